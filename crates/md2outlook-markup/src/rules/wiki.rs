//! Rules for the wiki markup dialect.

use super::commonmark::{code_language, commonmark_rules, delimit, heading_level};
use super::table::{wiki_cell, wiki_row};
use super::{Filter, Rule, Rules};
use crate::utilities::clean_attribute;

/// Shared rules plus the wiki overrides
pub fn wiki_rules() -> Rules {
    let mut rules = commonmark_rules();

    rules.add(
        "heading",
        Rule::new(
            Filter::tags(&["h1", "h2", "h3", "h4", "h5", "h6"]),
            |node, content, _| {
                let content = content.trim();
                if content.is_empty() {
                    return String::new();
                }
                format!("\n\nh{}. {}\n\n", heading_level(node), content)
            },
        ),
    );
    rules.add(
        "link",
        Rule::for_tag("a", |node, content, _| {
            let href = clean_attribute(node.attr("href"));
            match (href.is_empty(), content.trim().is_empty()) {
                (true, _) => content.to_string(),
                (false, true) => format!("[{}]", href),
                (false, false) => format!("[{}|{}]", content.trim(), href),
            }
        }),
    );
    rules.add(
        "image",
        Rule::for_tag("img", |node, _, _| {
            let src = clean_attribute(node.attr("src"));
            if src.is_empty() {
                String::new()
            } else {
                format!("!{}!", src)
            }
        }),
    );
    rules.add(
        "codeBlock",
        Rule::for_tag("pre", |node, content, _| {
            let open = match code_language(node) {
                Some(language) => format!("{{code:{}}}", language),
                None => "{code}".to_string(),
            };
            format!("\n\n{}\n{}\n{{code}}\n\n", open, content.trim_end_matches('\n'))
        })
        .verbatim(),
    );
    rules.add(
        "code",
        Rule::for_tag("code", |node, content, _| {
            if node.parent_tag() == Some("pre") || content.is_empty() {
                content.to_string()
            } else {
                format!("{{{{{}}}}}", content)
            }
        })
        .verbatim(),
    );
    rules.add(
        "blockquote",
        Rule::for_tag("blockquote", |_, content, _| {
            format!("\n\n{{quote}}\n{}\n{{quote}}\n\n", content.trim())
        }),
    );
    rules.add("lineBreak", Rule::for_tag("br", |_, _, _| "\n".to_string()));
    rules.add(
        "emphasis",
        Rule::for_tags(&["em", "i", "cite", "var"], |_, content, ctx| {
            delimit(content, &ctx.options.em_delimiter)
        }),
    );

    rules.add("columnGroup", Rule::for_tags(&["colgroup", "col"], |_, _, _| String::new()));
    rules.add("tableCell", Rule::for_tags(&["th", "td"], |node, c, _| wiki_cell(node, c)));
    rules.add("tableRow", Rule::for_tag("tr", |node, c, _| wiki_row(node, c)));
    rules.add(
        "tableSection",
        Rule::for_tags(&["thead", "tbody", "tfoot"], |_, c, _| c.to_string()),
    );
    rules.add(
        "table",
        Rule::for_tag("table", |_, content, _| format!("\n\n{}\n\n", content.trim_matches('\n'))),
    );

    rules
}

#[cfg(test)]
mod tests {
    use crate::converter::Converter;
    use crate::node::Node;

    fn with_text(tag: &str, attrs: Vec<(&str, &str)>, text: &str) -> Node {
        let mut node = Node::element_with_attrs(tag, attrs);
        node.add_child(Node::text(text));
        node
    }

    fn render(node: &Node) -> String {
        Converter::wiki().convert(node)
    }

    #[test]
    fn test_heading() {
        assert_eq!(render(&with_text("h3", vec![], "Setup")), "h3. Setup");
    }

    #[test]
    fn test_strong_and_emphasis() {
        let mut p = Node::element("p");
        p.add_child(with_text("strong", vec![], "bold"));
        p.add_child(Node::text(" and "));
        p.add_child(with_text("em", vec![], "italic"));
        assert_eq!(render(&p), "*bold* and _italic_");
    }

    #[test]
    fn test_link_and_image() {
        let a = with_text("a", vec![("href", "https://example.com")], "site");
        assert_eq!(render(&a), "[site|https://example.com]");

        let img = Node::element_with_attrs("img", vec![("src", "pic.png"), ("alt", "x")]);
        assert_eq!(render(&img), "!pic.png!");
    }

    #[test]
    fn test_code_block_with_language() {
        let code = with_text("code", vec![("class", "language-rust")], "let x = a_b * 2;\n");
        let mut pre = Node::element("pre");
        pre.add_child(code);
        assert_eq!(render(&pre), "{code:rust}\nlet x = a_b * 2;\n{code}");
    }

    #[test]
    fn test_code_block_without_language() {
        let mut pre = Node::element("pre");
        pre.add_child(Node::text("plain"));
        assert_eq!(render(&pre), "{code}\nplain\n{code}");
    }

    #[test]
    fn test_inline_code_is_not_escaped() {
        let mut p = Node::element("p");
        p.add_child(Node::text("call "));
        p.add_child(with_text("code", vec![], "a_b()"));
        assert_eq!(render(&p), "call {{a_b()}}");
    }

    #[test]
    fn test_blockquote() {
        let mut quote = Node::element("blockquote");
        quote.add_child(with_text("p", vec![], "quoted"));
        assert_eq!(render(&quote), "{quote}\nquoted\n{quote}");
    }

    #[test]
    fn test_text_is_escaped() {
        let p = with_text("p", vec![], "a*b {x} | !y!");
        assert_eq!(render(&p), r"a\*b \{x\} \| \!y\!");
    }
}
