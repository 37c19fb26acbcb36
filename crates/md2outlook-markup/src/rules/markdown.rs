//! Rules for the Markdown dialect (clipboard paste path).

use super::commonmark::{code_span, commonmark_rules, delimit, link};
use super::table::{markdown_cell, markdown_row};
use super::{Filter, Rule, Rules};
use crate::utilities::clean_attribute;

/// Shared rules plus the Markdown-only overrides
pub fn markdown_rules() -> Rules {
    let mut rules = commonmark_rules();

    rules.add("superscript", Rule::for_tag("sup", |_, c, _| delimit(c, "^")));
    rules.add("subscript", Rule::for_tag("sub", |_, c, _| delimit(c, "~")));
    rules.add("lineBreak", Rule::for_tag("br", |_, _, _| "\n".to_string()));
    rules.add(
        "emphasis",
        Rule::for_tags(&["em", "i", "cite", "var"], |_, content, ctx| {
            delimit(content, &ctx.options.em_delimiter)
        }),
    );
    rules.add("code", code_rule());
    rules.add("link", link_rule());
    rules.add("styleOnly", Rule::for_tags(&["font", "span"], |_, c, _| c.to_string()));
    rules.add("division", Rule::for_tag("div", |_, c, _| format!("{}\n", c)));
    rules.add("mark", Rule::for_tag("mark", |_, c, _| delimit(c, "==")));
    rules.add(
        "strikethrough",
        Rule::for_tags(&["del", "s", "strike"], |_, c, _| delimit(c, "~~")),
    );

    rules.add("columnGroup", Rule::for_tags(&["colgroup", "col"], |_, _, _| String::new()));
    rules.add("tableCell", Rule::for_tags(&["th", "td"], |node, c, _| markdown_cell(node, c)));
    rules.add(
        "tableRow",
        Rule::for_tag("tr", |node, content, ctx| {
            markdown_row(node, content, ctx.column_alignments())
        }),
    );
    rules.add(
        "tableSection",
        Rule::for_tags(&["thead", "tbody", "tfoot"], |_, c, _| c.to_string()),
    );
    rules.add(
        "table",
        Rule::for_tag("table", |_, content, _| {
            format!("\n\n{}\n\n", content.trim_matches('\n'))
        }),
    );

    rules
}

/// Inline code and its relatives, except the `code` that carries a `pre` block
fn code_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, _| {
            matches!(tag, "code" | "kbd" | "samp" | "tt") && node.parent_tag() != Some("pre")
        }),
        |_, content, _| code_span(content),
    )
    .verbatim()
}

/// Links with the `<url>` autolink and `mailto:` shortcuts
fn link_rule() -> Rule {
    Rule::for_tag("a", |node, content, ctx| {
        let href = clean_attribute(node.attr("href"));
        if href.is_empty() {
            return content.to_string();
        }
        if content.trim().is_empty() {
            return String::new();
        }
        let text = node.text_content();
        if node.attr("title").is_none() {
            if text == href {
                return format!("<{}>", href);
            }
            if href.strip_prefix("mailto:") == Some(text.as_str()) {
                return format!("<{}>", text);
            }
        }
        link(node, content, ctx)
    })
}

#[cfg(test)]
mod tests {
    use crate::converter::Converter;
    use crate::node::Node;

    fn paragraph(children: Vec<Node>) -> Node {
        let mut p = Node::element("p");
        for child in children {
            p.add_child(child);
        }
        p
    }

    fn render(node: &Node) -> String {
        Converter::markdown().convert(node)
    }

    #[test]
    fn test_superscript_and_subscript() {
        let mut sup = Node::element("sup");
        sup.add_child(Node::text("2"));
        let mut sub = Node::element("sub");
        sub.add_child(Node::text("i"));
        let tree = paragraph(vec![Node::text("x"), sup, Node::text(" a"), sub]);
        assert_eq!(render(&tree), "x^2^ a~i~");
    }

    #[test]
    fn test_autolink_and_mailto() {
        let mut auto = Node::element_with_attrs("a", vec![("href", "https://example.com")]);
        auto.add_child(Node::text("https://example.com"));
        assert_eq!(render(&auto), "<https://example.com>");

        let mut mail = Node::element_with_attrs("a", vec![("href", "mailto:me@example.com")]);
        mail.add_child(Node::text("me@example.com"));
        assert_eq!(render(&mail), "<me@example.com>");
    }

    #[test]
    fn test_link_with_title() {
        let mut a = Node::element_with_attrs(
            "a",
            vec![("href", "https://example.com"), ("title", "Example")],
        );
        a.add_child(Node::text("site"));
        assert_eq!(render(&a), "[site](https://example.com \"Example\")");
    }

    #[test]
    fn test_empty_link_is_dropped() {
        let a = Node::element_with_attrs("a", vec![("href", "https://example.com")]);
        assert_eq!(render(&a), "");
    }

    #[test]
    fn test_style_only_elements_unwrap() {
        let mut span = Node::element_with_attrs("span", vec![("style", "color: red")]);
        span.add_child(Node::text("red"));
        let mut font = Node::element("font");
        font.add_child(span);
        assert_eq!(render(&paragraph(vec![font])), "red");
    }

    #[test]
    fn test_kbd_is_code() {
        let mut kbd = Node::element("kbd");
        kbd.add_child(Node::text("Ctrl_C"));
        assert_eq!(render(&paragraph(vec![kbd])), "`Ctrl_C`");
    }

    #[test]
    fn test_mark_and_strikethrough() {
        let mut mark = Node::element("mark");
        mark.add_child(Node::text("hot"));
        let mut del = Node::element("del");
        del.add_child(Node::text("old"));
        let tree = paragraph(vec![mark, Node::text(" "), del]);
        assert_eq!(render(&tree), "==hot== ~~old~~");
    }
}
