//! Converter - the entry point for tree-to-markup conversion.

use log::debug;

use crate::context::RenderContext;
use crate::node::{Node, NodeRef, NodeType};
use crate::options::RenderOptions;
use crate::rules::{markdown_rules, wiki_rules, Rule, Rules};
use crate::utilities::{collapse_whitespace, escape_markdown, escape_wiki, is_blank, is_block};

/// Target markup language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Markdown,
    Wiki,
}

/// Renders a [`Node`] tree to markup text by post-order rule dispatch.
///
/// Children are rendered first and concatenated in document order; the
/// concatenation is handed to the most recently registered rule matching the
/// node. Elements without a rule contribute their children unchanged.
pub struct Converter {
    dialect: Dialect,
    options: RenderOptions,
    rules: Rules,
}

impl Converter {
    /// Create a converter with the dialect's default options and rule table
    pub fn new(dialect: Dialect) -> Self {
        let (options, rules) = match dialect {
            Dialect::Markdown => (RenderOptions::markdown(), markdown_rules()),
            Dialect::Wiki => (RenderOptions::wiki(), wiki_rules()),
        };
        Self {
            dialect,
            options,
            rules,
        }
    }

    pub fn markdown() -> Self {
        Self::new(Dialect::Markdown)
    }

    pub fn wiki() -> Self {
        Self::new(Dialect::Wiki)
    }

    /// Replace the options, keeping the rule table
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Add a custom rule; it takes precedence over every earlier rule
    pub fn add_rule(&mut self, key: &str, rule: Rule) -> &mut Self {
        self.rules.add(key, rule);
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Escape markup-significant characters of the target dialect
    pub fn escape(&self, text: &str) -> String {
        match self.dialect {
            Dialect::Markdown => escape_markdown(text),
            Dialect::Wiki => escape_wiki(text),
        }
    }

    /// Convert a tree to markup
    pub fn convert(&self, root: &Node) -> String {
        let mut ctx = RenderContext::new(self.options.clone());
        let output = self.process_node(&NodeRef::new(root), &mut ctx);
        let mut output = post_process(&output);

        let references = ctx.take_references();
        debug!(
            "{:?} conversion: {} bytes, {} link references",
            self.dialect,
            output.len(),
            references.len()
        );
        if !references.is_empty() {
            output.push_str("\n\n");
            output.push_str(&references.join("\n"));
        }
        output
    }

    /// Parse an HTML string and convert it
    #[cfg(feature = "html")]
    pub fn convert_html(&self, html: &str) -> crate::Result<String> {
        let tree = crate::html::parse_html(html)?;
        Ok(self.convert(&tree))
    }

    fn process_node(&self, node: &NodeRef, ctx: &mut RenderContext) -> String {
        match node.node {
            Node::Text(text) => self.process_text(node, text, ctx),
            Node::Document(_) => self.process_children(node, ctx),
            Node::Element(_) => {
                let rule = self.rules.for_node(node, &ctx.options);
                let scope = ctx.enter(node, rule.is_some_and(Rule::is_verbatim));
                let content = self.process_children(node, ctx);
                ctx.exit(scope);

                match rule {
                    Some(rule) => rule.replace(node, &content, ctx),
                    None => content,
                }
            }
        }
    }

    fn process_children(&self, node: &NodeRef, ctx: &mut RenderContext) -> String {
        let mut result = String::new();
        for (index, child) in node.node.children().enumerate() {
            let child = node.child(child, index);
            result.push_str(&self.process_node(&child, ctx));
        }
        result
    }

    fn process_text(&self, node: &NodeRef, text: &str, ctx: &RenderContext) -> String {
        if ctx.is_verbatim() {
            return text.replace('\u{a0}', " ");
        }

        let trim_start = match node.previous_sibling() {
            Some(prev) => is_block_node(prev),
            None => node.parent().is_some_and(|p| is_block_node(p.node)),
        };
        let trim_end = match node.next_sibling() {
            Some(next) => is_block_node(next),
            None => node.parent().is_some_and(|p| is_block_node(p.node)),
        };

        if is_blank(text) {
            return if trim_start || trim_end {
                String::new()
            } else {
                " ".to_string()
            };
        }

        let mut collapsed = collapse_whitespace(text);
        if trim_start {
            collapsed = collapsed.trim_start_matches(' ').to_string();
        }
        if trim_end {
            collapsed = collapsed.trim_end_matches(' ').to_string();
        }
        self.escape(&collapsed)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::markdown()
    }
}

fn is_block_node(node: &Node) -> bool {
    node.node_type() == NodeType::Document || (node.is_element() && is_block(node.tag_name()))
}

/// Trim surrounding newlines and cap runs of blank lines at one
fn post_process(output: &str) -> String {
    let result = output.trim_matches('\n');

    let mut newline_count = 0;
    let mut processed = String::with_capacity(result.len());

    for c in result.chars() {
        if c == '\n' {
            newline_count += 1;
            if newline_count <= 2 {
                processed.push(c);
            }
        } else {
            newline_count = 0;
            processed.push(c);
        }
    }

    processed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{CodeBlockStyle, HeadingStyle, LinkReferenceStyle, LinkStyle, ListStyle};

    fn element(tag: &str, children: Vec<Node>) -> Node {
        let mut node = Node::element(tag);
        for child in children {
            node.add_child(child);
        }
        node
    }

    fn text(s: &str) -> Node {
        Node::text(s)
    }

    #[test]
    fn test_simple_paragraph() {
        let tree = element("p", vec![text("Hello World")]);
        assert_eq!(Converter::markdown().convert(&tree), "Hello World");
    }

    #[test]
    fn test_heading_atx() {
        let tree = element("h1", vec![text("Title")]);
        assert_eq!(Converter::markdown().convert(&tree), "# Title");
    }

    #[test]
    fn test_heading_setext() {
        let options = RenderOptions {
            heading_style: HeadingStyle::Setext,
            ..RenderOptions::markdown()
        };
        let tree = element("h2", vec![text("Title")]);
        assert_eq!(
            Converter::markdown().with_options(options).convert(&tree),
            "Title\n-----"
        );
    }

    #[test]
    fn test_unmatched_element_unwraps() {
        let tree = element("section", vec![element("custom-tag", vec![text("inside")])]);
        assert_eq!(Converter::markdown().convert(&tree), "inside");
    }

    #[test]
    fn test_whitespace_between_blocks_is_dropped() {
        let tree = element(
            "div",
            vec![
                text("\n  "),
                element("p", vec![text("\n  one  two\n")]),
                text("\n  "),
                element("p", vec![text("three")]),
                text("\n"),
            ],
        );
        assert_eq!(Converter::markdown().convert(&tree), "one two\n\nthree");
    }

    #[test]
    fn test_text_escaped_per_dialect() {
        let tree = element("p", vec![text("a*b_c")]);
        assert_eq!(Converter::markdown().convert(&tree), r"a\*b\_c");
        assert_eq!(Converter::wiki().convert(&tree), r"a\*b\_c");

        let braces = element("p", vec![text("{x}")]);
        assert_eq!(Converter::markdown().convert(&braces), "{x}");
        assert_eq!(Converter::wiki().convert(&braces), r"\{x\}");
    }

    #[test]
    fn test_code_block_fenced_and_indented() {
        let code = Node::element_with_attrs("code", vec![("class", "language-js")]);
        let mut code = code;
        code.add_child(text("if (a) {\n  b();\n}\n"));
        let pre = element("pre", vec![code]);

        assert_eq!(
            Converter::markdown().convert(&pre),
            "```js\nif (a) {\n  b();\n}\n```"
        );

        let options = RenderOptions {
            code_block_style: CodeBlockStyle::Indented,
            ..RenderOptions::markdown()
        };
        assert_eq!(
            Converter::markdown().with_options(options).convert(&pre),
            "    if (a) {\n      b();\n    }"
        );
    }

    #[test]
    fn test_verbatim_turns_nbsp_into_space() {
        let pre = element("pre", vec![text("a\u{a0}\u{a0}b")]);
        assert_eq!(Converter::markdown().convert(&pre), "```\na  b\n```");
    }

    fn indented() -> Converter {
        Converter::markdown().with_options(RenderOptions {
            list_style: ListStyle::Indented,
            ..RenderOptions::markdown()
        })
    }

    #[test]
    fn test_indented_lists() {
        let inner = element("ul", vec![element("li", vec![text("b")])]);
        let tree = element(
            "ol",
            vec![
                element("li", vec![text("a"), inner]),
                element("li", vec![text("c")]),
            ],
        );
        assert_eq!(indented().convert(&tree), "1. a\n   * b\n2. c");
    }

    #[test]
    fn test_ordered_list_start() {
        let mut ol = Node::element_with_attrs("ol", vec![("start", "4")]);
        ol.add_child(element("li", vec![text("four")]));
        ol.add_child(element("li", vec![text("five")]));
        assert_eq!(indented().convert(&ol), "4. four\n5. five");
    }

    #[test]
    fn test_marker_run_lists() {
        let leaf = element("ul", vec![element("li", vec![text("deep")])]);
        let middle = element("ul", vec![element("li", vec![text("mid"), leaf])]);
        let tree = element(
            "ul",
            vec![
                element("li", vec![text("top"), middle]),
                element("li", vec![text("next")]),
            ],
        );
        assert_eq!(
            Converter::wiki().convert(&tree),
            "* top\n** mid\n*** deep\n* next"
        );
        assert_eq!(
            Converter::markdown().convert(&tree),
            "* top\n** mid\n*** deep\n* next"
        );

        let nested = element("ul", vec![element("li", vec![text("x")])]);
        let mixed = element("ol", vec![element("li", vec![text("one"), nested])]);
        assert_eq!(Converter::markdown().convert(&mixed), "# one\n#* x");
    }

    #[test]
    fn test_item_text_starting_with_marker_keeps_its_run() {
        let tree = element(
            "ol",
            vec![
                element("li", vec![text("# of users")]),
                element("li", vec![text("* rating")]),
            ],
        );
        assert_eq!(Converter::wiki().convert(&tree), "# # of users\n# \\* rating");
    }

    #[test]
    fn test_reference_links() {
        let mut a = Node::element_with_attrs("a", vec![("href", "https://example.com")]);
        a.add_child(text("site"));
        let tree = element("p", vec![text("see "), a]);

        let full = RenderOptions {
            link_style: LinkStyle::Referenced,
            ..RenderOptions::markdown()
        };
        assert_eq!(
            Converter::markdown().with_options(full.clone()).convert(&tree),
            "see [site][1]\n\n[1]: https://example.com"
        );

        let shortcut = RenderOptions {
            link_reference_style: LinkReferenceStyle::Shortcut,
            ..full
        };
        assert_eq!(
            Converter::markdown().with_options(shortcut).convert(&tree),
            "see [site]\n\n[site]: https://example.com"
        );
    }

    #[test]
    fn test_custom_rule_overrides() {
        let mut converter = Converter::markdown();
        converter.add_rule("loud", Rule::for_tag("strong", |_, c, _| c.to_uppercase()));
        let tree = element("p", vec![element("strong", vec![text("hey")])]);
        assert_eq!(converter.convert(&tree), "HEY");
    }

    #[test]
    fn test_removed_elements() {
        let tree = element(
            "div",
            vec![
                element("style", vec![text("p { color: red }")]),
                element("p", vec![text("kept")]),
            ],
        );
        assert_eq!(Converter::markdown().convert(&tree), "kept");
    }
}
