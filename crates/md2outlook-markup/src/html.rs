//! HTML parsing support.
//!
//! Parsing is lenient: `scraper`/html5ever recovers from malformed markup the
//! way browsers do, so the only failure is a parse that yields no element at
//! all. Comments, doctypes and processing instructions are dropped.

use scraper::{ElementRef, Html, Node as ScraperNode};

use crate::node::Node;
use crate::{MarkupError, Result};

/// Parse an HTML fragment into a Node tree rooted at the synthetic `html`
/// element the fragment parser creates.
///
/// # Example
///
/// ```rust
/// use md2outlook_markup::{parse_html, Converter};
///
/// let node = parse_html("<h1>Hello <em>World</em></h1>").unwrap();
/// let markdown = Converter::markdown().convert(&node);
/// assert_eq!(markdown, "# Hello *World*");
/// ```
pub fn parse_html(html: &str) -> Result<Node> {
    let fragment = Html::parse_fragment(html);
    let root = fragment
        .tree
        .root()
        .children()
        .find_map(ElementRef::wrap)
        .ok_or_else(|| MarkupError::Parse("fragment has no root element".to_string()))?;
    Ok(scraper_to_node(root, &mut |_, _| {}))
}

/// Parse a full HTML document into a [`Node::Document`]
pub fn parse_document(html: &str) -> Result<Node> {
    convert_document(&Html::parse_document(html), |_, _| {})
}

/// Convert an already parsed document, letting `decorate` adjust each element
/// after it has been built. Stages that select with CSS selectors on the
/// `scraper` tree use the hook to carry their results across.
pub fn convert_document<F>(document: &Html, mut decorate: F) -> Result<Node>
where
    F: FnMut(&ElementRef, &mut Node),
{
    let mut root = Node::document();
    for child in document.tree.root().children() {
        if let Some(element) = ElementRef::wrap(child) {
            root.add_child(scraper_to_node(element, &mut decorate));
        }
    }
    if root.element_children().next().is_none() {
        return Err(MarkupError::Parse("document has no root element".to_string()));
    }
    Ok(root)
}

/// Convert a scraper ElementRef to our Node structure
fn scraper_to_node<F>(element: ElementRef, decorate: &mut F) -> Node
where
    F: FnMut(&ElementRef, &mut Node),
{
    let attrs: Vec<(&str, &str)> = element.value().attrs().collect();
    let mut node = Node::element_with_attrs(element.value().name(), attrs);

    for child in element.children() {
        match child.value() {
            ScraperNode::Text(text) => node.add_child(Node::text(&text.text)),
            ScraperNode::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    node.add_child(scraper_to_node(child_element, decorate));
                }
            }
            _ => {}
        }
    }

    decorate(&element, &mut node);
    node
}
