//! Tree model shared by the rule engine and the HTML post-processing stages.
//!
//! A [`Node`] is a tagged variant: a document root, an element with ordered
//! attributes and children, or a text run. Nodes own their children; upward
//! navigation is provided by [`NodeRef`], which carries the chain of ancestors
//! on the stack instead of storing parent pointers in the tree.

use indexmap::IndexMap;

use crate::utilities::{escape_html, escape_html_attr, is_raw_text, is_void};

/// Node types, mirroring the DOM `nodeType` values we care about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Element node (nodeType = 1)
    Element = 1,
    /// Text node (nodeType = 3)
    Text = 3,
    /// Document node (nodeType = 9)
    Document = 9,
}

/// An element: lowercase tag name, attributes in source order, children in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Get an attribute value by (case-insensitive) name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attr(&mut self, name: &str, value: &str) {
        let existing = self
            .attributes
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned();
        match existing {
            Some(key) => {
                self.attributes.insert(key, value.to_string());
            }
            None => {
                self.attributes.insert(name.to_lowercase(), value.to_string());
            }
        }
    }

    /// Whitespace-separated entries of the `class` attribute
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }
}

/// A node in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Document root; has no parent
    Document(Vec<Node>),
    Element(Element),
    Text(String),
}

impl Node {
    /// Create a new element node
    pub fn element(tag_name: &str) -> Self {
        Node::Element(Element::new(tag_name))
    }

    /// Create a new element node with attributes
    pub fn element_with_attrs(tag_name: &str, attrs: Vec<(&str, &str)>) -> Self {
        let mut element = Element::new(tag_name);
        for (name, value) in attrs {
            element.set_attr(name, value);
        }
        Node::Element(element)
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Node::Text(content.to_string())
    }

    /// Create an empty document node
    pub fn document() -> Self {
        Node::Document(Vec::new())
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Document(_) => NodeType::Document,
            Node::Element(_) => NodeType::Element,
            Node::Text(_) => NodeType::Text,
        }
    }

    /// Check if this is an element node
    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    /// Check if this is a text node
    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Get the tag name (lowercase); empty for non-element nodes
    pub fn tag_name(&self) -> &str {
        match self {
            Node::Element(element) => &element.tag,
            _ => "",
        }
    }

    /// Get an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.as_element()?.attr(name)
    }

    /// Check if an attribute exists
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Set an attribute; a no-op on non-element nodes
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(element) = self.as_element_mut() {
            element.set_attr(name, value);
        }
    }

    /// Get all child nodes
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.child_slice().iter()
    }

    /// Get only element children
    pub fn element_children(&self) -> impl Iterator<Item = &Node> {
        self.children().filter(|n| n.is_element())
    }

    fn child_slice(&self) -> &[Node] {
        match self {
            Node::Document(children) => children,
            Node::Element(element) => &element.children,
            Node::Text(_) => &[],
        }
    }

    /// Mutable access to the children; `None` for text nodes
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Document(children) => Some(children),
            Node::Element(element) => Some(&mut element.children),
            Node::Text(_) => None,
        }
    }

    /// Add a child node; text nodes cannot have children and ignore the call
    pub fn add_child(&mut self, child: Node) {
        if let Some(children) = self.children_mut() {
            children.push(child);
        }
    }

    /// Depth-first search for the first descendant element with the given tag
    pub fn find(&self, tag: &str) -> Option<&Node> {
        self.element_children().find_map(|child| {
            if child.tag_name() == tag {
                Some(child)
            } else {
                child.find(tag)
            }
        })
    }

    pub fn find_mut(&mut self, tag: &str) -> Option<&mut Node> {
        let children = self.children_mut()?;
        for child in children.iter_mut() {
            if child.tag_name() == tag {
                return Some(child);
            }
            if let Some(found) = child.find_mut(tag) {
                return Some(found);
            }
        }
        None
    }

    /// Check whether any descendant element has the given tag
    pub fn has_descendant(&self, tag: &str) -> bool {
        self.find(tag).is_some()
    }

    /// Remove every descendant element matching the predicate, with its subtree
    pub fn remove_elements<F>(&mut self, predicate: &F) -> usize
    where
        F: Fn(&Element) -> bool,
    {
        let Some(children) = self.children_mut() else {
            return 0;
        };
        let before = children.len();
        children.retain(|child| !child.as_element().is_some_and(predicate));
        let mut removed = before - children.len();
        for child in children.iter_mut() {
            removed += child.remove_elements(predicate);
        }
        removed
    }

    /// Visit every element mutably, parents before children
    pub fn for_each_element_mut<F>(&mut self, visit: &mut F)
    where
        F: FnMut(&mut Element),
    {
        if let Node::Element(element) = self {
            visit(element);
        }
        if let Some(children) = self.children_mut() {
            for child in children.iter_mut() {
                child.for_each_element_mut(visit);
            }
        }
    }

    /// Get all text content from this node and descendants
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(text) => text.clone(),
            _ => self.children().map(|child| child.text_content()).collect(),
        }
    }

    /// Serialize this node and its subtree to HTML
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out, false);
        out
    }

    /// Serialize the children of this node to HTML
    pub fn inner_html(&self) -> String {
        let raw = is_raw_text(self.tag_name());
        let mut out = String::new();
        for child in self.children() {
            child.write_html(&mut out, raw);
        }
        out
    }

    fn write_html(&self, out: &mut String, raw_text: bool) {
        match self {
            Node::Text(text) if raw_text => out.push_str(text),
            Node::Text(text) => out.push_str(&escape_html(text)),
            Node::Document(children) => {
                for child in children {
                    child.write_html(out, false);
                }
            }
            Node::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                for (name, value) in &element.attributes {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape_html_attr(value));
                        out.push('"');
                    }
                }
                out.push('>');

                if is_void(&element.tag) {
                    return;
                }

                let raw = is_raw_text(&element.tag);
                for child in &element.children {
                    child.write_html(out, raw);
                }
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
        }
    }
}

/// A reference to a node with its ancestor chain and sibling position.
///
/// The chain lives on the call stack of whoever walks the tree, so rules can
/// look at parents and siblings without the tree holding parent pointers.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    /// The node itself
    pub node: &'a Node,
    parent: Option<&'a NodeRef<'a>>,
    index: usize,
}

impl<'a> NodeRef<'a> {
    /// Create a new NodeRef without parent context
    pub fn new(node: &'a Node) -> Self {
        Self {
            node,
            parent: None,
            index: 0,
        }
    }

    /// Reference to the `index`-th child of this node
    pub fn child(&'a self, node: &'a Node, index: usize) -> NodeRef<'a> {
        NodeRef {
            node,
            parent: Some(self),
            index,
        }
    }

    pub fn parent(&self) -> Option<&'a NodeRef<'a>> {
        self.parent
    }

    /// Get the parent tag name if known
    pub fn parent_tag(&self) -> Option<&'a str> {
        self.parent.map(|p| p.node.tag_name())
    }

    /// Ancestors, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = &'a NodeRef<'a>> {
        std::iter::successors(self.parent, |p| p.parent)
    }

    /// Nearest ancestor element with the given tag
    pub fn closest(&self, tag: &str) -> Option<&'a NodeRef<'a>> {
        self.ancestors().find(|a| a.node.tag_name() == tag)
    }

    /// Position among all of the parent's children
    pub fn index(&self) -> usize {
        self.index
    }

    fn siblings(&self) -> &'a [Node] {
        self.parent.map(|p| p.node.child_slice()).unwrap_or(&[])
    }

    pub fn previous_sibling(&self) -> Option<&'a Node> {
        let index = self.index.checked_sub(1)?;
        self.siblings().get(index)
    }

    pub fn next_sibling(&self) -> Option<&'a Node> {
        self.siblings().get(self.index + 1)
    }

    /// Nearest preceding sibling that is an element
    pub fn previous_element_sibling(&self) -> Option<&'a Node> {
        self.siblings()[..self.index.min(self.siblings().len())]
            .iter()
            .rev()
            .find(|n| n.is_element())
    }

    /// Position among the parent's element children
    pub fn element_index(&self) -> usize {
        self.siblings()[..self.index.min(self.siblings().len())]
            .iter()
            .filter(|n| n.is_element())
            .count()
    }

    /// Delegate to Node methods
    pub fn is_element(&self) -> bool {
        self.node.is_element()
    }

    pub fn is_text(&self) -> bool {
        self.node.is_text()
    }

    pub fn tag_name(&self) -> &'a str {
        self.node.tag_name()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.node.attr(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.node.has_attr(name)
    }

    pub fn children(&self) -> impl Iterator<Item = &'a Node> {
        self.node.children()
    }

    pub fn element_children(&self) -> impl Iterator<Item = &'a Node> {
        self.node.element_children()
    }

    pub fn text_content(&self) -> String {
        self.node.text_content()
    }
}
