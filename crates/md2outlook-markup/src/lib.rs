//! # md2outlook-markup
//!
//! Convert DOM trees to Markdown or wiki markup.
//!
//! The converter walks a [`Node`] tree bottom-up and hands each element's
//! rendered children to the most recently registered matching [`Rule`].
//! Two rule tables ship with the crate: [`markdown_rules`] for Markdown and
//! [`wiki_rules`] for the Confluence-style wiki dialect. Both share the
//! table and list serialization in [`rules`](crate::Rules).
//!
//! ## Example (Node-based)
//!
//! ```rust
//! use md2outlook_markup::{Converter, Node};
//!
//! let mut h1 = Node::element("h1");
//! h1.add_child(Node::text("Hello World"));
//!
//! assert_eq!(Converter::wiki().convert(&h1), "h1. Hello World");
//! ```
//!
//! ## Example (HTML string)
//!
//! ```rust
//! use md2outlook_markup::Converter;
//!
//! let markdown = Converter::markdown()
//!     .convert_html("<h1>Hello World</h1>")
//!     .unwrap();
//! assert_eq!(markdown, "# Hello World");
//! ```

pub mod context;
pub mod converter;
#[cfg(feature = "html")]
pub mod html;
pub mod node;
pub mod options;
mod rules;
mod utilities;

pub use context::RenderContext;
pub use converter::{Converter, Dialect};
#[cfg(feature = "html")]
pub use html::{convert_document, parse_document, parse_html};
pub use node::{Element, Node, NodeRef, NodeType};
pub use options::{
    CodeBlockStyle, HeadingStyle, LinkReferenceStyle, LinkStyle, ListStyle, RenderOptions,
};
pub use rules::{
    code_language, commonmark_rules, list, list_item, markdown_rules, wiki_rules, Alignment,
    Filter, Rule, Rules,
};
pub use utilities::*;

/// Error type for markup operations
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, MarkupError>;
