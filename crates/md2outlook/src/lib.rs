//! # md2outlook
//!
//! Render Markdown into HTML a mail client displays faithfully, and convert
//! HTML back into Markdown or Confluence-style wiki markup.
//!
//! The Markdown path renders with [`MarkdownRenderer`], rewrites block quotes
//! into bordered tables, optionally embeds local images, fills the document
//! template and runs the [`MailSafePipeline`]. The reverse path parses HTML
//! leniently and runs the rule engine from `md2outlook-markup`.
//!
//! ## Example
//!
//! ```rust
//! use md2outlook::{html_to_wiki, markdown_to_html, PlainHighlighter};
//!
//! let html = markdown_to_html("# Title\n\nSome **bold** text.", &PlainHighlighter);
//! assert!(html.contains("<h1>Title</h1>"));
//!
//! let wiki = html_to_wiki(&html).unwrap();
//! assert_eq!(wiki, "h1. Title\n\nSome *bold* text.");
//! ```

use std::path::Path;

use log::debug;

use md2outlook_markup::{parse_html, Converter, MarkupError};

pub mod config;
pub mod css;
pub mod highlight;
pub mod images;
pub mod inline_style;
pub mod mail;
pub mod normalize;
pub mod render;

pub use config::{Config, DEFAULT_STYLESHEET, DEFAULT_TEMPLATE};
pub use highlight::{Highlighter, PlainHighlighter, SyntectHighlighter};
pub use inline_style::{inline_highlight_styles, StyleRule};
pub use mail::{make_mail_safe, MailSafePipeline};
pub use render::{CodeLayout, MarkdownRenderer, RendererOptions};

/// Error type for md2outlook operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error("highlighting failed: {0}")]
    Highlight(#[from] syntect::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("stylesheet error: {0}")]
    Stylesheet(String),

    #[error("missing <{0}> element")]
    MissingElement(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Render Markdown to HTML with mail-table code blocks
pub fn markdown_to_html(markdown: &str, highlighter: &dyn Highlighter) -> String {
    MarkdownRenderer::new(highlighter).render(markdown)
}

/// Render Markdown into a self-contained, mail-safe HTML fragment.
///
/// Local images are resolved against `source_dir` when one is given and
/// [`Config::embed_images`] is set.
pub fn markdown_to_mail_html(
    markdown: &str,
    source_dir: Option<&Path>,
    config: &Config,
    highlighter: &dyn Highlighter,
) -> Result<String> {
    let html = markdown_to_html(markdown, highlighter);

    let mut fragment = parse_html(&html)?;
    let quotes = normalize::rewrite_blockquotes(&mut fragment);
    let images = match source_dir {
        Some(dir) if config.embed_images => images::embed_local_images(&mut fragment, dir),
        _ => 0,
    };
    debug!("Rewrote {} block quotes, embedded {} images", quotes, images);

    let document = config.compose(&fragment.inner_html());
    Ok(MailSafePipeline::new(&config.row_background).run(&document))
}

/// Render Markdown and convert the result to wiki markup
pub fn markdown_to_wiki(markdown: &str, highlighter: &dyn Highlighter) -> Result<String> {
    let html = MarkdownRenderer::new(highlighter)
        .with_options(RendererOptions::plain())
        .render(markdown);
    html_to_wiki(&html)
}

/// Convert HTML (e.g. rich clipboard content) to Markdown
pub fn html_to_markdown(html: &str) -> Result<String> {
    Ok(Converter::markdown().convert_html(html)?)
}

/// Convert HTML to wiki markup
pub fn html_to_wiki(html: &str) -> Result<String> {
    Ok(Converter::wiki().convert_html(html)?)
}
