//! Markdown renderer.
//!
//! Parses with pulldown-cmark and rewrites three constructs on the event
//! stream before handing it to the HTML writer: fenced code blocks go through
//! the [`Highlighter`], inline code gets an explicit `style` attribute, and
//! `==text==` becomes `<mark>`.

use log::{debug, warn};
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

use md2outlook_markup::{escape_html, escape_html_attr};

use crate::highlight::Highlighter;
use crate::inline_style::{apply_style_rules, inline_highlight_styles};

/// Style of inline `code` spans
pub const INLINE_CODE_STYLE: &str = "font-family:SFMono-Regular,Consolas,'Liberation Mono',Menlo,monospace;padding:0.2em 0.4em;margin:0;font-size:85%;background-color:rgba(175,184,193,0.2);border-radius:6px;color:#850000;";

/// Style of the table cell wrapping a code block
pub const CODE_CELL_STYLE: &str = "border:1px solid #d0d7de;background-color:#f6f8fa;padding:8px 12px;font-family:Consolas,monospace;font-size:13px;color:#24292e;";

/// How fenced code blocks are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeLayout {
    /// Bordered, shaded table cell with explicit line breaks and indentation;
    /// survives the mail client's CSS handling
    #[default]
    MailTable,
    /// `<pre><code class="language-x">`; what the wiki converter expects
    Plain,
}

#[derive(Debug, Clone)]
pub struct RendererOptions {
    pub code_layout: CodeLayout,
    pub inline_code_style: String,
    pub code_cell_style: String,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            code_layout: CodeLayout::MailTable,
            inline_code_style: INLINE_CODE_STYLE.to_string(),
            code_cell_style: CODE_CELL_STYLE.to_string(),
        }
    }
}

impl RendererOptions {
    /// `<pre>` code blocks for the wiki path
    pub fn plain() -> Self {
        Self {
            code_layout: CodeLayout::Plain,
            ..Self::default()
        }
    }
}

pub struct MarkdownRenderer<'h> {
    highlighter: &'h dyn Highlighter,
    options: RendererOptions,
}

impl<'h> MarkdownRenderer<'h> {
    pub fn new(highlighter: &'h dyn Highlighter) -> Self {
        Self {
            highlighter,
            options: RendererOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RendererOptions) -> Self {
        self.options = options;
        self
    }

    /// Render Markdown to an HTML string
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(
            markdown,
            Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH,
        );

        let mut events: Vec<Event> = Vec::new();
        let mut code_block: Option<(String, String)> = None;
        let mut marks = MarkState::default();

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let language = match kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().unwrap_or("").to_string()
                        }
                        CodeBlockKind::Indented => String::new(),
                    };
                    code_block = Some((language, String::new()));
                }
                Event::Text(text) if code_block.is_some() => {
                    if let Some((_, code)) = code_block.as_mut() {
                        code.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((language, code)) = code_block.take() {
                        events.push(Event::Html(self.code_block(&language, &code).into()));
                    }
                }
                Event::Code(code) => {
                    events.push(Event::InlineHtml(
                        format!(
                            "<code style=\"{}\">{}</code>",
                            escape_html_attr(&self.options.inline_code_style),
                            escape_html(&code)
                        )
                        .into(),
                    ));
                }
                Event::Text(text) => marks.push_text(&mut events, text),
                Event::End(end) => {
                    if closes_inline_context(&end) {
                        marks.abandon(&mut events);
                    }
                    events.push(Event::End(end));
                }
                other => events.push(other),
            }
        }

        let mut out = String::new();
        html::push_html(&mut out, events.into_iter());
        out
    }

    fn code_block(&self, language: &str, code: &str) -> String {
        let code = code.strip_suffix('\n').unwrap_or(code);
        let body = self.highlight(language, code);

        let class = if language.is_empty() {
            String::new()
        } else {
            format!(" class=\"language-{}\"", escape_html_attr(language))
        };

        match self.options.code_layout {
            CodeLayout::MailTable => format!(
                concat!(
                    "<table class=\"code\" style=\"border-collapse:collapse;width:100%;\">",
                    "<tbody><tr><td style=\"{}\"><code{}>{}</code></td></tr></tbody></table>\n",
                ),
                escape_html_attr(&self.options.code_cell_style),
                class,
                inline_highlight_styles(&body)
            ),
            CodeLayout::Plain => format!(
                "<pre><code{}>{}</code></pre>\n",
                class,
                apply_style_rules(&body)
            ),
        }
    }

    /// Classified HTML, or the escaped code when the language is unknown or
    /// the highlighter fails
    fn highlight(&self, language: &str, code: &str) -> String {
        if language.is_empty() {
            return escape_html(code);
        }
        match self.highlighter.highlight(language, code) {
            Ok(Some(highlighted)) => highlighted,
            Ok(None) => {
                debug!("Rendering {} block without highlighting", language);
                escape_html(code)
            }
            Err(e) => {
                warn!("Highlighting {} block failed: {}", language, e);
                escape_html(code)
            }
        }
    }
}

/// Leaf blocks end any `==` span left open inside them
fn closes_inline_context(end: &TagEnd) -> bool {
    matches!(
        end,
        TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::TableCell
            | TagEnd::Item
    )
}

/// Tracks an open `==` so it can be turned back into text if it never closes
#[derive(Default)]
struct MarkState {
    /// Index of the `<mark>` event
    open: Option<usize>,
}

impl MarkState {
    fn push_text<'a>(&mut self, events: &mut Vec<Event<'a>>, text: CowStr<'a>) {
        if !text.contains("==") {
            events.push(Event::Text(text));
            return;
        }

        let mut rest: &str = &text;
        let mut pending = String::new();
        while let Some(pos) = rest.find("==") {
            pending.push_str(&rest[..pos]);
            let after = &rest[pos + 2..];
            let toggles = match self.open {
                None => !after.starts_with(char::is_whitespace),
                Some(index) => {
                    !pending.ends_with(char::is_whitespace)
                        && !(pending.is_empty() && index + 1 == events.len())
                }
            };

            if toggles {
                if !pending.is_empty() {
                    events.push(Event::Text(std::mem::take(&mut pending).into()));
                }
                if self.open.take().is_some() {
                    events.push(Event::InlineHtml("</mark>".into()));
                } else {
                    self.open = Some(events.len());
                    events.push(Event::InlineHtml("<mark>".into()));
                }
            } else {
                pending.push_str("==");
            }
            rest = after;
        }
        pending.push_str(rest);
        if !pending.is_empty() {
            events.push(Event::Text(pending.into()));
        }
    }

    /// Revert an unclosed `<mark>` to the literal `==`
    fn abandon(&mut self, events: &mut [Event]) {
        if let Some(index) = self.open.take() {
            events[index] = Event::Text("==".into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::{PlainHighlighter, SyntectHighlighter};
    use crate::Result;

    struct FailingHighlighter;

    impl Highlighter for FailingHighlighter {
        fn highlight(&self, _language: &str, _code: &str) -> Result<Option<String>> {
            Err(crate::Error::Stylesheet("boom".to_string()))
        }
    }

    #[test]
    fn test_basic_markdown() {
        let html = MarkdownRenderer::new(&PlainHighlighter)
            .render("# Title\n\nSome **bold** and *italic*.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
    }

    #[test]
    fn test_inline_code_has_style() {
        let html = MarkdownRenderer::new(&PlainHighlighter).render("Use `a < b` here");
        assert!(html.contains("<code style=\"font-family:SFMono-Regular"));
        assert!(html.contains(">a &lt; b</code>"));
        assert!(!html.contains("class="));
    }

    #[test]
    fn test_mark() {
        let render = |md: &str| MarkdownRenderer::new(&PlainHighlighter).render(md);
        assert_eq!(render("a ==hot== b"), "<p>a <mark>hot</mark> b</p>\n");
        assert_eq!(render("a == b"), "<p>a == b</p>\n");
        assert_eq!(render("x ==open"), "<p>x ==open</p>\n");
        assert_eq!(render("==**x**=="), "<p><mark><strong>x</strong></mark></p>\n");
    }

    #[test]
    fn test_code_block_mail_table() {
        let highlighter = SyntectHighlighter::new();
        let html = MarkdownRenderer::new(&highlighter).render("```js\nconsole.log(1);\n```\n");
        assert!(html.contains("<table class=\"code\""));
        assert!(html.contains("<code class=\"language-js\">"));
        assert!(html.contains("class=\"hl-"));
        assert!(html.contains("style=\"color:"));
        assert!(!html.contains("<pre"));
    }

    #[test]
    fn test_code_block_plain_layout() {
        let html = MarkdownRenderer::new(&PlainHighlighter)
            .with_options(RendererOptions::plain())
            .render("```text\nif a < b {\n    c\n}\n```\n");
        assert_eq!(
            html,
            "<pre><code class=\"language-text\">if a &lt; b {\n    c\n}</code></pre>\n"
        );
    }

    #[test]
    fn test_unknown_language_keeps_indentation() {
        let html = MarkdownRenderer::new(&PlainHighlighter).render("```\nfn x\n  y\n```\n");
        assert!(html.contains("<code>fn x<br>&nbsp;&nbsp;y</code>"));
    }

    #[test]
    fn test_highlighter_failure_falls_back() {
        let html = MarkdownRenderer::new(&FailingHighlighter)
            .with_options(RendererOptions::plain())
            .render("```rust\nlet a = 1 < 2;\n```\n");
        assert!(html.contains("let a = 1 &lt; 2;"));
    }
}
