//! Email-safe HTML pipeline.
//!
//! Turns a full HTML document into a fragment the mail client accepts
//! without a "complex content" prompt:
//!
//! 1. inline every `<style>` rule and drop the `<style>` blocks
//! 2. shade even table rows, standing in for `tr:nth-of-type(even)`
//! 3. remove `<script>` and external stylesheet `<link>` elements
//! 4. keep only the `<body>` content
//!
//! Each stage returns a `Result`; on error the pipeline logs and falls back
//! to a regex approximation or to the stage input, so one broken stage costs
//! styling, never the document. Running the pipeline on its own output
//! changes nothing.

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use md2outlook_markup::{parse_document, Element, Node};

use crate::css::{inline_css, merge_declarations};
use crate::{Error, Result};

static SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").expect("static script pattern"));
static STYLESHEET_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<link\b[^>]*\brel\s*=\s*["']?stylesheet[^>]*>"#)
        .expect("static link pattern")
});
static BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*)</body\s*>").expect("static body pattern"));

/// The four pipeline stages with their settings
#[derive(Debug, Clone)]
pub struct MailSafePipeline {
    row_background: String,
}

impl Default for MailSafePipeline {
    fn default() -> Self {
        Self::new("#f3f3f3")
    }
}

impl MailSafePipeline {
    pub fn new(row_background: &str) -> Self {
        Self {
            row_background: row_background.to_string(),
        }
    }

    /// Run every stage on a full HTML document and return the body fragment
    pub fn run(&self, html: &str) -> String {
        let html = stage("inline css", html, inline_css, str::to_string);
        let html = stage(
            "row shading",
            &html,
            |h| shade_rows(h, &self.row_background),
            str::to_string,
        );
        let html = stage(
            "strip complex elements",
            &html,
            strip_complex_elements,
            strip_with_regex,
        );
        stage("extract body", &html, extract_body, body_with_regex)
    }
}

/// Run the pipeline with default settings
pub fn make_mail_safe(html: &str) -> String {
    MailSafePipeline::default().run(html)
}

fn stage<S, F>(name: &str, input: &str, run: S, fallback: F) -> String
where
    S: FnOnce(&str) -> Result<String>,
    F: FnOnce(&str) -> String,
{
    match run(input) {
        Ok(output) => {
            debug!("Mail pipeline stage '{}' done", name);
            output
        }
        Err(e) => {
            warn!("Mail pipeline stage '{}' failed, falling back: {}", name, e);
            fallback(input)
        }
    }
}

/// Append `background-color` to every even row (1-based) of every table
pub fn shade_rows(html: &str, background: &str) -> Result<String> {
    let mut root = parse_document(html)?;
    let declaration = [("background-color".to_string(), background.to_string())];
    shade_tables(&mut root, &declaration);
    Ok(root.outer_html())
}

fn shade_tables(node: &mut Node, declaration: &[(String, String)]) {
    if node.tag_name() == "table" {
        for (index, row) in rows_mut(node).into_iter().enumerate() {
            if (index + 1) % 2 == 0 {
                let style = merge_declarations(row.attr("style").unwrap_or(""), declaration);
                row.set_attr("style", &style);
            }
        }
    }
    if let Some(children) = node.children_mut() {
        for child in children.iter_mut() {
            shade_tables(child, declaration);
        }
    }
}

/// Rows of this table only, looking through row groups
fn rows_mut(table: &mut Node) -> Vec<&mut Node> {
    let mut rows = Vec::new();
    let Some(children) = table.children_mut() else {
        return rows;
    };
    for child in children.iter_mut() {
        let tag = child.tag_name().to_string();
        match tag.as_str() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => {
                if let Some(group) = child.children_mut() {
                    rows.extend(group.iter_mut().filter(|n| n.tag_name() == "tr"));
                }
            }
            _ => {}
        }
    }
    rows
}

fn is_complex(element: &Element) -> bool {
    match element.tag.as_str() {
        "script" => true,
        "link" => element.attr("rel").is_some_and(|rel| {
            rel.split_whitespace()
                .any(|r| r.eq_ignore_ascii_case("stylesheet"))
        }),
        _ => false,
    }
}

/// Remove `<script>` and `<link rel="stylesheet">` elements
pub fn strip_complex_elements(html: &str) -> Result<String> {
    let mut root = parse_document(html)?;
    let removed = root.remove_elements(&is_complex);
    debug!("Removed {} complex elements", removed);
    Ok(root.outer_html())
}

fn strip_with_regex(html: &str) -> String {
    let html = SCRIPT.replace_all(html, "");
    STYLESHEET_LINK.replace_all(&html, "").into_owned()
}

/// Inner HTML of `<body>`, trimmed
pub fn extract_body(html: &str) -> Result<String> {
    let root = parse_document(html)?;
    let body = root.find("body").ok_or(Error::MissingElement("body"))?;
    Ok(body.inner_html().trim().to_string())
}

fn body_with_regex(html: &str) -> String {
    BODY.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| html.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>t</title>
  <link rel="stylesheet" href="https://cdn.example.com/x.css">
  <style>
    p { color: red }
    td { padding: 2px }
  </style>
</head>
<body>
<p>hello</p>
<table>
<tr><td>1</td></tr>
<tr><td>2</td></tr>
<tr><td>3</td></tr>
<tr><td>4</td></tr>
</table>
<script>alert(1)</script>
</body>
</html>"#;

    #[test]
    fn test_pipeline() {
        let out = make_mail_safe(DOCUMENT);
        assert!(out.starts_with(r#"<p style="color: red">hello</p>"#));
        assert!(!out.contains("<script"));
        assert!(!out.contains("<link"));
        assert!(!out.contains("<style"));
        assert!(!out.contains("<body"));
        assert!(!out.contains("<title"));
        assert_eq!(out.matches("background-color: #f3f3f3").count(), 2);
        assert!(out.contains(r#"<td style="padding: 2px">1</td>"#));
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let once = make_mail_safe(DOCUMENT);
        let twice = make_mail_safe(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_shade_rows_skips_nested_tables() {
        let html = "<table><tbody><tr><td><table><tr><td>a</td></tr><tr><td>b</td></tr></table></td></tr>\
                    <tr><td>c</td></tr></tbody></table>";
        let out = shade_rows(html, "#eee").unwrap();
        assert_eq!(out.matches("background-color: #eee").count(), 2);
        assert!(out.contains(r#"<tr style="background-color: #eee"><td>b</td></tr>"#));
        assert!(out.contains(r#"<tr style="background-color: #eee"><td>c</td></tr>"#));
    }

    #[test]
    fn test_shade_rows_merges_existing_style() {
        let html = r#"<table><tr><td>1</td></tr><tr style="color: red"><td>2</td></tr></table>"#;
        let out = shade_rows(html, "#eee").unwrap();
        assert!(out.contains(r#"<tr style="color: red; background-color: #eee">"#));
    }

    #[test]
    fn test_regex_fallbacks() {
        assert_eq!(
            strip_with_regex(r#"a<script type="x">b</script>c<link rel="stylesheet" href="s.css">d"#),
            "acd"
        );
        assert_eq!(body_with_regex("<html><body class=\"x\">\n<p>x</p>\n</body></html>"), "<p>x</p>");
        assert_eq!(body_with_regex("<p>fragment</p>"), "<p>fragment</p>");
    }
}
