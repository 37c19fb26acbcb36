//! Document configuration: stylesheet, template and pipeline settings.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;

use md2outlook_markup::escape_html;

use crate::Result;

/// Stylesheet used when the configuration does not provide one.
///
/// `body` styles are repeated on `.document` because only the body's
/// content survives fragment extraction.
pub const DEFAULT_STYLESHEET: &str = r#"
table {
    border-collapse: collapse;
}

thead tr {
    background-color: #009879;
    color: #000000;
    text-align: left;
    border-bottom: 2px solid #009879;
}

th, td {
    padding: 0in 5.4pt 0in 5.4pt;
}

tbody tr:nth-of-type(even) {
    background-color: #f3f3f3;
}

body, .document {
    color: #333;
    font-family: Calibri;
    font-size: 14.5px;
    line-height: 1.6;
    word-wrap: break-word;
}

mark {
    background-color: yellow;
}

pre {
    background-color: #f4f4f4;
    color: black;
    margin: 15px;
    padding: 10px;
}

code {
    font-family: Consolas;
    color: darkred;
    font-size: 13px;
}

pre code {
    color: rgb(0, 0, 0);
}

.code code {
    font-family: Consolas, monospace;
    color: #24292e;
}

.quote {
    font-family: Calibri;
    font-style: italic;
    font-weight: normal;
    color: black;
    padding-left: 10px;
    border-collapse: collapse;
    background-color: #f4f4f4;
}
"#;

/// Template used when the configuration does not provide one
pub const DEFAULT_TEMPLATE: &str = r#"<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <style>
{stylesheet}
  </style>
</head>
<body>
<div class="document">
{body}
</div>
</body>
</html>"#;

static SLOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(title|stylesheet|body)\}").expect("static slot pattern"));

/// Settings for the Markdown to mail HTML path
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document title, written into the template's `{title}` slot
    pub title: String,
    /// Stylesheet text; [`DEFAULT_STYLESHEET`] when absent
    pub stylesheet: Option<String>,
    /// Template with `{title}`, `{stylesheet}` and `{body}` slots;
    /// [`DEFAULT_TEMPLATE`] when absent
    pub template: Option<String>,
    /// Background colour for even table rows
    pub row_background: String,
    /// Inline local images as data URIs
    pub embed_images: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "Document".to_string(),
            stylesheet: None,
            template: None,
            row_background: "#f3f3f3".to_string(),
            embed_images: true,
        }
    }
}

impl Config {
    /// Parse a TOML configuration; missing keys take their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn stylesheet(&self) -> &str {
        self.stylesheet.as_deref().unwrap_or(DEFAULT_STYLESHEET)
    }

    pub fn template(&self) -> &str {
        self.template.as_deref().unwrap_or(DEFAULT_TEMPLATE)
    }

    /// Fill the template's slots. Slots are substituted in a single pass, so
    /// slot names inside the body are left alone.
    pub fn compose(&self, body: &str) -> String {
        SLOT.replace_all(self.template(), |caps: &Captures| match &caps[1] {
            "title" => escape_html(&self.title),
            "stylesheet" => self.stylesheet().to_string(),
            _ => body.to_string(),
        })
        .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.stylesheet(), DEFAULT_STYLESHEET);
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml_str(
            r##"
title = "Weekly report"
row_background = "#eeeeee"
embed_images = false
stylesheet = "p { color: red }"
"##,
        )
        .unwrap();
        assert_eq!(config.title, "Weekly report");
        assert_eq!(config.row_background, "#eeeeee");
        assert!(!config.embed_images);
        assert_eq!(config.stylesheet(), "p { color: red }");
        assert_eq!(config.template(), DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::from_toml_str("title = ").is_err());
    }

    #[test]
    fn test_compose_fills_slots_once() {
        let config = Config {
            title: "A & B".to_string(),
            stylesheet: Some("p{}".to_string()),
            template: Some("<title>{title}</title><style>{stylesheet}</style>{body}".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.compose("<p>{title}</p>"),
            "<title>A &amp; B</title><style>p{}</style><p>{title}</p>"
        );
    }
}
