//! Highlight adapter for fenced code blocks.
//!
//! A [`Highlighter`] turns raw code into a token-classified HTML fragment.
//! The classes use the `hl-` prefix, one class per scope atom, so a
//! `keyword.control.js` token becomes `<span class="hl-keyword hl-control hl-js">`.
//! [`inline_style`](crate::inline_style) maps those classes to inline styles.

use log::debug;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::Result;

/// Prefix of every class emitted by [`SyntectHighlighter`]
pub const CLASS_PREFIX: &str = "hl-";

/// Produces classified HTML for a code block.
///
/// `Ok(None)` means the language is not recognized; `Err` means the
/// highlighter failed on a language it does know. Callers degrade to
/// escaped raw text in both cases.
pub trait Highlighter {
    fn highlight(&self, language: &str, code: &str) -> Result<Option<String>>;
}

/// Highlighter backed by syntect's bundled syntax definitions.
///
/// Loading the syntax set is relatively expensive; build one and share it.
pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntectHighlighter {
    pub fn new() -> Self {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        debug!("Loaded {} syntaxes", syntax_set.syntaxes().len());
        Self { syntax_set }
    }

    /// Find syntax definition for a fence language tag.
    ///
    /// Tries the tag as a token, then common aliases by extension, then the
    /// syntax name case-insensitively.
    fn find_syntax(&self, language: &str) -> Option<&SyntaxReference> {
        if language.is_empty() {
            return None;
        }
        let lang_lower = language.to_lowercase();

        if let Some(syntax) = self.syntax_set.find_syntax_by_token(&lang_lower) {
            return Some(syntax);
        }

        let extension = match lang_lower.as_str() {
            "rust" => "rs",
            "python" => "py",
            "javascript" | "node" => "js",
            "typescript" => "ts",
            "cpp" | "c++" | "cxx" => "cpp",
            "csharp" | "c#" => "cs",
            "golang" => "go",
            "ruby" => "rb",
            "shell" | "bash" | "zsh" | "console" => "sh",
            "powershell" => "ps1",
            "yml" => "yaml",
            "markdown" => "md",
            "perl" => "pl",
            "haskell" => "hs",
            "dockerfile" | "docker" => "Dockerfile",
            "makefile" | "make" => "Makefile",
            "patch" => "diff",
            other => other,
        };
        if let Some(syntax) = self.syntax_set.find_syntax_by_extension(extension) {
            return Some(syntax);
        }

        self.syntax_set
            .syntaxes()
            .iter()
            .find(|syntax| syntax.name.to_lowercase() == lang_lower)
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, language: &str, code: &str) -> Result<Option<String>> {
        let Some(syntax) = self.find_syntax(language) else {
            debug!("No syntax found for language: {}", language);
            return Ok(None);
        };

        let mut generator = ClassedHTMLGenerator::new_with_class_style(
            syntax,
            &self.syntax_set,
            ClassStyle::SpacedPrefixed {
                prefix: CLASS_PREFIX,
            },
        );
        for line in LinesWithEndings::from(code) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }
        Ok(Some(generator.finalize()))
    }
}

/// Highlighter that recognizes nothing; every block renders as escaped text
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, _language: &str, _code: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_language_is_classified() {
        let highlighter = SyntectHighlighter::new();
        let html = highlighter.highlight("rust", "fn main() {}\n").unwrap().unwrap();
        assert!(html.contains("class=\"hl-"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_aliases_resolve() {
        let highlighter = SyntectHighlighter::new();
        for language in ["js", "javascript", "py", "python", "bash", "JSON"] {
            assert!(
                highlighter.find_syntax(language).is_some(),
                "no syntax for {language}"
            );
        }
    }

    #[test]
    fn test_unknown_language() {
        let highlighter = SyntectHighlighter::new();
        assert!(highlighter.highlight("no-such-lang", "x").unwrap().is_none());
        assert!(highlighter.highlight("", "x").unwrap().is_none());
    }

    #[test]
    fn test_plain_highlighter() {
        assert!(PlainHighlighter.highlight("rust", "fn f() {}").unwrap().is_none());
    }
}
