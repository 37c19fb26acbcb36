//! Minimal stylesheet parser and CSS inliner.
//!
//! Only what the mail pipeline needs: flat rule lists, selector specificity,
//! and property-level merging into `style` attributes. At-rules (including
//! media queries) are skipped; selectors with pseudo-classes or
//! pseudo-elements are skipped too, since the pipeline emulates the one it
//! relies on.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use md2outlook_markup::convert_document;

use crate::{Error, Result};

static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("static comment pattern"));

/// One selector with its declarations; grouped selectors are split apart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssRule {
    pub selector: String,
    pub declarations: Vec<(String, String)>,
}

/// Parse a stylesheet into rules in source order
pub fn parse_stylesheet(css: &str) -> Result<Vec<CssRule>> {
    let css = COMMENT.replace_all(css, "");
    let mut rules = Vec::new();
    let mut rest = css.as_ref();

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        let Some(end) = rest.find(['{', ';', '}']) else {
            return Err(Error::Stylesheet(format!(
                "unterminated rule: {}",
                rest.trim()
            )));
        };
        let prelude = rest[..end].trim();

        match rest.as_bytes()[end] {
            b'}' => return Err(Error::Stylesheet("unbalanced '}'".to_string())),
            // `@import ...;` and friends
            b';' => {
                if !prelude.starts_with('@') {
                    debug!("Skipping stray statement: {}", prelude);
                }
                rest = &rest[end + 1..];
            }
            _ => {
                let close = matching_brace(rest, end)?;
                let body = &rest[end + 1..close];
                if prelude.starts_with('@') {
                    debug!("Skipping at-rule: {}", prelude);
                } else {
                    let declarations = parse_declarations(body);
                    for selector in prelude.split(',') {
                        let selector = selector.split_whitespace().collect::<Vec<_>>().join(" ");
                        if !selector.is_empty() {
                            rules.push(CssRule {
                                selector,
                                declarations: declarations.clone(),
                            });
                        }
                    }
                }
                rest = &rest[close + 1..];
            }
        }
    }

    Ok(rules)
}

/// Byte index of the `}` closing the `{` at `open`
fn matching_brace(text: &str, open: usize) -> Result<usize> {
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + i);
                }
            }
            _ => {}
        }
    }
    Err(Error::Stylesheet("unbalanced '{'".to_string()))
}

/// Split a declaration block into `(property, value)` pairs. Semicolons
/// inside parentheses or quotes do not end a declaration.
pub fn parse_declarations(block: &str) -> Vec<(String, String)> {
    let mut declarations = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    let mut push = |text: &str| {
        if let Some((name, value)) = text.split_once(':') {
            let (name, value) = (name.trim(), value.trim());
            if !name.is_empty() && !value.is_empty() {
                declarations.push((name.to_ascii_lowercase(), value.to_string()));
            }
        }
    };

    for c in block.chars() {
        match (c, quote) {
            (q, Some(open)) if q == open => quote = None,
            (_, Some(_)) => {}
            ('"' | '\'', None) => quote = Some(c),
            ('(', None) => depth += 1,
            (')', None) => depth = depth.saturating_sub(1),
            (';', None) if depth == 0 => {
                push(&current);
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    push(&current);

    declarations
}

/// `(ids, classes + attributes + pseudo-classes, types + pseudo-elements)`
pub fn specificity(selector: &str) -> (u32, u32, u32) {
    let mut spec = (0, 0, 0);
    for part in selector.split(|c: char| c.is_whitespace() || matches!(c, '>' | '+' | '~')) {
        let mut chars = part.chars().peekable();
        let mut at_start = true;
        while let Some(c) = chars.next() {
            match c {
                '#' => spec.0 += 1,
                '.' | '[' => spec.1 += 1,
                ':' => {
                    if chars.peek() == Some(&':') {
                        chars.next();
                        spec.2 += 1;
                    } else {
                        spec.1 += 1;
                    }
                }
                c if at_start && c.is_ascii_alphabetic() => spec.2 += 1,
                _ => {}
            }
            at_start = false;
        }
    }
    spec
}

/// Merge declarations into an inline style string; later values win per
/// property, first appearance fixes the position
pub fn merge_declarations(existing: &str, added: &[(String, String)]) -> String {
    let mut merged: IndexMap<String, String> = parse_declarations(existing).into_iter().collect();
    for (name, value) in added {
        merged.insert(name.clone(), value.clone());
    }
    merged
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Move every `<style>` rule onto the elements it matches and drop the
/// `<style>` elements. Declarations already inline win over stylesheet ones.
pub fn inline_css(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let style_selector =
        Selector::parse("style").map_err(|e| Error::Stylesheet(format!("{:?}", e)))?;

    let mut rules = Vec::new();
    for style in document.select(&style_selector) {
        rules.extend(parse_stylesheet(&style.text().collect::<String>())?);
    }

    let mut matched = HashMap::new();
    for (order, rule) in rules.iter().enumerate() {
        if rule.selector.contains(':') {
            debug!("Skipping pseudo selector: {}", rule.selector);
            continue;
        }
        let Ok(selector) = Selector::parse(&rule.selector) else {
            debug!("Skipping unsupported selector: {}", rule.selector);
            continue;
        };
        let spec = specificity(&rule.selector);
        for element in document.select(&selector) {
            matched
                .entry(element.id())
                .or_insert_with(Vec::new)
                .push((spec, order, &rule.declarations));
        }
    }
    debug!("Inlining {} rules onto {} elements", rules.len(), matched.len());

    let mut root = convert_document(&document, |element, node| {
        let Some(hits) = matched.get_mut(&element.id()) else {
            return;
        };
        hits.sort_by_key(|(spec, order, _)| (*spec, *order));
        let mut style = String::new();
        for (_, _, declarations) in hits.iter() {
            style = merge_declarations(&style, declarations);
        }
        if let Some(inline) = node.attr("style") {
            style = merge_declarations(&style, &parse_declarations(inline));
        }
        node.set_attr("style", &style);
    })?;

    root.remove_elements(&|element| element.tag == "style");
    Ok(root.outer_html())
}
