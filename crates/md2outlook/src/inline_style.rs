//! Rewrites class-based highlight markup into explicit inline styles.
//!
//! The mail client drops `<style>` blocks and renders `white-space: pre`
//! unreliably, so a highlighted fragment is made self-describing in two
//! phases: class selectors from a [`StyleRule`] table become `style`
//! attributes, then indentation and line breaks in text become `&nbsp;` runs
//! and `<br>` elements.

use log::warn;
use md2outlook_markup::{parse_html, Element, Node};

/// Declarations appended to every element matched by any of the selectors.
///
/// A selector is a compound class selector (`.hl-entity.hl-name`) optionally
/// preceded by ancestor compounds (`.hl-meta .hl-string`).
#[derive(Debug, Clone, Copy)]
pub struct StyleRule<'a> {
    pub selectors: &'a [&'a str],
    pub style: &'a str,
}

/// GitHub light colours keyed to syntect scope classes
pub const GITHUB_LIGHT: &[StyleRule<'static>] = &[
    StyleRule {
        selectors: &[".hl-keyword", ".hl-storage", ".hl-variable.hl-language"],
        style: "color: #d73a49",
    },
    StyleRule {
        selectors: &[
            ".hl-entity.hl-name.hl-function",
            ".hl-entity.hl-name.hl-class",
            ".hl-entity.hl-name.hl-type",
            ".hl-entity.hl-other.hl-inherited-class",
            ".hl-support.hl-type",
        ],
        style: "color: #6f42c1",
    },
    StyleRule {
        selectors: &[
            ".hl-constant",
            ".hl-entity.hl-other.hl-attribute-name",
            ".hl-support.hl-constant",
            ".hl-variable.hl-other.hl-constant",
            ".hl-meta.hl-property-name",
        ],
        style: "color: #005cc5",
    },
    StyleRule {
        selectors: &[".hl-string", ".hl-meta .hl-string"],
        style: "color: #032f62",
    },
    StyleRule {
        selectors: &[".hl-support.hl-function", ".hl-variable.hl-function"],
        style: "color: #e36209",
    },
    StyleRule {
        selectors: &[".hl-comment"],
        style: "color: #6a737d",
    },
    StyleRule {
        selectors: &[".hl-entity.hl-name.hl-tag", ".hl-markup.hl-quote"],
        style: "color: #22863a",
    },
    StyleRule {
        selectors: &[".hl-markup.hl-heading"],
        style: "color: #005cc5; font-weight: 700",
    },
    StyleRule {
        selectors: &[".hl-markup.hl-bold"],
        style: "font-weight: 700",
    },
    StyleRule {
        selectors: &[".hl-markup.hl-italic"],
        style: "font-style: italic",
    },
    StyleRule {
        selectors: &[".hl-markup.hl-inserted"],
        style: "color: #22863a; background-color: #f0fff4",
    },
    StyleRule {
        selectors: &[".hl-markup.hl-deleted"],
        style: "color: #b31d28; background-color: #ffeef0",
    },
];

/// Spaces a tab expands to before indentation is made non-breaking
const TAB_WIDTH: usize = 4;

/// Apply [`GITHUB_LIGHT`] and rewrite whitespace. Returns the input unchanged
/// if it cannot be parsed.
pub fn inline_highlight_styles(fragment: &str) -> String {
    rewrite_fragment(fragment, |root| {
        apply_rules(root, GITHUB_LIGHT);
        rewrite_whitespace(root);
    })
}

/// Apply [`GITHUB_LIGHT`] only, leaving whitespace alone
pub fn apply_style_rules(fragment: &str) -> String {
    rewrite_fragment(fragment, |root| apply_rules(root, GITHUB_LIGHT))
}

fn rewrite_fragment<F>(fragment: &str, rewrite: F) -> String
where
    F: FnOnce(&mut Node),
{
    match parse_html(fragment) {
        Ok(mut root) => {
            rewrite(&mut root);
            root.inner_html()
        }
        Err(e) => {
            warn!("Could not parse highlighted fragment, leaving it as is: {}", e);
            fragment.to_string()
        }
    }
}

/// Append the declarations of every matching rule, in table order
pub fn apply_rules(root: &mut Node, rules: &[StyleRule]) {
    let mut ancestors = Vec::new();
    apply_rules_below(root, rules, &mut ancestors);
}

fn apply_rules_below(node: &mut Node, rules: &[StyleRule], ancestors: &mut Vec<Vec<String>>) {
    let Some(children) = node.children_mut() else {
        return;
    };
    for child in children.iter_mut() {
        let Some(element) = child.as_element_mut() else {
            continue;
        };
        let classes: Vec<String> = element.classes().map(str::to_string).collect();
        for rule in rules {
            if rule
                .selectors
                .iter()
                .any(|selector| selector_matches(selector, &classes, ancestors))
            {
                append_style(element, rule.style);
            }
        }
        ancestors.push(classes);
        apply_rules_below(child, rules, ancestors);
        ancestors.pop();
    }
}

fn append_style(element: &mut Element, style: &str) {
    let merged = match element.attr("style") {
        Some(existing) if !existing.trim().is_empty() => {
            let existing = existing.trim_end();
            if existing.ends_with(';') {
                format!("{} {}", existing, style)
            } else {
                format!("{}; {}", existing, style)
            }
        }
        _ => style.to_string(),
    };
    element.set_attr("style", &merged);
}

fn compound_matches(compound: &str, classes: &[String]) -> bool {
    let mut required = compound.split('.').filter(|c| !c.is_empty()).peekable();
    required.peek().is_some() && required.all(|class| classes.iter().any(|c| c == class))
}

/// Match a descendant selector against an element's classes and the classes
/// of its ancestors, outermost first
fn selector_matches(selector: &str, classes: &[String], ancestors: &[Vec<String>]) -> bool {
    let mut compounds = selector.split_whitespace().rev();
    let Some(last) = compounds.next() else {
        return false;
    };
    if !compound_matches(last, classes) {
        return false;
    }

    let mut remaining = ancestors.iter().rev();
    compounds.all(|compound| remaining.any(|classes| compound_matches(compound, classes)))
}

/// Turn newlines into `<br>` and leading whitespace into non-breaking spaces
pub fn rewrite_whitespace(node: &mut Node) {
    if matches!(node.tag_name(), "script" | "style") {
        return;
    }
    let Some(children) = node.children_mut() else {
        return;
    };

    let mut rewritten = Vec::with_capacity(children.len());
    for mut child in std::mem::take(children) {
        if let Node::Text(text) = &child {
            if needs_rewrite(text) {
                rewritten.extend(split_lines(text));
                continue;
            }
        }
        rewrite_whitespace(&mut child);
        rewritten.push(child);
    }
    *children = rewritten;
}

fn needs_rewrite(text: &str) -> bool {
    text.contains('\n') || text.starts_with([' ', '\t'])
}

fn split_lines(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            nodes.push(Node::element("br"));
        }
        let rest = line.trim_start_matches([' ', '\t']);
        let indent: usize = line[..line.len() - rest.len()]
            .chars()
            .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
            .sum();

        let mut content = "\u{a0}".repeat(indent);
        content.push_str(rest);
        if !content.is_empty() {
            nodes.push(Node::text(&content));
        }
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_append_to_existing_style() {
        let html = r#"<span class="hl-keyword" style="font-weight: bold">fn</span>"#;
        assert_eq!(
            apply_style_rules(html),
            r#"<span class="hl-keyword" style="font-weight: bold; color: #d73a49">fn</span>"#
        );
    }

    #[test]
    fn test_compound_and_descendant_selectors() {
        let html = concat!(
            r#"<span class="hl-meta"><span class="hl-string hl-quoted">"a"</span></span>"#,
            r#"<span class="hl-entity hl-name hl-function">f</span>"#,
            r#"<span class="hl-entity">e</span>"#
        );
        let out = apply_style_rules(html);
        assert!(out.contains(r#"<span class="hl-string hl-quoted" style="color: #032f62">"#));
        assert!(out.contains(r#"<span class="hl-entity hl-name hl-function" style="color: #6f42c1">"#));
        assert!(out.contains(r#"<span class="hl-entity">e</span>"#));
    }

    #[test]
    fn test_all_matching_rules_concatenate_in_table_order() {
        let rules = [
            StyleRule { selectors: &[".a"], style: "color: red" },
            StyleRule { selectors: &[".b"], style: "font-style: italic" },
        ];
        let mut root = parse_html(r#"<i class="b a">x</i>"#).unwrap();
        apply_rules(&mut root, &rules);
        assert_eq!(
            root.inner_html(),
            r#"<i class="b a" style="color: red; font-style: italic">x</i>"#
        );
    }

    #[test]
    fn test_whitespace_rewrite() {
        let out = inline_highlight_styles("if x:\n    y()\n\tz");
        assert_eq!(
            out,
            "if x:<br>&nbsp;&nbsp;&nbsp;&nbsp;y()<br>&nbsp;&nbsp;&nbsp;&nbsp;z"
        );
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(inline_highlight_styles("<b>a b</b>, c"), "<b>a b</b>, c");
    }

    #[test]
    fn test_whitespace_inside_spans() {
        let out = inline_highlight_styles("<span>a\n  b</span>");
        assert_eq!(out, "<span>a<br>&nbsp;&nbsp;b</span>");
    }
}
