//! List serialization.
//!
//! Two layouts are supported. `MarkerRun`, the default for both dialects,
//! writes every item on its own line prefixed by the markers of all enclosing
//! lists, outermost first, so an item two bullets deep reads `** item`. The
//! marker run comes from the list stack in [`RenderContext`], not from
//! rewriting child output. `Indented` nests lists by indenting them under the
//! parent item's content, CommonMark style.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::RenderContext;
use crate::node::NodeRef;
use crate::options::ListStyle;

/// What follows the enclosing run on a line emitted by a nested list
static DEEPER_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[*#]+\s").expect("static marker pattern"));

/// Render a `ul` or `ol` from its items' output
pub fn list(node: &NodeRef, content: &str, ctx: &mut RenderContext) -> String {
    match ctx.options.list_style {
        ListStyle::Indented => {
            let content = content.trim();
            if node.parent_tag() == Some("li") {
                // Nested lists don't get surrounding blank lines
                format!("\n{}", content)
            } else {
                format!("\n\n{}\n\n", content)
            }
        }
        ListStyle::MarkerRun => {
            let content = content.trim_matches('\n');
            if ctx.list_depth() > 0 {
                format!("\n{}\n", content)
            } else {
                format!("\n\n{}\n\n", content)
            }
        }
    }
}

/// Render an `li` from its content
pub fn list_item(node: &NodeRef, content: &str, ctx: &mut RenderContext) -> String {
    match ctx.options.list_style {
        ListStyle::Indented => indented_item(node, content, ctx),
        ListStyle::MarkerRun => marker_run_item(content, ctx),
    }
}

fn indented_item(node: &NodeRef, content: &str, ctx: &RenderContext) -> String {
    let prefix = match node.parent() {
        Some(parent) if parent.tag_name() == "ol" => {
            let start = parent
                .attr("start")
                .and_then(|s| s.trim().parse::<usize>().ok())
                .unwrap_or(1);
            format!("{}. ", start + node.element_index())
        }
        _ => format!("{} ", ctx.options.bullet_list_marker),
    };
    let indent = " ".repeat(prefix.len());

    let content = content.trim().replace("\n\n\n", "\n\n");
    let mut out = prefix;
    for (i, line) in content.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&indent);
            }
        }
        out.push_str(line);
    }
    out.push('\n');
    out
}

/// Lines of a nested list start with this item's run plus at least one more
/// marker; item text that merely begins with `#` or `*` does not.
fn is_nested_line(line: &str, marker: &str) -> bool {
    line.strip_prefix(marker)
        .is_some_and(|rest| DEEPER_RUN.is_match(rest))
}

fn marker_run_item(content: &str, ctx: &RenderContext) -> String {
    let marker = ctx.marker_run();
    let mut out = String::new();
    for line in content.lines().filter(|line| !line.trim().is_empty()) {
        if is_nested_line(line, &marker) {
            out.push_str(line);
        } else {
            out.push_str(&marker);
            out.push(' ');
            out.push_str(line.trim_start());
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_line_needs_deeper_run() {
        assert!(is_nested_line("** two", "*"));
        assert!(is_nested_line("#* b", "#"));
        assert!(!is_nested_line("# of users", "*"));
        assert!(!is_nested_line("# of users", "#"));
        assert!(!is_nested_line("* same depth", "*"));
    }
}
