//! Table serialization for both dialects.

use crate::node::{Node, NodeRef};

/// Column alignment, taken from a header cell's `align` attribute
/// (or a `text-align` declaration in its inline style)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn of(cell: &Node) -> Self {
        let from_style = || {
            cell.attr("style")?
                .split(';')
                .filter_map(|decl| decl.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("text-align"))
                .map(|(_, value)| value)
        };
        let value = cell.attr("align").or_else(from_style).unwrap_or("");
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Alignment::Left,
            "center" => Alignment::Center,
            "right" => Alignment::Right,
            _ => Alignment::None,
        }
    }

    /// Border-row token for this column
    pub fn border(self) -> &'static str {
        match self {
            Alignment::None => "---",
            Alignment::Left => ":--",
            Alignment::Center => ":-:",
            Alignment::Right => "--:",
        }
    }
}

/// Number of columns a cell spans; at least 1
pub fn colspan(cell: &Node) -> usize {
    cell.attr("colspan")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

fn is_cell(node: &Node) -> bool {
    matches!(node.tag_name(), "th" | "td")
}

/// Rows of a table in document order, looking through row groups but not
/// into nested tables
pub fn rows(table: &Node) -> Vec<&Node> {
    let mut rows = Vec::new();
    for child in table.element_children() {
        match child.tag_name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => {
                rows.extend(child.element_children().filter(|n| n.tag_name() == "tr"))
            }
            _ => {}
        }
    }
    rows
}

/// The row a Markdown border follows: the first `thead` row, or the first
/// row of the table when there is no `thead`
pub fn header_row(table: &Node) -> Option<&Node> {
    table
        .element_children()
        .find(|n| n.tag_name() == "thead")
        .and_then(|thead| thead.element_children().find(|n| n.tag_name() == "tr"))
        .or_else(|| rows(table).into_iter().next())
}

/// Alignment per column of the header row, with spanned columns repeated
pub fn column_alignments(table: &Node) -> Vec<Alignment> {
    let Some(row) = header_row(table) else {
        return Vec::new();
    };
    row.element_children()
        .filter(|n| is_cell(n))
        .flat_map(|cell| std::iter::repeat(Alignment::of(cell)).take(colspan(cell)))
        .collect()
}

pub fn is_header_row(row: &NodeRef) -> bool {
    row.closest("table")
        .and_then(|table| header_row(table.node))
        .is_some_and(|header| std::ptr::eq(header, row.node))
}

/// Cell content on a single line
fn cell_text(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `| content |` for the first cell of a row, ` content |` after it; one
/// closing delimiter per spanned column
pub fn markdown_cell(node: &NodeRef, content: &str) -> String {
    let text = cell_text(content).replace('|', "\\|");
    let closing = "|".repeat(colspan(node.node));
    if node.element_index() == 0 {
        format!("| {} {}", text, closing)
    } else {
        format!(" {} {}", text, closing)
    }
}

/// `| --- | :-: |` for the given columns
pub fn markdown_border(alignments: &[Alignment]) -> String {
    let tokens: Vec<&str> = alignments.iter().map(|a| a.border()).collect();
    format!("| {} |", tokens.join(" | "))
}

pub fn markdown_row(node: &NodeRef, content: &str, alignments: &[Alignment]) -> String {
    let mut out = format!("\n{}", content.trim());
    if !alignments.is_empty() && is_header_row(node) {
        out.push('\n');
        out.push_str(&markdown_border(alignments));
    }
    out
}

/// `||content` for header cells, `|content` for data cells, followed by an
/// empty cell per extra spanned column
pub fn wiki_cell(node: &NodeRef, content: &str) -> String {
    let delimiter = if node.tag_name() == "th" { "||" } else { "|" };
    let mut out = format!("{}{}", delimiter, cell_text(content));
    for _ in 1..colspan(node.node) {
        out.push_str(delimiter);
    }
    out
}

/// Cells followed by `||` (row containing a header cell) or `|`
pub fn wiki_row(node: &NodeRef, content: &str) -> String {
    let closing = if node.node.has_descendant("th") { "||" } else { "|" };
    format!("{}{}\n", content.trim(), closing)
}
