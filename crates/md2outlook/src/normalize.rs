//! Rewrites applied to rendered HTML before the mail pipeline.

use md2outlook_markup::Node;

/// Border drawn at the left of a rewritten block quote
pub const QUOTE_BORDER: &str = "border-left: 4px solid #58abf9";

/// Replace every `<blockquote>` with a one-cell bordered table holding its
/// content. The mail client ignores `border-left` on block elements but
/// draws table cell borders.
pub fn rewrite_blockquotes(node: &mut Node) -> usize {
    let Some(children) = node.children_mut() else {
        return 0;
    };

    let mut rewritten = 0;
    for child in children.iter_mut() {
        rewritten += rewrite_blockquotes(child);
        if child.tag_name() == "blockquote" {
            let content = child.children_mut().map(std::mem::take).unwrap_or_default();
            *child = quote_table(content);
            rewritten += 1;
        }
    }
    rewritten
}

fn quote_table(content: Vec<Node>) -> Node {
    let mut cell = Node::element_with_attrs("td", vec![("class", "quote"), ("style", QUOTE_BORDER)]);
    for node in content {
        cell.add_child(node);
    }
    let mut row = Node::element("tr");
    row.add_child(cell);
    let mut body = Node::element("tbody");
    body.add_child(row);
    let mut table = Node::element_with_attrs(
        "table",
        vec![("class", "quote"), ("style", "border-collapse: collapse")],
    );
    table.add_child(body);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use md2outlook_markup::parse_html;

    #[test]
    fn test_blockquote_becomes_table() {
        let mut root = parse_html("<p>a</p><blockquote><p>quoted</p></blockquote>").unwrap();
        assert_eq!(rewrite_blockquotes(&mut root), 1);
        assert_eq!(
            root.inner_html(),
            "<p>a</p><table class=\"quote\" style=\"border-collapse: collapse\"><tbody><tr>\
             <td class=\"quote\" style=\"border-left: 4px solid #58abf9\"><p>quoted</p></td>\
             </tr></tbody></table>"
        );
    }

    #[test]
    fn test_nested_blockquotes() {
        let mut root =
            parse_html("<blockquote><blockquote><p>deep</p></blockquote></blockquote>").unwrap();
        assert_eq!(rewrite_blockquotes(&mut root), 2);
        assert!(root.find("blockquote").is_none());
        let inner = root.find("td").and_then(|td| td.find("td"));
        assert_eq!(inner.map(|td| td.text_content()), Some("deep".to_string()));
    }
}
