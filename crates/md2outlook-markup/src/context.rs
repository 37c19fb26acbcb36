//! Mutable state scoped to a single conversion call.

use crate::node::NodeRef;
use crate::options::RenderOptions;
use crate::rules::table::{self, Alignment};

/// State carried down the recursion of one conversion.
///
/// Created at the start of [`Converter::convert`](crate::Converter::convert)
/// and dropped at the end; never shared between calls.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Options snapshot for this call
    pub options: RenderOptions,
    /// Marker of each enclosing list, outermost first
    list_markers: Vec<char>,
    /// Column alignments of each enclosing table, outermost first
    tables: Vec<Vec<Alignment>>,
    /// Set while inside a verbatim rule (code); suppresses escaping
    verbatim: bool,
    /// Link reference definitions collected for `LinkStyle::Referenced`
    references: Vec<String>,
}

/// What [`RenderContext::enter`] pushed, so [`RenderContext::exit`] can undo it
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope {
    list: bool,
    table: bool,
    verbatim: bool,
}

impl RenderContext {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            list_markers: Vec::new(),
            tables: Vec::new(),
            verbatim: false,
            references: Vec::new(),
        }
    }

    pub(crate) fn enter(&mut self, node: &NodeRef, verbatim: bool) -> Scope {
        let scope = Scope {
            list: matches!(node.tag_name(), "ul" | "ol"),
            table: node.tag_name() == "table",
            verbatim: self.verbatim,
        };
        if scope.list {
            let marker = if node.tag_name() == "ol" {
                self.options.ordered_list_marker
            } else {
                self.options.bullet_list_marker
            };
            self.list_markers.push(marker);
        }
        if scope.table {
            self.tables.push(table::column_alignments(node.node));
        }
        self.verbatim |= verbatim;
        scope
    }

    pub(crate) fn exit(&mut self, scope: Scope) {
        if scope.list {
            self.list_markers.pop();
        }
        if scope.table {
            self.tables.pop();
        }
        self.verbatim = scope.verbatim;
    }

    /// Number of enclosing lists
    pub fn list_depth(&self) -> usize {
        self.list_markers.len()
    }

    /// Markers of all enclosing lists, outermost first (e.g. `**` or `*#`)
    pub fn marker_run(&self) -> String {
        self.list_markers.iter().collect()
    }

    /// Alignments of the innermost enclosing table
    pub fn column_alignments(&self) -> &[Alignment] {
        self.tables.last().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_verbatim(&self) -> bool {
        self.verbatim
    }

    /// Record a link reference definition; returns its 1-based number
    pub fn add_reference(&mut self, definition: String) -> usize {
        self.references.push(definition);
        self.references.len()
    }

    pub fn references_len(&self) -> usize {
        self.references.len()
    }

    pub(crate) fn take_references(&mut self) -> Vec<String> {
        std::mem::take(&mut self.references)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    #[test]
    fn test_enter_exit_lists() {
        let mut ctx = RenderContext::new(RenderOptions::wiki());
        let ul = Node::element("ul");
        let ol = Node::element("ol");
        let ul_ref = NodeRef::new(&ul);
        let ol_ref = NodeRef::new(&ol);

        let outer = ctx.enter(&ul_ref, false);
        let inner = ctx.enter(&ol_ref, false);
        assert_eq!(ctx.list_depth(), 2);
        assert_eq!(ctx.marker_run(), "*#");

        ctx.exit(inner);
        assert_eq!(ctx.marker_run(), "*");
        ctx.exit(outer);
        assert_eq!(ctx.list_depth(), 0);
    }

    #[test]
    fn test_verbatim_is_restored() {
        let mut ctx = RenderContext::new(RenderOptions::markdown());
        let pre = Node::element("pre");
        let code = Node::element("code");

        let outer = ctx.enter(&NodeRef::new(&pre), true);
        let inner = ctx.enter(&NodeRef::new(&code), false);
        assert!(ctx.is_verbatim());
        ctx.exit(inner);
        assert!(ctx.is_verbatim());
        ctx.exit(outer);
        assert!(!ctx.is_verbatim());
    }
}
