//! Rule system for tree-to-markup conversion.

mod commonmark;
mod list;
mod markdown;
mod rule;
pub(crate) mod table;
mod wiki;

pub use commonmark::{code_language, commonmark_rules};
pub use list::{list, list_item};
pub use markdown::markdown_rules;
pub use rule::{Filter, Rule};
pub use table::Alignment;
pub use wiki::wiki_rules;

use indexmap::IndexMap;

use crate::node::NodeRef;
use crate::options::RenderOptions;

/// Ordered collection of rules.
///
/// Lookup walks the rules from the most recently registered to the oldest and
/// returns the first match, so a later rule overrides an earlier one for the
/// same tag.
pub struct Rules {
    rules: IndexMap<String, Rule>,
}

impl Rules {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self {
            rules: IndexMap::new(),
        }
    }

    /// Register a rule under `key`. Re-registering a key replaces the old rule
    /// and moves it to the most recent position.
    pub fn add(&mut self, key: &str, rule: Rule) {
        self.rules.shift_remove(key);
        self.rules.insert(key.to_string(), rule);
    }

    /// Find the appropriate rule for a node
    pub fn for_node<'a>(&'a self, node: &NodeRef, options: &RenderOptions) -> Option<&'a Rule> {
        let tag = node.tag_name();
        self.rules
            .values()
            .rev()
            .find(|rule| rule.filter.matches(tag, node, options))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new()
    }
}
