//! Hierarchical projection of the registered field keys.

use std::collections::BTreeMap;

/// One layer of the recursive field tree.
///
/// Only terminal segments carry the full key; intermediate table nodes
/// carry `None`. The tree is derived on demand from the key set and holds
/// no data of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTree {
    pub full_key: Option<String>,
    pub children: BTreeMap<String, FieldTree>,
}

impl FieldTree {
    /// Inserts a key into the tree rooted at this node, splitting on `/`
    /// and creating intermediate nodes lazily.
    pub fn insert_key(&mut self, key: &str) {
        let mut node = self;
        for segment in key.split('/') {
            if segment.is_empty() {
                continue;
            }
            node = node.children.entry(segment.to_string()).or_default();
        }
        node.full_key = Some(key.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_segments_carry_full_key() {
        let mut root = FieldTree::default();
        root.insert_key("/Drive/Velocity");
        root.insert_key("/Drive/Heading");

        let drive = &root.children["Drive"];
        assert_eq!(drive.full_key, None);
        assert_eq!(
            drive.children["Velocity"].full_key.as_deref(),
            Some("/Drive/Velocity")
        );
        assert_eq!(
            drive.children["Heading"].full_key.as_deref(),
            Some("/Drive/Heading")
        );
    }

    #[test]
    fn empty_segments_are_skipped() {
        let mut root = FieldTree::default();
        root.insert_key("//a//b");
        assert_eq!(
            root.children["a"].children["b"].full_key.as_deref(),
            Some("//a//b")
        );
    }

    #[test]
    fn parent_can_become_terminal() {
        let mut root = FieldTree::default();
        root.insert_key("/a/b");
        root.insert_key("/a");
        let a = &root.children["a"];
        assert_eq!(a.full_key.as_deref(), Some("/a"));
        assert!(a.children.contains_key("b"));
    }
}
