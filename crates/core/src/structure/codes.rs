//! Hierarchical display codes ("1", "1.2", "1.2.3").
//!
//! Codes are never stored; they are derived from the current tree shape
//! whenever the structure is rendered.

use std::collections::HashMap;

use reportree_shared::types::ReportLineId;

use super::tree::ReportTree;

/// Display code of every line, keyed by line id.
pub type LineCodes = HashMap<ReportLineId, String>;

/// Derives display codes with a pre-order walk from the root level.
///
/// Root lines get `"1"`, `"2"`, ...; a child gets its parent's code followed
/// by `.` and its 1-based position among its siblings.
#[must_use]
pub fn derive_codes(tree: &ReportTree) -> LineCodes {
    let mut codes = LineCodes::with_capacity(tree.len());
    assign(tree, None, None, &mut codes);
    codes
}

fn assign(
    tree: &ReportTree,
    parent: Option<ReportLineId>,
    prefix: Option<&str>,
    codes: &mut LineCodes,
) {
    for (index, &child) in tree.child_ids(parent).iter().enumerate() {
        let position = index + 1;
        let code = match prefix {
            Some(prefix) => format!("{prefix}.{position}"),
            None => position.to_string(),
        };
        assign(tree, Some(child), Some(&code), codes);
        codes.insert(child, code);
    }
}

impl ReportTree {
    /// Derives the display codes of the current tree.
    #[must_use]
    pub fn codes(&self) -> LineCodes {
        derive_codes(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportree_shared::types::ReportTemplateId;

    #[test]
    fn test_codes_follow_tree_shape() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let a = tree.add_root_line("A");
        let b = tree.add_root_line("B");
        let a1 = tree.add_child_line(a, "A1").unwrap();
        let a2 = tree.add_child_line(a, "A2").unwrap();
        let a21 = tree.add_child_line(a2, "A21").unwrap();

        let codes = derive_codes(&tree);

        assert_eq!(codes.len(), 5);
        assert_eq!(codes[&a], "1");
        assert_eq!(codes[&b], "2");
        assert_eq!(codes[&a1], "1.1");
        assert_eq!(codes[&a2], "1.2");
        assert_eq!(codes[&a21], "1.2.1");
    }

    #[test]
    fn test_codes_recomputed_after_move() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let a = tree.add_root_line("A");
        let b = tree.add_root_line("B");

        tree.move_down(a).unwrap();
        let codes = tree.codes();

        assert_eq!(codes[&b], "1");
        assert_eq!(codes[&a], "2");
    }

    #[test]
    fn test_empty_tree_has_no_codes() {
        let tree = ReportTree::new(ReportTemplateId::new());
        assert!(derive_codes(&tree).is_empty());
    }
}
