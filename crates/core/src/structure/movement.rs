//! Structural moves: reorder among siblings, nest and promote.
//!
//! Every move returns `Ok(true)` when the tree changed and `Ok(false)` when
//! the move is not available for the line (the editor disables it in that
//! case). Sibling groups are renumbered after each change.

use reportree_shared::types::ReportLineId;

use super::error::StructureError;
use super::tree::ReportTree;

/// Which moves are currently available for a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveAvailability {
    /// The line has a preceding sibling.
    pub move_up: bool,
    /// The line has a following sibling.
    pub move_down: bool,
    /// The line can be nested under its preceding sibling.
    pub indent: bool,
    /// The line has a parent to be promoted out of.
    pub outdent: bool,
}

impl ReportTree {
    /// Reports which moves are available for a line.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn available_moves(&self, id: ReportLineId) -> Result<MoveAvailability, StructureError> {
        let line = self.line(id)?;
        let siblings = self.child_ids(line.parent_id).len();
        Ok(MoveAvailability {
            move_up: line.order > 0,
            move_down: line.order + 1 < siblings,
            indent: line.order > 0,
            outdent: line.parent_id.is_some(),
        })
    }

    /// Swaps a line with its preceding sibling.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn move_up(&mut self, id: ReportLineId) -> Result<bool, StructureError> {
        let line = self.line(id)?;
        if line.order == 0 {
            return Ok(false);
        }
        let previous = self.child_ids(line.parent_id)[line.order - 1];
        self.swap_orders(id, previous)?;
        Ok(true)
    }

    /// Swaps a line with its following sibling.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn move_down(&mut self, id: ReportLineId) -> Result<bool, StructureError> {
        let line = self.line(id)?;
        let Some(&next) = self.child_ids(line.parent_id).get(line.order + 1) else {
            return Ok(false);
        };
        self.swap_orders(id, next)?;
        Ok(true)
    }

    /// Nests a line as the last child of its preceding sibling.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn indent(&mut self, id: ReportLineId) -> Result<bool, StructureError> {
        let line = self.line(id)?;
        if line.order == 0 {
            return Ok(false);
        }
        let new_parent = self.child_ids(line.parent_id)[line.order - 1];
        let new_order = self.child_ids(Some(new_parent)).len();

        let line = self.line_mut(id)?;
        line.parent_id = Some(new_parent);
        line.order = new_order;
        self.normalize();
        Ok(true)
    }

    /// Promotes a line to its grandparent level, right after its old parent.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn outdent(&mut self, id: ReportLineId) -> Result<bool, StructureError> {
        let Some(parent_id) = self.line(id)?.parent_id else {
            return Ok(false);
        };
        let parent = self.line(parent_id)?;
        let grandparent = parent.parent_id;
        let parent_order = parent.order;

        let shifted: Vec<ReportLineId> = self.child_ids(grandparent)[parent_order + 1..].to_vec();
        for sibling in shifted {
            self.line_mut(sibling)?.order += 1;
        }

        let line = self.line_mut(id)?;
        line.parent_id = grandparent;
        line.order = parent_order + 1;
        self.normalize();
        Ok(true)
    }

    fn swap_orders(&mut self, a: ReportLineId, b: ReportLineId) -> Result<(), StructureError> {
        let order_a = self.line(a)?.order;
        let order_b = self.line(b)?.order;
        self.line_mut(a)?.order = order_b;
        self.line_mut(b)?.order = order_a;
        self.normalize();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportree_shared::types::ReportTemplateId;

    fn root_names(tree: &ReportTree) -> Vec<String> {
        tree.children(None)
            .into_iter()
            .map(|line| line.name.clone())
            .collect()
    }

    #[test]
    fn test_move_up_and_down() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let a = tree.add_root_line("A");
        let b = tree.add_root_line("B");
        let c = tree.add_root_line("C");

        assert!(tree.move_up(c).unwrap());
        assert_eq!(root_names(&tree), ["A", "C", "B"]);
        assert!(tree.move_down(a).unwrap());
        assert_eq!(root_names(&tree), ["C", "A", "B"]);

        assert!(!tree.move_down(b).unwrap());
        assert!(!tree.move_up(c).unwrap());
        assert_eq!(root_names(&tree), ["C", "A", "B"]);
        tree.check_integrity().unwrap();
    }

    #[test]
    fn test_indent_appends_to_previous_sibling() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let a = tree.add_root_line("A");
        tree.add_child_line(a, "A1").unwrap();
        let b = tree.add_root_line("B");
        let c = tree.add_root_line("C");

        assert!(tree.indent(b).unwrap());

        let line = tree.line(b).unwrap();
        assert_eq!(line.parent_id, Some(a));
        assert_eq!(line.order, 1);
        assert_eq!(tree.line(c).unwrap().order, 1);
        assert!(!tree.indent(a).unwrap());
        tree.check_integrity().unwrap();
    }

    #[test]
    fn test_outdent_inserts_after_old_parent() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let a = tree.add_root_line("A");
        let a1 = tree.add_child_line(a, "A1").unwrap();
        let a2 = tree.add_child_line(a, "A2").unwrap();
        tree.add_root_line("B");

        assert!(tree.outdent(a1).unwrap());

        assert_eq!(root_names(&tree), ["A", "A1", "B"]);
        assert_eq!(tree.line(a1).unwrap().parent_id, None);
        assert_eq!(tree.line(a2).unwrap().order, 0);
        assert!(!tree.outdent(a).unwrap());
        tree.check_integrity().unwrap();
    }

    #[test]
    fn test_outdent_nested_level() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let a = tree.add_root_line("A");
        let a1 = tree.add_child_line(a, "A1").unwrap();
        let a2 = tree.add_child_line(a, "A2").unwrap();
        let a11 = tree.add_child_line(a1, "A11").unwrap();

        assert!(tree.outdent(a11).unwrap());

        let ids = tree.child_ids(Some(a));
        assert_eq!(ids, [a1, a11, a2]);
        tree.check_integrity().unwrap();
    }

    #[test]
    fn test_available_moves() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let a = tree.add_root_line("A");
        let b = tree.add_root_line("B");
        let a1 = tree.add_child_line(a, "A1").unwrap();

        assert_eq!(
            tree.available_moves(a).unwrap(),
            MoveAvailability {
                move_up: false,
                move_down: true,
                indent: false,
                outdent: false,
            }
        );
        assert_eq!(
            tree.available_moves(b).unwrap(),
            MoveAvailability {
                move_up: true,
                move_down: false,
                indent: true,
                outdent: false,
            }
        );
        assert!(tree.available_moves(a1).unwrap().outdent);
    }

    #[test]
    fn test_moves_on_missing_line_fail() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let missing = ReportLineId::new();
        assert!(matches!(
            tree.move_up(missing),
            Err(StructureError::LineNotFound(_))
        ));
        assert!(matches!(
            tree.outdent(missing),
            Err(StructureError::LineNotFound(_))
        ));
    }
}
