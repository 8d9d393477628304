//! In-memory report line tree.
//!
//! `ReportTree` is the single source of truth of an editing session. Lines are
//! kept in insertion order; a `parent -> ordered children` index is rebuilt
//! after every structural change together with the sibling renumbering.

use std::collections::{HashMap, HashSet};

use reportree_shared::types::{AccountId, ReportLineId, ReportTemplateId};

use super::catalog::Account;
use super::error::StructureError;
use super::types::{LineContent, LineType, ReportLine, Sign};

/// Working set of report lines with a cached sibling index.
#[derive(Debug, Clone)]
pub struct ReportTree {
    report_id: ReportTemplateId,
    lines: Vec<ReportLine>,
    positions: HashMap<ReportLineId, usize>,
    children: HashMap<Option<ReportLineId>, Vec<ReportLineId>>,
}

impl ReportTree {
    /// Creates an empty tree for a report.
    #[must_use]
    pub fn new(report_id: ReportTemplateId) -> Self {
        Self {
            report_id,
            lines: Vec::new(),
            positions: HashMap::new(),
            children: HashMap::new(),
        }
    }

    /// Builds a tree from a snapshot of lines.
    ///
    /// Lines are sorted by their stored `order` and renumbered, so gaps in a
    /// snapshot are closed on load. Only the first flagged total keeps the
    /// vertical analysis base flag.
    ///
    /// # Errors
    ///
    /// Returns an error if ids repeat, a line belongs to another report, a
    /// parent is missing, or the parent links contain a cycle.
    pub fn load(
        report_id: ReportTemplateId,
        mut lines: Vec<ReportLine>,
    ) -> Result<Self, StructureError> {
        let mut ids = HashSet::with_capacity(lines.len());
        for line in &lines {
            if line.report_id != report_id {
                return Err(StructureError::ForeignLine {
                    line_id: line.id,
                    expected: report_id,
                    found: line.report_id,
                });
            }
            if !ids.insert(line.id) {
                return Err(StructureError::DuplicateLineId(line.id));
            }
        }
        for line in &lines {
            if let Some(parent_id) = line.parent_id
                && !ids.contains(&parent_id)
            {
                return Err(StructureError::UnknownParent {
                    line_id: line.id,
                    parent_id,
                });
            }
        }

        lines.sort_by_key(|line| line.order);
        let mut tree = Self {
            report_id,
            lines,
            positions: HashMap::new(),
            children: HashMap::new(),
        };
        tree.ensure_acyclic()?;
        tree.normalize();
        tree.normalize_vertical_analysis_base();
        Ok(tree)
    }

    /// Keeps the flag on the first flagged total in tree order only.
    fn normalize_vertical_analysis_base(&mut self) {
        let base = self
            .lines_in_tree_order()
            .into_iter()
            .find(|line| {
                line.style.is_vertical_analysis_base && line.line_type() == LineType::Total
            })
            .map(|line| line.id);
        for line in &mut self.lines {
            line.style.is_vertical_analysis_base = Some(line.id) == base;
        }
    }

    /// Returns the report this tree belongs to.
    #[must_use]
    pub const fn report_id(&self) -> ReportTemplateId {
        self.report_id
    }

    /// Returns the number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the tree has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns all lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    /// Looks up a line.
    #[must_use]
    pub fn get(&self, id: ReportLineId) -> Option<&ReportLine> {
        self.positions.get(&id).map(|&pos| &self.lines[pos])
    }

    /// Looks up a line, failing if it is missing.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn line(&self, id: ReportLineId) -> Result<&ReportLine, StructureError> {
        self.get(id).ok_or(StructureError::LineNotFound(id))
    }

    pub(crate) fn line_mut(&mut self, id: ReportLineId) -> Result<&mut ReportLine, StructureError> {
        let pos = *self
            .positions
            .get(&id)
            .ok_or(StructureError::LineNotFound(id))?;
        Ok(&mut self.lines[pos])
    }

    /// Returns the ordered child ids of a parent (`None` for root level).
    #[must_use]
    pub fn child_ids(&self, parent: Option<ReportLineId>) -> &[ReportLineId] {
        self.children
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the ordered children of a parent (`None` for root level).
    #[must_use]
    pub fn children(&self, parent: Option<ReportLineId>) -> Vec<&ReportLine> {
        self.child_ids(parent)
            .iter()
            .filter_map(|id| self.get(*id))
            .collect()
    }

    /// Returns true if the line has at least one child.
    #[must_use]
    pub fn has_children(&self, id: ReportLineId) -> bool {
        !self.child_ids(Some(id)).is_empty()
    }

    /// Returns the line id followed by all of its descendants, depth-first.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn descendant_ids(&self, id: ReportLineId) -> Result<Vec<ReportLineId>, StructureError> {
        self.line(id)?;
        let mut ids = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            ids.push(current);
            stack.extend(self.child_ids(Some(current)).iter().rev().copied());
        }
        Ok(ids)
    }

    /// Returns clones of all lines in depth-first display order.
    #[must_use]
    pub fn lines_in_tree_order(&self) -> Vec<ReportLine> {
        let mut ordered = Vec::with_capacity(self.lines.len());
        let mut stack: Vec<ReportLineId> = self.child_ids(None).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if let Some(line) = self.get(current) {
                ordered.push(line.clone());
            }
            stack.extend(self.child_ids(Some(current)).iter().rev().copied());
        }
        ordered
    }

    /// Appends a new data bucket line at the end of the root level.
    pub fn add_root_line(&mut self, name: impl Into<String>) -> ReportLineId {
        let order = self.child_ids(None).len();
        let line = ReportLine::new(self.report_id, None, name, order);
        let id = line.id;
        self.lines.push(line);
        self.normalize();
        id
    }

    /// Appends a new data bucket line at the end of a parent's children.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the parent is not in the tree.
    pub fn add_child_line(
        &mut self,
        parent_id: ReportLineId,
        name: impl Into<String>,
    ) -> Result<ReportLineId, StructureError> {
        self.line(parent_id)?;
        let order = self.child_ids(Some(parent_id)).len();
        let line = ReportLine::new(self.report_id, Some(parent_id), name, order);
        let id = line.id;
        self.lines.push(line);
        self.normalize();
        Ok(id)
    }

    /// Removes a line together with its whole subtree.
    ///
    /// Formula references pointing at any removed line are dropped from the
    /// remaining formula lines. Returns the removed lines.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn remove_subtree(&mut self, id: ReportLineId) -> Result<Vec<ReportLine>, StructureError> {
        let doomed: HashSet<ReportLineId> = self.descendant_ids(id)?.into_iter().collect();

        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.lines)
            .into_iter()
            .partition(|line| doomed.contains(&line.id));
        self.lines = kept;

        self.strip_references(&doomed);
        self.normalize();
        Ok(removed)
    }

    /// Drops every formula reference pointing at one of `targets`.
    fn strip_references(&mut self, targets: &HashSet<ReportLineId>) {
        for line in &mut self.lines {
            if let LineContent::Formula { references } = &mut line.content {
                references.retain(|reference| !targets.contains(&reference.target));
            }
        }
    }

    /// Renames a line.
    ///
    /// # Errors
    ///
    /// Returns `NameLockedByAccount` for a data bucket bound to an account.
    pub fn rename(&mut self, id: ReportLineId, name: impl Into<String>) -> Result<(), StructureError> {
        let line = self.line_mut(id)?;
        if line.account_id().is_some() {
            return Err(StructureError::NameLockedByAccount(id));
        }
        line.name = name.into();
        Ok(())
    }

    /// Sets the contribution sign of a line.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn set_sign(&mut self, id: ReportLineId, sign: Sign) -> Result<(), StructureError> {
        self.line_mut(id)?.sign = sign;
        Ok(())
    }

    /// Changes the type of a line, resetting its type-specific payload.
    ///
    /// Returns `false` when the line already had that type. When the new type
    /// cannot be referenced by formulas, references to the line are dropped.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn set_line_type(
        &mut self,
        id: ReportLineId,
        line_type: LineType,
    ) -> Result<bool, StructureError> {
        let line = self.line_mut(id)?;
        if line.line_type() == line_type {
            return Ok(false);
        }
        line.content = LineContent::empty(line_type);
        if line_type != LineType::Total {
            line.style.is_vertical_analysis_base = false;
        }
        if !line_type.is_formula_target() {
            self.strip_references(&HashSet::from([id]));
        }
        Ok(true)
    }

    /// Toggles bold rendering of a line.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn set_bold(&mut self, id: ReportLineId, bold: bool) -> Result<(), StructureError> {
        self.line_mut(id)?.style.bold = bold;
        Ok(())
    }

    /// Sets or clears the vertical analysis base flag.
    ///
    /// Setting the flag clears it from every other line.
    ///
    /// # Errors
    ///
    /// Returns `WrongLineType` when setting the flag on a non-total line.
    pub fn set_vertical_analysis_base(
        &mut self,
        id: ReportLineId,
        enabled: bool,
    ) -> Result<(), StructureError> {
        let line = self.line(id)?;
        if enabled && line.line_type() != LineType::Total {
            return Err(StructureError::WrongLineType {
                line_id: id,
                expected: LineType::Total,
                actual: line.line_type(),
            });
        }

        if enabled {
            for other in &mut self.lines {
                other.style.is_vertical_analysis_base = other.id == id;
            }
        } else {
            self.line_mut(id)?.style.is_vertical_analysis_base = false;
        }
        Ok(())
    }

    /// Returns the line flagged as vertical analysis base, if any.
    #[must_use]
    pub fn vertical_analysis_base(&self) -> Option<&ReportLine> {
        self.lines
            .iter()
            .find(|line| line.style.is_vertical_analysis_base)
    }

    /// Returns the line bound to an account, if any.
    #[must_use]
    pub fn line_bound_to(&self, account_id: AccountId) -> Option<&ReportLine> {
        self.lines
            .iter()
            .find(|line| line.account_id() == Some(account_id))
    }

    /// Binds a data bucket line to an account; the line takes the account name.
    ///
    /// # Errors
    ///
    /// Returns `AccountAlreadyBound` if another line holds the account, or
    /// `WrongLineType` if the line is not a data bucket. The tree is left
    /// unchanged on error.
    pub fn bind_account(&mut self, id: ReportLineId, account: &Account) -> Result<(), StructureError> {
        let line = self.line(id)?;
        if line.line_type() != LineType::DataBucket {
            return Err(StructureError::WrongLineType {
                line_id: id,
                expected: LineType::DataBucket,
                actual: line.line_type(),
            });
        }
        if let Some(holder) = self.line_bound_to(account.id)
            && holder.id != id
        {
            return Err(StructureError::AccountAlreadyBound {
                account_id: account.id,
                account_name: account.name.clone(),
                bound_to: holder.id,
            });
        }

        let line = self.line_mut(id)?;
        line.content = LineContent::DataBucket {
            account_id: Some(account.id),
        };
        line.name.clone_from(&account.name);
        Ok(())
    }

    /// Removes the account binding of a data bucket line.
    ///
    /// # Errors
    ///
    /// Returns `WrongLineType` if the line is not a data bucket.
    pub fn unbind_account(&mut self, id: ReportLineId) -> Result<(), StructureError> {
        let line = self.line_mut(id)?;
        match &mut line.content {
            LineContent::DataBucket { account_id } => {
                *account_id = None;
                Ok(())
            }
            other => Err(StructureError::WrongLineType {
                line_id: id,
                expected: LineType::DataBucket,
                actual: other.line_type(),
            }),
        }
    }

    /// Returns every account bound by more than one line, with its lines.
    ///
    /// Accounts are listed in the order they are first encountered.
    #[must_use]
    pub fn duplicate_account_bindings(&self) -> Vec<(AccountId, Vec<ReportLineId>)> {
        let mut seen: Vec<(AccountId, Vec<ReportLineId>)> = Vec::new();
        let mut slots: HashMap<AccountId, usize> = HashMap::new();
        for line in &self.lines {
            if let Some(account_id) = line.account_id() {
                let slot = *slots.entry(account_id).or_insert_with(|| {
                    seen.push((account_id, Vec::new()));
                    seen.len() - 1
                });
                seen[slot].1.push(line.id);
            }
        }
        seen.retain(|(_, lines)| lines.len() > 1);
        seen
    }

    /// Verifies parents, acyclicity and sibling order contiguity.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn check_integrity(&self) -> Result<(), StructureError> {
        for line in &self.lines {
            if let Some(parent_id) = line.parent_id
                && self.get(parent_id).is_none()
            {
                return Err(StructureError::UnknownParent {
                    line_id: line.id,
                    parent_id,
                });
            }
        }
        self.ensure_acyclic()?;

        let mut groups: HashMap<Option<ReportLineId>, Vec<usize>> = HashMap::new();
        for line in &self.lines {
            groups.entry(line.parent_id).or_default().push(line.order);
        }
        for (parent, mut orders) in groups {
            orders.sort_unstable();
            if orders.iter().enumerate().any(|(index, &order)| index != order) {
                return Err(StructureError::NonContiguousOrder { parent });
            }
        }
        Ok(())
    }

    fn ensure_acyclic(&self) -> Result<(), StructureError> {
        let parents: HashMap<ReportLineId, Option<ReportLineId>> = self
            .lines
            .iter()
            .map(|line| (line.id, line.parent_id))
            .collect();
        let mut acyclic: HashSet<ReportLineId> = HashSet::with_capacity(self.lines.len());

        for line in &self.lines {
            let mut path = HashSet::new();
            let mut current = Some(line.id);
            while let Some(id) = current {
                if acyclic.contains(&id) {
                    break;
                }
                if !path.insert(id) {
                    return Err(StructureError::CycleDetected(line.id));
                }
                current = parents.get(&id).copied().flatten();
            }
            acyclic.extend(path);
        }
        Ok(())
    }

    /// Renumbers every sibling group to `0..n` and rebuilds the indexes.
    ///
    /// Groups are sorted by their current order; ties keep insertion order.
    pub(crate) fn normalize(&mut self) {
        let mut groups: HashMap<Option<ReportLineId>, Vec<usize>> = HashMap::new();
        for (pos, line) in self.lines.iter().enumerate() {
            groups.entry(line.parent_id).or_default().push(pos);
        }

        self.children.clear();
        for (parent, mut members) in groups {
            members.sort_by_key(|&pos| self.lines[pos].order);
            let mut ids = Vec::with_capacity(members.len());
            for (order, pos) in members.into_iter().enumerate() {
                self.lines[pos].order = order;
                ids.push(self.lines[pos].id);
            }
            self.children.insert(parent, ids);
        }

        self.positions = self
            .lines
            .iter()
            .enumerate()
            .map(|(pos, line)| (line.id, pos))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::catalog::AccountCategory;

    fn names(tree: &ReportTree, parent: Option<ReportLineId>) -> Vec<String> {
        tree.children(parent)
            .into_iter()
            .map(|line| line.name.clone())
            .collect()
    }

    #[test]
    fn test_add_lines_append_at_end() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let receita = tree.add_root_line("Receita");
        tree.add_root_line("Despesas");
        let bruta = tree.add_child_line(receita, "Receita Bruta").unwrap();
        let deducoes = tree.add_child_line(receita, "Deduções").unwrap();

        assert_eq!(names(&tree, None), ["Receita", "Despesas"]);
        assert_eq!(names(&tree, Some(receita)), ["Receita Bruta", "Deduções"]);
        assert_eq!(tree.line(bruta).unwrap().order, 0);
        assert_eq!(tree.line(deducoes).unwrap().order, 1);
        assert_eq!(tree.line(deducoes).unwrap().line_type(), LineType::DataBucket);
        assert!(tree.has_children(receita));
    }

    #[test]
    fn test_load_sorts_and_closes_gaps() {
        let report_id = ReportTemplateId::new();
        let a = ReportLine::new(report_id, None, "A", 7);
        let b = ReportLine::new(report_id, None, "B", 2);
        let c = ReportLine::new(report_id, None, "C", 4);

        let tree = ReportTree::load(report_id, vec![a, b, c]).unwrap();

        assert_eq!(names(&tree, None), ["B", "C", "A"]);
        let orders: Vec<usize> = tree.children(None).iter().map(|l| l.order).collect();
        assert_eq!(orders, [0, 1, 2]);
        tree.check_integrity().unwrap();
    }

    #[test]
    fn test_load_rejects_cycles() {
        let report_id = ReportTemplateId::new();
        let mut a = ReportLine::new(report_id, None, "A", 0);
        let mut b = ReportLine::new(report_id, None, "B", 0);
        a.parent_id = Some(b.id);
        b.parent_id = Some(a.id);

        let err = ReportTree::load(report_id, vec![a, b]).unwrap_err();
        assert!(matches!(err, StructureError::CycleDetected(_)));
    }

    #[test]
    fn test_load_rejects_unknown_parent_and_foreign_lines() {
        let report_id = ReportTemplateId::new();
        let mut orphan = ReportLine::new(report_id, None, "Orphan", 0);
        orphan.parent_id = Some(ReportLineId::new());
        assert!(matches!(
            ReportTree::load(report_id, vec![orphan]),
            Err(StructureError::UnknownParent { .. })
        ));

        let foreign = ReportLine::new(ReportTemplateId::new(), None, "Foreign", 0);
        assert!(matches!(
            ReportTree::load(report_id, vec![foreign]),
            Err(StructureError::ForeignLine { .. })
        ));
    }

    #[test]
    fn test_load_rejects_duplicate_ids() {
        let report_id = ReportTemplateId::new();
        let line = ReportLine::new(report_id, None, "A", 0);
        let copy = line.clone();
        assert!(matches!(
            ReportTree::load(report_id, vec![line, copy]),
            Err(StructureError::DuplicateLineId(_))
        ));
    }

    #[test]
    fn test_descendant_ids_depth_first() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let root = tree.add_root_line("Root");
        let a = tree.add_child_line(root, "A").unwrap();
        let a1 = tree.add_child_line(a, "A1").unwrap();
        let b = tree.add_child_line(root, "B").unwrap();

        assert_eq!(tree.descendant_ids(root).unwrap(), [root, a, a1, b]);
        assert_eq!(tree.descendant_ids(b).unwrap(), [b]);
    }

    #[test]
    fn test_remove_subtree_renumbers_and_strips_references() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let first = tree.add_root_line("First");
        let child = tree.add_child_line(first, "Child").unwrap();
        let second = tree.add_root_line("Second");
        let formula = tree.add_root_line("Formula");
        tree.set_line_type(formula, LineType::Formula).unwrap();
        tree.add_reference(formula, child, Sign::Positive).unwrap();
        tree.add_reference(formula, second, Sign::Negative).unwrap();

        let removed = tree.remove_subtree(first).unwrap();

        assert_eq!(removed.len(), 2);
        assert!(tree.get(child).is_none());
        assert_eq!(tree.line(second).unwrap().order, 0);
        assert_eq!(tree.line(formula).unwrap().order, 1);
        let refs = tree.line(formula).unwrap().formula_references();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].target, second);
        tree.check_integrity().unwrap();
    }

    #[test]
    fn test_bind_account_rejects_duplicates_without_mutation() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let first = tree.add_root_line("First");
        let second = tree.add_root_line("Second");
        let account = Account::new("3.1.01", "Receita de Vendas", AccountCategory::Result);

        tree.bind_account(first, &account).unwrap();
        let err = tree.bind_account(second, &account).unwrap_err();

        assert!(matches!(err, StructureError::AccountAlreadyBound { .. }));
        assert_eq!(tree.line(first).unwrap().account_id(), Some(account.id));
        assert_eq!(tree.line(first).unwrap().name, "Receita de Vendas");
        assert_eq!(tree.line(second).unwrap().account_id(), None);
        assert_eq!(tree.line(second).unwrap().name, "Second");
    }

    #[test]
    fn test_rebinding_same_line_is_allowed() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let line = tree.add_root_line("Line");
        let account = Account::new("3.1.01", "Receita de Vendas", AccountCategory::Result);
        tree.bind_account(line, &account).unwrap();
        tree.bind_account(line, &account).unwrap();
        assert_eq!(tree.line(line).unwrap().account_id(), Some(account.id));
    }

    #[test]
    fn test_bound_line_name_is_locked() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let line = tree.add_root_line("Line");
        let account = Account::new("3.2.01", "CMV", AccountCategory::Result);
        tree.bind_account(line, &account).unwrap();

        assert!(matches!(
            tree.rename(line, "Custo"),
            Err(StructureError::NameLockedByAccount(_))
        ));
        tree.unbind_account(line).unwrap();
        tree.rename(line, "Custo").unwrap();
        assert_eq!(tree.line(line).unwrap().name, "Custo");
    }

    #[test]
    fn test_bind_account_requires_data_bucket() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let line = tree.add_root_line("Total");
        tree.set_line_type(line, LineType::Total).unwrap();
        let account = Account::new("3.2.01", "CMV", AccountCategory::Result);
        assert!(matches!(
            tree.bind_account(line, &account),
            Err(StructureError::WrongLineType { .. })
        ));
    }

    #[test]
    fn test_vertical_analysis_base_is_unique() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let x = tree.add_root_line("Receita Líquida");
        let y = tree.add_root_line("Lucro Bruto");
        tree.set_line_type(x, LineType::Total).unwrap();
        tree.set_line_type(y, LineType::Total).unwrap();

        tree.set_vertical_analysis_base(y, true).unwrap();
        tree.set_vertical_analysis_base(x, true).unwrap();

        assert_eq!(tree.vertical_analysis_base().map(|l| l.id), Some(x));
        assert!(!tree.line(y).unwrap().style.is_vertical_analysis_base);
    }

    #[test]
    fn test_vertical_analysis_base_requires_total() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let line = tree.add_root_line("Header");
        tree.set_line_type(line, LineType::Header).unwrap();
        assert!(matches!(
            tree.set_vertical_analysis_base(line, true),
            Err(StructureError::WrongLineType { .. })
        ));
    }

    #[test]
    fn test_type_change_clears_vertical_analysis_base() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let line = tree.add_root_line("Total");
        tree.set_line_type(line, LineType::Total).unwrap();
        tree.set_vertical_analysis_base(line, true).unwrap();

        assert!(tree.set_line_type(line, LineType::Header).unwrap());
        assert!(tree.vertical_analysis_base().is_none());
        assert!(!tree.set_line_type(line, LineType::Header).unwrap());
    }

    #[test]
    fn test_type_change_drops_references_to_non_targets() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let header = tree.add_root_line("Receita");
        tree.set_line_type(header, LineType::Header).unwrap();
        let total = tree.add_root_line("Receita Líquida");
        tree.set_line_type(total, LineType::Total).unwrap();
        let formula = tree.add_root_line("Resultado");
        tree.set_line_type(formula, LineType::Formula).unwrap();
        tree.add_reference(formula, header, Sign::Positive).unwrap();
        tree.add_reference(formula, total, Sign::Negative).unwrap();

        assert!(tree.set_line_type(header, LineType::Formula).unwrap());

        let refs = tree.line(formula).unwrap().formula_references();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].target, total);
        for reference in refs {
            assert!(tree.line(reference.target).unwrap().line_type().is_formula_target());
        }

        assert!(tree.set_line_type(total, LineType::DataBucket).unwrap());
        assert_eq!(tree.line(formula).unwrap().formula_references().len(), 1);
    }

    #[test]
    fn test_load_keeps_single_vertical_analysis_base() {
        let report_id = ReportTemplateId::new();
        let mut header = ReportLine::new(report_id, None, "Header", 0).with_type(LineType::Header);
        header.style.is_vertical_analysis_base = true;
        let mut first = ReportLine::new(report_id, None, "First", 1).with_type(LineType::Total);
        first.style.is_vertical_analysis_base = true;
        let mut second = ReportLine::new(report_id, None, "Second", 2).with_type(LineType::Total);
        second.style.is_vertical_analysis_base = true;
        let (header_id, first_id) = (header.id, first.id);

        let tree = ReportTree::load(report_id, vec![second, header, first]).unwrap();

        let flagged: Vec<ReportLineId> = tree
            .lines()
            .iter()
            .filter(|line| line.style.is_vertical_analysis_base)
            .map(|line| line.id)
            .collect();
        assert_eq!(flagged, [first_id]);
        assert!(!tree.line(header_id).unwrap().style.is_vertical_analysis_base);
    }

    #[test]
    fn test_duplicate_account_bindings_detected() {
        let report_id = ReportTemplateId::new();
        let account_id = AccountId::new();
        let mut a = ReportLine::new(report_id, None, "A", 0);
        let mut b = ReportLine::new(report_id, None, "B", 1);
        let c = ReportLine::new(report_id, None, "C", 2);
        a.content = LineContent::DataBucket {
            account_id: Some(account_id),
        };
        b.content = a.content.clone();
        let (a_id, b_id) = (a.id, b.id);

        let tree = ReportTree::load(report_id, vec![a, b, c]).unwrap();
        assert_eq!(
            tree.duplicate_account_bindings(),
            vec![(account_id, vec![a_id, b_id])]
        );
    }

    #[test]
    fn test_lines_in_tree_order() {
        let mut tree = ReportTree::new(ReportTemplateId::new());
        let a = tree.add_root_line("A");
        tree.add_root_line("B");
        tree.add_child_line(a, "A1").unwrap();

        let ordered: Vec<String> = tree
            .lines_in_tree_order()
            .into_iter()
            .map(|line| line.name)
            .collect();
        assert_eq!(ordered, ["A", "A1", "B"]);
    }
}
