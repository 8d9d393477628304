//! Flattened, indented view of the tree and its expand/collapse state.

use std::collections::HashSet;

use reportree_shared::types::ReportLineId;

use super::tree::ReportTree;
use super::types::ReportLine;

/// Expanded line ids of one editing session. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: HashSet<ReportLineId>,
}

impl ExpansionState {
    /// Initial state for a freshly loaded tree.
    ///
    /// Trees with at most `collapse_threshold` lines start fully expanded;
    /// larger trees start collapsed.
    #[must_use]
    pub fn initial(tree: &ReportTree, collapse_threshold: usize) -> Self {
        if tree.len() <= collapse_threshold {
            Self::all_expanded(tree)
        } else {
            Self::default()
        }
    }

    /// State with every line that has children expanded.
    #[must_use]
    pub fn all_expanded(tree: &ReportTree) -> Self {
        Self {
            expanded: tree
                .lines()
                .iter()
                .filter(|line| tree.has_children(line.id))
                .map(|line| line.id)
                .collect(),
        }
    }

    /// Returns true if the line is expanded.
    #[must_use]
    pub fn is_expanded(&self, id: ReportLineId) -> bool {
        self.expanded.contains(&id)
    }

    /// Expands a line.
    pub fn expand(&mut self, id: ReportLineId) {
        self.expanded.insert(id);
    }

    /// Collapses a line.
    pub fn collapse(&mut self, id: ReportLineId) {
        self.expanded.remove(&id);
    }

    /// Flips a line and returns whether it is now expanded.
    pub fn toggle(&mut self, id: ReportLineId) -> bool {
        if self.expanded.remove(&id) {
            false
        } else {
            self.expanded.insert(id);
            true
        }
    }

    /// Expands every line that has children.
    pub fn expand_all(&mut self, tree: &ReportTree) {
        *self = Self::all_expanded(tree);
    }

    /// Collapses everything.
    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Drops ids that left the tree.
    pub fn forget(&mut self, ids: &[ReportLineId]) {
        for id in ids {
            self.expanded.remove(id);
        }
    }
}

/// One visible row of the structure editor.
#[derive(Debug, Clone, Copy)]
pub struct FlatRow<'a> {
    /// The line rendered in this row.
    pub line: &'a ReportLine,
    /// Depth, 0 for root lines.
    pub level: usize,
    /// The line has children (expanded or not).
    pub has_children: bool,
    /// First among its siblings.
    pub is_first_child: bool,
    /// Last among its siblings.
    pub is_last_child: bool,
}

/// Walks the tree depth-first, descending only into expanded lines.
#[must_use]
pub fn flatten<'a>(tree: &'a ReportTree, expansion: &ExpansionState) -> Vec<FlatRow<'a>> {
    let mut rows = Vec::with_capacity(tree.len());
    visit(tree, expansion, None, 0, &mut rows);
    rows
}

fn visit<'a>(
    tree: &'a ReportTree,
    expansion: &ExpansionState,
    parent: Option<ReportLineId>,
    level: usize,
    rows: &mut Vec<FlatRow<'a>>,
) {
    let siblings = tree.child_ids(parent);
    let last = siblings.len().saturating_sub(1);
    for (index, &id) in siblings.iter().enumerate() {
        let Some(line) = tree.get(id) else {
            continue;
        };
        let has_children = tree.has_children(id);
        rows.push(FlatRow {
            line,
            level,
            has_children,
            is_first_child: index == 0,
            is_last_child: index == last,
        });
        if has_children && expansion.is_expanded(id) {
            visit(tree, expansion, Some(id), level + 1, rows);
        }
    }
}
