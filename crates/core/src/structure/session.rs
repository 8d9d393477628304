//! Editing session over one report structure.
//!
//! The session owns the working tree, the expand/collapse state and the
//! catalogs used for bindings. Edits are purely local until [`EditorSession::save`]
//! writes the whole structure through a [`StructureStore`]; deleting a line is
//! the one action that reaches the store immediately.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::try_join_all;
use reportree_shared::EditorConfig;
use reportree_shared::types::{AccountId, ReportLineId, ReportTemplateId};
use tracing::{debug, error, info, warn};

use super::catalog::{Account, AccountCatalog, OperationalCatalog, OperationalOption};
use super::codes::LineCodes;
use super::error::StructureError;
use super::formula::ResolvedReference;
use super::movement::MoveAvailability;
use super::presentation::{ExpansionState, FlatRow, flatten};
use super::tree::ReportTree;
use super::types::{
    FormulaReference, LineType, OperationalSource, ReportLine, ReportTemplate, Sign,
};
use crate::store::{ReportLineRecord, StructureStore};

/// Mutable editing state of one report structure.
#[derive(Debug)]
pub struct EditorSession {
    template: ReportTemplate,
    tree: ReportTree,
    expansion: ExpansionState,
    accounts: AccountCatalog,
    operational: OperationalCatalog,
    revision: u64,
    saved_revision: u64,
    save_in_flight: Arc<AtomicBool>,
}

impl EditorSession {
    /// Opens a session over already loaded lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the lines do not form a valid tree for `template`.
    pub fn open(
        template: ReportTemplate,
        lines: Vec<ReportLine>,
        accounts: AccountCatalog,
        operational: OperationalCatalog,
        config: &EditorConfig,
    ) -> Result<Self, StructureError> {
        let tree = ReportTree::load(template.id, lines)?;
        let expansion = ExpansionState::initial(&tree, config.collapse_threshold);
        info!(
            report_id = %template.id,
            lines = tree.len(),
            "structure opened"
        );
        Ok(Self {
            template,
            tree,
            expansion,
            accounts,
            operational,
            revision: 0,
            saved_revision: 0,
            save_in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Loads a report's persisted structure and opens a session over it.
    ///
    /// # Errors
    ///
    /// Returns `Store` if loading fails or a record is invalid, or a tree
    /// error if the persisted lines are inconsistent.
    pub async fn load(
        template: ReportTemplate,
        store: &dyn StructureStore,
        accounts: AccountCatalog,
        operational: OperationalCatalog,
        config: &EditorConfig,
    ) -> Result<Self, StructureError> {
        let records = store.load_structure(template.id).await?;
        let lines = records
            .into_iter()
            .map(ReportLineRecord::into_line)
            .collect::<Result<Vec<_>, _>>()?;
        Self::open(template, lines, accounts, operational, config)
    }

    /// Returns the edited report template.
    #[must_use]
    pub const fn template(&self) -> &ReportTemplate {
        &self.template
    }

    /// Returns the working tree.
    #[must_use]
    pub const fn tree(&self) -> &ReportTree {
        &self.tree
    }

    /// Returns the expand/collapse state.
    #[must_use]
    pub const fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    /// Returns true if there are local edits not yet saved.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    /// Returns true while a save is in flight.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.save_in_flight.load(Ordering::Acquire)
    }

    /// Derives the display codes of the current tree.
    #[must_use]
    pub fn codes(&self) -> LineCodes {
        self.tree.codes()
    }

    /// Returns the visible rows of the editor.
    #[must_use]
    pub fn rows(&self) -> Vec<FlatRow<'_>> {
        flatten(&self.tree, &self.expansion)
    }

    /// Flips the expansion of a line and returns whether it is now expanded.
    pub fn toggle(&mut self, id: ReportLineId) -> bool {
        self.expansion.toggle(id)
    }

    /// Expands every line that has children.
    pub fn expand_all(&mut self) {
        self.expansion.expand_all(&self.tree);
    }

    /// Collapses everything.
    pub fn collapse_all(&mut self) {
        self.expansion.collapse_all();
    }

    /// Appends a new root line.
    pub fn add_root_line(&mut self, name: impl Into<String>) -> ReportLineId {
        let id = self.tree.add_root_line(name);
        self.touch();
        debug!(line_id = %id, "root line added");
        id
    }

    /// Appends a child line and expands its parent.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the parent is not in the tree.
    pub fn add_child_line(
        &mut self,
        parent_id: ReportLineId,
        name: impl Into<String>,
    ) -> Result<ReportLineId, StructureError> {
        let id = self.tree.add_child_line(parent_id, name)?;
        self.expansion.expand(parent_id);
        self.touch();
        debug!(line_id = %id, parent_id = %parent_id, "child line added");
        Ok(id)
    }

    /// Reports which moves are available for a line.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn available_moves(&self, id: ReportLineId) -> Result<MoveAvailability, StructureError> {
        self.tree.available_moves(id)
    }

    /// Moves a line before its preceding sibling.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn move_up(&mut self, id: ReportLineId) -> Result<bool, StructureError> {
        let moved = self.tree.move_up(id)?;
        self.record_move(id, moved, "line moved up");
        Ok(moved)
    }

    /// Moves a line after its following sibling.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn move_down(&mut self, id: ReportLineId) -> Result<bool, StructureError> {
        let moved = self.tree.move_down(id)?;
        self.record_move(id, moved, "line moved down");
        Ok(moved)
    }

    /// Nests a line under its preceding sibling, which gets expanded.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn indent(&mut self, id: ReportLineId) -> Result<bool, StructureError> {
        let moved = self.tree.indent(id)?;
        if moved && let Some(parent_id) = self.tree.line(id)?.parent_id {
            self.expansion.expand(parent_id);
        }
        self.record_move(id, moved, "line indented");
        Ok(moved)
    }

    /// Promotes a line to its grandparent level.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn outdent(&mut self, id: ReportLineId) -> Result<bool, StructureError> {
        let moved = self.tree.outdent(id)?;
        self.record_move(id, moved, "line outdented");
        Ok(moved)
    }

    /// Renames a line.
    ///
    /// # Errors
    ///
    /// Returns `NameLockedByAccount` for a data bucket bound to an account.
    pub fn rename(&mut self, id: ReportLineId, name: impl Into<String>) -> Result<(), StructureError> {
        self.tree.rename(id, name)?;
        self.touch();
        Ok(())
    }

    /// Sets the contribution sign of a line.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn set_sign(&mut self, id: ReportLineId, sign: Sign) -> Result<(), StructureError> {
        self.tree.set_sign(id, sign)?;
        self.touch();
        Ok(())
    }

    /// Changes the type of a line, resetting its type-specific payload.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn set_line_type(
        &mut self,
        id: ReportLineId,
        line_type: LineType,
    ) -> Result<bool, StructureError> {
        let changed = self.tree.set_line_type(id, line_type)?;
        if changed {
            self.touch();
            debug!(line_id = %id, %line_type, "line type changed");
        }
        Ok(changed)
    }

    /// Sets the bold flag of a line.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn set_bold(&mut self, id: ReportLineId, bold: bool) -> Result<(), StructureError> {
        self.tree.set_bold(id, bold)?;
        self.touch();
        Ok(())
    }

    /// Marks or unmarks a total line as the vertical analysis base.
    ///
    /// # Errors
    ///
    /// Returns `WrongLineType` if the line is not a total.
    pub fn set_vertical_analysis_base(
        &mut self,
        id: ReportLineId,
        enabled: bool,
    ) -> Result<(), StructureError> {
        self.tree.set_vertical_analysis_base(id, enabled)?;
        self.touch();
        Ok(())
    }

    /// Returns the accounts the line may be bound to.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn account_options(&self, id: ReportLineId) -> Result<Vec<&Account>, StructureError> {
        self.tree.line(id)?;
        Ok(self
            .accounts
            .available_for(&self.tree, self.template.report_type, id))
    }

    /// Binds a data bucket line to an account of the catalog.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account is not a candidate for this
    /// report type, or the binding errors of [`ReportTree::bind_account`].
    pub fn bind_account(
        &mut self,
        id: ReportLineId,
        account_id: AccountId,
    ) -> Result<(), StructureError> {
        let account = self
            .accounts
            .get(account_id)
            .filter(|account| self.template.report_type.accepts(account.category))
            .ok_or(StructureError::AccountNotFound(account_id))?;
        self.tree.bind_account(id, account)?;
        self.touch();
        debug!(line_id = %id, %account_id, "account bound");
        Ok(())
    }

    /// Clears the account binding of a data bucket line.
    ///
    /// # Errors
    ///
    /// Returns `WrongLineType` if the line is not a data bucket.
    pub fn unbind_account(&mut self, id: ReportLineId) -> Result<(), StructureError> {
        self.tree.unbind_account(id)?;
        self.touch();
        Ok(())
    }

    /// Returns the active operational catalog entries.
    #[must_use]
    pub fn operational_options(&self) -> Vec<OperationalOption> {
        self.operational.options()
    }

    /// Binds an operational line to a catalog entry.
    ///
    /// # Errors
    ///
    /// Returns `OperationalEntryNotFound`, `OperationalEntryInactive` or
    /// `WrongLineType`.
    pub fn bind_operational(
        &mut self,
        id: ReportLineId,
        source: OperationalSource,
    ) -> Result<(), StructureError> {
        self.tree.bind_operational(id, source, &self.operational)?;
        self.touch();
        debug!(line_id = %id, %source, "operational entry bound");
        Ok(())
    }

    /// Returns the lines a formula line may reference.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn reference_candidates(&self, id: ReportLineId) -> Result<Vec<&ReportLine>, StructureError> {
        self.tree.reference_candidates(id)
    }

    /// Resolves the references of a formula line for display.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn resolved_references(
        &self,
        id: ReportLineId,
    ) -> Result<Vec<ResolvedReference>, StructureError> {
        self.tree.resolve_references(id, &self.codes())
    }

    /// Appends a signed reference to a formula line.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`ReportTree::add_reference`].
    pub fn add_reference(
        &mut self,
        id: ReportLineId,
        target: ReportLineId,
        sign: Sign,
    ) -> Result<(), StructureError> {
        self.tree.add_reference(id, target, sign)?;
        self.touch();
        Ok(())
    }

    /// Removes the reference at `index` of a formula line.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceOutOfRange` for an invalid index.
    pub fn remove_reference(
        &mut self,
        id: ReportLineId,
        index: usize,
    ) -> Result<FormulaReference, StructureError> {
        let removed = self.tree.remove_reference(id, index)?;
        self.touch();
        Ok(removed)
    }

    /// Sets the sign of the reference at `index` of a formula line.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceOutOfRange` for an invalid index.
    pub fn change_reference_sign(
        &mut self,
        id: ReportLineId,
        index: usize,
        sign: Sign,
    ) -> Result<(), StructureError> {
        self.tree.change_reference_sign(id, index, sign)?;
        self.touch();
        Ok(())
    }

    /// Validates the working set and snapshots it for persistence.
    ///
    /// While the returned [`PendingSave`] is alive, further saves are refused
    /// with `SaveInProgress`; local edits stay possible.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAccountBindings` naming every account bound to more
    /// than one line, `SaveInProgress`, or `Store` if a line cannot be encoded.
    pub fn prepare_save(&self) -> Result<PendingSave, StructureError> {
        let duplicates = self.tree.duplicate_account_bindings();
        if !duplicates.is_empty() {
            let ids: Vec<AccountId> = duplicates.iter().map(|(account_id, _)| *account_id).collect();
            let accounts = self.accounts.names_of(&ids);
            warn!(
                report_id = %self.template.id,
                accounts = ?accounts,
                "save blocked by duplicate account bindings"
            );
            return Err(StructureError::DuplicateAccountBindings { accounts });
        }

        if self
            .save_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StructureError::SaveInProgress);
        }
        let guard = SaveGuard(Arc::clone(&self.save_in_flight));

        let records = self
            .tree
            .lines_in_tree_order()
            .iter()
            .map(ReportLineRecord::from_line)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PendingSave {
            report_id: self.template.id,
            revision: self.revision,
            records,
            _guard: guard,
        })
    }

    /// Marks the snapshot behind `receipt` as persisted.
    pub fn acknowledge_save(&mut self, receipt: SaveReceipt) {
        self.saved_revision = self.saved_revision.max(receipt.revision);
    }

    /// Validates and persists the whole structure.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::prepare_save`], or `Store` if the write
    /// fails. The working set is left untouched on failure.
    pub async fn save(&mut self, store: &dyn StructureStore) -> Result<(), StructureError> {
        let pending = self.prepare_save()?;
        match pending.commit(store).await {
            Ok(receipt) => {
                info!(
                    report_id = %self.template.id,
                    lines = receipt.lines,
                    "structure saved"
                );
                self.acknowledge_save(receipt);
                Ok(())
            }
            Err(err) => {
                error!(report_id = %self.template.id, error = %err, "structure save failed");
                Err(err)
            }
        }
    }

    /// Deletes a line and its subtree from the store, then from the session.
    ///
    /// One delete is issued per removed line, all in parallel. The local tree
    /// only changes if every delete succeeded. Returns the removed ids.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree, or `Store` if any
    /// delete fails.
    pub async fn delete_line(
        &mut self,
        id: ReportLineId,
        store: &dyn StructureStore,
    ) -> Result<Vec<ReportLineId>, StructureError> {
        let ids = self.tree.descendant_ids(id)?;
        let report_id = self.template.id;

        if let Err(err) =
            try_join_all(ids.iter().map(|&line_id| store.delete_line(report_id, line_id))).await
        {
            error!(%report_id, line_id = %id, error = %err, "line delete failed");
            return Err(err.into());
        }

        self.tree.remove_subtree(id)?;
        self.expansion.forget(&ids);
        self.touch();
        info!(%report_id, line_id = %id, removed = ids.len(), "line deleted");
        Ok(ids)
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn record_move(&mut self, id: ReportLineId, moved: bool, message: &'static str) {
        if moved {
            self.touch();
            debug!(line_id = %id, "{message}");
        }
    }
}

/// Snapshot of a structure waiting to be written.
#[derive(Debug)]
pub struct PendingSave {
    report_id: ReportTemplateId,
    revision: u64,
    records: Vec<ReportLineRecord>,
    _guard: SaveGuard,
}

impl PendingSave {
    /// Returns the records that will be written.
    #[must_use]
    pub fn records(&self) -> &[ReportLineRecord] {
        &self.records
    }

    /// Writes the snapshot. The in-flight flag is released when this returns.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the write fails.
    pub async fn commit(self, store: &dyn StructureStore) -> Result<SaveReceipt, StructureError> {
        let Self {
            report_id,
            revision,
            records,
            _guard,
        } = self;
        let lines = records.len();
        store.save_structure(report_id, records).await?;
        Ok(SaveReceipt { revision, lines })
    }
}

/// Proof that a snapshot was persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReceipt {
    revision: u64,
    /// Number of lines written.
    pub lines: usize,
}

#[derive(Debug)]
struct SaveGuard(Arc<AtomicBool>);

impl Drop for SaveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
