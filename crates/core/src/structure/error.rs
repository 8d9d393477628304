//! Structure editor error types.

use reportree_shared::AppError;
use reportree_shared::types::{AccountId, ReportLineId, ReportTemplateId};
use thiserror::Error;

use super::types::LineType;
use crate::store::StoreError;

/// Errors that can occur while editing a report structure.
#[derive(Debug, Error)]
pub enum StructureError {
    /// Line not found in the working set.
    #[error("Report line not found: {0}")]
    LineNotFound(ReportLineId),

    /// Account not found in the candidate catalog.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Operational catalog entry not found.
    #[error("Operational catalog entry not found: {0}")]
    OperationalEntryNotFound(String),

    /// Operational catalog entry exists but is deactivated.
    #[error("Operational catalog entry is inactive: {0}")]
    OperationalEntryInactive(String),

    /// Two lines with the same id were loaded.
    #[error("Duplicate report line id: {0}")]
    DuplicateLineId(ReportLineId),

    /// A loaded line belongs to another report.
    #[error("Line {line_id} belongs to report {found}, expected {expected}")]
    ForeignLine {
        /// Offending line.
        line_id: ReportLineId,
        /// Report the session edits.
        expected: ReportTemplateId,
        /// Report the line claims.
        found: ReportTemplateId,
    },

    /// A line points at a parent that is not in the working set.
    #[error("Line {line_id} references unknown parent {parent_id}")]
    UnknownParent {
        /// Offending line.
        line_id: ReportLineId,
        /// Missing parent.
        parent_id: ReportLineId,
    },

    /// Following parent links from a line loops back on itself.
    #[error("Parent cycle detected at line {0}")]
    CycleDetected(ReportLineId),

    /// Sibling order values are not `0..n`.
    #[error("Non-contiguous sibling order under parent {parent:?}")]
    NonContiguousOrder {
        /// Parent of the broken sibling group.
        parent: Option<ReportLineId>,
    },

    /// The operation requires another line type.
    #[error("Line {line_id} is {actual}, expected {expected}")]
    WrongLineType {
        /// Offending line.
        line_id: ReportLineId,
        /// Required line type.
        expected: LineType,
        /// Actual line type.
        actual: LineType,
    },

    /// The account is already bound by another line.
    #[error("Account {account_name} is already bound to line {bound_to}")]
    AccountAlreadyBound {
        /// Account being bound.
        account_id: AccountId,
        /// Account display name.
        account_name: String,
        /// Line that already holds the binding.
        bound_to: ReportLineId,
    },

    /// Duplicate account bindings found while validating a save.
    #[error("Accounts bound to more than one line: {}", .accounts.join(", "))]
    DuplicateAccountBindings {
        /// Names of every conflicting account.
        accounts: Vec<String>,
    },

    /// The name of a bound data bucket mirrors its account.
    #[error("Line {0} takes its name from the bound account")]
    NameLockedByAccount(ReportLineId),

    /// The formula target is not allowed.
    #[error("Line {target} cannot be referenced by formula line {line_id}")]
    InvalidReferenceTarget {
        /// Formula line.
        line_id: ReportLineId,
        /// Rejected target.
        target: ReportLineId,
    },

    /// Formula reference index is out of range.
    #[error("Reference {index} out of range for line {line_id} with {len} references")]
    ReferenceOutOfRange {
        /// Formula line.
        line_id: ReportLineId,
        /// Requested index.
        index: usize,
        /// Number of references.
        len: usize,
    },

    /// Another save of this structure has not completed yet.
    #[error("A save is already in progress")]
    SaveInProgress,

    /// The structure store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl StructureError {
    /// Returns the error code for user-facing reports.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::LineNotFound(_) => "LINE_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::OperationalEntryNotFound(_) => "OPERATIONAL_ENTRY_NOT_FOUND",
            Self::OperationalEntryInactive(_) => "OPERATIONAL_ENTRY_INACTIVE",
            Self::DuplicateLineId(_) => "DUPLICATE_LINE_ID",
            Self::ForeignLine { .. } => "FOREIGN_LINE",
            Self::UnknownParent { .. } => "UNKNOWN_PARENT",
            Self::CycleDetected(_) => "CYCLE_DETECTED",
            Self::NonContiguousOrder { .. } => "NON_CONTIGUOUS_ORDER",
            Self::WrongLineType { .. } => "WRONG_LINE_TYPE",
            Self::AccountAlreadyBound { .. } => "ACCOUNT_ALREADY_BOUND",
            Self::DuplicateAccountBindings { .. } => "DUPLICATE_ACCOUNT_BINDINGS",
            Self::NameLockedByAccount(_) => "NAME_LOCKED_BY_ACCOUNT",
            Self::InvalidReferenceTarget { .. } => "INVALID_REFERENCE_TARGET",
            Self::ReferenceOutOfRange { .. } => "REFERENCE_OUT_OF_RANGE",
            Self::SaveInProgress => "SAVE_IN_PROGRESS",
            Self::Store(err) => err.error_code(),
        }
    }
}

impl From<StructureError> for AppError {
    fn from(err: StructureError) -> Self {
        let message = err.to_string();
        match err {
            StructureError::LineNotFound(_)
            | StructureError::AccountNotFound(_)
            | StructureError::OperationalEntryNotFound(_) => Self::NotFound(message),
            StructureError::AccountAlreadyBound { .. }
            | StructureError::DuplicateAccountBindings { .. }
            | StructureError::SaveInProgress => Self::Conflict(message),
            StructureError::Store(_) => Self::ExternalService(message),
            StructureError::NonContiguousOrder { .. } => Self::Internal(message),
            _ => Self::Validation(message),
        }
    }
}
