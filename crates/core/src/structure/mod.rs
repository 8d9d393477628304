//! Hierarchical report-structure editor.
//!
//! This module holds the editing logic for report layouts (DRE, balance
//! sheet, cash flow):
//! - Tree model with contiguous sibling order and cascading removal
//! - Derived hierarchical codes
//! - Movement: reorder, indent, outdent
//! - Signed formula references and catalog bindings
//! - Flattened, collapsible presentation
//! - Editing session with save and delete flows

pub mod catalog;
pub mod codes;
pub mod error;
pub mod formula;
pub mod movement;
pub mod presentation;
pub mod session;
pub mod tree;
pub mod types;


pub use catalog::{
    Account, AccountCatalog, AccountCategory, OperationalCatalog, OperationalFormula,
    OperationalIndicator, OperationalOption,
};
pub use codes::{LineCodes, derive_codes};
pub use error::StructureError;
pub use formula::{ReferenceTarget, ResolvedReference};
pub use movement::MoveAvailability;
pub use presentation::{ExpansionState, FlatRow, flatten};
pub use session::{EditorSession, PendingSave, SaveReceipt};
pub use tree::ReportTree;
pub use types::*;
