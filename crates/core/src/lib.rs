//! Core logic for Reportree.
//!
//! This crate contains the report-structure editor and the persistence seam it
//! saves through. No UI code lives here; the editor is driven through
//! [`structure::EditorSession`].
//!
//! # Modules
//!
//! - `structure` - Report line tree, codes, movement, formulas and the editing session
//! - `store` - Structure persistence over Apache OpenDAL

pub mod store;
pub mod structure;
