//! Persistence of report structures using Apache OpenDAL.
//!
//! Each report structure is stored as one JSON document under
//! `{prefix}/{report_id}.json` on any OpenDAL backend:
//! - In-process memory (tests)
//! - Local filesystem (development only)
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3
//!
//! The editor talks to the [`StructureStore`] trait, never to OpenDAL directly.

mod error;
mod record;
mod service;

pub use error::StoreError;
pub use record::ReportLineRecord;
pub use service::{OpendalStructureStore, StructureDocument, StructureStore};
