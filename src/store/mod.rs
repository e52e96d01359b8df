//! Document store
//!
//! Session-scoped, append-only persistence of extracted person records
//! as one pretty-printed JSON array.

mod document_store;
mod record;

pub use document_store::{DocumentStore, Session, StoreError};
pub use record::{build_records, DocumentRecord};
