//! core::records
//!
//! Persisted records and the stores that hold them.
//!
//! # Modules
//!
//! - [`schema`] - `Repository` and `OperationLogEntry`
//! - `store` - The `RecordStore` trait and `RecordError`
//! - `memory` - In-memory store (tests, embedding)
//! - `file` - JSON files under a data directory

mod file;
mod memory;
pub mod schema;
mod store;

pub use file::FileStore;
pub use memory::{FailOn, MemoryStore};
pub use schema::{OperationLogEntry, OperationType, Repository};
pub use store::{RecordError, RecordStore};
