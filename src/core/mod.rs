//! core
//!
//! Core domain types, records, and configuration for repomirror.
//!
//! # Modules
//!
//! - [`types`] - Strong types: RecordId, RefName, PushType, etc.
//! - [`url`] - GitHub URL parsing
//! - [`records`] - Repository and operation log records and their stores
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Nothing in `core` talks to the network

pub mod config;
pub mod records;
pub mod types;
pub mod url;
