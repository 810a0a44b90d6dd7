//! ui
//!
//! User-facing terminal output.
//!
//! All command output goes through [`output`] so quiet, debug, and JSON
//! modes behave the same across commands.

pub mod output;
