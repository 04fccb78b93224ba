//! Error handling module
//!
//! Defines the sync error taxonomy with appropriate exit codes

pub mod types;

pub use types::*;
