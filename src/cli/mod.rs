//! Command-line interface module
//!
//! Handles argument parsing and the one-shot commands

pub mod args;
pub mod commands;

pub use args::*;
