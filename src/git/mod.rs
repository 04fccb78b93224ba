//! Git operations module
//!
//! Everything that touches the external `git` executable: the invocation
//! contract with timeouts, porcelain decoding and sparse checkout setup

pub mod mock;
pub mod porcelain;
pub mod runner;
pub mod sparse_checkout;

pub use mock::MockGit;
pub use runner::*;
pub use sparse_checkout::*;
