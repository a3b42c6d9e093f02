//! arogya-cli library root.
//!
//! Re-exports internal modules so that integration tests can exercise the
//! config file handling and the console collaborators directly.

pub mod aws;
pub mod config;
pub mod console;
