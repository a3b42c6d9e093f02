//! arogya-storage
//!
//! S3 operations. Thin wrapper around the AWS S3 SDK, plus persistence of
//! escalation receipts for the reviewer inbox.

pub mod client;
pub mod error;
pub mod objects;
pub mod receipts;
pub mod state;
