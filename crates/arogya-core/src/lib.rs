//! arogya-core
//!
//! Pure domain types for the intake engine: subjects, intake kinds, the
//! dialogue transcript, structured outcomes, and S3 key conventions.
//! No AWS SDK dependency: this is the shared vocabulary of the Arogya system.

pub mod error;
pub mod models;
pub mod s3_keys;
