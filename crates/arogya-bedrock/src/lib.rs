//! arogya-bedrock
//!
//! The intake decision service: Bedrock model invocation, prompt assembly,
//! and structured decision parsing.

pub mod chat;
pub mod decision;
pub mod error;
pub mod prompt;
