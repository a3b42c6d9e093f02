pub mod escalation;
pub mod intake;
pub mod outcome;
pub mod subject;
pub mod transcript;
