//! arogya-intake
//!
//! The bounded multi-turn intake engine. A [`SessionController`] runs one
//! short dialogue at a time for a subject and an intake kind, gathering
//! answers through a [`capture::SpeechRecognizer`], choosing each next step
//! with a [`policy::BranchPolicy`], speaking through a shared
//! [`feedback::FeedbackEmitter`], and handing escalations to an
//! [`escalation::EscalationDispatcher`].

pub mod capture;
pub mod controller;
pub mod error;
pub mod escalation;
pub mod event;
pub mod feedback;
pub mod policy;
pub mod prompts;
pub mod session;
pub mod settings;

pub use controller::SessionController;
pub use error::IntakeError;
pub use event::SessionEvent;
pub use session::{Session, SessionState};
pub use settings::EngineSettings;
