//! Spoken feedback.
//!
//! One [`FeedbackEmitter`] is shared by every session in the process. Each
//! [`FeedbackEmitter::speak`] silences whatever is still playing before the
//! new utterance starts, and nothing the synthesizer does ever reaches the
//! session state.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use arogya_core::models::intake::Locale;

use crate::error::FeedbackError;

/// Platform text-to-speech capability.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn is_available(&self) -> bool;

    /// Speak `text`, resolving when playback ends.
    async fn speak(&self, text: &str, locale: Locale) -> Result<(), FeedbackError>;
}

pub struct FeedbackEmitter {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    current: Mutex<Option<JoinHandle<()>>>,
}

impl FeedbackEmitter {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Arc<Self> {
        Arc::new(Self {
            synthesizer,
            current: Mutex::new(None),
        })
    }

    /// Start speaking `text`, replacing any utterance still playing.
    ///
    /// Returns immediately; must be called from within a Tokio runtime.
    pub fn speak(&self, text: impl Into<String>, locale: Locale) {
        let text = text.into();
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = current.take() {
            previous.abort();
        }

        if !self.synthesizer.is_available() {
            debug!(text, "no speech engine, skipping feedback");
            return;
        }

        let synthesizer = self.synthesizer.clone();
        *current = Some(tokio::spawn(async move {
            if let Err(e) = synthesizer.speak(&text, locale).await {
                warn!(error = %e, "speech feedback failed");
            }
        }));
    }

    /// Silence any utterance still playing.
    pub fn stop(&self) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = current.take() {
            previous.abort();
        }
    }

    pub fn is_speaking(&self) -> bool {
        let current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        current.as_ref().is_some_and(|h| !h.is_finished())
    }
}
