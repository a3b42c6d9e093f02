//! Recognizer backed by Amazon Transcribe.
//!
//! Each capture waits for the host to deliver one recorded clip already
//! uploaded to S3, then runs a batch transcription job over it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use arogya_core::models::intake::Locale;
use arogya_transcribe::{MediaFormat, TranscribeJob};

use super::{CaptureErrorKind, CaptureOutcome, SpeechRecognizer};
use crate::settings::EngineSettings;

/// Capture budget held back for removing the job after it ends.
pub const CLEANUP_MARGIN: Duration = Duration::from_secs(3);

/// How long a transcription job may run once `elapsed` of the capture
/// budget has gone to waiting for the clip.
///
/// The job notices its deadline only after a poll, so one interval is held
/// back besides [`CLEANUP_MARGIN`]. `None` when less than one further poll
/// would fit.
pub fn job_deadline(budget: Duration, elapsed: Duration, poll_interval: Duration) -> Option<Duration> {
    let remaining = budget
        .saturating_sub(elapsed)
        .checked_sub(CLEANUP_MARGIN + poll_interval)?;
    (remaining >= poll_interval).then_some(remaining)
}

/// A recorded answer already stored in the bucket.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub key: String,
    pub media_format: MediaFormat,
}

/// Where recorded clips come from (microphone pipeline, file picker, ...).
#[async_trait]
pub trait ClipSource: Send + Sync {
    /// Next clip for `locale`, or `None` once the source is exhausted.
    async fn next_clip(&self, locale: Locale) -> Option<AudioClip>;
}

pub struct TranscribeRecognizer {
    config: aws_config::SdkConfig,
    bucket: String,
    clips: Arc<dyn ClipSource>,
    poll_interval: Duration,
    /// Should equal the capture timeout the recognizer runs under.
    capture_budget: Duration,
}

impl TranscribeRecognizer {
    pub fn new(
        config: aws_config::SdkConfig,
        bucket: impl Into<String>,
        clips: Arc<dyn ClipSource>,
    ) -> Self {
        Self {
            config,
            bucket: bucket.into(),
            clips,
            poll_interval: Duration::from_secs(2),
            capture_budget: EngineSettings::default().capture_timeout,
        }
    }

    /// Poll the job every `interval`, fitting each job inside
    /// `capture_budget` measured from the start of the capture.
    pub fn with_polling(mut self, interval: Duration, capture_budget: Duration) -> Self {
        self.poll_interval = interval;
        self.capture_budget = capture_budget;
        self
    }
}

#[async_trait]
impl SpeechRecognizer for TranscribeRecognizer {
    fn is_available(&self) -> bool {
        !self.bucket.is_empty()
    }

    async fn recognize(&self, locale: Locale) -> CaptureOutcome {
        let started = tokio::time::Instant::now();
        let Some(clip) = self.clips.next_clip(locale).await else {
            return CaptureOutcome::Error(CaptureErrorKind::Unsupported);
        };
        let Some(deadline) = job_deadline(self.capture_budget, started.elapsed(), self.poll_interval)
        else {
            warn!(audio_key = clip.key, "clip arrived too late to transcribe");
            return CaptureOutcome::Timeout;
        };

        let job = TranscribeJob {
            bucket: self.bucket.clone(),
            audio_key: clip.key,
            media_format: clip.media_format,
            locale,
            poll_interval: self.poll_interval,
            deadline,
        };

        match arogya_transcribe::transcribe_audio(&self.config, &job).await {
            Ok(text) if text.is_empty() => CaptureOutcome::Error(CaptureErrorKind::NoSpeech),
            Ok(text) => CaptureOutcome::Result(text),
            Err(e) => {
                warn!(error = %e, audio_key = job.audio_key, "transcription failed");
                CaptureOutcome::Error(CaptureErrorKind::Transient)
            }
        }
    }
}
