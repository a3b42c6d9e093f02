mod common;

use std::time::Duration;

use arogya_core::models::intake::Locale;
use arogya_intake::IntakeError;
use arogya_intake::SessionEvent;
use arogya_intake::capture::{CaptureAdapter, CaptureErrorKind, CaptureOutcome};
use tokio::sync::mpsc;

use common::ScriptedRecognizer;

async fn next_outcome(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> (u64, CaptureOutcome) {
    match rx.recv().await {
        Some(SessionEvent::Capture { epoch, outcome, .. }) => (epoch, outcome),
        other => panic!("expected capture event, got {other:?}"),
    }
}

#[tokio::test]
async fn recognized_text_is_delivered_once() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut adapter = CaptureAdapter::new(ScriptedRecognizer::answers(&["yes"]), Duration::from_secs(1));

    let ticket = adapter.begin(7, Locale::Default, tx).unwrap();
    assert!(adapter.is_busy());
    assert_eq!(next_outcome(&mut rx).await, (7, CaptureOutcome::Result("yes".to_string())));

    assert!(adapter.complete(ticket));
    assert!(!adapter.complete(ticket));
    assert!(!adapter.is_busy());
}

#[tokio::test]
async fn unavailable_recognizer_reports_unsupported() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let recognizer = ScriptedRecognizer::unavailable();
    let mut adapter = CaptureAdapter::new(recognizer.clone(), Duration::from_secs(1));

    adapter.begin(1, Locale::Local, tx).unwrap();
    assert_eq!(
        next_outcome(&mut rx).await.1,
        CaptureOutcome::Error(CaptureErrorKind::Unsupported)
    );
    assert_eq!(recognizer.calls(), 0);
}

#[tokio::test]
async fn silence_times_out() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut adapter = CaptureAdapter::new(ScriptedRecognizer::silent(), Duration::from_millis(50));

    adapter.begin(1, Locale::Default, tx).unwrap();
    assert_eq!(next_outcome(&mut rx).await.1, CaptureOutcome::Timeout);
}

#[tokio::test]
async fn blank_text_is_no_speech() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut adapter = CaptureAdapter::new(ScriptedRecognizer::answers(&[" \n"]), Duration::from_secs(1));

    adapter.begin(1, Locale::Default, tx).unwrap();
    assert_eq!(
        next_outcome(&mut rx).await.1,
        CaptureOutcome::Error(CaptureErrorKind::NoSpeech)
    );
}

#[tokio::test]
async fn only_one_capture_in_flight() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut adapter = CaptureAdapter::new(ScriptedRecognizer::silent(), Duration::from_secs(1));

    adapter.begin(1, Locale::Default, tx.clone()).unwrap();
    assert!(matches!(adapter.begin(1, Locale::Default, tx), Err(IntakeError::Busy)));
}

#[tokio::test]
async fn cancelled_capture_delivers_nothing() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut adapter = CaptureAdapter::new(ScriptedRecognizer::answers(&["yes"]), Duration::from_secs(1));

    adapter.begin(1, Locale::Default, tx.clone()).unwrap();
    adapter.cancel();
    assert!(!adapter.is_busy());

    let waited = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(waited.is_err(), "cancelled capture delivered {waited:?}");
    drop(tx);
}

#[test]
fn retryable_kinds() {
    assert!(CaptureErrorKind::NoSpeech.is_retryable());
    assert!(CaptureErrorKind::Transient.is_retryable());
    assert!(!CaptureErrorKind::Unsupported.is_retryable());
    assert!(!CaptureErrorKind::DeviceDenied.is_retryable());
}

mod transcribe_budget {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use arogya_core::models::intake::Locale;
    use arogya_intake::capture::transcribe::{
        AudioClip, CLEANUP_MARGIN, ClipSource, TranscribeRecognizer, job_deadline,
    };
    use arogya_intake::capture::{CaptureOutcome, SpeechRecognizer};
    use arogya_transcribe::MediaFormat;

    const POLL: Duration = Duration::from_secs(2);

    #[test]
    fn job_gets_what_the_capture_has_left() {
        let deadline = job_deadline(Duration::from_secs(60), Duration::from_secs(10), POLL);
        assert_eq!(deadline, Some(Duration::from_secs(50) - CLEANUP_MARGIN - POLL));
    }

    #[test]
    fn job_always_ends_inside_the_capture() {
        for (budget, elapsed) in [(60, 0), (60, 30), (30, 5), (120, 100)] {
            let budget = Duration::from_secs(budget);
            let elapsed = Duration::from_secs(elapsed);
            let deadline = job_deadline(budget, elapsed, POLL).unwrap();
            // Last poll may start just before the deadline.
            assert!(elapsed + deadline + POLL + CLEANUP_MARGIN <= budget);
        }
    }

    #[test]
    fn no_job_when_budget_is_spent() {
        assert_eq!(job_deadline(Duration::from_secs(60), Duration::from_secs(58), POLL), None);
        assert_eq!(job_deadline(Duration::from_secs(60), Duration::from_secs(90), POLL), None);
        assert_eq!(job_deadline(Duration::from_secs(5), Duration::ZERO, POLL), None);
    }

    struct ReadyClip;

    #[async_trait]
    impl ClipSource for ReadyClip {
        async fn next_clip(&self, _locale: Locale) -> Option<AudioClip> {
            Some(AudioClip {
                key: "audio/run/clip.wav".to_string(),
                media_format: MediaFormat::Wav,
            })
        }
    }

    #[tokio::test]
    async fn late_clip_times_out_without_starting_a_job() {
        let config = aws_config::SdkConfig::builder().build();
        let recognizer = TranscribeRecognizer::new(config, "arogya-test", Arc::new(ReadyClip))
            .with_polling(POLL, Duration::from_secs(4));

        assert_eq!(recognizer.recognize(Locale::Default).await, CaptureOutcome::Timeout);
    }
}
