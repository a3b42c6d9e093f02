//! Terminal stand-ins for the speech collaborators.
//!
//! A single reader thread owns the input stream and forwards lines over a
//! channel, so a capture that times out or is cancelled never strands a
//! blocking read: the next capture simply receives the next line.

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use tokio::sync::{Mutex, mpsc};
use tracing::warn;
use uuid::Uuid;

use arogya_core::models::intake::Locale;
use arogya_core::s3_keys;
use arogya_intake::capture::transcribe::{AudioClip, ClipSource};
use arogya_intake::capture::{CaptureErrorKind, CaptureOutcome, SpeechRecognizer};
use arogya_intake::error::FeedbackError;
use arogya_intake::feedback::SpeechSynthesizer;
use arogya_storage::objects::{self, WriteCondition};

/// Lines read from an input stream on a dedicated thread.
pub struct InputLines {
    rx: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl InputLines {
    pub fn spawn<R: BufRead + Send + 'static>(reader: R) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Arc::new(Self { rx: Mutex::new(rx) })
    }

    pub fn stdin() -> Arc<Self> {
        Self::spawn(std::io::BufReader::new(std::io::stdin()))
    }

    /// Next line, or `None` at end of input.
    pub async fn next_line(&self) -> Option<String> {
        self.rx.lock().await.recv().await
    }
}

fn prompt(label: &str) {
    print!("{label}");
    let _ = std::io::stdout().flush();
}

/// Typed answers stand in for speech.
pub struct ConsoleRecognizer {
    lines: Arc<InputLines>,
    echo_prompt: bool,
}

impl ConsoleRecognizer {
    pub fn new(lines: Arc<InputLines>) -> Self {
        Self {
            lines,
            echo_prompt: true,
        }
    }

    pub fn quiet(lines: Arc<InputLines>) -> Self {
        Self {
            lines,
            echo_prompt: false,
        }
    }
}

#[async_trait]
impl SpeechRecognizer for ConsoleRecognizer {
    fn is_available(&self) -> bool {
        true
    }

    async fn recognize(&self, _locale: Locale) -> CaptureOutcome {
        if self.echo_prompt {
            prompt("> ");
        }
        match self.lines.next_line().await {
            Some(line) => CaptureOutcome::Result(line.trim().to_string()),
            // Input closed: nothing more can ever be captured.
            None => CaptureOutcome::Error(CaptureErrorKind::Unsupported),
        }
    }
}

/// Prints utterances and holds the "speaker" for a time proportional to
/// their length.
pub struct ConsoleSynthesizer {
    per_word: Duration,
}

impl ConsoleSynthesizer {
    pub fn new(per_word: Duration) -> Self {
        Self { per_word }
    }
}

impl Default for ConsoleSynthesizer {
    fn default() -> Self {
        Self::new(Duration::from_millis(120))
    }
}

#[async_trait]
impl SpeechSynthesizer for ConsoleSynthesizer {
    fn is_available(&self) -> bool {
        true
    }

    async fn speak(&self, text: &str, _locale: Locale) -> Result<(), FeedbackError> {
        println!("\narogya: {text}");
        let words = text.split_whitespace().count() as u32;
        tokio::time::sleep(self.per_word * words).await;
        Ok(())
    }
}

/// Reads audio file paths from the console and uploads each file to S3
/// for transcription.
pub struct FileClipSource {
    lines: Arc<InputLines>,
    client: Client,
    bucket: String,
    /// Groups the clips of one CLI run under a common prefix.
    run_id: Uuid,
}

impl FileClipSource {
    pub fn new(lines: Arc<InputLines>, client: Client, bucket: impl Into<String>) -> Self {
        Self {
            lines,
            client,
            bucket: bucket.into(),
            run_id: Uuid::new_v4(),
        }
    }

    async fn upload(&self, path: &Path) -> eyre::Result<AudioClip> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| eyre::eyre!("{} has no file extension", path.display()))?;
        let media_format = arogya_transcribe::media_format_for_extension(extension)
            .ok_or_else(|| eyre::eyre!("unsupported audio format: .{extension}"))?;

        let body = tokio::fs::read(path).await?;
        let key = s3_keys::audio_clip(self.run_id, Uuid::new_v4(), &extension.to_lowercase());
        objects::put_object(
            &self.client,
            &self.bucket,
            &key,
            body,
            None,
            WriteCondition::Always,
        )
        .await?;

        Ok(AudioClip { key, media_format })
    }
}

#[async_trait]
impl ClipSource for FileClipSource {
    async fn next_clip(&self, _locale: Locale) -> Option<AudioClip> {
        loop {
            prompt("audio file> ");
            let line = self.lines.next_line().await?;
            let path = line.trim();
            if path.is_empty() {
                continue;
            }
            match self.upload(Path::new(path)).await {
                Ok(clip) => return Some(clip),
                Err(e) => {
                    warn!(path, error = %e, "could not upload audio clip");
                    eprintln!("could not use {path}: {e}");
                }
            }
        }
    }
}
