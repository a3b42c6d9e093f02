//! arogya-transcribe
//!
//! Audio-to-text transcription of recorded answers via Amazon Transcribe.

pub mod error;

pub use aws_sdk_transcribe::types::MediaFormat;

use std::time::Duration;

use aws_sdk_transcribe::types::{LanguageCode, Media, TranscriptionJobStatus};
use tracing::{debug, info, warn};
use uuid::Uuid;

use arogya_core::models::intake::Locale;
use arogya_core::s3_keys;

use crate::error::TranscribeError;

/// One transcription of an audio clip already uploaded to S3.
#[derive(Debug, Clone)]
pub struct TranscribeJob {
    pub bucket: String,
    pub audio_key: String,
    pub media_format: MediaFormat,
    pub locale: Locale,
    pub poll_interval: Duration,
    /// Give up polling after this long.
    pub deadline: Duration,
}

/// Transcribe an uploaded audio clip.
///
/// Starts an Amazon Transcribe job pointing at the clip, directs the output
/// to the same bucket under `_transcribe/`, polls until completion or the
/// job deadline, reads the transcript JSON from S3, then cleans up the
/// temporary output and the job. If the returned future is dropped before
/// it finishes, the cleanup still runs as a detached task.
pub async fn transcribe_audio(
    config: &aws_config::SdkConfig,
    job: &TranscribeJob,
) -> Result<String, TranscribeError> {
    let transcribe = aws_sdk_transcribe::Client::new(config);
    let s3 = aws_sdk_s3::Client::new(config);

    let job_name = format!("arogya-{}", Uuid::new_v4());
    let s3_uri = format!("s3://{}/{}", job.bucket, job.audio_key);
    let output_key = format!("{}{job_name}.json", s3_keys::TRANSCRIBE_OUTPUT_PREFIX);

    info!(job_name, s3_uri, language = job.locale.language_tag(), "starting transcription job");

    transcribe
        .start_transcription_job()
        .transcription_job_name(&job_name)
        .media(Media::builder().media_file_uri(&s3_uri).build())
        .media_format(job.media_format.clone())
        .language_code(language_code(job.locale))
        .output_bucket_name(&job.bucket)
        .output_key(&output_key)
        .send()
        .await
        .map_err(|e| TranscribeError::Api(e.into_service_error().to_string()))?;

    let cleanup = JobCleanup {
        transcribe: transcribe.clone(),
        s3: s3.clone(),
        bucket: job.bucket.clone(),
        job_name: job_name.clone(),
        output_key: output_key.clone(),
        done: false,
    };

    let started = tokio::time::Instant::now();
    loop {
        tokio::time::sleep(job.poll_interval).await;

        let resp = transcribe
            .get_transcription_job()
            .transcription_job_name(&job_name)
            .send()
            .await
            .map_err(|e| TranscribeError::Api(e.into_service_error().to_string()))?;

        let status = resp
            .transcription_job()
            .ok_or_else(|| TranscribeError::Api("no job in response".into()))?;

        match status.transcription_job_status() {
            Some(TranscriptionJobStatus::Completed) => break,
            Some(TranscriptionJobStatus::Failed) => {
                let reason = status.failure_reason().unwrap_or("unknown").to_string();
                cleanup.run().await;
                return Err(TranscribeError::JobFailed(reason));
            }
            _ if started.elapsed() >= job.deadline => {
                warn!(job_name, "transcription deadline exceeded");
                cleanup.run().await;
                return Err(TranscribeError::Deadline(job.deadline));
            }
            _ => continue,
        }
    }

    info!(job_name, "transcription complete, reading result from S3");

    let get_resp = s3
        .get_object()
        .bucket(&job.bucket)
        .key(&output_key)
        .send()
        .await
        .map_err(|e| TranscribeError::Api(format!("failed to read transcript from S3: {e}")))?;

    let body = get_resp
        .body
        .collect()
        .await
        .map_err(|e| TranscribeError::Api(format!("failed to read transcript body: {e}")))?;

    let transcript_json = String::from_utf8(body.into_bytes().to_vec())
        .map_err(|e| TranscribeError::Parse(e.to_string()))?;

    let text = extract_transcript_text(&transcript_json)?;
    cleanup.run().await;

    Ok(text)
}

/// Removes a started job and its output object.
///
/// Awaited on every path that returns normally. When the transcription
/// future is dropped instead (capture timeout, cancellation) or bails out
/// with `?`, `Drop` hands the same work to a detached task.
struct JobCleanup {
    transcribe: aws_sdk_transcribe::Client,
    s3: aws_sdk_s3::Client,
    bucket: String,
    job_name: String,
    output_key: String,
    done: bool,
}

impl JobCleanup {
    async fn run(mut self) {
        self.done = true;
        remove_job(
            &self.transcribe,
            &self.s3,
            &self.bucket,
            &self.job_name,
            &self.output_key,
        )
        .await;
    }
}

impl Drop for JobCleanup {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(job_name = self.job_name, "no runtime left, transcription job not removed");
            return;
        };

        debug!(job_name = self.job_name, "transcription abandoned, removing job in background");
        let transcribe = self.transcribe.clone();
        let s3 = self.s3.clone();
        let bucket = std::mem::take(&mut self.bucket);
        let job_name = std::mem::take(&mut self.job_name);
        let output_key = std::mem::take(&mut self.output_key);
        runtime.spawn(async move {
            remove_job(&transcribe, &s3, &bucket, &job_name, &output_key).await;
        });
    }
}

async fn remove_job(
    transcribe: &aws_sdk_transcribe::Client,
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    job_name: &str,
    output_key: &str,
) {
    // The output object only exists for completed jobs; deleting a missing
    // key succeeds.
    if let Err(e) = s3.delete_object().bucket(bucket).key(output_key).send().await {
        warn!(job_name, error = %e, "failed to delete transcript output");
    }
    if let Err(e) = transcribe
        .delete_transcription_job()
        .transcription_job_name(job_name)
        .send()
        .await
    {
        warn!(job_name, error = %e, "failed to delete transcription job");
    }
}

/// Transcribe language for a session locale.
pub fn language_code(locale: Locale) -> LanguageCode {
    match locale {
        Locale::Local => LanguageCode::HiIn,
        Locale::Default => LanguageCode::EnIn,
    }
}

/// Extract plain text from the Transcribe JSON response.
///
/// The response format is:
/// ```json
/// { "results": { "transcripts": [{ "transcript": "the text..." }] } }
/// ```
/// A response without transcripts yields an empty string (no speech).
pub fn extract_transcript_text(json: &str) -> Result<String, TranscribeError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| TranscribeError::Parse(e.to_string()))?;

    let text = value
        .get("results")
        .and_then(|r| r.get("transcripts"))
        .and_then(|t| t.as_array())
        .and_then(|arr| arr.first())
        .and_then(|t| t.get("transcript"))
        .and_then(|t| t.as_str())
        .unwrap_or("");

    Ok(text.trim().to_string())
}

/// Map a file extension to an Amazon Transcribe `MediaFormat`.
///
/// Returns `None` for extensions that aren't supported audio formats.
pub fn media_format_for_extension(ext: &str) -> Option<MediaFormat> {
    match ext.to_lowercase().as_str() {
        "mp3" => Some(MediaFormat::Mp3),
        "mp4" | "m4a" => Some(MediaFormat::Mp4),
        "wav" => Some(MediaFormat::Wav),
        "flac" => Some(MediaFormat::Flac),
        "ogg" => Some(MediaFormat::Ogg),
        "amr" => Some(MediaFormat::Amr),
        "webm" => Some(MediaFormat::Webm),
        _ => None,
    }
}
