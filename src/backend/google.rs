use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{verify_artifact, AsrBackend, BackendError};
use crate::segment::{TranscriptSegment, TranscriptSequence};

const RECOGNIZE_URL: &str = "http://www.google.com/speech-api/v2/recognize";
const SAMPLE_RATE: u32 = 16_000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Cloud speech recognition via the Google speech-api v2 endpoint.
///
/// The recognizer wants single-channel 16 kHz PCM, so the staged artifact is
/// transcoded once with ffmpeg, reading at most the configured initial
/// window of audio. Longer inputs are silently truncated to that window —
/// a stated policy of this backend, not a defect.
pub struct GoogleSpeechBackend {
    http: reqwest::Client,
    language: String,
    api_key: Option<String>,
    window_secs: u32,
}

impl GoogleSpeechBackend {
    pub fn new(language: impl Into<String>, api_key: Option<String>, window_secs: u32) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            language: language.into(),
            api_key,
            window_secs,
        }
    }

    /// Transcode the artifact to the canonical waveform: mono, 16 kHz,
    /// signed 16-bit PCM, capped at the recognition window.
    async fn transcode_window(&self, artifact: &Path, wav_path: &Path) -> Result<(), BackendError> {
        tracing::debug!(
            artifact = %artifact.display(),
            window_secs = self.window_secs,
            "transcoding recognition window"
        );

        let output = Command::new("ffmpeg")
            .args([
                "-i",
                &artifact.to_string_lossy(),
                "-t",
                &self.window_secs.to_string(),
                "-vn",
                "-ac",
                "1",
                "-ar",
                &SAMPLE_RATE.to_string(),
                "-f",
                "wav",
                "-y",
                &wav_path.to_string_lossy(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| BackendError::Transport(format!("failed to run ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::ArtifactInvalid(format!(
                "audio transcoding failed: {}",
                stderr
            )));
        }

        Ok(())
    }

    async fn recognize(&self, waveform: Vec<u8>) -> Result<String, BackendError> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            BackendError::Transport(
                "Google speech API key not configured (set GOOGLE_SPEECH_API_KEY)".to_string(),
            )
        })?;

        let url = url::Url::parse_with_params(
            RECOGNIZE_URL,
            &[
                ("client", "chromium"),
                ("lang", self.language.as_str()),
                ("key", key),
            ],
        )
        .map_err(|e| BackendError::Transport(format!("invalid recognize request: {}", e)))?;

        let response = self
            .http
            .post(url)
            .header(
                "Content-Type",
                format!("audio/l16; rate={}", SAMPLE_RATE),
            )
            .body(waveform)
            .send()
            .await
            .map_err(|e| BackendError::Transport(format!("speech service unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(BackendError::Transport(format!(
                "speech service returned HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Transport(format!("speech response read failed: {}", e)))?;

        extract_transcript(&body)
    }
}

#[derive(Debug, Deserialize)]
struct RecognizeLine {
    #[serde(default)]
    result: Vec<RecognizeResult>,
}

#[derive(Debug, Deserialize)]
struct RecognizeResult {
    #[serde(default)]
    alternative: Vec<RecognizeAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognizeAlternative {
    #[serde(default)]
    transcript: String,
}

/// The recognize endpoint streams one JSON object per line; the first line
/// is usually an empty `{"result":[]}` placeholder. The first non-empty
/// alternative wins; none at all means the audio was unintelligible.
fn extract_transcript(body: &str) -> Result<String, BackendError> {
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parsed: RecognizeLine = match serde_json::from_str(line) {
            Ok(parsed) => parsed,
            Err(_) => continue,
        };

        for result in parsed.result {
            if let Some(alternative) = result.alternative.first() {
                let transcript = alternative.transcript.trim();
                if !transcript.is_empty() {
                    return Ok(transcript.to_string());
                }
            }
        }
    }

    Err(BackendError::UnintelligibleAudio)
}

#[async_trait]
impl AsrBackend for GoogleSpeechBackend {
    fn name(&self) -> &'static str {
        "Google Speech (cloud)"
    }

    async fn transcribe(&self, artifact: &Path) -> Result<TranscriptSequence, BackendError> {
        verify_artifact(artifact)?;

        let scratch = tempfile::tempdir()
            .map_err(|e| BackendError::Transport(format!("failed to create transcode dir: {}", e)))?;
        let wav_path = scratch.path().join("window.wav");

        self.transcode_window(artifact, &wav_path).await?;

        let waveform = fs_err::read(&wav_path)
            .map_err(|e| BackendError::ArtifactInvalid(format!("transcoded window unreadable: {}", e)))?;

        let text = self.recognize(waveform).await?;

        // One span covering the recognition window; the provider gives no
        // per-segment timing.
        Ok(TranscriptSequence::new(vec![TranscriptSegment::new(
            text,
            0.0,
            self.window_secs as f64,
        )]))
    }
}
