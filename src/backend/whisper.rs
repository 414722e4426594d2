use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::{verify_artifact, AsrBackend, BackendError};
use crate::segment::{TranscriptSegment, TranscriptSequence};

/// On-device speech-to-text via the Whisper CLI.
///
/// The model runs as an external process with JSON output; this adapter
/// stages nothing itself, it only normalizes the provider's segment format
/// (`text` + `start` + `end`) into the common model.
pub struct WhisperBackend {
    binary: String,
    model: String,
    language: String,
}

impl WhisperBackend {
    pub fn new(
        binary: impl Into<String>,
        model: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            binary: binary.into(),
            model: model.into(),
            language: language.into(),
        }
    }

    /// Check if the whisper binary is available on this machine.
    pub async fn check_availability(&self) -> bool {
        Command::new(&self.binary)
            .arg("--help")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    async fn run_whisper(&self, artifact: &Path, output_dir: &Path) -> Result<(), BackendError> {
        tracing::debug!(artifact = %artifact.display(), model = %self.model, "running whisper");

        let output = Command::new(&self.binary)
            .args([
                "--model",
                &self.model,
                "--language",
                &self.language,
                "--output_format",
                "json",
                "--output_dir",
                &output_dir.to_string_lossy(),
                "--fp16",
                "False",
                &artifact.to_string_lossy(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| BackendError::Transport(format!("failed to run whisper: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::Transport(format!("whisper failed: {}", stderr)));
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    text: String,

    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

/// Map whisper's native `{text, start, end}` segments to
/// `{text, start, duration}`. When the provider returns whole-file text with
/// no per-segment breakdown, synthesize one segment at `start=0, duration=0`
/// so "no segmentation" never becomes "no output".
fn normalize(raw: WhisperOutput) -> TranscriptSequence {
    let mut segments: Vec<TranscriptSegment> = raw
        .segments
        .into_iter()
        .filter_map(|s| {
            let text = s.text.trim();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment::new(text, s.start, (s.end - s.start).max(0.0)))
        })
        .collect();

    if segments.is_empty() {
        let text = raw.text.trim();
        if !text.is_empty() {
            segments.push(TranscriptSegment::new(text, 0.0, 0.0));
        }
    }

    TranscriptSequence::new(segments)
}

#[async_trait]
impl AsrBackend for WhisperBackend {
    fn name(&self) -> &'static str {
        "Whisper (on-device)"
    }

    async fn transcribe(&self, artifact: &Path) -> Result<TranscriptSequence, BackendError> {
        verify_artifact(artifact)?;

        let output_dir = tempfile::tempdir()
            .map_err(|e| BackendError::Transport(format!("failed to create whisper output dir: {}", e)))?;

        self.run_whisper(artifact, output_dir.path()).await?;

        // Whisper writes <stem>.json next to its other outputs
        let stem = artifact
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                BackendError::ArtifactInvalid(format!("{} has no file stem", artifact.display()))
            })?;
        let json_path = output_dir.path().join(format!("{}.json", stem));

        let raw = fs_err::read_to_string(&json_path)
            .map_err(|e| BackendError::Transport(format!("whisper produced no output: {}", e)))?;

        let parsed: WhisperOutput = serde_json::from_str(&raw)
            .map_err(|e| BackendError::Transport(format!("malformed whisper output: {}", e)))?;

        Ok(normalize(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_normalize_to_start_and_duration() {
        let raw = WhisperOutput {
            text: "Hi there".to_string(),
            segments: vec![
                WhisperSegment {
                    start: 0.0,
                    end: 1.0,
                    text: " Hi".to_string(),
                },
                WhisperSegment {
                    start: 1.0,
                    end: 2.0,
                    text: " there".to_string(),
                },
            ],
        };

        let sequence = normalize(raw);
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.segments()[0].text, "Hi");
        assert_eq!(sequence.segments()[0].start, 0.0);
        assert_eq!(sequence.segments()[0].duration, 1.0);
        assert_eq!(sequence.segments()[1].text, "there");
        assert_eq!(sequence.segments()[1].start, 1.0);
        assert_eq!(sequence.segments()[1].duration, 1.0);
    }

    #[test]
    fn whole_file_text_without_segments_becomes_one_segment() {
        let raw = WhisperOutput {
            text: "  lecture recording  ".to_string(),
            segments: Vec::new(),
        };

        let sequence = normalize(raw);
        assert_eq!(sequence.len(), 1);
        assert_eq!(sequence.segments()[0].text, "lecture recording");
        assert_eq!(sequence.segments()[0].start, 0.0);
        assert_eq!(sequence.segments()[0].duration, 0.0);
    }

    #[test]
    fn silence_yields_an_empty_sequence() {
        let raw = WhisperOutput {
            text: "   ".to_string(),
            segments: Vec::new(),
        };

        assert!(normalize(raw).is_empty());
    }

    #[test]
    fn blank_segments_are_dropped() {
        let raw = WhisperOutput {
            text: "ok".to_string(),
            segments: vec![WhisperSegment {
                start: 0.0,
                end: 0.5,
                text: "  ".to_string(),
            }],
        };

        // No usable per-segment text, falls back to the whole-file text
        let sequence = normalize(raw);
        assert_eq!(sequence.len(), 1);
        assert_eq!(sequence.segments()[0].text, "ok");
    }
}
