use async_trait::async_trait;
use std::path::Path;

use crate::segment::TranscriptSequence;

pub mod captions;
pub mod google;
pub mod whisper;

pub use captions::CaptionClient;
pub use google::GoogleSpeechBackend;
pub use whisper::WhisperBackend;

/// Failure taxonomy shared by every transcription backend.
///
/// Adapters classify their own failures; nothing upstream reclassifies
/// across kinds.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Captions are disabled or absent for the requested video. A normal
    /// outcome, surfaced as an empty sequence with a message, not a fault.
    #[error("no transcript available for this source")]
    NoTranscript,

    /// The recognizer ran but produced no usable text.
    #[error("speech recognition could not understand the audio")]
    UnintelligibleAudio,

    /// The staged artifact is empty, unreadable, or otherwise unusable.
    #[error("staged artifact is invalid: {0}")]
    ArtifactInvalid(String),

    /// The backend service or process is unreachable or failed. Retrying is
    /// a caller-layer decision; adapters never retry internally.
    #[error("backend transport failure: {0}")]
    Transport(String),
}

/// Which speech-to-text engine handles an audio-backed job.
///
/// A closed set: adding an engine is a compile-time-visible change, matched
/// exhaustively wherever a backend is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsrChoice {
    /// On-device Whisper CLI
    Whisper,
    /// Google Speech cloud recognizer
    Google,
}

impl AsrChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            AsrChoice::Whisper => "whisper",
            AsrChoice::Google => "google",
        }
    }
}

impl std::fmt::Display for AsrChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform capability implemented by the audio-backed adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AsrBackend: Send + Sync {
    /// Engine name for logs and the CLI listing.
    fn name(&self) -> &'static str;

    /// Run full-file speech-to-text over a staged audio artifact and
    /// normalize the provider output into the common segment model.
    async fn transcribe(&self, artifact: &Path) -> Result<TranscriptSequence, BackendError>;
}

/// Check if a command is available in PATH.
pub(crate) async fn command_available(command: &str) -> bool {
    tokio::process::Command::new(command)
        .arg("-version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Reject artifacts that are missing, unreadable, or zero bytes before
/// handing them to a provider.
pub(crate) fn verify_artifact(artifact: &Path) -> Result<(), BackendError> {
    let metadata = fs_err::metadata(artifact)
        .map_err(|e| BackendError::ArtifactInvalid(format!("{}: {}", artifact.display(), e)))?;

    if metadata.len() == 0 {
        return Err(BackendError::ArtifactInvalid(format!(
            "{} is empty",
            artifact.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_byte_artifact_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        fs_err::write(&path, b"").unwrap();

        assert!(matches!(
            verify_artifact(&path),
            Err(BackendError::ArtifactInvalid(_))
        ));
    }

    #[test]
    fn missing_artifact_is_invalid() {
        assert!(matches!(
            verify_artifact(Path::new("/nonexistent/clip.wav")),
            Err(BackendError::ArtifactInvalid(_))
        ));
    }

    #[test]
    fn nonempty_artifact_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        fs_err::write(&path, b"RIFF").unwrap();

        assert!(verify_artifact(&path).is_ok());
    }
}
