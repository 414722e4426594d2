use std::io::Write;
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::backend::{
    AsrBackend, AsrChoice, BackendError, CaptionClient, GoogleSpeechBackend, WhisperBackend,
};
use crate::config::Config;
use crate::segment::TranscriptSequence;
use crate::source::{SourceKind, ALLOWED_EXTENSIONS};

const NO_CAPTIONS_MESSAGE: &str = "No captions available for this video";
const NO_SPEECH_MESSAGE: &str = "No speech detected in audio file";
const UNINTELLIGIBLE_MESSAGE: &str = "Speech recognition could not understand the audio";

/// Job failure taxonomy. "Backend found nothing" is not here: that is a
/// successful [`JobOutput`] with an empty sequence and a message.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Bad or missing caller input; surfaced immediately, never retried.
    #[error("invalid request: {0}")]
    Caller(String),

    /// Temporary-artifact creation or verification failure; fatal for the
    /// job, cleanup still runs.
    #[error("artifact failure: {0}")]
    Resource(String),

    /// Backend service or process unreachable or erroring. Bounded retry is
    /// a caller-layer decision.
    #[error("transcription service failure: {0}")]
    Transport(String),
}

/// Successful job result: a normalized sequence, plus an explanatory
/// message when the backend ran but found nothing to transcribe.
#[derive(Debug, Clone)]
pub struct JobOutput {
    pub sequence: TranscriptSequence,
    pub message: Option<String>,
}

impl JobOutput {
    fn full(sequence: TranscriptSequence) -> Self {
        Self {
            sequence,
            message: None,
        }
    }

    fn no_content(message: &str) -> Self {
        Self {
            sequence: TranscriptSequence::empty(),
            message: Some(message.to_string()),
        }
    }
}

/// Lifecycle states of one transcription job, logged at each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobState {
    Received,
    Validated,
    Staged,
    BackendInvoked,
    Normalized,
    Completed,
    Failed,
}

impl JobState {
    fn as_str(&self) -> &'static str {
        match self {
            JobState::Received => "received",
            JobState::Validated => "validated",
            JobState::Staged => "staged",
            JobState::BackendInvoked => "backend_invoked",
            JobState::Normalized => "normalized",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }
}

/// Owns the lifecycle of transcription jobs: validation, artifact staging,
/// backend invocation, normalization, and unconditional cleanup.
///
/// Jobs are request-scoped and independent; each stages its own uniquely
/// named artifact under the configured temp root, so concurrent jobs never
/// collide.
pub struct TranscriptionPipeline {
    config: Config,
    captions: CaptionClient,
    whisper: WhisperBackend,
    google: GoogleSpeechBackend,
}

impl TranscriptionPipeline {
    pub fn new(config: Config) -> crate::Result<Self> {
        fs_err::create_dir_all(&config.storage.temp_dir)?;

        let captions = CaptionClient::new(&config.transcription.caption_language);
        let whisper = WhisperBackend::new(
            &config.transcription.whisper_binary,
            &config.transcription.whisper_model,
            &config.transcription.caption_language,
        );
        let google = GoogleSpeechBackend::new(
            &config.transcription.cloud_language,
            std::env::var("GOOGLE_SPEECH_API_KEY").ok(),
            config.transcription.cloud_window_secs,
        );

        Ok(Self {
            config,
            captions,
            whisper,
            google,
        })
    }

    /// Check for required external tools. Missing tools are warnings for
    /// the caller, not failures.
    pub async fn check_dependencies(&self) -> Vec<String> {
        let mut missing = Vec::new();

        if !self.whisper.check_availability().await {
            missing.push("whisper - required for on-device transcription".to_string());
        }

        if !crate::backend::command_available("ffmpeg").await {
            missing.push("ffmpeg - required for cloud-recognition transcoding".to_string());
        }

        missing
    }

    /// Run one transcription job to completion.
    ///
    /// Exactly one backend is invoked: caption fetch for a video source, the
    /// caller-selected engine for an audio source. There is no automatic
    /// cross-backend fallback; `asr` is an explicit input.
    pub async fn run(&self, source: SourceKind, asr: AsrChoice) -> Result<JobOutput, JobError> {
        let job_id = Uuid::new_v4();
        trace_state(job_id, JobState::Received);

        match source {
            SourceKind::Captions { video_id } => self.run_captions(job_id, &video_id).await,
            SourceKind::UploadedAudio { bytes, extension } => {
                let backend = self.select_backend(asr);
                self.run_audio(job_id, backend, &bytes, &extension).await
            }
            SourceKind::LiveCapture { bytes } => {
                let backend = self.select_backend(asr);
                self.run_audio(job_id, backend, &bytes, "webm").await
            }
        }
    }

    fn select_backend(&self, asr: AsrChoice) -> &dyn AsrBackend {
        match asr {
            AsrChoice::Whisper => &self.whisper,
            AsrChoice::Google => &self.google,
        }
    }

    async fn run_captions(&self, job_id: Uuid, video_id: &str) -> Result<JobOutput, JobError> {
        if video_id.trim().is_empty() {
            trace_state(job_id, JobState::Failed);
            return Err(JobError::Caller("video identifier is required".to_string()));
        }
        trace_state(job_id, JobState::Validated);

        let result = self.captions.fetch(video_id).await;
        trace_state(job_id, JobState::BackendInvoked);

        self.finish(job_id, result, NO_CAPTIONS_MESSAGE)
    }

    async fn run_audio(
        &self,
        job_id: Uuid,
        backend: &dyn AsrBackend,
        bytes: &[u8],
        extension: &str,
    ) -> Result<JobOutput, JobError> {
        if let Err(err) = validate_audio_input(bytes, extension) {
            trace_state(job_id, JobState::Failed);
            return Err(err);
        }
        trace_state(job_id, JobState::Validated);

        let artifact = match self.stage_artifact(bytes, extension) {
            Ok(artifact) => artifact,
            Err(err) => {
                trace_state(job_id, JobState::Failed);
                return Err(err);
            }
        };
        trace_state(job_id, JobState::Staged);

        tracing::info!(%job_id, backend = backend.name(), "invoking backend");
        let timeout = std::time::Duration::from_secs(self.config.transcription.backend_timeout_secs);
        let result = match tokio::time::timeout(timeout, backend.transcribe(artifact.path())).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Transport(format!(
                "backend timed out after {}s",
                timeout.as_secs()
            ))),
        };
        trace_state(job_id, JobState::BackendInvoked);

        // Cleanup runs on every exit path. The NamedTempFile guard also
        // covers cancellation and panics between staging and here.
        release_artifact(artifact);

        self.finish(job_id, result, NO_SPEECH_MESSAGE)
    }

    /// Map a backend result into the job taxonomy. "Found nothing" outcomes
    /// become successful empty outputs; faults keep their kind — a caller
    /// fault is never reclassified as a transport fault or vice versa.
    fn finish(
        &self,
        job_id: Uuid,
        result: Result<TranscriptSequence, BackendError>,
        no_content_message: &str,
    ) -> Result<JobOutput, JobError> {
        let output = match result {
            Ok(sequence) if sequence.is_empty() => Ok(JobOutput::no_content(no_content_message)),
            Ok(sequence) => Ok(JobOutput::full(sequence)),
            Err(BackendError::NoTranscript) => Ok(JobOutput::no_content(no_content_message)),
            Err(BackendError::UnintelligibleAudio) => {
                Ok(JobOutput::no_content(UNINTELLIGIBLE_MESSAGE))
            }
            Err(BackendError::ArtifactInvalid(msg)) => Err(JobError::Resource(msg)),
            Err(BackendError::Transport(msg)) => Err(JobError::Transport(msg)),
        };

        match &output {
            Ok(out) => {
                trace_state(job_id, JobState::Normalized);
                trace_state(job_id, JobState::Completed);
                tracing::info!(%job_id, segments = out.sequence.len(), "job completed");
            }
            Err(err) => {
                trace_state(job_id, JobState::Failed);
                tracing::warn!(%job_id, error = %err, "job failed");
            }
        }

        output
    }

    /// Write upload bytes once to a uniquely named artifact under the temp
    /// root, then reverify existence and size before any backend sees it.
    fn stage_artifact(&self, bytes: &[u8], extension: &str) -> Result<NamedTempFile, JobError> {
        let mut artifact = tempfile::Builder::new()
            .prefix("upload_")
            .suffix(&format!(".{}", extension))
            .tempfile_in(&self.config.storage.temp_dir)
            .map_err(|e| JobError::Resource(format!("failed to create temporary artifact: {}", e)))?;

        artifact
            .as_file_mut()
            .write_all(bytes)
            .map_err(|e| JobError::Resource(format!("failed to write temporary artifact: {}", e)))?;
        artifact
            .as_file()
            .sync_all()
            .map_err(|e| JobError::Resource(format!("failed to flush temporary artifact: {}", e)))?;

        // Guards against partial writes before the backend is invoked
        let metadata = fs_err::metadata(artifact.path())
            .map_err(|e| JobError::Resource(format!("staged artifact disappeared: {}", e)))?;
        if metadata.len() == 0 || metadata.len() != bytes.len() as u64 {
            return Err(JobError::Resource(format!(
                "staged artifact verification failed: expected {} bytes, found {}",
                bytes.len(),
                metadata.len()
            )));
        }

        Ok(artifact)
    }
}

fn validate_audio_input(bytes: &[u8], extension: &str) -> Result<(), JobError> {
    if bytes.is_empty() {
        return Err(JobError::Caller("uploaded file is empty".to_string()));
    }

    if !ALLOWED_EXTENSIONS.contains(&extension.to_lowercase().as_str()) {
        return Err(JobError::Caller(format!(
            "unsupported audio format: {}",
            extension
        )));
    }

    Ok(())
}

fn release_artifact(artifact: NamedTempFile) {
    let path = artifact.path().display().to_string();
    if let Err(err) = artifact.close() {
        // Never let a cleanup failure mask the job's primary result
        tracing::warn!(path, error = %err, "failed to remove temporary artifact");
    }
}

fn trace_state(job_id: Uuid, state: JobState) {
    tracing::debug!(%job_id, state = state.as_str(), "job state");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockAsrBackend;
    use crate::segment::TranscriptSegment;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    fn test_pipeline() -> (TranscriptionPipeline, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.temp_dir = dir.path().join("staging");
        config.storage.notes_dir = dir.path().join("notes");
        let pipeline = TranscriptionPipeline::new(config).unwrap();
        (pipeline, dir)
    }

    /// Records the artifact path it was handed and whether it existed at
    /// invocation time, then returns a canned result.
    struct StubBackend {
        seen: Arc<Mutex<Option<PathBuf>>>,
        existed: Arc<AtomicBool>,
        result: Mutex<Option<Result<TranscriptSequence, BackendError>>>,
    }

    impl StubBackend {
        fn returning(result: Result<TranscriptSequence, BackendError>) -> Self {
            Self {
                seen: Arc::new(Mutex::new(None)),
                existed: Arc::new(AtomicBool::new(false)),
                result: Mutex::new(Some(result)),
            }
        }
    }

    #[async_trait]
    impl AsrBackend for StubBackend {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn transcribe(&self, artifact: &Path) -> Result<TranscriptSequence, BackendError> {
            *self.seen.lock().unwrap() = Some(artifact.to_path_buf());
            self.existed.store(artifact.exists(), Ordering::SeqCst);
            self.result.lock().unwrap().take().expect("single invocation")
        }
    }

    fn one_segment() -> TranscriptSequence {
        TranscriptSequence::new(vec![TranscriptSegment::new("hello", 0.0, 1.0)])
    }

    #[tokio::test]
    async fn artifact_is_removed_after_success() {
        let (pipeline, _dir) = test_pipeline();
        let stub = StubBackend::returning(Ok(one_segment()));
        let job_id = Uuid::new_v4();

        let output = pipeline
            .run_audio(job_id, &stub, b"RIFF....WAVE", "wav")
            .await
            .unwrap();

        assert_eq!(output.sequence.len(), 1);
        assert!(stub.existed.load(Ordering::SeqCst), "artifact must exist during invocation");
        let seen = stub.seen.lock().unwrap().clone().unwrap();
        assert!(!seen.exists(), "artifact must be removed after the job");
    }

    #[tokio::test]
    async fn artifact_is_removed_after_backend_failure() {
        let (pipeline, _dir) = test_pipeline();
        let stub = StubBackend::returning(Err(BackendError::Transport("unreachable".to_string())));
        let job_id = Uuid::new_v4();

        let err = pipeline
            .run_audio(job_id, &stub, b"RIFF....WAVE", "wav")
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::Transport(_)));
        let seen = stub.seen.lock().unwrap().clone().unwrap();
        assert!(!seen.exists(), "artifact must be removed after a failed job");
    }

    #[tokio::test]
    async fn staged_artifact_uses_temp_root_and_extension() {
        let (pipeline, _dir) = test_pipeline();
        let stub = StubBackend::returning(Ok(one_segment()));
        let job_id = Uuid::new_v4();

        pipeline
            .run_audio(job_id, &stub, b"payload", "mp3")
            .await
            .unwrap();

        let seen = stub.seen.lock().unwrap().clone().unwrap();
        assert!(seen.starts_with(&pipeline.config.storage.temp_dir));
        assert_eq!(seen.extension().and_then(|e| e.to_str()), Some("mp3"));
    }

    #[tokio::test]
    async fn empty_upload_is_a_caller_fault_before_staging() {
        let (pipeline, dir) = test_pipeline();
        let stub = StubBackend::returning(Ok(one_segment()));
        let job_id = Uuid::new_v4();

        let err = pipeline.run_audio(job_id, &stub, b"", "wav").await.unwrap_err();

        assert!(matches!(err, JobError::Caller(_)));
        assert!(stub.seen.lock().unwrap().is_none(), "backend must not run");
        let staged: Vec<_> = std::fs::read_dir(dir.path().join("staging"))
            .unwrap()
            .collect();
        assert!(staged.is_empty(), "no artifact may be created for rejected input");
    }

    #[tokio::test]
    async fn disallowed_extension_never_reaches_staging() {
        let (pipeline, dir) = test_pipeline();
        let stub = StubBackend::returning(Ok(one_segment()));
        let job_id = Uuid::new_v4();

        let err = pipeline
            .run_audio(job_id, &stub, b"data", "exe")
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::Caller(_)));
        let staged: Vec<_> = std::fs::read_dir(dir.path().join("staging"))
            .unwrap()
            .collect();
        assert!(staged.is_empty());
    }

    #[tokio::test]
    async fn zero_byte_staging_is_a_resource_fault_and_leaves_nothing() {
        let (pipeline, dir) = test_pipeline();

        let err = pipeline.stage_artifact(b"", "wav").unwrap_err();

        assert!(matches!(err, JobError::Resource(_)));
        let staged: Vec<_> = std::fs::read_dir(dir.path().join("staging"))
            .unwrap()
            .collect();
        assert!(staged.is_empty(), "failed staging must remove its artifact");
    }

    #[tokio::test]
    async fn artifact_invalid_maps_to_resource_fault() {
        let (pipeline, _dir) = test_pipeline();
        let stub = StubBackend::returning(Err(BackendError::ArtifactInvalid("bad file".to_string())));
        let job_id = Uuid::new_v4();

        let err = pipeline
            .run_audio(job_id, &stub, b"data", "wav")
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::Resource(_)));
    }

    #[tokio::test]
    async fn unintelligible_audio_is_a_successful_empty_result() {
        let (pipeline, _dir) = test_pipeline();
        let stub = StubBackend::returning(Err(BackendError::UnintelligibleAudio));
        let job_id = Uuid::new_v4();

        let output = pipeline
            .run_audio(job_id, &stub, b"data", "wav")
            .await
            .unwrap();

        assert!(output.sequence.is_empty());
        assert_eq!(output.message.as_deref(), Some(UNINTELLIGIBLE_MESSAGE));
    }

    #[tokio::test]
    async fn empty_backend_output_reports_no_speech() {
        let (pipeline, _dir) = test_pipeline();
        let stub = StubBackend::returning(Ok(TranscriptSequence::empty()));
        let job_id = Uuid::new_v4();

        let output = pipeline
            .run_audio(job_id, &stub, b"data", "wav")
            .await
            .unwrap();

        assert!(output.sequence.is_empty());
        assert_eq!(output.message.as_deref(), Some(NO_SPEECH_MESSAGE));
    }

    #[test]
    fn disabled_captions_map_to_empty_success() {
        let (pipeline, _dir) = test_pipeline();
        let job_id = Uuid::new_v4();

        let output = pipeline
            .finish(job_id, Err(BackendError::NoTranscript), NO_CAPTIONS_MESSAGE)
            .unwrap();

        assert!(output.sequence.is_empty());
        assert_eq!(output.sequence.len(), 0);
        assert_eq!(output.message.as_deref(), Some(NO_CAPTIONS_MESSAGE));
    }

    #[tokio::test]
    async fn live_capture_stages_as_webm() {
        let (pipeline, _dir) = test_pipeline();
        let mut mock = MockAsrBackend::new();
        mock.expect_name().return_const("mock");
        mock.expect_transcribe()
            .withf(|path| path.extension().and_then(|e| e.to_str()) == Some("webm"))
            .returning(|_| Ok(TranscriptSequence::empty()));

        let job_id = Uuid::new_v4();
        let output = pipeline
            .run_audio(job_id, &mock, b"\x1a\x45\xdf\xa3", "webm")
            .await
            .unwrap();

        assert!(output.sequence.is_empty());
    }

    #[tokio::test]
    async fn empty_video_id_is_a_caller_fault() {
        let (pipeline, _dir) = test_pipeline();

        let err = pipeline
            .run(
                SourceKind::Captions {
                    video_id: "  ".to_string(),
                },
                AsrChoice::Whisper,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::Caller(_)));
    }
}
