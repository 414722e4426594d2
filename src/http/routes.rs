use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{error::ApiError, AppState};
use crate::backend::AsrChoice;
use crate::segment::TranscriptSegment;
use crate::source::{self, SourceKind};

#[derive(Debug, Serialize)]
pub struct SegmentDto {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

impl From<&TranscriptSegment> for SegmentDto {
    fn from(segment: &TranscriptSegment) -> Self {
        Self {
            text: segment.text.clone(),
            start: segment.start,
            duration: segment.duration,
        }
    }
}

/// One merged span, the "no timeline" shape of the caption endpoint.
#[derive(Debug, Serialize)]
pub struct SpanDto {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CaptionResponse {
    #[serde(rename = "videoId")]
    pub video_id: String,
    pub transcripts: Vec<SpanDto>,
    #[serde(rename = "totalSegments")]
    pub total_segments: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AudioResponse {
    pub filename: String,
    pub transcripts: Vec<SegmentDto>,
    #[serde(rename = "totalSegments")]
    pub total_segments: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<&'static str>,
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "notescribe transcript service is running"
    }))
}

#[derive(Debug, Deserialize)]
pub struct TranscriptRequest {
    pub url: Option<String>,
}

/// Fetch platform captions for a video URL or bare identifier.
///
/// Captions disabled is a successful empty response with a message, never an
/// error status.
pub async fn transcript(
    State(state): State<AppState>,
    Json(body): Json<TranscriptRequest>,
) -> Result<Json<CaptionResponse>, ApiError> {
    let url = body
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("YouTube URL is required".to_string()))?;

    let video_id = source::extract_video_id(&url).unwrap_or_else(|| url.clone());

    let output = state
        .pipeline
        .run(
            SourceKind::Captions {
                video_id: video_id.clone(),
            },
            AsrChoice::Whisper,
        )
        .await?;

    let transcripts = if output.sequence.is_empty() {
        Vec::new()
    } else {
        let span = output.sequence.to_single_span();
        vec![SpanDto {
            start: span.start,
            end: span.start + span.duration,
            text: span.text,
        }]
    };

    Ok(Json(CaptionResponse {
        video_id,
        total_segments: transcripts.len(),
        transcripts,
        message: output.message,
    }))
}

/// Transcribe an uploaded audio file with the on-device engine.
pub async fn transcribe_audio(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AudioResponse>, ApiError> {
    run_audio_job(state, multipart, AsrChoice::Whisper, None).await
}

/// Transcribe an uploaded audio file with the cloud recognizer.
pub async fn transcribe_google(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AudioResponse>, ApiError> {
    run_audio_job(state, multipart, AsrChoice::Google, Some("Google Speech Recognition")).await
}

async fn run_audio_job(
    state: AppState,
    mut multipart: Multipart,
    choice: AsrChoice,
    method: Option<&'static str>,
) -> Result<Json<AudioResponse>, ApiError> {
    let (filename, bytes) = read_audio_field(&mut multipart).await?;

    if filename.is_empty() {
        return Err(ApiError::BadRequest("No file selected".to_string()));
    }

    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }

    // A capture without a filename extension comes from the browser
    // recorder and is staged as WebM; everything else must carry an
    // allowed audio extension.
    let source = match source::audio_extension(&filename) {
        Ok(extension) => SourceKind::UploadedAudio { bytes, extension },
        Err(_) if !filename.contains('.') => SourceKind::LiveCapture { bytes },
        Err(err) => return Err(ApiError::BadRequest(err.to_string())),
    };

    tracing::info!(%filename, backend = choice.as_str(), "audio transcription request");

    let output = state.pipeline.run(source, choice).await?;

    let transcripts: Vec<SegmentDto> = output.sequence.segments().iter().map(SegmentDto::from).collect();

    Ok(Json(AudioResponse {
        filename,
        total_segments: transcripts.len(),
        transcripts,
        message: output.message,
        method,
    }))
}

/// Pull the `audio` part out of a multipart upload.
async fn read_audio_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("audio") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read audio field: {}", e)))?;

        return Ok((filename, bytes.to_vec()));
    }

    Err(ApiError::BadRequest("No audio file provided".to_string()))
}

#[derive(Debug, Serialize)]
pub struct NoteDto {
    pub filename: String,
    pub title: String,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub async fn list_notes(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let notes: Vec<NoteDto> = state
        .notes
        .list()?
        .into_iter()
        .map(|n| NoteDto {
            filename: n.filename,
            title: n.title,
            created_at: n.created_at,
        })
        .collect();

    Ok(Json(json!({ "notes": notes })))
}

#[derive(Debug, Deserialize)]
pub struct SaveNoteRequest {
    pub content: Option<String>,
}

pub async fn save_note(
    State(state): State<AppState>,
    Json(body): Json<SaveNoteRequest>,
) -> Result<Json<Value>, ApiError> {
    let content = body
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Content is required".to_string()))?;

    let filename = state.notes.save(&content)?;

    Ok(Json(json!({ "message": "Note saved", "filename": filename })))
}

pub async fn get_note(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let content = state.notes.get(&filename)?;
    Ok(Json(json!({ "content": content })))
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub content: Option<String>,
}

/// Render markdown-flavored content (typically a saved note or summary) as
/// word-processor-ready text.
pub async fn export_document(
    Json(body): Json<ExportRequest>,
) -> Result<Json<Value>, ApiError> {
    let content = body
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Content is required".to_string()))?;

    Ok(Json(json!({ "document": crate::export::render_document(&content) })))
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub transcript: Option<String>,
}

pub async fn summarize(
    State(state): State<AppState>,
    Json(body): Json<SummarizeRequest>,
) -> Result<Json<Value>, ApiError> {
    let transcript = body
        .transcript
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Transcript text is required".to_string()))?;

    let summary = state.summarizer.summarize(&transcript).await?;

    Ok(Json(json!({ "summary": summary })))
}
