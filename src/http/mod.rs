use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::job::TranscriptionPipeline;
use crate::notes::NoteStore;
use crate::summarize::Summarizer;

pub mod error;
pub mod routes;

/// Shared service state. The pipeline is stateless per request; notes and
/// summarizer are the only cross-request collaborators.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TranscriptionPipeline>,
    pub notes: NoteStore,
    pub summarizer: Arc<Summarizer>,
}

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/transcript", post(routes::transcript))
        .route("/api/transcribe-audio", post(routes::transcribe_audio))
        .route("/api/transcribe-google", post(routes::transcribe_google))
        .route("/api/notes", get(routes::list_notes).post(routes::save_note))
        .route("/api/notes/:filename", get(routes::get_note))
        .route("/api/summarize", post(routes::summarize))
        .route("/api/export-document", post(routes::export_document))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP transcription service until shutdown.
pub async fn serve(config: Config, host: Option<String>, port: Option<u16>) -> crate::Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let max_upload_bytes = config.server.max_upload_bytes;

    let notes = NoteStore::new(&config.storage.notes_dir);
    let summarizer = Arc::new(Summarizer::new(&config.summarizer));
    if !summarizer.is_configured() {
        tracing::warn!("GROQ_API_KEY not set; summarization requests will fail");
    }
    let pipeline = Arc::new(TranscriptionPipeline::new(config)?);

    let state = AppState {
        pipeline,
        notes,
        summarizer,
    };
    let app = build_router(state, max_upload_bytes);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Transcript service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
