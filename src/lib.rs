//! Notescribe - a transcription service and CLI for lectures and recordings
//!
//! This library turns heterogeneous inputs - YouTube video identifiers,
//! uploaded audio files, and raw microphone captures - into one normalized
//! transcript representation, and layers note storage, summarization, and
//! document export on top of it.

pub mod backend;
pub mod cli;
pub mod config;
pub mod export;
pub mod http;
pub mod job;
pub mod notes;
pub mod render;
pub mod segment;
pub mod source;
pub mod summarize;

pub use backend::AsrChoice;
pub use cli::{Cli, Commands, Method};
pub use config::Config;
pub use job::{JobError, JobOutput, TranscriptionPipeline};
pub use render::RenderMode;
pub use segment::{TranscriptSegment, TranscriptSequence};
pub use source::SourceKind;

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;
