use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::backend::AsrChoice;

#[derive(Parser)]
#[command(
    name = "notescribe",
    about = "Notescribe - Turn YouTube videos, audio files, and voice captures into transcripts and notes",
    version,
    long_about = "A transcription toolkit for lectures and recordings. Fetches YouTube captions when available, runs on-device Whisper or the Google cloud recognizer over audio files, and serves the same pipeline over HTTP with flat-file note storage and summarization."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transcribe a YouTube video or local audio file
    Transcribe {
        /// YouTube URL, bare video ID, or path to an audio file
        #[arg(value_name = "URL_OR_FILE")]
        input: String,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Emit one merged paragraph instead of [HH:MM:SS] lines
        #[arg(long)]
        no_timestamps: bool,

        /// Treat the input as a local audio file instead of a video URL
        #[arg(long)]
        audio: bool,

        /// Speech-to-text engine for audio inputs
        #[arg(short, long, value_enum, default_value = "whisper")]
        method: Method,
    },

    /// Run the HTTP transcription service
    Serve {
        /// Bind address (overrides config)
        #[arg(long, value_name = "HOST")]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(long, value_name = "PORT")]
        port: Option<u16>,
    },

    /// List transcription backends and supported sources
    Backends,

    /// Show or initialize configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

/// Speech-to-text engine selection for audio-backed jobs.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Method {
    /// On-device Whisper CLI
    Whisper,
    /// Google Speech cloud recognizer (30-second window)
    Google,
}

impl From<Method> for AsrChoice {
    fn from(method: Method) -> Self {
        match method {
            Method::Whisper => AsrChoice::Whisper,
            Method::Google => AsrChoice::Google,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Whisper => write!(f, "whisper"),
            Method::Google => write!(f, "google"),
        }
    }
}
