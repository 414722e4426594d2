use regex::Regex;
use std::path::Path;

/// Audio file extensions accepted for upload and local transcription.
pub const ALLOWED_EXTENSIONS: [&str; 8] = ["mp3", "wav", "m4a", "flac", "ogg", "aac", "wma", "webm"];

/// Video-sharing URL shapes recognized by the resolver. The first capture
/// group of the first matching pattern is the video identifier.
const VIDEO_ID_PATTERNS: [&str; 3] = [
    r"(?:youtube\.com/watch\?v=|youtu\.be/)([^&\n?#]+)",
    r"youtube\.com/embed/([^&\n?#]+)",
    r"youtube\.com/v/([^&\n?#]+)",
];

/// The classified input of one transcription job.
///
/// Exactly one kind is selected per job, derived from the input shape or an
/// explicit hint, never from sniffing audio content.
#[derive(Debug, Clone)]
pub enum SourceKind {
    /// Platform captions keyed by a video identifier
    Captions { video_id: String },

    /// Uploaded audio payload with its declared extension
    UploadedAudio { bytes: Vec<u8>, extension: String },

    /// Raw microphone capture from a browser recorder (WebM container)
    LiveCapture { bytes: Vec<u8> },
}

impl SourceKind {
    pub fn describe(&self) -> &'static str {
        match self {
            SourceKind::Captions { .. } => "captions",
            SourceKind::UploadedAudio { .. } => "uploaded audio",
            SourceKind::LiveCapture { .. } => "live capture",
        }
    }
}

/// Caller-supplied override for input classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceHint {
    Captions,
    AudioFile,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("unsupported audio format: {extension} (allowed: mp3, wav, m4a, flac, ogg, aac, wma, webm)")]
    UnsupportedFormat { extension: String },

    #[error("cannot read audio file {path}: {source}")]
    Unreadable {
        path: String,
        source: std::io::Error,
    },
}

/// Extract a video identifier from a known video-sharing URL shape.
/// Returns `None` for anything that matches no pattern (including bare IDs).
pub fn extract_video_id(input: &str) -> Option<String> {
    for pattern in VIDEO_ID_PATTERNS {
        let matched = Regex::new(pattern)
            .ok()
            .and_then(|re| re.captures(input).and_then(|c| c.get(1).map(|m| m.as_str().to_string())));
        if matched.is_some() {
            return matched;
        }
    }
    None
}

/// Validate a filename's extension against the allowed audio set and return
/// it lowercased.
pub fn audio_extension(filename: &str) -> Result<String, ResolveError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(ResolveError::UnsupportedFormat { extension })
    }
}

/// Classify an input token into a source kind.
///
/// Order: an explicit hint wins; then known video URL shapes; then an
/// existing filesystem path (extension-validated); otherwise the raw string
/// is treated as a caption identifier. The fallback never fails here — a bad
/// identifier surfaces later as a backend outcome, not a resolution error.
pub fn resolve(input: &str, hint: Option<SourceHint>) -> Result<SourceKind, ResolveError> {
    match hint {
        Some(SourceHint::Captions) => {
            return Ok(SourceKind::Captions {
                video_id: extract_video_id(input).unwrap_or_else(|| input.to_string()),
            });
        }
        Some(SourceHint::AudioFile) => return resolve_audio_file(input),
        None => {}
    }

    if let Some(video_id) = extract_video_id(input) {
        return Ok(SourceKind::Captions { video_id });
    }

    let is_url = input.starts_with("http://") || input.starts_with("https://");
    if !is_url && Path::new(input).is_file() {
        return resolve_audio_file(input);
    }

    Ok(SourceKind::Captions {
        video_id: input.to_string(),
    })
}

fn resolve_audio_file(path: &str) -> Result<SourceKind, ResolveError> {
    let extension = audio_extension(path)?;
    let bytes = fs_err::read(path).map_err(|source| ResolveError::Unreadable {
        path: path.to_string(),
        source,
    })?;

    Ok(SourceKind::UploadedAudio { bytes, extension })
}
