use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

const TITLE_PREVIEW_CHARS: usize = 50;

/// A listing entry for one saved note.
#[derive(Debug, Clone, Serialize)]
pub struct NoteSummary {
    pub filename: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("note not found: {0}")]
    NotFound(String),

    #[error("invalid note filename: {0}")]
    InvalidName(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Flat-file note store rooted at an explicitly injected directory.
///
/// Notes are plain `.txt` blobs keyed by a generated filename; listing order
/// is reverse filename order, which sorts newest first because filenames
/// embed a UTC timestamp. A uuid fragment in the name keeps concurrent saves
/// within the same second from colliding.
#[derive(Debug, Clone)]
pub struct NoteStore {
    root: PathBuf,
}

impl NoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Persist a note and return its generated filename.
    pub fn save(&self, content: &str) -> Result<String, NoteError> {
        fs_err::create_dir_all(&self.root)?;

        let fragment = Uuid::new_v4().simple().to_string();
        let filename = format!(
            "note_{}_{}.txt",
            Utc::now().format("%Y%m%d_%H%M%S"),
            &fragment[..8]
        );

        fs_err::write(self.root.join(&filename), content)?;
        tracing::debug!(filename, "saved note");

        Ok(filename)
    }

    /// List all notes, newest first.
    pub fn list(&self) -> Result<Vec<NoteSummary>, NoteError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut notes = Vec::new();
        for entry in fs_err::read_dir(&self.root)? {
            let entry = entry?;
            let filename = entry.file_name().to_string_lossy().to_string();
            if !filename.ends_with(".txt") {
                continue;
            }

            let path = entry.path();
            let content = fs_err::read_to_string(&path)?;
            let title = title_preview(&content).unwrap_or_else(|| filename.clone());

            let metadata = entry.metadata()?;
            let created_at = metadata
                .created()
                .or_else(|_| metadata.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            notes.push(NoteSummary {
                filename,
                title,
                created_at,
            });
        }

        notes.sort_by(|a, b| b.filename.cmp(&a.filename));
        Ok(notes)
    }

    /// Read one note's content by filename.
    pub fn get(&self, filename: &str) -> Result<String, NoteError> {
        validate_filename(filename)?;

        fs_err::read_to_string(self.root.join(filename)).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                NoteError::NotFound(filename.to_string())
            } else {
                NoteError::Io(err)
            }
        })
    }
}

/// Reject names that could escape the store root or point at non-note files.
fn validate_filename(filename: &str) -> Result<(), NoteError> {
    let suspicious = filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
        || !filename.ends_with(".txt");

    if suspicious {
        return Err(NoteError::InvalidName(filename.to_string()));
    }

    Ok(())
}

fn title_preview(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.chars().take(TITLE_PREVIEW_CHARS).collect())
}
