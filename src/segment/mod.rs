use serde::{Deserialize, Serialize};

/// A timestamped span of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Transcribed text for this span
    pub text: String,

    /// Start offset in seconds from the beginning of the source
    pub start: f64,

    /// Length of the span in seconds. Zero only for the synthetic
    /// whole-file fallback segment.
    pub duration: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// An ordered sequence of transcript segments produced by a single job.
///
/// Segment starts are non-decreasing. An empty sequence is a valid
/// "no speech / no captions" result, distinct from a failed job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSequence {
    segments: Vec<TranscriptSegment>,
}

impl TranscriptSequence {
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        Self { segments }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[TranscriptSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Join all segment texts with single spaces and collapse whitespace
    /// runs, producing a transcript independent of segment boundaries.
    pub fn merge_to_text(&self) -> String {
        let joined = self
            .segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        joined.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Collapse the sequence into one segment spanning from zero to the end
    /// of the last segment, carrying the merged text.
    ///
    /// An empty sequence yields an empty-text segment with zero duration;
    /// callers treat that as "no content", not an error.
    pub fn to_single_span(&self) -> TranscriptSegment {
        let end = self
            .segments
            .last()
            .map(|s| s.start + s.duration)
            .unwrap_or(0.0);

        TranscriptSegment::new(self.merge_to_text(), 0.0, end)
    }
}

impl From<Vec<TranscriptSegment>> for TranscriptSequence {
    fn from(segments: Vec<TranscriptSegment>) -> Self {
        Self::new(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TranscriptSequence {
        TranscriptSequence::new(vec![
            TranscriptSegment::new("Hello  world", 0.0, 1.5),
            TranscriptSegment::new(" this is ", 1.5, 2.0),
            TranscriptSegment::new("a test", 3.5, 1.0),
        ])
    }

    #[test]
    fn merge_collapses_whitespace_and_preserves_order() {
        let merged = sample().merge_to_text();
        assert_eq!(merged, "Hello world this is a test");
        assert!(!merged.contains("  "));
    }

    #[test]
    fn merge_of_empty_sequence_is_empty() {
        assert_eq!(TranscriptSequence::empty().merge_to_text(), "");
    }

    #[test]
    fn single_span_covers_full_range() {
        let span = sample().to_single_span();
        assert_eq!(span.start, 0.0);
        assert_eq!(span.duration, 4.5);
        assert_eq!(span.text, "Hello world this is a test");
    }

    #[test]
    fn single_span_of_empty_sequence_is_no_content() {
        let span = TranscriptSequence::empty().to_single_span();
        assert_eq!(span.text, "");
        assert_eq!(span.duration, 0.0);
    }
}
