use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::BackendError;
use crate::segment::{TranscriptSegment, TranscriptSequence};

const TIMEDTEXT_URL: &str = "https://www.youtube.com/api/timedtext";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches platform captions for a video identifier.
///
/// Captions are the source of truth when available: zero compute cost and
/// exact timing. A video with captions disabled is a normal outcome
/// (`NoTranscript`), not a transport failure.
pub struct CaptionClient {
    http: reqwest::Client,
    language: String,
}

impl CaptionClient {
    pub fn new(language: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            language: language.into(),
        }
    }

    /// Fetch the caption track for a video in the configured language.
    pub async fn fetch(&self, video_id: &str) -> Result<TranscriptSequence, BackendError> {
        let url = Url::parse_with_params(
            TIMEDTEXT_URL,
            &[
                ("v", video_id),
                ("lang", self.language.as_str()),
                ("fmt", "json3"),
            ],
        )
        .map_err(|e| BackendError::Transport(format!("invalid caption request: {}", e)))?;

        tracing::debug!(video_id, language = %self.language, "fetching caption track");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| BackendError::Transport(format!("caption fetch failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NoTranscript);
        }

        if !response.status().is_success() {
            return Err(BackendError::Transport(format!(
                "caption service returned HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Transport(format!("caption read failed: {}", e)))?;

        parse_timed_text(&body)
    }
}

#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
struct TimedTextEvent {
    #[serde(rename = "tStartMs")]
    start_ms: Option<u64>,

    #[serde(rename = "dDurationMs")]
    duration_ms: Option<u64>,

    #[serde(default)]
    segs: Vec<TimedTextSeg>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSeg {
    #[serde(default)]
    utf8: String,
}

/// Normalize a `json3` timedtext payload into the segment model.
///
/// The endpoint answers an empty body (or a track with no text events) for
/// videos whose captions are disabled; both map to `NoTranscript`.
fn parse_timed_text(body: &str) -> Result<TranscriptSequence, BackendError> {
    if body.trim().is_empty() {
        return Err(BackendError::NoTranscript);
    }

    let timed: TimedText = serde_json::from_str(body)
        .map_err(|e| BackendError::Transport(format!("malformed caption payload: {}", e)))?;

    let mut segments = Vec::new();
    for event in timed.events {
        let text = event
            .segs
            .iter()
            .map(|s| s.utf8.as_str())
            .collect::<String>();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let start = event.start_ms.unwrap_or(0) as f64 / 1000.0;
        let duration = event.duration_ms.unwrap_or(0) as f64 / 1000.0;
        segments.push(TranscriptSegment::new(text, start, duration));
    }

    if segments.is_empty() {
        return Err(BackendError::NoTranscript);
    }

    Ok(TranscriptSequence::new(segments))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_events_into_segments() {
        let body = r#"{
            "events": [
                {"tStartMs": 0, "dDurationMs": 1500, "segs": [{"utf8": "Hello "}, {"utf8": "world"}]},
                {"tStartMs": 1500, "dDurationMs": 2000, "segs": [{"utf8": "again"}]}
            ]
        }"#;

        let sequence = parse_timed_text(body).unwrap();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.segments()[0].text, "Hello world");
        assert_eq!(sequence.segments()[0].start, 0.0);
        assert_eq!(sequence.segments()[0].duration, 1.5);
        assert_eq!(sequence.segments()[1].start, 1.5);
    }

    #[test]
    fn newline_only_events_are_skipped() {
        let body = r#"{
            "events": [
                {"tStartMs": 0, "dDurationMs": 100, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 100, "dDurationMs": 900, "segs": [{"utf8": "speech"}]}
            ]
        }"#;

        let sequence = parse_timed_text(body).unwrap();
        assert_eq!(sequence.len(), 1);
        assert_eq!(sequence.segments()[0].text, "speech");
    }

    #[test]
    fn empty_body_means_no_transcript() {
        assert!(matches!(
            parse_timed_text(""),
            Err(BackendError::NoTranscript)
        ));
    }

    #[test]
    fn track_without_text_means_no_transcript() {
        assert!(matches!(
            parse_timed_text(r#"{"events": []}"#),
            Err(BackendError::NoTranscript)
        ));
    }

    #[test]
    fn malformed_payload_is_a_transport_failure() {
        assert!(matches!(
            parse_timed_text("<html>captcha</html>"),
            Err(BackendError::Transport(_))
        ));
    }
}
