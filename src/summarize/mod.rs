use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::SummarizerConfig;

const CHAT_COMPLETIONS_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Instructions for turning a raw lecture transcript into one continuous
/// academic summary. Kept strict: no headings, no lists, no invented
/// content.
const SYSTEM_PROMPT: &str = r#"You are an expert academic summarizer.

You will be given the COMPLETE lecture transcript.
Your task is to rewrite it into ONE continuous, detailed summary
that faithfully covers EVERYTHING said in the lecture.

ABSOLUTE RULES:
1. Do NOT add headings, subheadings, bullet points, or lists.
2. Do NOT include sections like "key takeaways", "summary", or "conclusion".
3. Do NOT invent, generalize, or abstract content.
4. Every idea in the output MUST come directly from the transcript.
5. Preserve the original order and logical flow of the lecture.

CONTENT RULES:
- Rewrite spoken language into clear academic prose.
- Remove filler words, repetitions, greetings, and pauses,
  but NEVER remove meaningful information.
- If an idea is repeated, merge it naturally into one explanation.

SCIENTIFIC & TECHNICAL FORMATTING:
- Convert spoken mathematics into proper notation:
  "x square" becomes \( x^2 \), "log base 2 of n" becomes \( \log_2(n) \).
- Preserve equations, formulas, and definitions exactly.
- Format any code or pseudo-code in fenced blocks.

ANTI-HALLUCINATION CHECK:
If the transcript lacks concrete educational content, output ONLY:
"ERROR: Transcript does not contain sufficient information to generate a detailed lecture summary."

OUTPUT FORMAT:
Plain text paragraphs only. No titles. No lists. No headings.
Academic, neutral tone."#;

#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("summarizer API key not configured (set GROQ_API_KEY)")]
    MissingApiKey,

    #[error("summarization request failed: {0}")]
    Request(String),

    #[error("summarizer returned no content")]
    EmptyResponse,
}

/// Client for the Groq OpenAI-compatible chat-completions endpoint.
///
/// Consumes merged transcript text only; it never calls into the
/// transcription pipeline.
pub struct Summarizer {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    temperature: f64,
}

impl Summarizer {
    pub fn new(config: &SummarizerConfig) -> Self {
        Self::with_api_key(config, std::env::var("GROQ_API_KEY").ok())
    }

    pub fn with_api_key(config: &SummarizerConfig, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a continuous summary of merged transcript text.
    pub async fn summarize(&self, transcript: &str) -> Result<String, SummarizeError> {
        let api_key = self.api_key.as_deref().ok_or(SummarizeError::MissingApiKey)?;

        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: transcript,
                },
            ],
        };

        tracing::info!(model = %self.model, chars = transcript.len(), "requesting summary");

        let response = self
            .http
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SummarizeError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(SummarizeError::Request(format!("HTTP {}: {}", status, detail)));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummarizeError::Request(format!("malformed completion: {}", e)))?;

        let summary = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if summary.trim().is_empty() {
            return Err(SummarizeError::EmptyResponse);
        }

        Ok(summary)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}
