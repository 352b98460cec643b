//! Translation through OpenAI-compatible chat APIs.
//!
//! The [`TranslationService`] trait is what the driver talks to;
//! [`OpenAiTranslator`] is the HTTP implementation, with optional
//! streaming progress display.

use crate::config::{ApiConfig, TranslationConfig};
use crate::console::Console;
use crate::error::TranslationError;
use crate::utils::{check_response_status, snippet};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

/// Refusal phrases that indicate the model declined to translate.
static REFUSAL_PHRASES: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    vec![
        "i'm sorry",
        "i cannot",
        "i am unable",
        "as an ai",
        "my apologies",
        "i am not programmed",
        "i do not have the ability",
    ]
});

/// Position of the current segment within the run, for display.
#[derive(Debug, Clone, Copy)]
pub struct ProgressInfo {
    /// 1-based index of the segment in the collection.
    pub index: usize,
    /// Index of the last segment in the run.
    pub last: usize,
}

/// Everything needed to translate one segment.
#[derive(Debug, Clone)]
pub struct TranslationRequest<'a> {
    /// Text to translate.
    pub text: &'a str,
    /// System-level guidance.
    pub system_instruction: &'a str,
    /// Assistant-level guidance.
    pub assistant_instruction: &'a str,
    /// Optional progress information for display.
    pub progress: Option<ProgressInfo>,
}

/// A capability that turns source text into translated text.
///
/// Implementations report every failure through the returned error;
/// they never panic on network or API problems.
#[async_trait]
pub trait TranslationService: Send + Sync {
    /// Translates one segment.
    async fn translate(&self, request: &TranslationRequest<'_>) -> Result<String, TranslationError>;
}

/// A message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role: "system", "user", or "assistant".
    pub role: String,
    /// Content of the message.
    pub content: String,
}

impl Message {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Request body for the chat completions API.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

/// Response from the chat completions API (non-streaming).
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

/// A single choice in the response.
#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
    delta: Option<Delta>,
}

/// Message content in a non-streaming response.
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Delta content in a streaming response.
#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

/// Streaming chunk from the API.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<Choice>,
}

/// Translator backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiTranslator {
    /// HTTP client for API requests.
    client: Client,
    /// API configuration.
    api_config: ApiConfig,
    /// Translation behavior configuration.
    translation_config: TranslationConfig,
    /// Console for output.
    console: Console,
}

impl OpenAiTranslator {
    /// Create a new OpenAiTranslator.
    pub fn new(api_config: ApiConfig, translation_config: TranslationConfig) -> Self {
        Self {
            client: Client::new(),
            api_config,
            translation_config,
            console: Console::new(),
        }
    }

    /// Builds the message list for one segment.
    fn build_messages(&self, request: &TranslationRequest<'_>) -> Vec<Message> {
        vec![
            Message::new("system", request.system_instruction),
            Message::new("assistant", request.assistant_instruction),
            Message::new(
                "user",
                format!(
                    "{}\n\n{}",
                    self.translation_config.user_instruction, request.text
                ),
            ),
        ]
    }

    /// Sends the request and returns the raw reply text.
    async fn call_model(&self, request: &TranslationRequest<'_>) -> Result<String, TranslationError> {
        if !self.api_config.is_configured() {
            return Err(TranslationError::InvalidConfig(
                "API key is not set".to_string(),
            ));
        }

        let body = ChatRequest {
            model: self.api_config.model.clone(),
            messages: self.build_messages(request),
            max_tokens: self.translation_config.max_tokens,
            temperature: self.translation_config.temperature,
            stream: self.translation_config.stream,
        };

        let url = format!(
            "{}/chat/completions",
            self.api_config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_config.key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;
        let response = check_response_status(response).await?;

        if self.translation_config.stream {
            self.read_stream(response, request.progress).await
        } else {
            let body: ChatResponse = response.json().await.map_err(|e| {
                TranslationError::ParseError(format!("Failed to parse API response: {}", e))
            })?;

            body.choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message)
                .and_then(|message| message.content)
                .ok_or_else(|| TranslationError::ParseError("No choices in API response".to_string()))
        }
    }

    /// Accumulates a server-sent event stream into the full reply.
    async fn read_stream(
        &self,
        response: reqwest::Response,
        progress: Option<ProgressInfo>,
    ) -> Result<String, TranslationError> {
        let mut full_response = String::new();
        let mut pending: Vec<u8> = Vec::new();
        let start_time = Instant::now();
        let mut last_update = Instant::now();

        let mut stream = response.bytes_stream();

        'outer: while let Some(chunk_result) = stream.next().await {
            let bytes = chunk_result?;
            pending.extend_from_slice(&bytes);

            // Events and multi-byte characters may be split across network
            // chunks; only decode whole lines.
            while let Some(newline) = pending.iter().position(|&b| b == b'\n') {
                let raw: Vec<u8> = pending.drain(..=newline).collect();
                let line = String::from_utf8_lossy(&raw);
                let Some(data) = line.trim_end().strip_prefix("data: ") else {
                    continue;
                };

                if data.trim() == "[DONE]" {
                    break 'outer;
                }

                let Ok(chunk) = serde_json::from_str::<StreamChunk>(data) else {
                    continue;
                };

                for content in chunk
                    .choices
                    .into_iter()
                    .filter_map(|choice| choice.delta.and_then(|delta| delta.content))
                {
                    full_response.push_str(&content);

                    // Update progress display every second
                    if last_update.elapsed() >= Duration::from_secs(1) {
                        self.display_progress(&full_response, start_time.elapsed(), progress);
                        last_update = Instant::now();
                    }
                }
            }
        }

        self.console.clear_line();
        Ok(full_response)
    }

    /// Display progress during streaming.
    fn display_progress(&self, response: &str, elapsed: Duration, progress: Option<ProgressInfo>) {
        let char_count = response.chars().count();
        let speed = if elapsed.as_secs_f64() > 0.0 {
            char_count as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        // Get preview (last 50 chars, newlines replaced with spaces)
        let preview: String = response
            .chars()
            .rev()
            .take(50)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();

        let prefix = progress
            .map(|info| format!("{} ", self.console.segment_info(info.index, info.last)))
            .unwrap_or_default();

        self.console.progress_update(&format!(
            "{}Progress: {} chars at {}. {}",
            prefix,
            self.console.count(char_count),
            self.console.speed(speed),
            self.console.muted(&format!("{}...", preview))
        ));
    }
}

/// Checks a model reply and returns it unmodified.
///
/// Empty replies and replies that open with a refusal are errors.
pub fn validate_reply(reply: &str) -> Result<String, TranslationError> {
    let trimmed = reply.trim();

    if trimmed.is_empty() {
        return Err(TranslationError::Refused("Empty response".to_string()));
    }

    let lower = trimmed.to_lowercase();
    if let Some(phrase) = REFUSAL_PHRASES.iter().find(|p| lower.starts_with(*p)) {
        return Err(TranslationError::Refused(format!(
            "Response starts with refusal phrase: {} ({})",
            phrase,
            snippet(trimmed, 60)
        )));
    }

    Ok(reply.to_string())
}

#[async_trait]
impl TranslationService for OpenAiTranslator {
    async fn translate(&self, request: &TranslationRequest<'_>) -> Result<String, TranslationError> {
        let reply = self.call_model(request).await?;
        validate_reply(&reply)
    }
}
