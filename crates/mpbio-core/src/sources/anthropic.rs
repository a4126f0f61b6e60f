//! Anthropic Messages API adapter.
//!
//! Topic expansion runs on the short data-source timeout; narrative
//! generation uses the longer generator timeout.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use mpbio_utils::{HttpClient, UtilsError};

use super::{GenerationPurpose, GenerationRequest, TextGenerator};
use crate::config::GeneratorConfig;
use crate::errors::SourceError;

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    short: HttpClient,
    long: HttpClient,
    config: GeneratorConfig,
    api_key: Option<String>,
}

impl AnthropicClient {
    /// Build from the shared data-source client and the generator settings.
    ///
    /// The API key is read from `config.api_key_env` once, here.
    pub fn new(http: &HttpClient, config: GeneratorConfig) -> Result<Self, UtilsError> {
        let long = http.with_timeout(Duration::from_secs(config.timeout_secs))?;
        let api_key = config.api_key();
        Ok(Self {
            short: http.clone(),
            long,
            config,
            api_key,
        })
    }

    fn client_for(&self, purpose: GenerationPurpose) -> &HttpClient {
        match purpose {
            GenerationPurpose::TopicExpansion => &self.short,
            GenerationPurpose::Narrative => &self.long,
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

fn extract_text(response: MessagesResponse) -> Result<String, SourceError> {
    let text: String = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        return Err(SourceError::Malformed(
            "no text blocks in generator response".to_string(),
        ));
    }
    Ok(text)
}

// ============================================================================
// Trait implementation
// ============================================================================

impl TextGenerator for AnthropicClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, SourceError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            SourceError::Unavailable(format!(
                "API key not set (export {})",
                self.config.api_key_env
            ))
        })?;

        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system.as_deref(),
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        tracing::debug!(
            purpose = ?request.purpose,
            model = %self.config.model,
            prompt_chars = request.prompt.len(),
            "Generation request"
        );

        let response: MessagesResponse = self.client_for(request.purpose).post_json(
            &self.config.api_url,
            &[
                ("x-api-key", api_key),
                ("anthropic-version", &self.config.anthropic_version),
            ],
            &body,
        )?;
        extract_text(response)
    }
}
