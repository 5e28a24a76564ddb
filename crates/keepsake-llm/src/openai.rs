// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter for the OpenAI-compatible chat completions protocol.
//!
//! Covers both OpenAI itself and DeepSeek, which serves the same wire
//! format from a different base URL.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

use keepsake_core::KeepsakeError;
use keepsake_core::traits::ProviderAdapter;
use keepsake_core::types::{ProviderRequest, ProviderResponse};

use crate::types::{ApiErrorResponse, ApiMessage, ChatCompletionRequest, ChatCompletionResponse};

/// Base URL for the OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Base URL for the DeepSeek API (OpenAI-compatible).
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";

/// Adapter for OpenAI-compatible chat completion backends.
///
/// Performs no retries: retry policy belongs to the caller. No request
/// timeout is set either; LLM calls may block until the backend responds,
/// matching the rest of the pipeline.
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    name: &'static str,
    base_url: String,
}

impl OpenAiCompatProvider {
    /// Creates a new adapter with bearer-token authentication.
    pub fn new(
        name: &'static str,
        api_key: &str,
        base_url: impl Into<String>,
    ) -> Result<Self, KeepsakeError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {api_key}");
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer).map_err(|e| {
                KeepsakeError::Config(format!("invalid API key header value: {e}"))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| KeepsakeError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            name,
            base_url: base_url.into(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, KeepsakeError> {
        let body = ChatCompletionRequest {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| KeepsakeError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(provider = self.name, status = %status, "completion response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
                format!(
                    "{} API error ({}): {}",
                    self.name, api_err.error.type_, api_err.error.message
                )
            } else {
                format!("API returned {status}: {body}")
            };
            return Err(KeepsakeError::provider(message));
        }

        let parsed: ChatCompletionResponse =
            response.json().await.map_err(|e| KeepsakeError::Provider {
                message: format!("failed to parse API response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| {
                KeepsakeError::provider(format!("{} response had no choices", self.name))
            })?;

        Ok(ProviderResponse {
            content,
            model: parsed.model.unwrap_or(request.model),
        })
    }
}
