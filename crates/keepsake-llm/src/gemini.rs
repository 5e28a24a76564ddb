// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter for the Google Gemini `generateContent` API.

use async_trait::async_trait;
use tracing::debug;

use keepsake_core::KeepsakeError;
use keepsake_core::traits::ProviderAdapter;
use keepsake_core::types::{ProviderRequest, ProviderResponse, Role};

use crate::types::{
    GeminiContent, GeminiPart, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
};

/// Base URL for the Gemini API.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Adapter for Gemini. System messages map to `systemInstruction`,
/// assistant turns map to the `model` role.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self, KeepsakeError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| KeepsakeError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn to_generate_request(&self, request: &ProviderRequest) -> GenerateContentRequest {
        let mut system_parts: Vec<GeminiPart> = Vec::new();
        let mut contents: Vec<GeminiContent> = Vec::new();

        for message in &request.messages {
            match message.role {
                Role::System => system_parts.push(GeminiPart {
                    text: message.content.clone(),
                }),
                Role::User | Role::Assistant => contents.push(GeminiContent {
                    role: Some(
                        if message.role == Role::User { "user" } else { "model" }.to_string(),
                    ),
                    parts: vec![GeminiPart {
                        text: message.content.clone(),
                    }],
                }),
            }
        }

        GenerateContentRequest {
            system_instruction: if system_parts.is_empty() {
                None
            } else {
                Some(GeminiContent {
                    role: None,
                    parts: system_parts,
                })
            },
            contents,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        }
    }
}

#[async_trait]
impl ProviderAdapter for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, KeepsakeError> {
        let body = self.to_generate_request(&request);
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, request.model, self.api_key
        );

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
        debug!(provider = "gemini", status = %status, "completion response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KeepsakeError::provider(format!(
                "Gemini API returned {status}: {body}"
            )));
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(|e| KeepsakeError::Provider {
                message: format!("failed to parse API response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| KeepsakeError::provider("Gemini response had no candidates"))?;

        let content = candidate
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        Ok(ProviderResponse {
            content,
            model: request.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake_core::types::ChatMessage;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_provider(base_url: &str) -> GeminiProvider {
        GeminiProvider::new("gm-test-key")
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    fn test_request() -> ProviderRequest {
        ProviderRequest {
            model: "gemini-2.5-flash".into(),
            messages: vec![
                ChatMessage::system("Be brief."),
                ChatMessage::user("hello"),
                ChatMessage::assistant("hi"),
                ChatMessage::user("what now?"),
            ],
            temperature: 0.1,
            max_tokens: 128,
        }
    }

    #[test]
    fn system_messages_become_system_instruction() {
        let provider = GeminiProvider::new("k").unwrap();
        let body = provider.to_generate_request(&test_request());
        let system = body.system_instruction.expect("system instruction");
        assert_eq!(system.parts[0].text, "Be brief.");
        assert_eq!(body.contents.len(), 3);
        assert_eq!(body.contents[0].role.as_deref(), Some("user"));
        assert_eq!(body.contents[1].role.as_deref(), Some("model"));
    }

    #[tokio::test]
    async fn complete_joins_candidate_parts() {
        let server = MockServer::start().await;
        let response_body = serde_json::json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "All"}, {"text": " good"}]}}
            ]
        });
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(query_param("key", "gm-test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        let response = provider.complete(test_request()).await.unwrap();
        assert_eq!(response.content, "All good");
    }

    #[tokio::test]
    async fn complete_fails_on_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(403).set_body_string("key invalid"))
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        let err = provider.complete(test_request()).await.unwrap_err();
        assert!(err.to_string().contains("403"), "got: {err}");
    }

    #[tokio::test]
    async fn complete_fails_on_empty_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
            )
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        let err = provider.complete(test_request()).await.unwrap_err();
        assert!(err.to_string().contains("no candidates"));
    }
}
