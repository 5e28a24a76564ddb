// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM gateway for Keepsake.
//!
//! One adapter per wire protocol: [`OpenAiCompatProvider`] covers OpenAI
//! and DeepSeek, [`GeminiProvider`] covers Gemini. [`Gateway`] binds the
//! configured adapter to a model and sampling settings and exposes the
//! provider-agnostic [`LlmGateway`] trait the rest of the system depends
//! on. Provider selection happens once at construction and is immutable
//! afterwards.

mod gemini;
mod openai;
mod types;

pub use gemini::{GEMINI_BASE_URL, GeminiProvider};
pub use openai::{DEEPSEEK_BASE_URL, OPENAI_BASE_URL, OpenAiCompatProvider};

use async_trait::async_trait;
use tracing::info;

use keepsake_config::KeepsakeConfig;
use keepsake_core::KeepsakeError;
use keepsake_core::traits::{LlmGateway, ProviderAdapter};
use keepsake_core::types::{ChatMessage, ProviderRequest};

/// The configured LLM gateway: a provider adapter plus the model and
/// sampling settings every call uses.
pub struct Gateway {
    provider: Box<dyn ProviderAdapter>,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl Gateway {
    /// Builds the gateway from configuration.
    ///
    /// Fails with [`KeepsakeError::MissingCredential`] when the selected
    /// provider has no API key, and [`KeepsakeError::ProviderUnavailable`]
    /// for provider names the build does not support.
    pub fn from_config(config: &KeepsakeConfig) -> Result<Self, KeepsakeError> {
        let (provider, model): (Box<dyn ProviderAdapter>, String) =
            match config.llm.provider.as_str() {
                "openai" => {
                    let key = config.openai.api_key.as_deref().ok_or_else(|| {
                        KeepsakeError::MissingCredential {
                            provider: "openai".into(),
                            hint: "set KEEPSAKE_OPENAI_API_KEY or [openai].api_key".into(),
                        }
                    })?;
                    (
                        Box::new(OpenAiCompatProvider::new("openai", key, OPENAI_BASE_URL)?),
                        config.openai.model.clone(),
                    )
                }
                "deepseek" => {
                    let key = config.deepseek.api_key.as_deref().ok_or_else(|| {
                        KeepsakeError::MissingCredential {
                            provider: "deepseek".into(),
                            hint: "set KEEPSAKE_DEEPSEEK_API_KEY or [deepseek].api_key".into(),
                        }
                    })?;
                    (
                        Box::new(OpenAiCompatProvider::new(
                            "deepseek",
                            key,
                            DEEPSEEK_BASE_URL,
                        )?),
                        config.deepseek.model.clone(),
                    )
                }
                "gemini" => {
                    let key = config.gemini.api_key.as_deref().ok_or_else(|| {
                        KeepsakeError::MissingCredential {
                            provider: "gemini".into(),
                            hint: "set KEEPSAKE_GEMINI_API_KEY or [gemini].api_key".into(),
                        }
                    })?;
                    (
                        Box::new(GeminiProvider::new(key)?),
                        config.gemini.model.clone(),
                    )
                }
                other => {
                    return Err(KeepsakeError::ProviderUnavailable {
                        provider: other.to_string(),
                        hint: "supported providers: openai, deepseek, gemini".into(),
                    });
                }
            };

        info!(
            provider = provider.name(),
            model = %model,
            "LLM gateway initialized"
        );

        Ok(Self {
            provider,
            model,
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
        })
    }

    /// Wraps an existing adapter. Used by tests and by callers that build
    /// adapters directly.
    pub fn with_provider(
        provider: Box<dyn ProviderAdapter>,
        model: impl Into<String>,
        temperature: f64,
        max_tokens: u32,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens,
        }
    }

    /// Name of the active provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Model identifier used for every call.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmGateway for Gateway {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, KeepsakeError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let response = self.provider.complete(request).await?;
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake_core::types::ProviderResponse;

    struct EchoProvider;

    #[async_trait]
    impl ProviderAdapter for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, KeepsakeError> {
            let last = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(ProviderResponse {
                content: format!("echo: {last}"),
                model: request.model,
            })
        }
    }

    fn config_with_provider(provider: &str) -> KeepsakeConfig {
        let mut config = KeepsakeConfig::default();
        config.llm.provider = provider.to_string();
        config
    }

    #[test]
    fn from_config_selects_openai() {
        let mut config = config_with_provider("openai");
        config.openai.api_key = Some("sk-test".into());
        let gateway = Gateway::from_config(&config).unwrap();
        assert_eq!(gateway.provider_name(), "openai");
        assert_eq!(gateway.model(), "gpt-4o-mini");
    }

    #[test]
    fn from_config_selects_deepseek_by_default() {
        let mut config = KeepsakeConfig::default();
        config.deepseek.api_key = Some("sk-ds".into());
        let gateway = Gateway::from_config(&config).unwrap();
        assert_eq!(gateway.provider_name(), "deepseek");
        assert_eq!(gateway.model(), "deepseek-chat");
    }

    #[test]
    fn from_config_selects_gemini() {
        let mut config = config_with_provider("gemini");
        config.gemini.api_key = Some("gm-key".into());
        let gateway = Gateway::from_config(&config).unwrap();
        assert_eq!(gateway.provider_name(), "gemini");
        assert_eq!(gateway.model(), "gemini-2.5-flash");
    }

    #[test]
    fn from_config_requires_api_key() {
        let config = config_with_provider("openai");
        let Err(err) = Gateway::from_config(&config) else {
            panic!("expected a missing credential error");
        };
        assert!(matches!(err, KeepsakeError::MissingCredential { .. }));
        assert!(err.to_string().contains("KEEPSAKE_OPENAI_API_KEY"));
    }

    #[test]
    fn from_config_rejects_unknown_provider() {
        let config = config_with_provider("llamafile");
        let Err(err) = Gateway::from_config(&config) else {
            panic!("expected an unavailable provider error");
        };
        assert!(matches!(err, KeepsakeError::ProviderUnavailable { .. }));
    }

    #[tokio::test]
    async fn invoke_returns_provider_content() {
        let gateway = Gateway::with_provider(Box::new(EchoProvider), "echo-1", 0.1, 100);
        let answer = gateway
            .invoke(&[ChatMessage::user("ping")])
            .await
            .unwrap();
        assert_eq!(answer, "echo: ping");
    }
}
