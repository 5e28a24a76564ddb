// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding backends: a cloud provider and a local deterministic fallback.
//!
//! The keyword-hash fallback is intentionally coarse. It buckets keywords
//! into a fixed-width vector by hashing and L2-normalizes the result. It
//! never fails and needs no network access, so retrieval keeps working
//! without any embedding credential.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use keepsake_config::KeepsakeConfig;
use keepsake_core::KeepsakeError;
use keepsake_core::traits::EmbeddingAdapter;
use keepsake_core::types::{EmbeddingInput, EmbeddingOutput};

/// Fixed dimensionality of the keyword-hash fallback.
pub const KEYWORD_HASH_DIMENSIONS: usize = 128;

const KEYWORD_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "is",
    "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did",
    "will", "would", "should", "could", "may", "might", "must", "can", "this", "that", "these",
    "those",
];

const MAX_KEYWORDS: usize = 50;

/// Local deterministic bag-of-keywords embedder.
#[derive(Debug, Default)]
pub struct KeywordHashEmbedder;

impl KeywordHashEmbedder {
    pub fn new() -> Self {
        Self
    }

    fn extract_keywords(text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut keywords = Vec::new();
        for token in lowered.split(|c: char| !c.is_ascii_alphanumeric()) {
            if token.len() > 2 && !KEYWORD_STOP_WORDS.contains(&token) {
                keywords.push(token.to_string());
                if keywords.len() == MAX_KEYWORDS {
                    break;
                }
            }
        }
        keywords
    }

    fn embed_one(text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; KEYWORD_HASH_DIMENSIONS];
        for word in Self::extract_keywords(text) {
            let digest = Sha256::digest(word.as_bytes());
            let bucket = u64::from_be_bytes(
                digest[..8].try_into().unwrap_or([0; 8]),
            ) as usize
                % KEYWORD_HASH_DIMENSIONS;
            let weight = (word.len() as f32 / 10.0).min(1.0);
            embedding[bucket] += weight;
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }
        embedding
    }
}

#[async_trait]
impl EmbeddingAdapter for KeywordHashEmbedder {
    fn name(&self) -> &str {
        "keyword-hash"
    }

    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, KeepsakeError> {
        let embeddings = input.texts.iter().map(|t| Self::embed_one(t)).collect();
        Ok(EmbeddingOutput {
            embeddings,
            dimensions: KEYWORD_HASH_DIMENSIONS,
        })
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// Cloud embedder speaking the OpenAI `/embeddings` protocol.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: &str, model: impl Into<String>) -> Result<Self, KeepsakeError> {
        use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {api_key}");
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|e| KeepsakeError::Config(format!("invalid API key header value: {e}")))?,
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| KeepsakeError::Embedding {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            model: model.into(),
            base_url: "https://api.openai.com/v1".to_string(),
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
impl EmbeddingAdapter for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai"
    }

    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, KeepsakeError> {
        let url = format!("{}/embeddings", self.base_url);
        let body = EmbeddingsRequest {
            model: &self.model,
            input: &input.texts,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| KeepsakeError::Embedding {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KeepsakeError::Embedding {
                message: format!("embeddings API returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: EmbeddingsResponse =
            response.json().await.map_err(|e| KeepsakeError::Embedding {
                message: format!("failed to parse embeddings response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let dimensions = parsed.data.first().map(|d| d.embedding.len()).unwrap_or(0);
        Ok(EmbeddingOutput {
            embeddings: parsed.data.into_iter().map(|d| d.embedding).collect(),
            dimensions,
        })
    }
}

/// Selects the embedding backend from configuration.
///
/// `auto` prefers the cloud backend when a key is configured and falls back
/// to the local embedder otherwise. An explicit `openai` selection without a
/// key is a configuration error.
pub fn select_embedder(
    config: &KeepsakeConfig,
) -> Result<Box<dyn EmbeddingAdapter>, KeepsakeError> {
    match config.memory.embedding_provider.as_str() {
        "openai" => {
            let key = config.openai.api_key.as_deref().ok_or_else(|| {
                KeepsakeError::MissingCredential {
                    provider: "openai".into(),
                    hint: "set KEEPSAKE_OPENAI_API_KEY or [openai].api_key for embeddings".into(),
                }
            })?;
            info!(model = %config.memory.embedding_model, "using OpenAI embeddings");
            Ok(Box::new(OpenAiEmbedder::new(
                key,
                config.memory.embedding_model.clone(),
            )?))
        }
        "auto" => {
            if let Some(key) = config.openai.api_key.as_deref() {
                info!(model = %config.memory.embedding_model, "using OpenAI embeddings");
                Ok(Box::new(OpenAiEmbedder::new(
                    key,
                    config.memory.embedding_model.clone(),
                )?))
            } else {
                warn!("no embedding credential configured, using keyword-hash fallback");
                Ok(Box::new(KeywordHashEmbedder::new()))
            }
        }
        "simple" => Ok(Box::new(KeywordHashEmbedder::new())),
        other => Err(KeepsakeError::Config(format!(
            "unknown embedding provider `{other}`, use openai, simple, or auto"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn keyword_hash_is_deterministic_and_normalized() {
        let embedder = KeywordHashEmbedder::new();
        let input = EmbeddingInput {
            texts: vec!["I prefer dark mode interfaces".into()],
        };
        let a = embedder.embed(input.clone()).await.unwrap();
        let b = embedder.embed(input).await.unwrap();
        assert_eq!(a.embeddings, b.embeddings);
        assert_eq!(a.dimensions, KEYWORD_HASH_DIMENSIONS);

        let norm: f32 = a.embeddings[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn keyword_hash_handles_stop_word_only_text() {
        let embedder = KeywordHashEmbedder::new();
        let output = embedder
            .embed(EmbeddingInput {
                texts: vec!["the and of".into()],
            })
            .await
            .unwrap();
        assert!(output.embeddings[0].iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn similar_texts_score_closer_than_unrelated() {
        let embedder = KeywordHashEmbedder::new();
        let output = embedder
            .embed(EmbeddingInput {
                texts: vec![
                    "user prefers dark mode editor themes".into(),
                    "dark mode preference for the editor".into(),
                    "quarterly sales figures for accounting".into(),
                ],
            })
            .await
            .unwrap();
        let dot = |a: &[f32], b: &[f32]| -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() };
        let similar = dot(&output.embeddings[0], &output.embeddings[1]);
        let unrelated = dot(&output.embeddings[0], &output.embeddings[2]);
        assert!(similar > unrelated, "similar={similar} unrelated={unrelated}");
    }

    #[tokio::test]
    async fn openai_embedder_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer sk-embed"))
            .and(body_partial_json(
                serde_json::json!({"model": "text-embedding-3-small"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"index": 0, "embedding": [0.1, 0.2, 0.3]},
                    {"index": 1, "embedding": [0.4, 0.5, 0.6]}
                ],
                "model": "text-embedding-3-small"
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new("sk-embed", "text-embedding-3-small")
            .unwrap()
            .with_base_url(server.uri());
        let output = embedder
            .embed(EmbeddingInput {
                texts: vec!["one".into(), "two".into()],
            })
            .await
            .unwrap();
        assert_eq!(output.embeddings.len(), 2);
        assert_eq!(output.dimensions, 3);
    }

    #[tokio::test]
    async fn openai_embedder_surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new("sk-bad", "text-embedding-3-small")
            .unwrap()
            .with_base_url(server.uri());
        let err = embedder
            .embed(EmbeddingInput {
                texts: vec!["x".into()],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, KeepsakeError::Embedding { .. }));
    }

    #[test]
    fn select_embedder_auto_falls_back_without_key() {
        let config = KeepsakeConfig::default();
        let mut config = config;
        config.memory.embedding_provider = "auto".into();
        let embedder = select_embedder(&config).unwrap();
        assert_eq!(embedder.name(), "keyword-hash");
    }

    #[test]
    fn select_embedder_explicit_openai_requires_key() {
        let mut config = KeepsakeConfig::default();
        config.memory.embedding_provider = "openai".into();
        let Err(err) = select_embedder(&config) else {
            panic!("expected a missing credential error");
        };
        assert!(matches!(err, KeepsakeError::MissingCredential { .. }));
    }

    #[test]
    fn select_embedder_auto_prefers_cloud_with_key() {
        let mut config = KeepsakeConfig::default();
        config.memory.embedding_provider = "auto".into();
        config.openai.api_key = Some("sk-test".into());
        let embedder = select_embedder(&config).unwrap();
        assert_eq!(embedder.name(), "openai");
    }
}
