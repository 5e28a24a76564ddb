// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared across Keepsake crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Role of a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A persisted memory record: a fact, preference, or instruction usable
/// as future LLM context.
///
/// Records are stored as JSON array entries in the memory repository.
/// Unknown fields written by other tooling are preserved-tolerant: they
/// are ignored on load and not round-tripped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// The free-text content. Never empty when stored; content longer than
    /// 1000 characters is truncated with an ellipsis marker before storage.
    #[serde(default)]
    pub content: String,

    /// Logical tag (e.g. `interaction_20240101_120000`) or the
    /// repository-relative file path once persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// ISO-8601 creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Identifier of the person who triggered creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// The question that led to this memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_question: Option<String>,

    /// File extension of the originating file (`.md`, `.txt`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

/// Metadata attached to every retrieval document chunk so provenance
/// survives splitting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMetadata {
    pub source: String,
    pub timestamp: String,
    pub file_type: String,
}

/// The retrieval-facing projection of a memory: a chunk of its content
/// plus provenance metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    pub metadata: DocMetadata,
}

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// Output from an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
}

/// A request to an LLM provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// A response from an LLM provider. Providers that return multiple text
/// blocks join them into a single string.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub content: String,
    pub model: String,
}
