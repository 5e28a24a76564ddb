// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter trait for pluggable embedding backends.

use async_trait::async_trait;

use crate::error::KeepsakeError;
use crate::types::{EmbeddingInput, EmbeddingOutput};

/// Adapter for text embedding backends.
///
/// Implementations must be swappable between a cloud provider and a local
/// deterministic fallback that requires no network access.
#[async_trait]
pub trait EmbeddingAdapter: Send + Sync {
    /// Stable backend name (`"openai"`, `"keyword-hash"`).
    fn name(&self) -> &str;

    /// Embed a batch of texts. Output order matches input order.
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, KeepsakeError>;
}
