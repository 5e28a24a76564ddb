// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for LLM provider integrations.

use async_trait::async_trait;

use crate::error::KeepsakeError;
use crate::types::{ProviderRequest, ProviderResponse};

/// Adapter for a single LLM provider wire protocol.
///
/// Providers are pure text-in/text-out: no tool-calling is assumed, and
/// temperature/max-token settings pass through unmodified. Retry policy
/// belongs to the caller, not the adapter.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable provider name (`"openai"`, `"deepseek"`, `"gemini"`).
    fn name(&self) -> &str;

    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: ProviderRequest)
    -> Result<ProviderResponse, KeepsakeError>;
}
