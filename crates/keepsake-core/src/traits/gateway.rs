// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! High-level LLM gateway trait: send messages, get text.

use async_trait::async_trait;

use crate::error::KeepsakeError;
use crate::types::ChatMessage;

/// Uniform "send messages, get text" abstraction over the configured
/// provider. Consumers (analyzer, search decision, orchestrator) depend on
/// this trait so tests can substitute a deterministic mock.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, KeepsakeError>;
}
