// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test doubles for Keepsake crates.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use keepsake_core::KeepsakeError;
use keepsake_core::traits::LlmGateway;
use keepsake_core::types::ChatMessage;

/// A scripted [`LlmGateway`] for tests.
///
/// Responses are consumed front-to-back from a queue; once the queue is
/// empty every call returns `"mock response"`. All received message lists
/// are recorded so tests can assert on prompt content and call order.
pub struct MockGateway {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Creates a gateway preloaded with `responses`, consumed in order.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let gateway = Self::new();
        for response in responses {
            gateway.push_response(response);
        }
        gateway
    }

    /// Queues one more scripted response.
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response.into());
    }

    /// All message lists received so far, in call order.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of invocations so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmGateway for MockGateway {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, KeepsakeError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(messages.to_vec());
        let response = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string());
        Ok(response)
    }
}
