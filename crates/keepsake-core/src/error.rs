// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Keepsake assistant.

use thiserror::Error;

/// The primary error type used across Keepsake crates.
#[derive(Debug, Error)]
pub enum KeepsakeError {
    /// Configuration errors (invalid TOML, bad values, unknown keys).
    #[error("configuration error: {0}")]
    Config(String),

    /// The selected provider's credential was not found. Fatal at startup.
    #[error("missing credential for provider `{provider}`: set {hint}")]
    MissingCredential { provider: String, hint: String },

    /// The configured provider cannot be used at all. Switching providers
    /// is a user decision, so this carries a remediation hint instead of
    /// silently falling back to another provider.
    #[error("provider `{provider}` is unavailable: {hint}")]
    ProviderUnavailable { provider: String, hint: String },

    /// LLM provider call failures (HTTP errors, malformed responses).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding backend failures.
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Memory repository failures (git subprocess, file IO, parse errors).
    /// Recoverable at the orchestration level: an answer already produced
    /// stays valid even when persistence fails.
    #[error("repository error: {0}")]
    Repo(String),

    /// The web search backend returned a non-200 response.
    #[error("search failed with status {status}: {body}")]
    SearchFailed { status: u16, body: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KeepsakeError {
    /// Convenience constructor for provider errors without a source.
    pub fn provider(message: impl Into<String>) -> Self {
        KeepsakeError::Provider {
            message: message.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_remediation_hint() {
        let err = KeepsakeError::MissingCredential {
            provider: "openai".into(),
            hint: "KEEPSAKE_OPENAI_API_KEY".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("openai"));
        assert!(msg.contains("KEEPSAKE_OPENAI_API_KEY"));
    }

    #[test]
    fn search_failed_carries_status_and_body() {
        let err = KeepsakeError::SearchFailed {
            status: 500,
            body: "backend exploded".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("backend exploded"));
    }
}
