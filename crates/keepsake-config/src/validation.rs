// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of configuration values.

use crate::ConfigError;
use crate::model::KeepsakeConfig;

/// Providers the gateway can construct.
pub const SUPPORTED_PROVIDERS: &[&str] = &["openai", "deepseek", "gemini"];

/// Embedding backends the memory index can construct.
pub const SUPPORTED_EMBEDDING_PROVIDERS: &[&str] = &["openai", "simple", "auto"];

/// Validate constraints that `serde` alone cannot express.
///
/// Credential presence is NOT checked here: the gateway and embedder fail
/// fast with `MissingCredential` at construction, which keeps validation
/// independent of which components the caller actually wires up.
pub fn validate_config(config: &KeepsakeConfig) -> Result<(), ConfigError> {
    let mut problems = Vec::new();

    if !SUPPORTED_PROVIDERS.contains(&config.llm.provider.as_str()) {
        problems.push(format!(
            "llm.provider `{}` is not supported (expected one of: {})",
            config.llm.provider,
            SUPPORTED_PROVIDERS.join(", ")
        ));
    }

    if !SUPPORTED_EMBEDDING_PROVIDERS.contains(&config.memory.embedding_provider.as_str()) {
        problems.push(format!(
            "memory.embedding_provider `{}` is not supported (expected one of: {})",
            config.memory.embedding_provider,
            SUPPORTED_EMBEDDING_PROVIDERS.join(", ")
        ));
    }

    if !(0.0..=2.0).contains(&config.llm.temperature) {
        problems.push(format!(
            "llm.temperature {} is out of range (expected 0.0..=2.0)",
            config.llm.temperature
        ));
    }

    if !(0.0..=1.0).contains(&config.memory.delete_match_threshold) {
        problems.push(format!(
            "memory.delete_match_threshold {} is out of range (expected 0.0..=1.0)",
            config.memory.delete_match_threshold
        ));
    }

    if config.search.num_results == 0 || config.search.num_results > 10 {
        problems.push(format!(
            "search.num_results {} is out of range (expected 1..=10)",
            config.search.num_results
        ));
    }

    if config.search.api_key.is_some() != config.search.engine_id.is_some() {
        problems.push(
            "search.api_key and search.engine_id must be set together".to_string(),
        );
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(problems.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&KeepsakeConfig::default()).is_ok());
    }

    #[test]
    fn unknown_provider_rejected() {
        let mut config = KeepsakeConfig::default();
        config.llm.provider = "claude-shannon".into();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("claude-shannon"));
    }

    #[test]
    fn num_results_bounds() {
        let mut config = KeepsakeConfig::default();
        config.search.num_results = 0;
        assert!(validate_config(&config).is_err());
        config.search.num_results = 11;
        assert!(validate_config(&config).is_err());
        config.search.num_results = 10;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn search_credentials_must_pair() {
        let mut config = KeepsakeConfig::default();
        config.search.api_key = Some("key".into());
        assert!(validate_config(&config).is_err());
        config.search.engine_id = Some("cx".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn threshold_out_of_range_rejected() {
        let mut config = KeepsakeConfig::default();
        config.memory.delete_match_threshold = 1.5;
        assert!(validate_config(&config).is_err());
    }
}
