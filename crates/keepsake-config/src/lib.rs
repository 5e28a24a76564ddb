// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Keepsake assistant.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides. Configuration is resolved once at startup and is
//! read-only afterwards; no component mutates it.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::KeepsakeConfig;

use thiserror::Error;

/// Errors raised while loading or validating configuration. Fatal at
/// startup, reported to the process caller, not recovered.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<KeepsakeConfig, ConfigError> {
    let config = load_config().map_err(Box::new)?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<KeepsakeConfig, ConfigError> {
    let config = load_config_from_str(toml_content).map_err(Box::new)?;
    validation::validate_config(&config)?;
    Ok(config)
}
