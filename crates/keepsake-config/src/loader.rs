// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./keepsake.toml` > `~/.config/keepsake/keepsake.toml`
//! > `/etc/keepsake/keepsake.toml` with environment variable overrides via
//! the `KEEPSAKE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::KeepsakeConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/keepsake/keepsake.toml` (system-wide)
/// 3. `~/.config/keepsake/keepsake.toml` (user XDG config)
/// 4. `./keepsake.toml` (local directory)
/// 5. `KEEPSAKE_*` environment variables
pub fn load_config() -> Result<KeepsakeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeepsakeConfig::default()))
        .merge(Toml::file("/etc/keepsake/keepsake.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("keepsake/keepsake.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("keepsake.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<KeepsakeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeepsakeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeepsakeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeepsakeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` instead of `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `KEEPSAKE_MEMORY_REPO_TOKEN` must map
/// to `memory.repo_token`, not `memory.repo.token`.
fn env_provider() -> Env {
    Env::prefixed("KEEPSAKE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: KEEPSAKE_MEMORY_REPO_TOKEN -> "memory_repo_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("llm_", "llm.", 1)
            .replacen("openai_", "openai.", 1)
            .replacen("deepseek_", "deepseek.", 1)
            .replacen("gemini_", "gemini.", 1)
            .replacen("memory_", "memory.", 1)
            .replacen("search_", "search.", 1);
        mapped.into()
    })
}
