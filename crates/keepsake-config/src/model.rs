// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Keepsake.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. Settings are resolved once and read-only after
//! initialization.

use serde::{Deserialize, Serialize};

/// Top-level Keepsake configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with `KEEPSAKE_*`
/// environment variable overrides. All sections are optional and default
/// to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeepsakeConfig {
    /// Assistant identity and answer heuristics.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Active LLM provider and generation settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// OpenAI API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// DeepSeek API settings (OpenAI-compatible wire protocol).
    #[serde(default)]
    pub deepseek: DeepSeekConfig,

    /// Google Gemini API settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Memory repository and embedding settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Web search settings.
    #[serde(default)]
    pub search: SearchConfig,
}

/// Assistant identity and answer heuristics.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Minimum length of an agent-layer answer before it is accepted
    /// instead of falling back to a direct gateway call. Heuristic, tune
    /// freely.
    #[serde(default = "default_min_answer_len")]
    pub min_answer_len: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            min_answer_len: default_min_answer_len(),
        }
    }
}

fn default_agent_name() -> String {
    "keepsake".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_min_answer_len() -> usize {
    50
}

/// Active LLM provider selection and generation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// One of `openai`, `deepseek`, `gemini`. Selection is immutable for
    /// the gateway's lifetime.
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Sampling temperature, passed through to the provider unmodified.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Maximum tokens to generate per response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_provider() -> String {
    "deepseek".to_string()
}

fn default_temperature() -> f64 {
    0.1
}

fn default_max_tokens() -> u32 {
    10_000
}

/// OpenAI API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// OpenAI API key. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat model to use when `llm.provider = "openai"`.
    #[serde(default = "default_openai_model")]
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
        }
    }
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

/// DeepSeek API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeepSeekConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_deepseek_model")]
    pub model: String,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_deepseek_model(),
        }
    }
}

fn default_deepseek_model() -> String {
    "deepseek-chat".to_string()
}

/// Google Gemini API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

/// Memory repository and embedding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Remote URL of the git-backed memory repository. `None` disables
    /// durable persistence (the in-memory index still works).
    #[serde(default)]
    pub repo_url: Option<String>,

    /// Local working-copy path.
    #[serde(default = "default_repo_path")]
    pub repo_path: String,

    /// Authentication token for private HTTPS remotes, injected as the
    /// username component. Ignored for SSH remotes.
    #[serde(default)]
    pub repo_token: Option<String>,

    /// Embedding backend: `openai`, `simple`, or `auto` (cloud when a key
    /// is configured, keyword-hash fallback otherwise).
    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: String,

    /// Cloud embedding model.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Fraction of a delete descriptor's keywords that must appear in a
    /// memory for it to match. Heuristic, tune freely.
    #[serde(default = "default_delete_match_threshold")]
    pub delete_match_threshold: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            repo_url: None,
            repo_path: default_repo_path(),
            repo_token: None,
            embedding_provider: default_embedding_provider(),
            embedding_model: default_embedding_model(),
            delete_match_threshold: default_delete_match_threshold(),
        }
    }
}

fn default_repo_path() -> String {
    "./memory_repo".to_string()
}

fn default_embedding_provider() -> String {
    "simple".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_delete_match_threshold() -> f64 {
    0.5
}

/// Web search configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Search API key. `None` disables web search.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Custom search engine identifier (`cx` parameter).
    #[serde(default)]
    pub engine_id: Option<String>,

    /// Results to request per search. The backend caps this at 10.
    #[serde(default = "default_num_results")]
    pub num_results: u8,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            engine_id: None,
            num_results: default_num_results(),
        }
    }
}

fn default_num_results() -> u8 {
    5
}

impl SearchConfig {
    /// Search is enabled only when both credentials are present.
    pub fn enabled(&self) -> bool {
        self.api_key.is_some() && self.engine_id.is_some()
    }
}
