// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Keepsake assistant.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Keepsake workspace, plus the lenient
//! JSON parser shared by every LLM classification call.

pub mod error;
pub mod lenient;
pub mod traits;
pub mod types;

pub use error::KeepsakeError;
pub use traits::{EmbeddingAdapter, LlmGateway, ProviderAdapter};
pub use types::{ChatMessage, DocMetadata, Document, MemoryRecord, Role};
