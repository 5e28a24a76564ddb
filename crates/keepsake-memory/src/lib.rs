// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic memory store for Keepsake.
//!
//! [`MemoryIndex`] holds memory chunks with pluggable embeddings
//! ([`select_embedder`] picks a cloud backend or the local keyword-hash
//! fallback). [`MemoryAnalyzer`] classifies each question into retrieval,
//! creation, and deletion decisions. The index is ephemeral; durable
//! storage belongs to the repository layer.

pub mod analyzer;
pub mod chunker;
pub mod embedder;
pub mod index;

pub use analyzer::{MemoryAnalysis, MemoryAnalyzer, format_context};
pub use chunker::{split_text, truncate_content};
pub use embedder::{KeywordHashEmbedder, OpenAiEmbedder, select_embedder};
pub use index::MemoryIndex;
