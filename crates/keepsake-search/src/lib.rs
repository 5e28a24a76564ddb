// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Web search for Keepsake: an LLM-driven [`SearchDecision`] and the
//! [`SearchClient`] that executes queries and formats results.

mod client;
mod decision;

pub use client::{SearchClient, SearchResult, format_results};
pub use decision::SearchDecision;
