// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions. Concrete implementations live in the
//! provider-specific crates.

pub mod embedding;
pub mod gateway;
pub mod provider;

pub use embedding::EmbeddingAdapter;
pub use gateway::LlmGateway;
pub use provider::ProviderAdapter;
