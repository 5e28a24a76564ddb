// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Question-processing orchestrator for Keepsake.
//!
//! [`Orchestrator::process_question`] is the single public operation of the
//! pipeline: memory analysis, search decision, context assembly, answer
//! generation, and the resulting memory writes and deletes.

pub mod matcher;
mod orchestrator;

pub use orchestrator::{AnswerAgent, AssistantReply, Orchestrator};
