// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM-driven memory analysis.
//!
//! Per question the analyzer produces: always-loaded profile memories,
//! question-relevant memories, a create decision, and a list of delete
//! descriptors. It is state-free and never writes anything itself; acting
//! on the decisions is the orchestrator's job.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use keepsake_core::KeepsakeError;
use keepsake_core::lenient::extract_classification;
use keepsake_core::traits::LlmGateway;
use keepsake_core::types::{ChatMessage, Document};

use crate::index::MemoryIndex;

/// Canonical query for the always-loaded profile memories.
const BASIC_MEMORY_QUERY: &str = "user profile preferences general information";

const BASIC_MEMORY_K: usize = 3;
const RELEVANT_MEMORY_K: usize = 5;

/// Result of analyzing one question.
#[derive(Debug, Default)]
pub struct MemoryAnalysis {
    /// Profile memories loaded for every question.
    pub basic: Vec<Document>,
    /// Question-relevant memories, deduplicated against `basic` by source.
    pub relevant: Vec<Document>,
    /// Whether this interaction is worth remembering.
    pub should_create: bool,
    /// Content of the memory to create, when `should_create` is true.
    pub memory_content: String,
    /// Free-text descriptors (paths or content descriptions) of memories
    /// that now look stale.
    pub to_delete: Vec<String>,
}

impl MemoryAnalysis {
    /// All retrieved memories, basic first.
    pub fn all_memories(&self) -> Vec<&Document> {
        self.basic.iter().chain(self.relevant.iter()).collect()
    }
}

#[derive(Debug, Deserialize)]
struct CreateDecision {
    #[serde(default)]
    should_remember: bool,
    #[serde(default)]
    memory_content: String,
}

#[derive(Debug, Deserialize)]
struct DeleteDecision {
    #[serde(default)]
    memory_sources_to_delete: Vec<String>,
}

/// Analyzes questions against the memory index using LLM classification
/// calls. Malformed classification output always degrades to the
/// conservative default, never to an error.
pub struct MemoryAnalyzer {
    gateway: Arc<dyn LlmGateway>,
}

impl MemoryAnalyzer {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    /// Runs the full analysis for one question.
    pub async fn analyze(
        &self,
        index: &MemoryIndex,
        question: &str,
        user: &str,
    ) -> Result<MemoryAnalysis, KeepsakeError> {
        let (basic, relevant) = self.retrieve(index, question).await?;
        let (should_create, memory_content, to_delete) = self.classify(question, user).await;
        Ok(MemoryAnalysis {
            basic,
            relevant,
            should_create,
            memory_content,
            to_delete,
        })
    }

    /// Retrieval half: profile memories plus question-relevant memories
    /// deduplicated by source. The only part that needs the index, so
    /// callers can drop any index lock before classifying.
    pub async fn retrieve(
        &self,
        index: &MemoryIndex,
        question: &str,
    ) -> Result<(Vec<Document>, Vec<Document>), KeepsakeError> {
        let basic = index.search(BASIC_MEMORY_QUERY, BASIC_MEMORY_K).await?;

        let basic_sources: HashSet<&str> =
            basic.iter().map(|d| d.metadata.source.as_str()).collect();
        let relevant: Vec<Document> = index
            .search(question, RELEVANT_MEMORY_K)
            .await?
            .into_iter()
            .filter(|d| !basic_sources.contains(d.metadata.source.as_str()))
            .collect();
        Ok((basic, relevant))
    }

    /// Classification half: the create and delete decisions. Talks only to
    /// the gateway, never to the index.
    pub async fn classify(&self, question: &str, user: &str) -> (bool, String, Vec<String>) {
        let (should_create, memory_content) = self.should_create_memory(question, user).await;
        let to_delete = self.memories_to_delete(question).await;
        (should_create, memory_content, to_delete)
    }

    async fn should_create_memory(&self, question: &str, user: &str) -> (bool, String) {
        let prompt = format!(
            "Analyze the following question and determine if it contains information worth \
             remembering for future interactions.\n\n\
             Question: {question}\n\
             User: {user}\n\n\
             Consider:\n\
             1. Does it contain personal preferences, facts, or important information?\n\
             2. Is it a one-time question or something that might be relevant later?\n\
             3. Does it establish context about projects, interests, or ongoing work?\n\n\
             Respond with JSON:\n\
             {{\n\
                 \"should_remember\": true/false,\n\
                 \"reason\": \"brief explanation\",\n\
                 \"memory_content\": \"what to remember (if should_remember is true)\"\n\
             }}"
        );

        let response = match self.gateway.invoke(&[ChatMessage::user(prompt)]).await {
            Ok(text) => text,
            Err(e) => {
                debug!(error = %e, "memory creation classification call failed");
                return (false, String::new());
            }
        };

        match extract_classification::<CreateDecision>(&response) {
            Some(decision) => (decision.should_remember, decision.memory_content),
            None => {
                debug!("no parseable JSON in memory creation response");
                (false, String::new())
            }
        }
    }

    async fn memories_to_delete(&self, question: &str) -> Vec<String> {
        let prompt = format!(
            "Analyze the following question and determine if it suggests that any existing \
             memories might be outdated or should be deleted.\n\n\
             Question: {question}\n\n\
             Consider if the question:\n\
             1. Contradicts previous information\n\
             2. Indicates a change in preferences or circumstances\n\
             3. Suggests outdated information (e.g., asking for \"latest\" version implies old \
             version info is outdated)\n\
             4. Requests information that would make previous specific claims incorrect\n\n\
             IMPORTANT: For memory_sources_to_delete, provide:\n\
             - Specific file paths (e.g., \"memories/memory_20251117_131316.json\") if you know \
             them, OR\n\
             - Clear content descriptions that can be matched (e.g., \"memory about PyTorch \
             version 1.13.1 being latest\")\n\n\
             Respond with JSON:\n\
             {{\n\
                 \"should_delete\": true/false,\n\
                 \"memory_sources_to_delete\": [\"specific file path or clear content \
             description\"] or [],\n\
                 \"reason\": \"brief explanation of why these should be deleted\"\n\
             }}"
        );

        let response = match self.gateway.invoke(&[ChatMessage::user(prompt)]).await {
            Ok(text) => text,
            Err(e) => {
                debug!(error = %e, "memory deletion classification call failed");
                return Vec::new();
            }
        };

        match extract_classification::<DeleteDecision>(&response) {
            Some(decision) => {
                if !decision.memory_sources_to_delete.is_empty() {
                    info!(
                        count = decision.memory_sources_to_delete.len(),
                        "classifier flagged memory sources for deletion"
                    );
                }
                decision.memory_sources_to_delete
            }
            None => {
                debug!("no parseable JSON in memory deletion response");
                Vec::new()
            }
        }
    }
}

/// Formats retrieved memories as a numbered Markdown context block.
pub fn format_context(memories: &[&Document]) -> String {
    if memories.is_empty() {
        return String::new();
    }

    let mut context = String::from("## Relevant Memories:\n\n");
    for (i, memory) in memories.iter().enumerate() {
        context.push_str(&format!("{}. **{}**", i + 1, memory.metadata.source));
        if !memory.metadata.timestamp.is_empty() {
            context.push_str(&format!(" (from {})", memory.metadata.timestamp));
        }
        context.push_str(&format!("\n{}\n\n", memory.page_content));
    }
    context
}
