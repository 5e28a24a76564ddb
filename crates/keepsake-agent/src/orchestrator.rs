// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The question-processing pipeline.
//!
//! Each [`Orchestrator::process_question`] call is independent: analyze
//! memories, decide on search, assemble context, answer, then perform the
//! resulting memory writes and deletes. Persistence failures after an
//! answer exists are logged and never invalidate the answer.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use keepsake_config::KeepsakeConfig;
use keepsake_core::KeepsakeError;
use keepsake_core::traits::LlmGateway;
use keepsake_core::types::{ChatMessage, MemoryRecord};
use keepsake_llm::Gateway;
use keepsake_memory::analyzer::{MemoryAnalysis, MemoryAnalyzer, format_context};
use keepsake_memory::chunker::truncate_content;
use keepsake_memory::embedder::select_embedder;
use keepsake_memory::index::MemoryIndex;
use keepsake_repo::RepoSync;
use keepsake_search::{SearchClient, SearchDecision, format_results};

use crate::matcher::{DeleteContext, default_strategies};

const ANSWER_SYSTEM_PROMPT: &str = "You are a helpful personal assistant. Use the provided \
    context to answer questions accurately and comprehensively.\n\n\
    When search results are provided, prioritize that information as it contains the most \
    current data. Combine search results with memories when relevant.\n\n\
    Provide clear, direct answers based on the available information.";

/// Response returned to the upstream caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub answer: String,
    pub memories_used: usize,
    pub search_used: bool,
    pub timestamp: String,
}

/// Optional tool-using agent layer tried before the direct gateway call.
///
/// Agent layers may silently no-op when they fail to invoke a tool, so the
/// orchestrator only accepts their output when it passes the generic-answer
/// heuristic.
#[async_trait]
pub trait AnswerAgent: Send + Sync {
    async fn answer(&self, prompt: &str) -> Result<String, KeepsakeError>;
}

/// Coordinates the analyzer, search, gateway, index, and repository for
/// each incoming question.
pub struct Orchestrator {
    gateway: Arc<dyn LlmGateway>,
    analyzer: MemoryAnalyzer,
    index: Mutex<MemoryIndex>,
    repo: Option<RepoSync>,
    search: Option<(SearchDecision, SearchClient)>,
    agent: Option<Box<dyn AnswerAgent>>,
    min_answer_len: usize,
    delete_match_threshold: f64,
}

impl Orchestrator {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        index: MemoryIndex,
        repo: Option<RepoSync>,
        search: Option<SearchClient>,
        min_answer_len: usize,
        delete_match_threshold: f64,
    ) -> Self {
        Self {
            analyzer: MemoryAnalyzer::new(gateway.clone()),
            search: search.map(|client| (SearchDecision::new(gateway.clone()), client)),
            gateway,
            index: Mutex::new(index),
            repo,
            agent: None,
            min_answer_len,
            delete_match_threshold,
        }
    }

    /// Attaches an optional tool-using agent layer.
    pub fn with_agent(mut self, agent: Box<dyn AnswerAgent>) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Builds the full pipeline from configuration: gateway, embedder,
    /// repository clone/pull, and startup indexing of every stored memory.
    pub async fn from_config(config: &KeepsakeConfig) -> Result<Self, KeepsakeError> {
        let gateway: Arc<dyn LlmGateway> = Arc::new(Gateway::from_config(config)?);

        let embedder = select_embedder(config)?;
        let mut index = MemoryIndex::new(embedder);

        let repo = match &config.memory.repo_url {
            Some(url) => {
                let sync = RepoSync::new(
                    url,
                    &config.memory.repo_path,
                    config.memory.repo_token.as_deref(),
                );
                match sync.clone_or_update(false) {
                    Ok(()) => {
                        let memories = sync.load_memories();
                        if !memories.is_empty() {
                            index.add(&memories).await?;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "could not sync memory repository at startup");
                    }
                }
                Some(sync)
            }
            None => None,
        };

        let search = if config.search.enabled() {
            let api_key = config.search.api_key.as_deref().unwrap_or_default();
            let engine_id = config.search.engine_id.as_deref().unwrap_or_default();
            Some(SearchClient::new(
                api_key,
                engine_id,
                config.search.num_results,
            )?)
        } else {
            None
        };

        Ok(Self::new(
            gateway,
            index,
            repo,
            search,
            config.agent.min_answer_len,
            config.memory.delete_match_threshold,
        ))
    }

    /// Processes one question end to end.
    pub async fn process_question(
        &self,
        question: &str,
        user: &str,
        time: &str,
    ) -> Result<AssistantReply, KeepsakeError> {
        let preview: String = question.chars().take(100).collect();
        info!(user, time, question = %preview, "processing question");

        // Step 1: memory analysis and context assembly. The index lock
        // covers only the two retrieval searches, never a gateway await.
        let (basic, relevant) = {
            let index = self.index.lock().await;
            self.analyzer.retrieve(&index, question).await?
        };
        let (should_create, memory_content, to_delete) =
            self.analyzer.classify(question, user).await;
        let analysis = MemoryAnalysis {
            basic,
            relevant,
            should_create,
            memory_content,
            to_delete,
        };
        let memory_context = format_context(&analysis.all_memories());
        let full_context = if memory_context.is_empty() {
            String::new()
        } else {
            format!("**Relevant Memories:**\n{memory_context}")
        };

        // Step 2: search decision.
        let mut search_used = false;
        let mut search_query = None;
        if let Some((decision, _)) = &self.search {
            let context = (!memory_context.is_empty()).then_some(memory_context.as_str());
            let (needed, query) = decision.should_search(question, context).await;
            search_used = needed;
            search_query = query;
        }

        // Step 3: eager search. A failed search surfaces its failure text
        // inline so the model sees that search failed.
        let answer_context = match (&self.search, search_query.as_deref()) {
            (Some((_, client)), Some(query)) if search_used => {
                info!(query, "performing search");
                let results_text = match client.search(query).await {
                    Ok(results) => format_results(&results),
                    Err(KeepsakeError::SearchFailed { status, body }) => {
                        warn!(status, "search backend failed");
                        format!("Search failed with status {status}: {body}")
                    }
                    Err(e) => {
                        warn!(error = %e, "search errored");
                        format!("Error performing search: {e}")
                    }
                };
                format!("{full_context}\n\n**Search Results:**\n{results_text}")
            }
            _ => full_context.clone(),
        };

        // Step 4: answer, preferring the agent layer when it produces a
        // substantive response.
        let answer = match &self.agent {
            Some(agent) => {
                let prompt = format!("{answer_context}\n\nQuestion: {question}");
                match agent.answer(&prompt).await {
                    Ok(text) if !self.is_generic_answer(&text) => text,
                    Ok(_) => {
                        info!("agent gave a generic response, using direct gateway call");
                        self.direct_llm_call(question, &answer_context).await?
                    }
                    Err(e) => {
                        error!(error = %e, "agent execution failed, using direct gateway call");
                        self.direct_llm_call(question, &answer_context).await?
                    }
                }
            }
            None => self.direct_llm_call(question, &answer_context).await?,
        };

        // Step 5: memory creation.
        if analysis.should_create && !analysis.memory_content.trim().is_empty() {
            self.create_memory(&analysis.memory_content, user, question)
                .await;
        }

        // Step 6: memory deletion.
        if !analysis.to_delete.is_empty() {
            self.delete_memories(&analysis.to_delete).await;
        }

        Ok(AssistantReply {
            answer,
            memories_used: analysis.all_memories().len(),
            search_used,
            timestamp: Utc::now().to_rfc3339(),
        })
    }

    /// Empty, too-short, or fallback-greeting answers indicate the agent
    /// layer silently no-opped.
    fn is_generic_answer(&self, answer: &str) -> bool {
        answer.is_empty()
            || answer.len() < self.min_answer_len
            || answer.to_lowercase().contains("how can i help")
    }

    async fn direct_llm_call(
        &self,
        question: &str,
        context: &str,
    ) -> Result<String, KeepsakeError> {
        let user_prompt = format!(
            "{context}\n\nQuestion: {question}\n\nPlease provide a helpful, comprehensive \
             answer based on the context above."
        );
        self.gateway
            .invoke(&[
                ChatMessage::system(ANSWER_SYSTEM_PROMPT),
                ChatMessage::user(user_prompt),
            ])
            .await
    }

    async fn create_memory(&self, content: &str, user: &str, question: &str) {
        let now = Local::now();
        let record = MemoryRecord {
            content: truncate_content(content),
            source: Some(format!("interaction_{}", now.format("%Y%m%d_%H%M%S"))),
            timestamp: Some(now.to_rfc3339()),
            user: Some(user.to_string()),
            related_question: Some(question.to_string()),
            file_type: None,
        };

        {
            let mut index = self.index.lock().await;
            if let Err(e) = index.add(std::slice::from_ref(&record)).await {
                warn!(error = %e, "failed to index new memory");
            }
        }

        if let Some(repo) = &self.repo {
            match repo.save_memory(&record, None) {
                Ok(_) => {
                    let content_preview: String = record.content.chars().take(100).collect();
                    let message = format!("Add memory: {content_preview} (user: {user})");
                    match repo.commit_and_push(&message) {
                        Ok(()) => info!("memory saved, committed, and pushed"),
                        Err(e) => warn!(error = %e, "memory saved but commit/push failed"),
                    }
                }
                Err(e) => warn!(error = %e, "failed to save memory to repository"),
            }
        }

        let preview: String = record.content.chars().take(50).collect();
        info!(content = %preview, "created new memory");
    }

    async fn delete_memories(&self, descriptors: &[String]) {
        let Some(repo) = &self.repo else {
            warn!("memory repository not configured, cannot delete memories");
            return;
        };

        let memories = repo.load_memories();
        let ctx = DeleteContext {
            repo,
            memories: &memories,
            threshold: self.delete_match_threshold,
        };
        let strategies = default_strategies();

        let mut deleted_sources: Vec<String> = Vec::new();
        for descriptor in descriptors {
            let mut resolved = false;
            for strategy in &strategies {
                if let Some(sources) = strategy.apply(&ctx, descriptor) {
                    debug!(descriptor, strategy = strategy.name(), "descriptor resolved");
                    for source in sources {
                        if !deleted_sources.contains(&source) {
                            deleted_sources.push(source);
                        }
                    }
                    resolved = true;
                    break;
                }
            }
            if !resolved {
                let preview: String = descriptor.chars().take(100).collect();
                debug!(descriptor = %preview, "no matching memories for descriptor");
            }
        }

        if deleted_sources.is_empty() {
            debug!("no memories were deleted");
            return;
        }

        {
            let mut index = self.index.lock().await;
            for source in &deleted_sources {
                index.delete_by_source(source);
            }
        }

        // One combined commit per question, not one per descriptor.
        let previews: Vec<String> = deleted_sources
            .iter()
            .take(3)
            .map(|s| s.chars().take(50).collect())
            .collect();
        let mut message = format!(
            "Delete {} outdated memory(ies): {}",
            deleted_sources.len(),
            previews.join(", ")
        );
        if deleted_sources.len() > 3 {
            message.push_str(&format!(" and {} more", deleted_sources.len() - 3));
        }

        match repo.commit_and_push(&message) {
            Ok(()) => info!(count = deleted_sources.len(), "deleted memories and pushed"),
            Err(e) => warn!(error = %e, "deleted memories but commit/push failed"),
        }
    }

    /// Shared read access to the index for callers that want statistics.
    pub async fn indexed_chunks(&self) -> usize {
        self.index.lock().await.len()
    }
}
