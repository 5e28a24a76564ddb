// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM-driven decision on whether a question needs live web search.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use keepsake_core::lenient::extract_classification;
use keepsake_core::traits::LlmGateway;
use keepsake_core::types::ChatMessage;

#[derive(Debug, Deserialize)]
struct SearchClassification {
    #[serde(default)]
    search_needed: bool,
    #[serde(default)]
    search_query: Option<String>,
}

/// Decides whether a web search is needed for a question.
///
/// Malformed classification output degrades to "no search", never to an
/// error.
pub struct SearchDecision {
    gateway: Arc<dyn LlmGateway>,
}

impl SearchDecision {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    /// Returns `(search_needed, query)`. The query is only present when a
    /// search is needed.
    pub async fn should_search(
        &self,
        question: &str,
        context: Option<&str>,
    ) -> (bool, Option<String>) {
        let context_line = match context {
            Some(context) if !context.is_empty() => format!("Context: {context}\n"),
            _ => String::new(),
        };
        let prompt = format!(
            "Analyze the following question and determine if a web search is needed to answer \
             it accurately.\n\n\
             Question: {question}\n\
             {context_line}\n\
             Consider:\n\
             1. Does it require CURRENT information (news, weather, current events, recent \
             developments)?\n\
             2. Does it ask for SPECIFIC FACTS that might not be in the knowledge base?\n\
             3. Does it require REAL-TIME data (stock prices, sports scores, etc.)?\n\
             4. Can it be answered with general knowledge or existing context?\n\n\
             Respond with JSON:\n\
             {{\n\
                 \"search_needed\": true/false,\n\
                 \"search_query\": \"optimized search query\" or null,\n\
                 \"reason\": \"brief explanation\"\n\
             }}"
        );

        let response = match self.gateway.invoke(&[ChatMessage::user(prompt)]).await {
            Ok(text) => text,
            Err(e) => {
                debug!(error = %e, "search decision call failed");
                return (false, None);
            }
        };

        match extract_classification::<SearchClassification>(&response) {
            Some(decision) => {
                let query = if decision.search_needed {
                    decision.search_query.filter(|q| !q.is_empty())
                } else {
                    None
                };
                info!(
                    search_needed = decision.search_needed,
                    query = query.as_deref().unwrap_or(""),
                    "search decision"
                );
                (decision.search_needed, query)
            }
            None => {
                debug!("no parseable JSON in search decision response");
                (false, None)
            }
        }
    }
}
