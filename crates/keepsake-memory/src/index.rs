// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory semantic index over memory chunks.
//!
//! The index is rebuilt from the repository working copy at startup, so it
//! carries no persistence of its own. The durable record of every memory is
//! the git-backed repository.

use chrono::Utc;
use tracing::{debug, info};

use keepsake_core::KeepsakeError;
use keepsake_core::traits::EmbeddingAdapter;
use keepsake_core::types::{DocMetadata, Document, EmbeddingInput, MemoryRecord};

use crate::chunker::split_text;

struct IndexedChunk {
    document: Document,
    embedding: Vec<f32>,
}

/// Searchable index of memory chunks.
///
/// `add` splits long content into overlapping chunks before embedding;
/// every chunk keeps the parent record's source and timestamp so provenance
/// survives splitting.
pub struct MemoryIndex {
    embedder: Box<dyn EmbeddingAdapter>,
    chunks: Vec<IndexedChunk>,
}

impl MemoryIndex {
    pub fn new(embedder: Box<dyn EmbeddingAdapter>) -> Self {
        Self {
            embedder,
            chunks: Vec::new(),
        }
    }

    /// Name of the active embedding backend.
    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunks, embeds, and indexes a batch of memory records.
    pub async fn add(&mut self, memories: &[MemoryRecord]) -> Result<(), KeepsakeError> {
        if memories.is_empty() {
            return Ok(());
        }

        let mut documents = Vec::new();
        for memory in memories {
            if memory.content.is_empty() {
                continue;
            }
            let metadata = DocMetadata {
                source: memory.source.clone().unwrap_or_else(|| "unknown".into()),
                timestamp: memory
                    .timestamp
                    .clone()
                    .unwrap_or_else(|| Utc::now().to_rfc3339()),
                file_type: memory.file_type.clone().unwrap_or_else(|| "unknown".into()),
            };
            for chunk in split_text(&memory.content) {
                documents.push(Document {
                    page_content: chunk,
                    metadata: metadata.clone(),
                });
            }
        }

        if documents.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = documents.iter().map(|d| d.page_content.clone()).collect();
        let output = self.embedder.embed(EmbeddingInput { texts }).await?;
        if output.embeddings.len() != documents.len() {
            return Err(KeepsakeError::Embedding {
                message: format!(
                    "embedding count mismatch: {} texts, {} vectors",
                    documents.len(),
                    output.embeddings.len()
                ),
                source: None,
            });
        }

        let added = documents.len();
        for (document, embedding) in documents.into_iter().zip(output.embeddings) {
            self.chunks.push(IndexedChunk {
                document,
                embedding,
            });
        }
        info!(chunks = added, total = self.chunks.len(), "indexed memory chunks");
        Ok(())
    }

    /// Returns up to `k` chunks ordered by decreasing cosine similarity to
    /// `query`. Ties break by insertion order, so results are deterministic
    /// for a fixed index.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<Document>, KeepsakeError> {
        if self.chunks.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let output = self
            .embedder
            .embed(EmbeddingInput {
                texts: vec![query.to_string()],
            })
            .await?;
        let query_vec = output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| KeepsakeError::Embedding {
                message: "embedder returned no vector for query".into(),
                source: None,
            })?;

        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, cosine_similarity(&query_vec, &chunk.embedding)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        let preview: String = query.chars().take(50).collect();
        debug!(query = %preview, k, "memory search");
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, _)| self.chunks[i].document.clone())
            .collect())
    }

    /// Every indexed chunk, in insertion order. Expensive on large indexes.
    pub fn get_all(&self) -> Vec<Document> {
        self.chunks.iter().map(|c| c.document.clone()).collect()
    }

    /// This index supports precise per-source deletion, unlike vector
    /// backends that only offer delete-all. Callers branch on this instead
    /// of discovering support by failure.
    pub fn supports_precise_delete(&self) -> bool {
        true
    }

    /// Removes every chunk whose metadata source equals `source`. Returns
    /// the number of chunks removed.
    pub fn delete_by_source(&mut self, source: &str) -> usize {
        let before = self.chunks.len();
        self.chunks.retain(|c| c.document.metadata.source != source);
        let removed = before - self.chunks.len();
        if removed > 0 {
            debug!(source, removed, "deleted chunks from index");
        }
        removed
    }

    /// Drops every indexed chunk.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::CHUNK_SIZE;
    use crate::embedder::KeywordHashEmbedder;

    fn record(content: &str, source: &str) -> MemoryRecord {
        MemoryRecord {
            content: content.into(),
            source: Some(source.into()),
            timestamp: Some("2026-01-01T00:00:00Z".into()),
            ..Default::default()
        }
    }

    fn new_index() -> MemoryIndex {
        MemoryIndex::new(Box::new(KeywordHashEmbedder::new()))
    }

    #[tokio::test]
    async fn add_and_search_ranks_relevant_first() {
        let mut index = new_index();
        index
            .add(&[
                record("user prefers dark mode editor themes", "memories/a.json"),
                record("quarterly sales figures for accounting", "memories/b.json"),
            ])
            .await
            .unwrap();

        let results = index.search("dark mode preference", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metadata.source, "memories/a.json");
    }

    #[tokio::test]
    async fn long_content_is_chunked_with_provenance() {
        let mut index = new_index();
        let long = "rust ".repeat(400);
        index.add(&[record(&long, "memories/long.json")]).await.unwrap();

        assert!(index.len() > 1);
        for doc in index.get_all() {
            assert_eq!(doc.metadata.source, "memories/long.json");
            assert_eq!(doc.metadata.timestamp, "2026-01-01T00:00:00Z");
            assert!(doc.page_content.chars().count() <= CHUNK_SIZE);
        }
    }

    #[tokio::test]
    async fn empty_content_is_skipped() {
        let mut index = new_index();
        index.add(&[record("", "memories/empty.json")]).await.unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn search_respects_k_and_empty_index() {
        let index = new_index();
        assert!(index.search("anything", 5).await.unwrap().is_empty());

        let mut index = new_index();
        index
            .add(&[
                record("alpha fact", "a"),
                record("beta fact", "b"),
                record("gamma fact", "c"),
            ])
            .await
            .unwrap();
        assert_eq!(index.search("fact", 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn search_is_deterministic() {
        let mut index = new_index();
        index
            .add(&[record("identical text", "a"), record("identical text", "b")])
            .await
            .unwrap();
        let first = index.search("identical text", 2).await.unwrap();
        let second = index.search("identical text", 2).await.unwrap();
        assert_eq!(first, second);
        // Ties break by insertion order.
        assert_eq!(first[0].metadata.source, "a");
    }

    #[tokio::test]
    async fn delete_by_source_removes_all_chunks() {
        let mut index = new_index();
        let long = "memorable ".repeat(300);
        index
            .add(&[record(&long, "memories/x.json"), record("keep me", "memories/y.json")])
            .await
            .unwrap();
        assert!(index.supports_precise_delete());

        let removed = index.delete_by_source("memories/x.json");
        assert!(removed > 1);
        assert_eq!(index.len(), 1);
        assert_eq!(index.delete_by_source("memories/x.json"), 0);
    }
}
