// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delete-descriptor resolution strategies.
//!
//! The analyzer returns free-text descriptors: literal file paths or
//! natural-language content descriptions. Resolution tries an ordered list
//! of strategies and stops at the first that deletes something. A
//! descriptor matching nothing is expected, not an error.

use std::path::Path;

use tracing::debug;

use keepsake_core::types::MemoryRecord;
use keepsake_repo::RepoSync;

/// Words too generic to identify a memory in a delete descriptor.
const DESCRIPTOR_STOP_WORDS: &[&str] = &[
    "any", "memory", "asserting", "specific", "version", "latest", "stable",
];

/// Shared inputs for one deletion pass.
pub struct DeleteContext<'a> {
    pub repo: &'a RepoSync,
    pub memories: &'a [MemoryRecord],
    /// Fraction of descriptor keywords that must appear in a memory.
    pub threshold: f64,
}

/// One tier of descriptor resolution.
pub trait DeleteStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Attempts to resolve and delete `descriptor`. Returns the deleted
    /// sources on success, `None` when the strategy does not apply or
    /// matched nothing.
    fn apply(&self, ctx: &DeleteContext<'_>, descriptor: &str) -> Option<Vec<String>>;
}

/// The standard three-tier resolution order.
pub fn default_strategies() -> Vec<Box<dyn DeleteStrategy>> {
    vec![
        Box::new(PathMatch),
        Box::new(KeywordMatch),
        Box::new(FuzzyPathMatch),
    ]
}

/// Whether a descriptor looks like a literal repository path.
pub fn looks_like_path(descriptor: &str) -> bool {
    descriptor.contains('/') || descriptor.ends_with(".json")
}

/// Extracts matchable keywords from a descriptor: lowercased tokens longer
/// than three characters that are not descriptor stop-words.
pub fn descriptor_keywords(descriptor: &str) -> Vec<String> {
    descriptor
        .to_lowercase()
        .split_whitespace()
        .filter(|term| term.len() > 3 && !DESCRIPTOR_STOP_WORDS.contains(term))
        .map(str::to_string)
        .collect()
}

/// Whether a memory matches a descriptor's keyword set.
///
/// A memory matches when at least `threshold` of the keywords appear in its
/// lowercased content or source. With no keywords left after filtering, the
/// whole descriptor must appear as a substring.
pub fn keyword_match(
    keywords: &[String],
    descriptor: &str,
    memory: &MemoryRecord,
    threshold: f64,
) -> bool {
    let content = memory.content.to_lowercase();
    let source = memory.source.as_deref().unwrap_or("").to_lowercase();

    if keywords.is_empty() {
        let descriptor = descriptor.to_lowercase();
        return content.contains(&descriptor) || source.contains(&descriptor);
    }

    let matches = keywords
        .iter()
        .filter(|k| content.contains(k.as_str()) || source.contains(k.as_str()))
        .count();
    matches as f64 >= keywords.len() as f64 * threshold
}

/// Tier 1: the descriptor is a literal repository-relative path.
struct PathMatch;

impl DeleteStrategy for PathMatch {
    fn name(&self) -> &str {
        "path"
    }

    fn apply(&self, ctx: &DeleteContext<'_>, descriptor: &str) -> Option<Vec<String>> {
        if !looks_like_path(descriptor) {
            return None;
        }
        match ctx.repo.delete_memory_file(descriptor) {
            Ok(()) => Some(vec![descriptor.to_string()]),
            Err(e) => {
                debug!(descriptor, error = %e, "path match did not resolve");
                None
            }
        }
    }
}

/// Tier 2: the descriptor describes memory content; remove matching entries
/// from whichever JSON array file holds them.
struct KeywordMatch;

impl DeleteStrategy for KeywordMatch {
    fn name(&self) -> &str {
        "keyword"
    }

    fn apply(&self, ctx: &DeleteContext<'_>, descriptor: &str) -> Option<Vec<String>> {
        let keywords = descriptor_keywords(descriptor);
        let matched: Vec<&MemoryRecord> = ctx
            .memories
            .iter()
            .filter(|m| keyword_match(&keywords, descriptor, m, ctx.threshold))
            .collect();
        if matched.is_empty() {
            return None;
        }

        let json_files: Vec<String> = ctx
            .repo
            .memory_files()
            .into_iter()
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .filter_map(|p| relative_to(ctx.repo, &p))
            .collect();

        let mut deleted = Vec::new();
        for memory in matched {
            for file in &json_files {
                match ctx.repo.delete_memory_from_file(file, &memory.content) {
                    Ok(true) => {
                        let source = memory.source.clone().unwrap_or_else(|| file.clone());
                        if !deleted.contains(&source) {
                            deleted.push(source);
                        }
                        break;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        debug!(file, error = %e, "skipping file during keyword delete");
                    }
                }
            }
        }

        if deleted.is_empty() { None } else { Some(deleted) }
    }
}

/// Tier 3: the descriptor appears as a substring of a candidate file path.
struct FuzzyPathMatch;

impl DeleteStrategy for FuzzyPathMatch {
    fn name(&self) -> &str {
        "fuzzy-path"
    }

    fn apply(&self, ctx: &DeleteContext<'_>, descriptor: &str) -> Option<Vec<String>> {
        for path in ctx.repo.memory_files() {
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(relative) = relative_to(ctx.repo, &path) else {
                continue;
            };
            if relative.contains(descriptor) && ctx.repo.delete_memory_file(&relative).is_ok() {
                return Some(vec![relative]);
            }
        }
        None
    }
}

fn relative_to(repo: &RepoSync, path: &Path) -> Option<String> {
    path.strip_prefix(repo.repo_path())
        .ok()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn memory(content: &str, source: &str) -> MemoryRecord {
        MemoryRecord {
            content: content.into(),
            source: Some(source.into()),
            ..Default::default()
        }
    }

    fn scratch_repo(files: &[(&str, &str)]) -> (tempfile::TempDir, RepoSync) {
        let dir = tempfile::tempdir().unwrap();
        for (path, contents) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, contents).unwrap();
        }
        let repo = RepoSync::new("https://example.com/memories.git", dir.path(), None);
        (dir, repo)
    }

    #[test]
    fn keywords_drop_stop_words_and_short_tokens() {
        let keywords = descriptor_keywords("Any memory about PyTorch version 1.13.1 being latest");
        assert_eq!(keywords, vec!["about", "pytorch", "1.13.1", "being"]);
    }

    #[test]
    fn keyword_threshold_is_at_least_half() {
        let keywords: Vec<String> = ["pytorch", "1.13.1", "installed", "workstation"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let half = memory("pytorch 1.13.1 is great", "memories/a.json");
        assert!(keyword_match(&keywords, "", &half, 0.5));

        let none = memory("completely unrelated note", "memories/b.json");
        assert!(!keyword_match(&keywords, "", &none, 0.5));

        let below = memory("pytorch only", "memories/c.json");
        assert!(!keyword_match(&keywords, "", &below, 0.5));
    }

    #[test]
    fn empty_keyword_set_falls_back_to_substring() {
        let m = memory("the sky is blue", "memories/sky.json");
        assert!(keyword_match(&[], "sky", &m, 0.5));
        assert!(!keyword_match(&[], "ocean", &m, 0.5));
    }

    #[test]
    fn keyword_match_checks_source_too() {
        let keywords = vec!["pytorch".to_string()];
        let m = memory("unrelated", "memories/pytorch_notes.json");
        assert!(keyword_match(&keywords, "", &m, 0.5));
    }

    #[test]
    fn path_strategy_deletes_literal_path() {
        let (_dir, repo) = scratch_repo(&[(
            "memories/memory_20240101_000000.json",
            r#"[{"content": "old fact"}]"#,
        )]);
        let ctx = DeleteContext {
            repo: &repo,
            memories: &[],
            threshold: 0.5,
        };
        let deleted = PathMatch
            .apply(&ctx, "memories/memory_20240101_000000.json")
            .unwrap();
        assert_eq!(deleted, vec!["memories/memory_20240101_000000.json".to_string()]);
        assert!(!repo.repo_path().join("memories/memory_20240101_000000.json").exists());
    }

    #[test]
    fn path_strategy_skips_non_paths_and_missing_files() {
        let (_dir, repo) = scratch_repo(&[]);
        let ctx = DeleteContext {
            repo: &repo,
            memories: &[],
            threshold: 0.5,
        };
        assert!(PathMatch.apply(&ctx, "memory about pytorch").is_none());
        assert!(PathMatch.apply(&ctx, "memories/nope.json").is_none());
    }

    #[test]
    fn keyword_strategy_removes_matching_entry() {
        let (_dir, repo) = scratch_repo(&[(
            "memories/mixed.json",
            r#"[{"content": "PyTorch 1.13.1 is the latest release", "source": "memories/mixed.json"},
                {"content": "user prefers dark mode", "source": "memories/mixed.json"}]"#,
        )]);
        let memories = repo.load_memories();
        let ctx = DeleteContext {
            repo: &repo,
            memories: &memories,
            threshold: 0.5,
        };

        let deleted = KeywordMatch
            .apply(&ctx, "memory about PyTorch 1.13.1 release")
            .unwrap();
        assert_eq!(deleted.len(), 1);

        let remaining = repo.load_memories();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].content, "user prefers dark mode");
    }

    #[test]
    fn fuzzy_path_strategy_matches_substring() {
        let (_dir, repo) = scratch_repo(&[(
            "memories/memory_20240101_000000.json",
            r#"[{"content": "old"}]"#,
        )]);
        let ctx = DeleteContext {
            repo: &repo,
            memories: &[],
            threshold: 0.5,
        };
        let deleted = FuzzyPathMatch.apply(&ctx, "20240101").unwrap();
        assert_eq!(deleted, vec!["memories/memory_20240101_000000.json".to_string()]);
    }

    #[test]
    fn strategies_run_in_documented_order() {
        let strategies = default_strategies();
        let names: Vec<&str> = strategies.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["path", "keyword", "fuzzy-path"]);
    }
}
