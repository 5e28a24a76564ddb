// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Git-backed memory repository sync.
//!
//! [`RepoSync`] exclusively owns filesystem mutation of the working copy.
//! All git operations run the `git` binary with interactive credential
//! prompts suppressed, so an operation that would prompt fails fast instead
//! of hanging.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Local;
use tracing::{debug, info, warn};

use keepsake_core::KeepsakeError;
use keepsake_core::types::MemoryRecord;

use crate::url::{mask_url, prepare_repo_url};

const MEMORY_EXTENSIONS: &[&str] = &["json", "md", "txt", "yaml", "yml"];

/// Bridge between the durable git-hosted memory store and the application.
pub struct RepoSync {
    repo_url: String,
    repo_path: PathBuf,
}

impl RepoSync {
    /// Creates a sync handle. `token`, when given, is injected into HTTPS
    /// remote URLs as the username component.
    pub fn new(repo_url: &str, repo_path: impl Into<PathBuf>, token: Option<&str>) -> Self {
        Self {
            repo_url: prepare_repo_url(repo_url, token),
            repo_path: repo_path.into(),
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    fn git(&self, args: &[&str], cwd: Option<&Path>) -> Result<String, KeepsakeError> {
        let mut command = Command::new("git");
        command
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_ASKPASS", "echo");
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .map_err(|e| KeepsakeError::Repo(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KeepsakeError::Repo(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or(""),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Clones the repository if the working copy is absent, pulls otherwise.
    /// With `force`, an existing working copy is deleted and re-cloned.
    pub fn clone_or_update(&self, force: bool) -> Result<(), KeepsakeError> {
        if force && self.repo_path.exists() {
            info!(path = %self.repo_path.display(), "removing existing working copy");
            fs::remove_dir_all(&self.repo_path)
                .map_err(|e| KeepsakeError::Repo(format!("failed to remove working copy: {e}")))?;
        }

        if !self.repo_path.exists() {
            info!(url = %mask_url(&self.repo_url), "cloning memory repository");
            let path = self.repo_path.to_string_lossy().to_string();
            self.git(&["clone", &self.repo_url, &path], None)?;
            info!(path = %self.repo_path.display(), "repository cloned");
        } else {
            info!(path = %self.repo_path.display(), "updating existing working copy");
            // Keep the remote in sync with the (possibly re-tokenized) URL.
            self.git(
                &["remote", "set-url", "origin", &self.repo_url],
                Some(&self.repo_path),
            )?;
            self.git(&["pull"], Some(&self.repo_path))?;
            info!("repository updated");
        }
        Ok(())
    }

    /// Every memory file under the working copy, excluding git metadata.
    pub fn memory_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        if self.repo_path.exists() {
            collect_memory_files(&self.repo_path, &self.repo_path, &mut files);
        }
        files.sort();
        files
    }

    /// Parses every memory file into records. JSON arrays expand into one
    /// record per element; JSON objects become one record; markdown and
    /// text files become one record with the raw file text as content.
    /// Unreadable files are logged and skipped.
    pub fn load_memories(&self) -> Vec<MemoryRecord> {
        let mut memories = Vec::new();

        for path in self.memory_files() {
            let relative = self.relative_source(&path);
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default();

            match extension {
                "json" => {
                    let text = match fs::read_to_string(&path) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(path = %relative, error = %e, "failed to read memory file");
                            continue;
                        }
                    };
                    match serde_json::from_str::<serde_json::Value>(&text) {
                        Ok(serde_json::Value::Array(items)) => {
                            for item in items {
                                if let Some(record) = value_to_record(item, &relative) {
                                    memories.push(record);
                                }
                            }
                        }
                        Ok(value @ serde_json::Value::Object(_)) => {
                            if let Some(record) = value_to_record(value, &relative) {
                                memories.push(record);
                            }
                        }
                        Ok(_) => {
                            warn!(path = %relative, "memory file is not a JSON array or object");
                        }
                        Err(e) => {
                            warn!(path = %relative, error = %e, "failed to parse memory file");
                        }
                    }
                }
                "md" | "txt" => match fs::read_to_string(&path) {
                    Ok(content) => memories.push(MemoryRecord {
                        content,
                        source: Some(relative.clone()),
                        file_type: Some(format!(".{extension}")),
                        ..Default::default()
                    }),
                    Err(e) => {
                        warn!(path = %relative, error = %e, "failed to read memory file");
                    }
                },
                _ => {}
            }
        }

        info!(count = memories.len(), "loaded memories from repository");
        memories
    }

    /// Appends a record to a JSON array file under `memories/`, creating the
    /// file if absent. Returns the repository-relative path written.
    pub fn save_memory(
        &self,
        record: &MemoryRecord,
        filename: Option<&str>,
    ) -> Result<String, KeepsakeError> {
        if !self.repo_path.exists() {
            return Err(KeepsakeError::Repo("repository not cloned".into()));
        }

        let memories_dir = self.repo_path.join("memories");
        fs::create_dir_all(&memories_dir)
            .map_err(|e| KeepsakeError::Repo(format!("failed to create memories dir: {e}")))?;

        let filename = match filename {
            Some(name) => name.to_string(),
            None => format!("memory_{}.json", Local::now().format("%Y%m%d_%H%M%S")),
        };
        let file_path = memories_dir.join(&filename);

        let mut existing: Vec<serde_json::Value> = if file_path.exists() {
            let text = fs::read_to_string(&file_path)
                .map_err(|e| KeepsakeError::Repo(format!("failed to read {filename}: {e}")))?;
            serde_json::from_str(&text)
                .map_err(|e| KeepsakeError::Repo(format!("failed to parse {filename}: {e}")))?
        } else {
            Vec::new()
        };

        let value = serde_json::to_value(record)
            .map_err(|e| KeepsakeError::Repo(format!("failed to serialize memory: {e}")))?;
        existing.push(value);

        let serialized = serde_json::to_string_pretty(&existing)
            .map_err(|e| KeepsakeError::Repo(format!("failed to serialize memories: {e}")))?;
        fs::write(&file_path, serialized)
            .map_err(|e| KeepsakeError::Repo(format!("failed to write {filename}: {e}")))?;

        let relative = format!("memories/{filename}");
        info!(path = %relative, "memory saved");
        Ok(relative)
    }

    /// Resolves a repository-relative source against the working copy.
    /// Sources originate in LLM classification output and are untrusted:
    /// absolute paths and traversal out of the working copy are rejected.
    fn resolve_repo_file(&self, source: &str) -> Result<PathBuf, KeepsakeError> {
        let root = self
            .repo_path
            .canonicalize()
            .map_err(|_| KeepsakeError::Repo("repository not cloned".into()))?;
        let resolved = root
            .join(source)
            .canonicalize()
            .map_err(|_| KeepsakeError::Repo(format!("memory file not found: {source}")))?;
        if !resolved.starts_with(&root) {
            return Err(KeepsakeError::Repo(format!(
                "path escapes the working copy: {source}"
            )));
        }
        Ok(resolved)
    }

    /// Deletes a memory file outright by repository-relative path.
    pub fn delete_memory_file(&self, source: &str) -> Result<(), KeepsakeError> {
        let file_path = self.resolve_repo_file(source)?;
        if !file_path.is_file() {
            return Err(KeepsakeError::Repo(format!("memory file not found: {source}")));
        }
        fs::remove_file(&file_path)
            .map_err(|e| KeepsakeError::Repo(format!("failed to delete {source}: {e}")))?;
        info!(path = source, "deleted memory file");
        Ok(())
    }

    /// Removes entries matching `target` (by content or source field) from a
    /// JSON array file. Deletes the file entirely when the removal empties
    /// it. Returns whether anything was removed.
    pub fn delete_memory_from_file(
        &self,
        source: &str,
        target: &str,
    ) -> Result<bool, KeepsakeError> {
        let file_path = self.resolve_repo_file(source)?;
        if !file_path.is_file() || file_path.extension().and_then(|e| e.to_str()) != Some("json") {
            return Err(KeepsakeError::Repo(format!(
                "memory file not found or not JSON: {source}"
            )));
        }

        let text = fs::read_to_string(&file_path)
            .map_err(|e| KeepsakeError::Repo(format!("failed to read {source}: {e}")))?;
        let mut entries: Vec<serde_json::Value> = serde_json::from_str(&text)
            .map_err(|e| KeepsakeError::Repo(format!("{source} is not a JSON array: {e}")))?;

        let original_count = entries.len();
        entries.retain(|entry| {
            let entry_source = entry.get("source").and_then(|v| v.as_str()).unwrap_or("");
            let entry_content = entry.get("content").and_then(|v| v.as_str()).unwrap_or("");
            entry_source != target && entry_content != target
        });
        let removed = original_count - entries.len();

        if removed == 0 {
            debug!(path = source, "no matching entries to delete");
            return Ok(false);
        }

        if entries.is_empty() {
            fs::remove_file(&file_path)
                .map_err(|e| KeepsakeError::Repo(format!("failed to delete {source}: {e}")))?;
            info!(path = source, "deleted emptied memory file");
        } else {
            let serialized = serde_json::to_string_pretty(&entries)
                .map_err(|e| KeepsakeError::Repo(format!("failed to serialize {source}: {e}")))?;
            fs::write(&file_path, serialized)
                .map_err(|e| KeepsakeError::Repo(format!("failed to write {source}: {e}")))?;
            info!(path = source, removed, "removed entries from memory file");
        }
        Ok(true)
    }

    /// Stages everything, commits with a timestamp trailer, and pushes.
    /// A clean tree is an idempotent no-op success, not an error.
    pub fn commit_and_push(&self, message: &str) -> Result<(), KeepsakeError> {
        self.git(&["add", "-A"], Some(&self.repo_path))?;

        let status = self.git(&["status", "--porcelain"], Some(&self.repo_path))?;
        if status.trim().is_empty() {
            info!("no changes to commit");
            return Ok(());
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let full_message = format!("{message}\n\nTimestamp: {timestamp}");
        self.git(&["commit", "-m", &full_message], Some(&self.repo_path))?;
        self.git(&["push"], Some(&self.repo_path))?;

        let preview: String = message.chars().take(50).collect();
        info!(message = %preview, "changes committed and pushed");
        Ok(())
    }

    fn relative_source(&self, path: &Path) -> String {
        path.strip_prefix(&self.repo_path)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

fn collect_memory_files(root: &Path, dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if path.file_name().is_some_and(|n| n == ".git") {
                continue;
            }
            collect_memory_files(root, &path, files);
        } else if is_memory_file(root, &path) {
            files.push(path);
        }
    }
}

fn is_memory_file(root: &Path, path: &Path) -> bool {
    let by_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MEMORY_EXTENSIONS.contains(&e));
    let under_memories = path
        .strip_prefix(root)
        .ok()
        .and_then(|rel| rel.components().next())
        .is_some_and(|first| first.as_os_str() == "memories");
    by_extension || under_memories
}

fn value_to_record(value: serde_json::Value, relative: &str) -> Option<MemoryRecord> {
    match serde_json::from_value::<MemoryRecord>(value) {
        Ok(mut record) => {
            if record.source.is_none() {
                record.source = Some(relative.to_string());
            }
            Some(record)
        }
        Err(e) => {
            warn!(path = relative, error = %e, "skipping malformed memory entry");
            None
        }
    }
}
