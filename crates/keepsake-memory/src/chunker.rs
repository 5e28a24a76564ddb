// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Character-window text splitting for retrieval indexing.
//!
//! Windows of [`CHUNK_SIZE`] characters advance by `CHUNK_SIZE -
//! CHUNK_OVERLAP`, so consecutive chunks share [`CHUNK_OVERLAP`] characters.
//! Any substring no longer than the overlap therefore survives unbroken in
//! at least one chunk.

/// Maximum characters per indexed chunk.
pub const CHUNK_SIZE: usize = 1000;

/// Characters shared between consecutive chunks.
pub const CHUNK_OVERLAP: usize = 200;

/// Maximum characters of memory content persisted per record.
pub const MAX_CONTENT_LEN: usize = 1000;

/// Marker appended to truncated memory content.
pub const TRUNCATION_MARKER: &str = "...";

/// Splits `text` into overlapping character windows.
///
/// Text at or under [`CHUNK_SIZE`] characters comes back as a single chunk.
pub fn split_text(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= CHUNK_SIZE {
        return vec![text.to_string()];
    }

    let step = CHUNK_SIZE - CHUNK_OVERLAP;
    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + CHUNK_SIZE).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

/// Truncates memory content to [`MAX_CONTENT_LEN`] characters, appending
/// [`TRUNCATION_MARKER`] when anything was cut.
pub fn truncate_content(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= MAX_CONTENT_LEN {
        return text.to_string();
    }
    let mut truncated: String = chars[..MAX_CONTENT_LEN].iter().collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}
