// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Git-backed memory repository sync for Keepsake.
//!
//! The working copy mirrors a remote git repository of JSON, markdown, and
//! text memory files. Before any read the caller is expected to have pulled
//! the latest remote state via [`RepoSync::clone_or_update`]; writes are
//! committed and pushed before the operation reports success.

mod sync;
mod url;

pub use sync::RepoSync;
pub use url::{mask_url, prepare_repo_url};
