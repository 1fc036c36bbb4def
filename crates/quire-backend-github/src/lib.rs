// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub content backend for Quire.
//!
//! Pulls a repository's file tree and contents into a local working set and
//! pushes edits back as a single commit guarded by the branch head it was
//! built against. Tree listing, blobs and dispatches use the REST API; branch
//! resolution, batched hydration and commits use GraphQL.
//!
//! ```rust,no_run
//! use quire_backend_github::{
//! 	CommitOptions, FetchingFile, GithubBackend, GithubBackendConfig, PendingChange,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = GithubBackend::connect(GithubBackendConfig::from_env()?)?;
//!
//! let files = backend.fetch_file_list().await?;
//! let wanted: Vec<_> = files.into_iter().map(FetchingFile::entry).collect();
//! let contents = backend.fetch_file_contents(&wanted).await?;
//!
//! let changes = [PendingChange::update("posts/hello.md", "# Hello")];
//! let result = backend.commit_changes(&changes, &CommitOptions::default()).await?;
//! println!("{} files, committed {}", contents.files.len(), result.commit_url);
//! # Ok(())
//! # }
//! ```

mod api;
pub mod blob;
mod branch;
pub mod client;
pub mod commit;
pub mod config;
pub mod context;
mod contents;
mod deploy;
pub mod error;
pub mod graphql;
pub mod status;
pub mod sync;
#[cfg(test)]
mod testing;
mod tree;
pub mod types;
mod user;

pub use blob::BlobContent;
pub use client::GithubBackend;
pub use commit::{build_file_changes, CommitMessageFormatter, DefaultCommitMessage, FileChanges};
pub use config::GithubBackendConfig;
pub use context::{ApiEndpoints, RepositoryContext};
pub use error::{CacheError, GithubBackendError};
pub use quire_common_http::{HttpTransport, RetryConfig, Transport};
pub use status::{check_status, ServiceStatus, STATUS_CHECK_URL, STATUS_DASHBOARD_URL};
pub use sync::{ContentCache, ExtensionClassifier, FileClassifier, SyncSnapshot, SyncSummary};
pub use types::{
	ChangeAction, CommitAuthor, CommitOptions, CommitResult, FetchedContents, FetchingFile,
	FileCategory, FileListItem, FileMeta, HydratedFile, PendingChange, UserProfile, BACKEND_LABEL,
	BACKEND_NAME,
};
