// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Full sync: resolve the branch, skip if the cache is current, otherwise
//! list, classify, hydrate and hand everything to a cache.

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::client::GithubBackend;
use crate::error::{CacheError, GithubBackendError};
use crate::types::{FetchedContents, FetchingFile, FileCategory, FileListItem};

/// Decides which listed files are entries, which are assets, and which are
/// not synced at all (`None`).
pub trait FileClassifier: Send + Sync {
	fn classify(&self, file: &FileListItem) -> Option<FileCategory>;
}

impl<F> FileClassifier for F
where
	F: Fn(&FileListItem) -> Option<FileCategory> + Send + Sync,
{
	fn classify(&self, file: &FileListItem) -> Option<FileCategory> {
		self(file)
	}
}

/// Classifies by file extension: listed text extensions are entries,
/// everything else is an asset. Dotfiles are skipped.
#[derive(Debug, Clone)]
pub struct ExtensionClassifier {
	entry_extensions: Vec<String>,
}

impl Default for ExtensionClassifier {
	fn default() -> Self {
		Self::new(["md", "markdown", "mdx", "html", "json", "yaml", "yml", "toml"])
	}
}

impl ExtensionClassifier {
	pub fn new<I, S>(entry_extensions: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			entry_extensions: entry_extensions
				.into_iter()
				.map(|ext| ext.into().to_ascii_lowercase())
				.collect(),
		}
	}
}

impl FileClassifier for ExtensionClassifier {
	fn classify(&self, file: &FileListItem) -> Option<FileCategory> {
		let path = Path::new(&file.path);
		let hidden = path
			.components()
			.any(|c| c.as_os_str().to_string_lossy().starts_with('.'));
		if hidden {
			return None;
		}

		let is_entry = path
			.extension()
			.map(|ext| ext.to_string_lossy().to_ascii_lowercase())
			.is_some_and(|ext| self.entry_extensions.contains(&ext));

		Some(if is_entry {
			FileCategory::Entry
		} else {
			FileCategory::Asset
		})
	}
}

/// Everything a sync produced, handed to [`ContentCache::store`].
#[derive(Debug, Clone, Serialize)]
pub struct SyncSnapshot {
	pub branch: String,
	pub head: String,
	pub files: Vec<FileListItem>,
	pub contents: FetchedContents,
}

/// Where synced content goes. Storage mechanics belong to the implementor.
#[async_trait]
pub trait ContentCache: Send + Sync {
	/// Head hash of the last stored snapshot, if any.
	async fn cached_head(&self) -> Result<Option<String>, CacheError>;

	async fn store(&self, snapshot: SyncSnapshot) -> Result<(), CacheError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
	pub branch: String,
	pub head: String,
	/// The cache already held this head; nothing was fetched.
	pub up_to_date: bool,
	pub entries: usize,
	pub assets: usize,
	/// Listed files the classifier left out.
	pub ignored: usize,
	pub missing_history: usize,
}

impl GithubBackend {
	/// Bring `cache` up to date with the working branch.
	#[instrument(skip_all)]
	pub async fn sync_files(
		&self,
		classifier: &dyn FileClassifier,
		cache: &dyn ContentCache,
	) -> Result<SyncSummary, GithubBackendError> {
		let branch = self.branch().await?;
		let head = self.fetch_last_commit_hash().await?;

		if cache.cached_head().await?.as_deref() == Some(head.as_str()) {
			debug!(branch = %branch, head = %head, "Cache is current");
			return Ok(SyncSummary {
				branch,
				head,
				up_to_date: true,
				..SyncSummary::default()
			});
		}

		let files = self.fetch_file_list().await?;
		let wanted: Vec<FetchingFile> = files
			.iter()
			.filter_map(|file| {
				classifier
					.classify(file)
					.map(|category| FetchingFile::new(category, file.clone()))
			})
			.collect();

		let entries = wanted.iter().filter(|f| f.is_entry()).count();
		let summary = SyncSummary {
			branch: branch.clone(),
			head: head.clone(),
			up_to_date: false,
			entries,
			assets: wanted.len() - entries,
			ignored: files.len() - wanted.len(),
			missing_history: 0,
		};

		let contents = self.fetch_file_contents(&wanted).await?;
		let summary = SyncSummary {
			missing_history: contents.missing_history.len(),
			..summary
		};

		cache
			.store(SyncSnapshot {
				branch,
				head,
				files,
				contents,
			})
			.await?;

		info!(
			branch = %summary.branch,
			head = %summary.head,
			entries = summary.entries,
			assets = summary.assets,
			ignored = summary.ignored,
			missing_history = summary.missing_history,
			"Synced repository"
		);
		Ok(summary)
	}
}
