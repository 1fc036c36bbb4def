// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Data types exchanged with callers of the backend.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Machine name of this backend.
pub const BACKEND_NAME: &str = "github";

/// Human-readable name of this backend.
pub const BACKEND_LABEL: &str = "GitHub";

/// One blob in the repository tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileListItem {
	pub path: String,
	pub sha: String,
	pub size: u64,
}

/// How a file takes part in hydration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
	/// Text content plus commit metadata.
	Entry,
	/// Commit metadata only; bytes come later through `fetch_blob`.
	Asset,
}

/// A file requested from `fetch_file_contents`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchingFile {
	pub category: FileCategory,
	pub path: String,
	pub sha: String,
	pub size: u64,
}

impl FetchingFile {
	pub fn new(category: FileCategory, item: FileListItem) -> Self {
		Self {
			category,
			path: item.path,
			sha: item.sha,
			size: item.size,
		}
	}

	pub fn entry(item: FileListItem) -> Self {
		Self::new(FileCategory::Entry, item)
	}

	pub fn asset(item: FileListItem) -> Self {
		Self::new(FileCategory::Asset, item)
	}

	pub fn is_entry(&self) -> bool {
		self.category == FileCategory::Entry
	}
}

/// Author of the last commit that touched a file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitAuthor {
	pub name: String,
	pub email: String,
	/// GitHub account id, absent when the git author has no linked account.
	pub id: Option<i64>,
	pub login: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
	/// Web URL of the file on its branch.
	pub file_url: String,
	pub commit_author: CommitAuthor,
	pub commit_date: DateTime<Utc>,
}

/// A file with its content (entries only) and last-commit metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HydratedFile {
	pub path: String,
	pub sha: String,
	pub size: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub text: Option<String>,
	pub meta: FileMeta,
}

/// Result of a batched hydration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedContents {
	/// Hydrated files keyed by path.
	pub files: HashMap<String, HydratedFile>,
	/// Requested paths for which GitHub returned no commit history.
	pub missing_history: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
	Create,
	Update,
	Delete,
}

impl ChangeAction {
	pub fn verb(self) -> &'static str {
		match self {
			Self::Create => "Create",
			Self::Update => "Update",
			Self::Delete => "Delete",
		}
	}
}

/// A locally staged change to be committed.
///
/// For create/update the committed bytes are `base64` when present, else
/// `data` encoded, else empty content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChange {
	pub path: String,
	pub action: ChangeAction,
	pub data: Option<Vec<u8>>,
	pub base64: Option<String>,
}

impl PendingChange {
	pub fn create(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
		Self::with_data(ChangeAction::Create, path, data)
	}

	pub fn update(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
		Self::with_data(ChangeAction::Update, path, data)
	}

	pub fn delete(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			action: ChangeAction::Delete,
			data: None,
			base64: None,
		}
	}

	/// Attach already-encoded content, which takes precedence over `data`.
	pub fn with_base64(mut self, encoded: impl Into<String>) -> Self {
		self.base64 = Some(encoded.into());
		self
	}

	fn with_data(action: ChangeAction, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
		Self {
			path: path.into(),
			action,
			data: Some(data.into()),
			base64: None,
		}
	}
}

/// Caller-controlled commit settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOptions {
	/// Overrides the generated headline. Only the first line is used.
	pub message: Option<String>,
	/// Append `[skip ci]` to the headline.
	pub skip_ci: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResult {
	pub commit_url: String,
}

/// The authenticated GitHub account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
	pub name: Option<String>,
	pub login: String,
	pub email: Option<String>,
	pub avatar_url: String,
	pub html_url: String,
}
