// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Error types for the GitHub backend.

use quire_common_http::TransportError;
use thiserror::Error;

/// Errors that can occur when syncing with or committing to GitHub.
///
/// The three resolution failures (`RepositoryNotFound`, `RepositoryEmpty`,
/// `BranchNotFound`) point at configuration the user has to fix and are never
/// retried here. `CommitRejected` means the remote refused the commit; the
/// caller re-syncs, re-applies and commits again.
#[derive(Debug, Error)]
pub enum GithubBackendError {
	#[error("Repository {owner}/{repo} not found")]
	RepositoryNotFound { owner: String, repo: String },

	/// The repository exists but has no default branch ref (no commits yet).
	#[error("Repository {owner}/{repo} is empty")]
	RepositoryEmpty { owner: String, repo: String },

	#[error("Branch {branch} not found in {owner}/{repo}")]
	BranchNotFound {
		owner: String,
		repo: String,
		branch: String,
	},

	/// Stale head, missing permission or validation failure.
	#[error("Commit to {branch} was rejected: {message}")]
	CommitRejected { branch: String, message: String },

	#[error(transparent)]
	Transport(#[from] TransportError),

	/// GraphQL answered with errors and no usable data.
	#[error("GitHub GraphQL error: {0}")]
	GraphQl(String),

	#[error("Invalid response from GitHub: {0}")]
	InvalidResponse(String),

	#[error("GitHub backend used before init()")]
	NotInitialized,

	#[error("Configuration error: {0}")]
	Config(String),

	#[error(transparent)]
	Cache(#[from] CacheError),
}

/// Failure reported by a [`crate::ContentCache`] implementation.
#[derive(Debug, Error)]
#[error("Content cache error: {0}")]
pub struct CacheError(pub String);

impl GithubBackendError {
	pub fn repository_not_found(owner: impl Into<String>, repo: impl Into<String>) -> Self {
		Self::RepositoryNotFound {
			owner: owner.into(),
			repo: repo.into(),
		}
	}

	pub fn repository_empty(owner: impl Into<String>, repo: impl Into<String>) -> Self {
		Self::RepositoryEmpty {
			owner: owner.into(),
			repo: repo.into(),
		}
	}

	pub fn branch_not_found(
		owner: impl Into<String>,
		repo: impl Into<String>,
		branch: impl Into<String>,
	) -> Self {
		Self::BranchNotFound {
			owner: owner.into(),
			repo: repo.into(),
			branch: branch.into(),
		}
	}

	pub fn commit_rejected(branch: impl Into<String>, message: impl Into<String>) -> Self {
		Self::CommitRejected {
			branch: branch.into(),
			message: message.into(),
		}
	}

	/// True for failures that indicate a misconfigured repository or branch.
	pub fn is_resolution_failure(&self) -> bool {
		matches!(
			self,
			Self::RepositoryNotFound { .. }
				| Self::RepositoryEmpty { .. }
				| Self::BranchNotFound { .. }
		)
	}
}
