// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Guarded commits through `createCommitOnBranch`.
//!
//! The mutation carries the branch head read just before the change set was
//! submitted as `expectedHeadOid`. GitHub refuses the commit if the branch
//! has moved since, so concurrent editors cannot overwrite each other. The
//! caller re-syncs and tries again; nothing here retries.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::future::join_all;
use quire_common_http::TransportError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::client::GithubBackend;
use crate::error::GithubBackendError;
use crate::types::{ChangeAction, CommitOptions, CommitResult, PendingChange};

const CREATE_COMMIT_MUTATION: &str = r#"
	mutation ($input: CreateCommitOnBranchInput!) {
		createCommitOnBranch(input: $input) {
			commit {
				url
			}
		}
	}
"#;

/// Produces the single-line commit headline for a change set.
pub trait CommitMessageFormatter: Send + Sync {
	fn headline(&self, changes: &[PendingChange], options: &CommitOptions) -> String;
}

/// `Create a.md`, `Update a.md`, `Delete a.md` for one change, `Update 3
/// files` (or `Delete 3 files` when every change is a delete) for several.
/// A message in [`CommitOptions`] wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCommitMessage;

impl CommitMessageFormatter for DefaultCommitMessage {
	fn headline(&self, changes: &[PendingChange], options: &CommitOptions) -> String {
		let custom = options
			.message
			.as_deref()
			.and_then(|message| message.lines().next())
			.map(str::trim)
			.filter(|line| !line.is_empty());

		let mut headline = match (custom, changes) {
			(Some(line), _) => line.to_string(),
			(None, [change]) => format!("{} {}", change.action.verb(), change.path),
			(None, changes) => {
				let first = changes.first().map(|c| c.action);
				let verb = match first {
					Some(action) if changes.iter().all(|c| c.action == action) => action.verb(),
					_ => ChangeAction::Update.verb(),
				};
				format!("{verb} {} files", changes.len())
			}
		};

		if options.skip_ci {
			headline.push_str(" [skip ci]");
		}
		headline
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileAddition {
	pub path: String,
	/// Base64-encoded file content.
	pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDeletion {
	pub path: String,
}

/// The `fileChanges` argument of `createCommitOnBranch`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileChanges {
	pub additions: Vec<FileAddition>,
	pub deletions: Vec<FileDeletion>,
}

impl FileChanges {
	pub fn is_empty(&self) -> bool {
		self.additions.is_empty() && self.deletions.is_empty()
	}
}

async fn encode(change: &PendingChange) -> FileAddition {
	let contents = match (&change.base64, &change.data) {
		(Some(encoded), _) => encoded.clone(),
		(None, Some(data)) => STANDARD.encode(data),
		(None, None) => String::new(),
	};
	FileAddition {
		path: change.path.clone(),
		contents,
	}
}

/// Split pending changes into base64 additions and deletions, encoding the
/// additions concurrently.
pub async fn build_file_changes(changes: &[PendingChange]) -> FileChanges {
	let additions = join_all(
		changes
			.iter()
			.filter(|change| change.action != ChangeAction::Delete)
			.map(encode),
	)
	.await;

	let deletions = changes
		.iter()
		.filter(|change| change.action == ChangeAction::Delete)
		.map(|change| FileDeletion {
			path: change.path.clone(),
		})
		.collect();

	FileChanges {
		additions,
		deletions,
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCommitInput<'a> {
	branch: CommittableBranch<'a>,
	expected_head_oid: &'a str,
	file_changes: &'a FileChanges,
	message: CommitMessage<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommittableBranch<'a> {
	repository_name_with_owner: String,
	branch_name: &'a str,
}

#[derive(Serialize)]
struct CommitMessage<'a> {
	headline: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCommitData {
	create_commit_on_branch: Option<CreateCommitPayload>,
}

#[derive(Deserialize)]
struct CreateCommitPayload {
	commit: Option<CommitUrl>,
}

#[derive(Deserialize)]
struct CommitUrl {
	url: String,
}

impl GithubBackend {
	/// Commit `changes` to the working branch as one commit.
	///
	/// Returns [`GithubBackendError::CommitRejected`] when GitHub refuses the
	/// mutation, most often because the branch head moved.
	#[instrument(skip_all, fields(changes = changes.len()))]
	pub async fn commit_changes(
		&self,
		changes: &[PendingChange],
		options: &CommitOptions,
	) -> Result<CommitResult, GithubBackendError> {
		let ctx = self.context()?;
		let branch = self.branch().await?;

		let file_changes = build_file_changes(changes).await;
		let headline = self.formatter.headline(changes, options);
		let headline = headline.lines().next().unwrap_or_default().trim();

		let expected_head = self.fetch_last_commit_hash().await?;

		let input = CreateCommitInput {
			branch: CommittableBranch {
				repository_name_with_owner: ctx.full_name(),
				branch_name: &branch,
			},
			expected_head_oid: &expected_head,
			file_changes: &file_changes,
			message: CommitMessage { headline },
		};

		let response = match self
			.api
			.graphql(CREATE_COMMIT_MUTATION, json!({ "input": input }))
			.await
		{
			Ok(response) => response,
			Err(GithubBackendError::Transport(TransportError::Status { status, body })) => {
				warn!(status, branch = %branch, "Commit request refused");
				return Err(GithubBackendError::commit_rejected(
					&branch,
					format!("HTTP {status}: {body}"),
				));
			}
			Err(e) => return Err(e),
		};

		if !response.errors.is_empty() {
			let message = response.error_message();
			warn!(
				branch = %branch,
				expected_head = %expected_head,
				error = %message,
				"Commit rejected"
			);
			return Err(GithubBackendError::commit_rejected(&branch, message));
		}

		let data: CreateCommitData = response.into_data()?;
		let commit_url = data
			.create_commit_on_branch
			.and_then(|payload| payload.commit)
			.map(|commit| commit.url)
			.ok_or_else(|| GithubBackendError::commit_rejected(&branch, "no commit was created"))?;

		info!(
			branch = %branch,
			additions = file_changes.additions.len(),
			deletions = file_changes.deletions.len(),
			commit_url = %commit_url,
			"Committed changes"
		);
		Ok(CommitResult { commit_url })
	}
}
