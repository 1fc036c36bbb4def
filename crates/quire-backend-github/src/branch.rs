// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use crate::client::GithubBackend;
use crate::error::GithubBackendError;

const DEFAULT_BRANCH_QUERY: &str = r#"
	query($owner: String!, $name: String!) {
		repository(owner: $owner, name: $name) {
			defaultBranchRef {
				name
			}
		}
	}
"#;

const HEAD_QUERY: &str = r#"
	query($owner: String!, $name: String!, $qualifiedName: String!) {
		repository(owner: $owner, name: $name) {
			ref(qualifiedName: $qualifiedName) {
				target {
					oid
				}
			}
		}
	}
"#;

#[derive(Deserialize)]
struct RepositoryData<T> {
	repository: Option<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefaultBranchRepository {
	default_branch_ref: Option<RefName>,
}

#[derive(Deserialize)]
struct RefName {
	name: String,
}

#[derive(Deserialize)]
struct HeadRepository {
	#[serde(rename = "ref")]
	git_ref: Option<RefTarget>,
}

#[derive(Deserialize)]
struct RefTarget {
	target: Target,
}

#[derive(Deserialize)]
struct Target {
	oid: String,
}

impl GithubBackend {
	/// Name of the repository's default branch.
	///
	/// A missing repository and a repository with no commits are reported as
	/// different errors.
	#[instrument(skip(self))]
	pub async fn fetch_default_branch_name(&self) -> Result<String, GithubBackendError> {
		let ctx = self.context()?;
		let data: RepositoryData<DefaultBranchRepository> = self
			.api
			.graphql(
				DEFAULT_BRANCH_QUERY,
				json!({ "owner": ctx.owner, "name": ctx.repo }),
			)
			.await?
			.into_data()?;

		let repository = data
			.repository
			.ok_or_else(|| GithubBackendError::repository_not_found(&ctx.owner, &ctx.repo))?;
		let branch = repository
			.default_branch_ref
			.ok_or_else(|| GithubBackendError::repository_empty(&ctx.owner, &ctx.repo))?;

		debug!(branch = %branch.name, "Resolved default branch");
		Ok(branch.name)
	}

	/// Commit hash the working branch currently points at.
	///
	/// Always asks GitHub; the value is what a commit is guarded against.
	#[instrument(skip(self))]
	pub async fn fetch_last_commit_hash(&self) -> Result<String, GithubBackendError> {
		let ctx = self.context()?;
		let branch = self.branch().await?;
		let data: RepositoryData<HeadRepository> = self
			.api
			.graphql(
				HEAD_QUERY,
				json!({ "owner": ctx.owner, "name": ctx.repo, "qualifiedName": branch }),
			)
			.await?
			.into_data()?;

		let repository = data
			.repository
			.ok_or_else(|| GithubBackendError::repository_not_found(&ctx.owner, &ctx.repo))?;
		let head = repository
			.git_ref
			.ok_or_else(|| GithubBackendError::branch_not_found(&ctx.owner, &ctx.repo, &branch))?;

		debug!(branch = %branch, oid = %head.target.oid, "Resolved branch head");
		Ok(head.target.oid)
	}
}
