// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The GitHub backend client.
//!
//! Operations are spread over sibling modules as `impl GithubBackend` blocks:
//! branch resolution, tree listing, batched hydration, blobs, commits,
//! deployment dispatch, status and the user profile.

use std::sync::{Arc, OnceLock};

use quire_common_http::{HttpTransport, Transport};
use tracing::info;

use crate::api::GithubApi;
use crate::commit::{CommitMessageFormatter, DefaultCommitMessage};
use crate::config::GithubBackendConfig;
use crate::context::{ApiEndpoints, RepositoryContext};
use crate::error::GithubBackendError;

/// Client for one GitHub repository.
///
/// Call [`GithubBackend::init`] before anything else. The client is cheap to
/// share behind an `Arc`; the only mutable state is the repository context
/// and the resolved default branch, each written once.
pub struct GithubBackend {
	pub(crate) config: GithubBackendConfig,
	pub(crate) api: GithubApi,
	context: OnceLock<RepositoryContext>,
	default_branch: OnceLock<String>,
	pub(crate) formatter: Arc<dyn CommitMessageFormatter>,
}

impl std::fmt::Debug for GithubBackend {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("GithubBackend")
			.field("config", &self.config)
			.field("context", &self.context.get())
			.field("default_branch", &self.default_branch.get())
			.finish_non_exhaustive()
	}
}

impl GithubBackend {
	pub fn new(config: GithubBackendConfig, transport: Arc<dyn Transport>) -> Self {
		let endpoints = ApiEndpoints::resolve(config.api_root());
		let api = GithubApi::new(transport, config.token().clone(), endpoints);

		Self {
			config,
			api,
			context: OnceLock::new(),
			default_branch: OnceLock::new(),
			formatter: Arc::new(DefaultCommitMessage),
		}
	}

	/// Build an initialized client over [`HttpTransport`].
	pub fn connect(config: GithubBackendConfig) -> Result<Self, GithubBackendError> {
		let transport = HttpTransport::new()?.with_retry_config(config.retry_config.clone());
		let backend = Self::new(config, Arc::new(transport));
		backend.init();
		Ok(backend)
	}

	/// Replace the commit headline generator.
	pub fn with_commit_message_formatter(
		mut self,
		formatter: Arc<dyn CommitMessageFormatter>,
	) -> Self {
		self.formatter = formatter;
		self
	}

	/// Populate the repository context. Later calls return the existing one.
	pub fn init(&self) -> &RepositoryContext {
		self.context.get_or_init(|| {
			let ctx = RepositoryContext::from_config(&self.config);
			info!(
				owner = %ctx.owner,
				repo = %ctx.repo,
				branch = ?ctx.branch,
				base_url = %ctx.base_url,
				"GitHub backend initialized"
			);
			ctx
		})
	}

	pub fn context(&self) -> Result<&RepositoryContext, GithubBackendError> {
		self.context.get().ok_or(GithubBackendError::NotInitialized)
	}

	pub fn config(&self) -> &GithubBackendConfig {
		&self.config
	}

	/// The branch operations run against: the configured one, else the
	/// repository default, resolved on first use and remembered.
	pub async fn branch(&self) -> Result<String, GithubBackendError> {
		let ctx = self.context()?;
		if let Some(branch) = &ctx.branch {
			return Ok(branch.clone());
		}
		if let Some(branch) = self.default_branch.get() {
			return Ok(branch.clone());
		}

		let resolved = self.fetch_default_branch_name().await?;
		Ok(self.default_branch.get_or_init(|| resolved).clone())
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::testing::{graphql_ok, MockTransport};

	#[test]
	fn init_is_idempotent() {
		let transport = MockTransport::new(|_| unreachable!("init does not touch the network"));
		let backend =
			GithubBackend::new(GithubBackendConfig::new("acme/site", "t"), transport.clone());

		assert!(matches!(backend.context(), Err(GithubBackendError::NotInitialized)));

		let first = backend.init().clone();
		let second = backend.init();
		assert_eq!(&first, second);
		assert_eq!(transport.request_count(), 0);
	}

	#[tokio::test]
	async fn operations_require_init() {
		let transport = MockTransport::new(|_| unreachable!());
		let backend = GithubBackend::new(GithubBackendConfig::new("acme/site", "t"), transport);

		let err = backend.fetch_file_list().await.unwrap_err();
		assert!(matches!(err, GithubBackendError::NotInitialized));
	}

	#[tokio::test]
	async fn configured_branch_skips_resolution() {
		let transport = MockTransport::new(|_| unreachable!());
		let backend = GithubBackend::new(
			GithubBackendConfig::new("acme/site", "t").with_branch("draft"),
			transport.clone(),
		);
		backend.init();

		assert_eq!(backend.branch().await.unwrap(), "draft");
		assert_eq!(transport.request_count(), 0);
	}

	#[tokio::test]
	async fn default_branch_is_resolved_once() {
		let transport = MockTransport::new(|_| {
			graphql_ok(json!({ "repository": { "defaultBranchRef": { "name": "trunk" } } }))
		});
		let backend =
			GithubBackend::new(GithubBackendConfig::new("acme/site", "t"), transport.clone());
		backend.init();

		assert_eq!(backend.branch().await.unwrap(), "trunk");
		assert_eq!(backend.branch().await.unwrap(), "trunk");
		assert_eq!(transport.request_count(), 1);
	}
}
