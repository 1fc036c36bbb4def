// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration for the GitHub backend.

use quire_common_config::{env_value, require_secret_env, Secret, SecretString};
use quire_common_http::RetryConfig;
use reqwest::Url;
use tracing::warn;

use crate::error::GithubBackendError;

/// Repository dispatch event sent by [`crate::GithubBackend::trigger_deployment`].
pub const DEFAULT_DEPLOY_EVENT_TYPE: &str = "quire-cms-publish";

const ENV_PREFIX: &str = "QUIRE_GITHUB";

/// Configuration for [`crate::GithubBackend`].
///
/// The token is stored as a [`SecretString`] so it never shows up in logs.
#[derive(Clone)]
pub struct GithubBackendConfig {
	/// `owner/repo`
	repo: String,

	/// Branch to sync and commit to. `None` means the default branch.
	branch: Option<String>,

	/// GitHub Enterprise Server root (validated HTTPS). `None` means github.com.
	api_root: Option<Url>,

	token: SecretString,

	deploy_event_type: String,

	/// HTTP retry configuration for idempotent requests
	pub retry_config: RetryConfig,
}

impl std::fmt::Debug for GithubBackendConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("GithubBackendConfig")
			.field("repo", &self.repo)
			.field("branch", &self.branch)
			.field("api_root", &self.api_root.as_ref().map(Url::as_str))
			.field("token", &self.token)
			.field("deploy_event_type", &self.deploy_event_type)
			.field("retry_config", &self.retry_config)
			.finish()
	}
}

impl GithubBackendConfig {
	/// Parse an API root. It must be an https URL with a host.
	pub fn validate_api_root(raw: &str) -> Result<Url, GithubBackendError> {
		let url = Url::parse(raw).map_err(|e| {
			GithubBackendError::Config(format!("Invalid GitHub API root '{raw}': {e}"))
		})?;

		if url.scheme() != "https" {
			return Err(GithubBackendError::Config(format!(
				"GitHub API root must use https, got '{}'",
				url.scheme()
			)));
		}

		if url.host_str().is_none() {
			return Err(GithubBackendError::Config(
				"GitHub API root must include a host".to_string(),
			));
		}

		Ok(url)
	}

	/// Create a configuration for `owner/repo` on github.com.
	///
	/// The repository path is not validated; a malformed path surfaces later
	/// as a "not found" error from GitHub.
	pub fn new(repo: impl Into<String>, token: impl Into<String>) -> Self {
		Self {
			repo: repo.into(),
			branch: None,
			api_root: None,
			token: Secret::new(token.into()),
			deploy_event_type: DEFAULT_DEPLOY_EVENT_TYPE.to_string(),
			retry_config: RetryConfig::default(),
		}
	}

	/// Create configuration from environment variables.
	///
	/// Required:
	/// - `QUIRE_GITHUB_REPO`: `owner/repo`
	/// - `QUIRE_GITHUB_TOKEN`: access token (or `QUIRE_GITHUB_TOKEN_FILE`)
	///
	/// Optional:
	/// - `QUIRE_GITHUB_BRANCH`: branch name (defaults to the repository's default branch)
	/// - `QUIRE_GITHUB_API_ROOT`: GitHub Enterprise Server URL, must be https
	/// - `QUIRE_GITHUB_DEPLOY_EVENT`: dispatch event type (defaults to `quire-cms-publish`)
	pub fn from_env() -> Result<Self, GithubBackendError> {
		Self::from_env_prefixed(ENV_PREFIX)
	}

	/// [`Self::from_env`] with `{prefix}_REPO`, `{prefix}_TOKEN` and so on.
	fn from_env_prefixed(prefix: &str) -> Result<Self, GithubBackendError> {
		let var = |name: &str| format!("{prefix}_{name}");

		let repo_var = var("REPO");
		let repo = env_value(&repo_var)
			.ok_or_else(|| GithubBackendError::Config(format!("{repo_var} not set")))?;

		let token_var = var("TOKEN");
		let token =
			require_secret_env(&token_var).map_err(|e| GithubBackendError::Config(e.to_string()))?;
		if token.is_blank() {
			return Err(GithubBackendError::Config(format!("{token_var} is empty")));
		}

		let api_root = env_value(&var("API_ROOT"))
			.map(|raw| Self::validate_api_root(&raw))
			.transpose()?;

		Ok(Self {
			repo,
			branch: env_value(&var("BRANCH")),
			api_root,
			token,
			deploy_event_type: env_value(&var("DEPLOY_EVENT"))
				.unwrap_or_else(|| DEFAULT_DEPLOY_EVENT_TYPE.to_string()),
			retry_config: RetryConfig::default(),
		})
	}

	/// Pin the branch instead of following the repository default.
	pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
		let branch = branch.into();
		self.branch = (!branch.trim().is_empty()).then_some(branch);
		self
	}

	/// Point at a GitHub Enterprise Server instance.
	///
	/// If validation fails, logs a warning and keeps the previous value.
	pub fn with_api_root(mut self, url: impl Into<String>) -> Self {
		let url_str = url.into();
		match Self::validate_api_root(&url_str) {
			Ok(validated) => self.api_root = Some(validated),
			Err(e) => {
				warn!(
					error = %e,
					url = %url_str,
					"Invalid api_root in with_api_root, keeping previous value"
				);
			}
		}
		self
	}

	/// Like [`Self::with_api_root`], but an invalid URL is an error.
	pub fn try_with_api_root(mut self, url: &str) -> Result<Self, GithubBackendError> {
		self.api_root = Some(Self::validate_api_root(url)?);
		Ok(self)
	}

	pub fn with_deploy_event_type(mut self, event_type: impl Into<String>) -> Self {
		self.deploy_event_type = event_type.into();
		self
	}

	pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
		self.retry_config = config;
		self
	}

	pub fn repo(&self) -> &str {
		&self.repo
	}

	pub fn branch(&self) -> Option<&str> {
		self.branch.as_deref()
	}

	pub fn api_root(&self) -> Option<&Url> {
		self.api_root.as_ref()
	}

	pub fn deploy_event_type(&self) -> &str {
		&self.deploy_event_type
	}

	pub(crate) fn token(&self) -> &SecretString {
		&self.token
	}
}
