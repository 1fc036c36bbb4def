// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Repository identity and endpoint resolution.

use reqwest::Url;
use serde::Serialize;

use crate::config::GithubBackendConfig;
use crate::types::BACKEND_NAME;

const GITHUB_WEB_ORIGIN: &str = "https://github.com";
const GITHUB_API_ROOT: &str = "https://api.github.com";

/// Where the configured repository lives. Built once by
/// [`crate::GithubBackend::init`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryContext {
	pub service: &'static str,
	pub owner: String,
	pub repo: String,
	/// Configured branch; `None` follows the repository default.
	pub branch: Option<String>,
	/// `{origin}/{owner}/{repo}`
	pub base_url: String,
	/// `{base_url}/tree/{branch}`, or `base_url` when no branch is configured.
	pub branch_url: String,
}

impl RepositoryContext {
	pub fn from_config(config: &GithubBackendConfig) -> Self {
		let (owner, repo) = split_repo_path(config.repo());
		let origin = config
			.api_root()
			.map(web_origin)
			.unwrap_or_else(|| GITHUB_WEB_ORIGIN.to_string());
		let base_url = format!("{origin}/{owner}/{repo}");
		let branch = config.branch().map(str::to_string);
		let branch_url = match &branch {
			Some(branch) => format!("{base_url}/tree/{branch}"),
			None => base_url.clone(),
		};

		Self {
			service: BACKEND_NAME,
			owner,
			repo,
			branch,
			base_url,
			branch_url,
		}
	}

	/// `owner/repo`
	pub fn full_name(&self) -> String {
		format!("{}/{}", self.owner, self.repo)
	}

	/// Web URL of `path` on `branch`.
	pub fn file_url(&self, branch: &str, path: &str) -> String {
		format!("{}/blob/{branch}/{path}", self.base_url)
	}
}

/// REST and GraphQL endpoints for github.com or an Enterprise Server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
	rest: String,
	graphql: String,
}

impl ApiEndpoints {
	pub fn resolve(api_root: Option<&Url>) -> Self {
		match api_root {
			Some(root) => {
				let origin = web_origin(root);
				Self {
					rest: format!("{origin}/api/v3"),
					graphql: format!("{origin}/api/graphql"),
				}
			}
			None => Self {
				rest: GITHUB_API_ROOT.to_string(),
				graphql: format!("{GITHUB_API_ROOT}/graphql"),
			},
		}
	}

	/// Absolute REST URL for an API path such as `/user`.
	pub fn rest(&self, path: &str) -> String {
		format!("{}{path}", self.rest)
	}

	pub fn graphql(&self) -> &str {
		&self.graphql
	}
}

fn web_origin(url: &Url) -> String {
	url.origin().ascii_serialization()
}

/// Split `owner/repo`. Anything without a slash becomes the owner with an
/// empty repository name, which GitHub will later report as not found.
fn split_repo_path(path: &str) -> (String, String) {
	match path.split_once('/') {
		Some((owner, repo)) => (owner.to_string(), repo.to_string()),
		None => (path.to_string(), String::new()),
	}
}
