// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use serde::Deserialize;
use tracing::{debug, error, instrument, warn};

use crate::client::GithubBackend;
use crate::error::GithubBackendError;
use crate::types::FileListItem;

#[derive(Deserialize)]
struct TreeResponse {
	tree: Vec<TreeEntry>,
	#[serde(default)]
	truncated: bool,
}

#[derive(Deserialize)]
struct TreeEntry {
	path: String,
	#[serde(rename = "type")]
	kind: String,
	sha: String,
	#[serde(default)]
	size: u64,
}

impl GithubBackend {
	/// Every blob in the working branch, recursively. Trees and submodules
	/// are dropped.
	#[instrument(skip(self))]
	pub async fn fetch_file_list(&self) -> Result<Vec<FileListItem>, GithubBackendError> {
		let ctx = self.context()?;
		let branch = self.branch().await?;
		let path = format!(
			"/repos/{}/{}/git/trees/{branch}?recursive=1",
			ctx.owner, ctx.repo
		);

		let body = self.api.get_json(&path).await?;
		let response: TreeResponse = serde_json::from_value(body).map_err(|e| {
			error!(error = %e, "Failed to parse tree response");
			GithubBackendError::InvalidResponse(format!("tree: {e}"))
		})?;

		if response.truncated {
			warn!(
				branch = %branch,
				entries = response.tree.len(),
				"Repository tree was truncated by GitHub; some files are missing from the listing"
			);
		}

		let files: Vec<FileListItem> = response
			.tree
			.into_iter()
			.filter(|entry| entry.kind == "blob")
			.map(|entry| FileListItem {
				path: entry.path,
				sha: entry.sha,
				size: entry.size,
			})
			.collect();

		debug!(count = files.len(), "Listed repository files");
		Ok(files)
	}
}

#[cfg(test)]
mod tests {
	use quire_common_http::{TransportError, TransportResponse};
	use serde_json::json;

	use super::*;
	use crate::testing::{backend, MockTransport};

	#[tokio::test]
	async fn keeps_blobs_only() {
		let transport = MockTransport::new(|_| {
			Ok(TransportResponse::Json(json!({
				"sha": "root",
				"truncated": false,
				"tree": [
					{ "path": "posts", "type": "tree", "sha": "t1" },
					{ "path": "posts/hello.md", "type": "blob", "sha": "b1", "size": 12 },
					{ "path": "images/logo.png", "type": "blob", "sha": "b2", "size": 2048 },
					{ "path": "vendor/theme", "type": "commit", "sha": "c1" }
				]
			})))
		});
		let backend = backend(transport.clone());

		let files = backend.fetch_file_list().await.unwrap();
		assert_eq!(files.len(), 2);
		assert_eq!(
			files[0],
			FileListItem {
				path: "posts/hello.md".to_string(),
				sha: "b1".to_string(),
				size: 12,
			}
		);

		let request = &transport.requests()[0];
		assert_eq!(
			request.url,
			"https://api.github.com/repos/acme/site/git/trees/main?recursive=1"
		);
		assert_eq!(request.header_value("Authorization"), Some("token ghp_test"));
	}

	#[tokio::test]
	async fn truncated_tree_is_still_returned() {
		let transport = MockTransport::new(|_| {
			Ok(TransportResponse::Json(json!({
				"truncated": true,
				"tree": [{ "path": "a.md", "type": "blob", "sha": "b1", "size": 1 }]
			})))
		});
		assert_eq!(backend(transport).fetch_file_list().await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn http_failure_propagates() {
		let transport = MockTransport::new(|_| {
			Err(TransportError::Status {
				status: 404,
				body: "Not Found".to_string(),
			})
		});
		let err = backend(transport).fetch_file_list().await.unwrap_err();
		assert!(matches!(
			err,
			GithubBackendError::Transport(TransportError::Status { status: 404, .. })
		));
	}
}
