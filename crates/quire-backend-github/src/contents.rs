// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Batched hydration: text and last-commit metadata for many files in one
//! GraphQL round trip.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::client::GithubBackend;
use crate::error::GithubBackendError;
use crate::graphql::{alias, quote, BatchQuery, BatchResponse};
use crate::types::{CommitAuthor, FetchedContents, FetchingFile, FileMeta, HydratedFile};

#[derive(Deserialize)]
struct BlobText {
	text: Option<String>,
}

#[derive(Deserialize)]
struct CommitRef {
	target: Option<CommitTarget>,
}

#[derive(Deserialize)]
struct CommitTarget {
	history: Option<History>,
}

#[derive(Deserialize)]
struct History {
	nodes: Vec<HistoryNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryNode {
	author: Option<GitActor>,
	committed_date: DateTime<Utc>,
}

#[derive(Deserialize)]
struct GitActor {
	name: Option<String>,
	email: Option<String>,
	user: Option<ActorUser>,
}

#[derive(Deserialize)]
struct ActorUser {
	id: Option<i64>,
	login: Option<String>,
}

impl From<Option<GitActor>> for CommitAuthor {
	fn from(actor: Option<GitActor>) -> Self {
		let Some(actor) = actor else {
			return Self::default();
		};
		let (id, login) = actor
			.user
			.map(|user| (user.id, user.login))
			.unwrap_or_default();

		Self {
			name: actor.name.unwrap_or_default(),
			email: actor.email.unwrap_or_default(),
			id,
			login,
		}
	}
}

fn fragment(index: usize, file: &FetchingFile, branch: &str) -> String {
	let content = if file.is_entry() {
		format!(
			"{}: object(oid: {}) {{ ... on Blob {{ text }} }} ",
			alias("content", index),
			quote(&file.sha)
		)
	} else {
		String::new()
	};

	format!(
		"{content}{}: ref(qualifiedName: {}) {{
			target {{
				... on Commit {{
					history(first: 1, path: {}) {{
						nodes {{
							author {{ name email user {{ id: databaseId login }} }}
							committedDate
						}}
					}}
				}}
			}}
		}}",
		alias("commit", index),
		quote(branch),
		quote(&file.path)
	)
}

impl GithubBackend {
	/// Hydrate `files` in a single GraphQL request.
	///
	/// Entries get their text; assets only get metadata. A file whose path
	/// has no commit history is left out of the map and listed in
	/// `missing_history`.
	#[instrument(skip_all, fields(count = files.len()))]
	pub async fn fetch_file_contents(
		&self,
		files: &[FetchingFile],
	) -> Result<FetchedContents, GithubBackendError> {
		if files.is_empty() {
			return Ok(FetchedContents::default());
		}

		let ctx = self.context()?;
		let branch = self.branch().await?;
		let batch = BatchQuery::new(files);

		let query = format!(
			"query {{ repository(owner: {}, name: {}) {{ {} }} }}",
			quote(&ctx.owner),
			quote(&ctx.repo),
			batch.compose(|index, file| fragment(index, file, &branch))
		);

		let data: Value = self.api.graphql(&query, json!({})).await?.into_data()?;
		let fields = match data.get("repository") {
			Some(Value::Object(fields)) => fields.clone(),
			_ => return Err(GithubBackendError::repository_not_found(&ctx.owner, &ctx.repo)),
		};

		let hydrated = batch.demux(BatchResponse::new(fields), |index, file, response| {
			let history = response
				.take::<CommitRef>("commit", index)?
				.and_then(|r| r.target)
				.and_then(|t| t.history)
				.and_then(|h| h.nodes.into_iter().next());
			let text = if file.is_entry() {
				response
					.take::<BlobText>("content", index)?
					.and_then(|blob| blob.text)
			} else {
				None
			};

			Ok(history.map(|node| HydratedFile {
				path: file.path.clone(),
				sha: file.sha.clone(),
				size: file.size,
				text,
				meta: FileMeta {
					file_url: ctx.file_url(&branch, &file.path),
					commit_author: node.author.into(),
					commit_date: node.committed_date,
				},
			}))
		})?;

		let mut contents = FetchedContents::default();
		for (file, hydrated) in files.iter().zip(hydrated) {
			match hydrated {
				Some(hydrated) => {
					contents.files.insert(hydrated.path.clone(), hydrated);
				}
				None => {
					warn!(
						path = %file.path,
						branch = %branch,
						"No commit history for file, skipping"
					);
					contents.missing_history.push(file.path.clone());
				}
			}
		}

		debug!(
			hydrated = contents.files.len(),
			missing = contents.missing_history.len(),
			"Fetched file contents"
		);
		Ok(contents)
	}
}
