// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use quire_backend_github::{
	CommitOptions, ExtensionClassifier, FetchingFile, FileCategory, FileClassifier, FileListItem,
	GithubBackend, PendingChange, Transport, STATUS_DASHBOARD_URL,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::cache::JsonFileCache;
use crate::CommitArgs;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

async fn find_file(backend: &GithubBackend, path: &str) -> Result<Option<FileListItem>> {
	let files = backend.fetch_file_list().await?;
	Ok(files.into_iter().find(|file| file.path == path))
}

fn commit_options(args: &CommitArgs) -> CommitOptions {
	CommitOptions {
		message: args.message.clone(),
		skip_ci: args.skip_ci,
	}
}

async fn commit(
	backend: &GithubBackend,
	changes: &[PendingChange],
	args: &CommitArgs,
) -> Result<()> {
	let result = backend
		.commit_changes(changes, &commit_options(args))
		.await
		.context("commit failed; if the branch moved, sync and try again")?;
	println!("{}", result.commit_url);

	if args.deploy {
		// Best effort: the commit already landed.
		match backend.trigger_deployment().await {
			Ok(status) => info!(status, "Deployment requested"),
			Err(e) => warn!(error = %e, "Deployment trigger failed"),
		}
	}
	Ok(())
}

pub async fn status(transport: &dyn Transport) -> Result<()> {
	let status = quire_backend_github::check_status(transport).await;
	println!("{status} ({STATUS_DASHBOARD_URL})");
	Ok(())
}

pub async fn whoami(backend: &GithubBackend) -> Result<()> {
	print_json(&backend.fetch_user().await?)
}

pub async fn default_branch(backend: &GithubBackend) -> Result<()> {
	println!("{}", backend.fetch_default_branch_name().await?);
	Ok(())
}

pub async fn head(backend: &GithubBackend) -> Result<()> {
	println!("{}", backend.fetch_last_commit_hash().await?);
	Ok(())
}

pub async fn ls(backend: &GithubBackend) -> Result<()> {
	let mut files = backend.fetch_file_list().await?;
	files.sort_by(|a, b| a.path.cmp(&b.path));
	for file in files {
		println!("{}\t{}\t{}", file.sha, file.size, file.path);
	}
	Ok(())
}

/// Pick the files `fetch` hydrates and report named paths that are not in
/// the tree. With no paths, every file the classifier accepts is taken. A
/// named path bypasses the classifier's ignore rule and is fetched as an entry.
fn select_files<'a>(
	files: Vec<FileListItem>,
	paths: &'a [String],
	classifier: &dyn FileClassifier,
) -> (Vec<FetchingFile>, Vec<&'a str>) {
	let mut wanted = Vec::new();
	for file in files {
		let named = paths.contains(&file.path);
		if !paths.is_empty() && !named {
			continue;
		}
		match classifier.classify(&file) {
			Some(category) => wanted.push(FetchingFile::new(category, file)),
			None if named => {
				debug!(path = %file.path, "Fetching file the classifier ignores");
				wanted.push(FetchingFile::new(FileCategory::Entry, file));
			}
			None => {}
		}
	}

	let missing = paths
		.iter()
		.filter(|path| !wanted.iter().any(|file| &file.path == *path))
		.map(String::as_str)
		.collect();
	(wanted, missing)
}

#[instrument(skip(backend))]
pub async fn fetch(backend: &GithubBackend, paths: &[String]) -> Result<()> {
	let files = backend.fetch_file_list().await?;
	let (wanted, missing) = select_files(files, paths, &ExtensionClassifier::default());

	for path in missing {
		warn!(path = %path, "Not found in repository");
	}

	print_json(&backend.fetch_file_contents(&wanted).await?)
}

#[instrument(skip(backend))]
pub async fn blob(backend: &GithubBackend, path: &str, out: Option<&Path>) -> Result<()> {
	let file = find_file(backend, path)
		.await?
		.with_context(|| format!("{path} not found in repository"))?;

	let content = backend.fetch_blob(&file).await?;
	info!(mime_type = %content.mime_type(), bytes = content.len(), "Downloaded {path}");

	let bytes = content.into_bytes();
	match out {
		Some(out) => std::fs::write(out, &bytes)
			.with_context(|| format!("failed to write {}", out.display()))?,
		None => std::io::stdout().write_all(&bytes)?,
	}
	Ok(())
}

#[instrument(skip(backend, args))]
pub async fn put(
	backend: &GithubBackend,
	path: &str,
	source: &Path,
	args: &CommitArgs,
) -> Result<()> {
	let data =
		std::fs::read(source).with_context(|| format!("failed to read {}", source.display()))?;

	let change = if find_file(backend, path).await?.is_some() {
		PendingChange::update(path, data)
	} else {
		PendingChange::create(path, data)
	};

	commit(backend, &[change], args).await
}

#[instrument(skip(backend, args))]
pub async fn rm(backend: &GithubBackend, paths: &[String], args: &CommitArgs) -> Result<()> {
	let changes: Vec<PendingChange> = paths.iter().map(PendingChange::delete).collect();
	commit(backend, &changes, args).await
}

pub async fn sync(backend: &GithubBackend, cache: &Path) -> Result<()> {
	let cache = JsonFileCache::new(cache);
	let summary = backend
		.sync_files(&ExtensionClassifier::default(), &cache)
		.await?;
	print_json(&summary)
}

pub async fn deploy(backend: &GithubBackend) -> Result<()> {
	let status = backend.trigger_deployment().await?;
	println!("dispatched ({status})");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn item(path: &str) -> FileListItem {
		FileListItem {
			path: path.to_string(),
			sha: format!("sha-{path}"),
			size: 1,
		}
	}

	fn tree() -> Vec<FileListItem> {
		vec![item("posts/a.md"), item("logo.png"), item(".github/deploy.yml")]
	}

	#[test]
	fn no_paths_takes_every_classified_file() {
		let (wanted, missing) = select_files(tree(), &[], &ExtensionClassifier::default());

		let paths: Vec<_> = wanted.iter().map(|file| file.path.as_str()).collect();
		assert_eq!(paths, ["posts/a.md", "logo.png"]);
		assert!(missing.is_empty());
	}

	#[test]
	fn named_dotfile_is_fetched_not_reported_missing() {
		let paths = [".github/deploy.yml".to_string()];
		let (wanted, missing) = select_files(tree(), &paths, &ExtensionClassifier::default());

		assert_eq!(wanted.len(), 1);
		assert_eq!(wanted[0].path, ".github/deploy.yml");
		assert!(wanted[0].is_entry());
		assert!(missing.is_empty());
	}

	#[test]
	fn named_path_outside_the_tree_is_missing() {
		let paths = ["posts/a.md".to_string(), "posts/gone.md".to_string()];
		let (wanted, missing) = select_files(tree(), &paths, &ExtensionClassifier::default());

		assert_eq!(wanted.len(), 1);
		assert_eq!(missing, ["posts/gone.md"]);
	}
}
