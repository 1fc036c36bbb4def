// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Snapshot file used by `quire sync`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use quire_backend_github::{CacheError, ContentCache, SyncSnapshot};
use serde::Deserialize;
use tracing::debug;

/// Keeps the last [`SyncSnapshot`] as pretty-printed JSON on disk.
pub struct JsonFileCache {
	path: PathBuf,
}

#[derive(Deserialize)]
struct StoredHead {
	head: String,
}

impl JsonFileCache {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

#[async_trait]
impl ContentCache for JsonFileCache {
	async fn cached_head(&self) -> Result<Option<String>, CacheError> {
		let raw = match tokio::fs::read(&self.path).await {
			Ok(raw) => raw,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(CacheError(format!("{}: {e}", self.path.display()))),
		};

		// An unreadable snapshot just means a full sync.
		match serde_json::from_slice::<StoredHead>(&raw) {
			Ok(stored) => Ok(Some(stored.head)),
			Err(e) => {
				debug!(path = %self.path.display(), error = %e, "Ignoring unreadable snapshot");
				Ok(None)
			}
		}
	}

	async fn store(&self, snapshot: SyncSnapshot) -> Result<(), CacheError> {
		let json = serde_json::to_vec_pretty(&snapshot).map_err(|e| CacheError(e.to_string()))?;
		tokio::fs::write(&self.path, json)
			.await
			.map_err(|e| CacheError(format!("{}: {e}", self.path.display())))
	}
}
