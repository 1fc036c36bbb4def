// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Environment variable helpers.
//!
//! Tokens may be supplied directly (`QUIRE_GITHUB_TOKEN=ghp_...`) or through a
//! mounted file (`QUIRE_GITHUB_TOKEN_FILE=/run/secrets/github_token`), which is
//! how CI runners and container orchestrators usually hand out credentials.

use std::path::PathBuf;
use std::{env, fs};

use quire_common_secret::SecretString;
use thiserror::Error;

/// Failure while reading a secret referenced by the environment.
#[derive(Debug, Error)]
pub enum SecretEnvError {
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },
}

/// Failure of [`require_secret_env`].
#[derive(Debug, Error)]
pub enum RequiredSecretError {
	#[error("required secret not found: set either {var} or {file_var}")]
	Missing { var: String, file_var: String },

	#[error(transparent)]
	Load(#[from] SecretEnvError),
}

/// Load a secret from `{var}_FILE` (preferred) or `{var}`.
///
/// A single trailing newline is stripped from file contents. Returns
/// `Ok(None)` when neither variable is set.
pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let file_var = format!("{var}_FILE");

	if let Ok(path_str) = env::var(&file_var) {
		if path_str.is_empty() {
			return Err(SecretEnvError::EmptyPath { var: file_var });
		}

		let path = PathBuf::from(path_str);
		let content = fs::read_to_string(&path).map_err(|source| SecretEnvError::Io {
			path: path.clone(),
			source,
		})?;

		let value = content.strip_suffix('\n').unwrap_or(&content);
		let value = value.strip_suffix('\r').unwrap_or(value);
		return Ok(Some(SecretString::new(value.to_string())));
	}

	Ok(env::var(var).ok().map(SecretString::new))
}

/// Like [`load_secret_env`], but a missing secret is an error.
pub fn require_secret_env(var: &str) -> Result<SecretString, RequiredSecretError> {
	load_secret_env(var)?.ok_or_else(|| RequiredSecretError::Missing {
		var: var.to_string(),
		file_var: format!("{var}_FILE"),
	})
}

/// Read a non-secret setting. Unset and blank values both yield `None`.
pub fn env_value(var: &str) -> Option<String> {
	env::var(var)
		.ok()
		.map(|v| v.trim().to_string())
		.filter(|v| !v.is_empty())
}
