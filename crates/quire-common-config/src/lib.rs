// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration primitives shared by Quire crates.
//!
//! - [`Secret<T>`] / [`SecretString`] re-exported from [`quire_common_secret`]
//! - [`load_secret_env`] / [`require_secret_env`] for `VAR` / `VAR_FILE` secrets
//! - [`env_value`] for plain optional settings

pub mod env;

pub use quire_common_secret::{Secret, SecretString, REDACTED};

pub use env::{env_value, load_secret_env, require_secret_env, RequiredSecretError, SecretEnvError};
