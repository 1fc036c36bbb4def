// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

mod cache;
mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quire_backend_github::{GithubBackend, GithubBackendConfig, HttpTransport};
use quire_common_config::load_secret_env;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Quire - git-backed content sync for GitHub repositories
#[derive(Parser, Debug)]
#[command(name = "quire", version, about, long_about = None)]
struct Args {
	/// Repository as owner/repo
	#[arg(long, env = "QUIRE_GITHUB_REPO")]
	repo: Option<String>,

	/// Branch to work on (defaults to the repository's default branch)
	#[arg(long, env = "QUIRE_GITHUB_BRANCH")]
	branch: Option<String>,

	/// GitHub Enterprise Server URL (https)
	#[arg(long, env = "QUIRE_GITHUB_API_ROOT")]
	api_root: Option<String>,

	/// Access token (or set QUIRE_GITHUB_TOKEN / QUIRE_GITHUB_TOKEN_FILE)
	#[arg(long)]
	token: Option<String>,

	/// repository_dispatch event sent by `deploy`
	#[arg(long, env = "QUIRE_GITHUB_DEPLOY_EVENT")]
	deploy_event: Option<String>,

	/// Output logs as JSON
	#[arg(long)]
	log_json: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show GitHub service status
	Status,

	/// Show the account the token belongs to
	Whoami,

	/// Print the repository's default branch
	DefaultBranch,

	/// Print the head commit of the working branch
	Head,

	/// List files in the working branch
	Ls,

	/// Fetch text and last-commit metadata for files (all files if none given)
	Fetch {
		paths: Vec<String>,
	},

	/// Download one file's raw content
	Blob {
		path: String,

		/// Write to this file instead of stdout
		#[arg(short, long)]
		out: Option<PathBuf>,
	},

	/// Create or update a file from local content
	Put {
		/// Path in the repository
		path: String,

		/// Local file to upload
		source: PathBuf,

		#[command(flatten)]
		commit: CommitArgs,
	},

	/// Delete files
	Rm {
		#[arg(required = true)]
		paths: Vec<String>,

		#[command(flatten)]
		commit: CommitArgs,
	},

	/// Sync the working branch into a JSON snapshot file
	Sync {
		/// Snapshot file; skipped when it already holds the current head
		#[arg(long, default_value = "quire-snapshot.json")]
		cache: PathBuf,
	},

	/// Trigger a deployment via repository_dispatch
	Deploy,
}

#[derive(clap::Args, Debug, Clone)]
pub(crate) struct CommitArgs {
	/// Commit headline (generated from the changes if omitted)
	#[arg(short, long)]
	pub(crate) message: Option<String>,

	/// Append [skip ci] to the headline
	#[arg(long)]
	pub(crate) skip_ci: bool,

	/// Trigger a deployment after a successful commit
	#[arg(long)]
	pub(crate) deploy: bool,
}

fn init_tracing(json: bool) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	// Logs go to stderr so command output on stdout stays machine-readable.
	if json {
		tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().json().with_writer(std::io::stderr))
			.init();
	} else {
		tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().compact().with_writer(std::io::stderr))
			.init();
	}
}

impl Args {
	fn backend_config(&self) -> Result<GithubBackendConfig> {
		let repo = self
			.repo
			.clone()
			.context("repository not set, use --repo or QUIRE_GITHUB_REPO")?;

		let token = match &self.token {
			Some(token) => token.clone(),
			None => load_secret_env("QUIRE_GITHUB_TOKEN")
				.context("failed to read GitHub token")?
				.context("token not set, use --token or QUIRE_GITHUB_TOKEN[_FILE]")?
				.expose()
				.clone(),
		};

		let mut config = GithubBackendConfig::new(repo, token);
		if let Some(branch) = &self.branch {
			config = config.with_branch(branch.clone());
		}
		if let Some(api_root) = &self.api_root {
			config = config
				.try_with_api_root(api_root)
				.context("invalid --api-root")?;
		}
		if let Some(event) = &self.deploy_event {
			config = config.with_deploy_event_type(event.clone());
		}
		Ok(config)
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();
	init_tracing(args.log_json);

	// Status needs neither a repository nor a token.
	if let Command::Status = args.command {
		let transport = HttpTransport::new().context("failed to build HTTP client")?;
		return commands::status(&transport).await;
	}

	let backend = GithubBackend::connect(args.backend_config()?)
		.context("failed to create GitHub backend")?;

	match args.command {
		Command::Status => unreachable!("handled above"),
		Command::Whoami => commands::whoami(&backend).await,
		Command::DefaultBranch => commands::default_branch(&backend).await,
		Command::Head => commands::head(&backend).await,
		Command::Ls => commands::ls(&backend).await,
		Command::Fetch { paths } => commands::fetch(&backend, &paths).await,
		Command::Blob { path, out } => commands::blob(&backend, &path, out.as_deref()).await,
		Command::Put {
			path,
			source,
			commit,
		} => commands::put(&backend, &path, &source, &commit).await,
		Command::Rm { paths, commit } => commands::rm(&backend, &paths, &commit).await,
		Command::Sync { cache } => commands::sync(&backend, &cache).await,
		Command::Deploy => commands::deploy(&backend).await,
	}
}
