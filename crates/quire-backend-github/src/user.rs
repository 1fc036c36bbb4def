// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use tracing::{error, info, instrument};

use crate::client::GithubBackend;
use crate::error::GithubBackendError;
use crate::types::UserProfile;

impl GithubBackend {
	/// The account the configured token belongs to. Useful to validate a
	/// stored token before syncing.
	#[instrument(skip(self))]
	pub async fn fetch_user(&self) -> Result<UserProfile, GithubBackendError> {
		let body = self.api.get_json("/user").await?;
		let user: UserProfile = serde_json::from_value(body).map_err(|e| {
			error!(error = %e, "Failed to parse user response");
			GithubBackendError::InvalidResponse(format!("user: {e}"))
		})?;

		info!(login = %user.login, "Authenticated as GitHub user");
		Ok(user)
	}
}

#[cfg(test)]
mod tests {
	use quire_common_http::{TransportError, TransportResponse};
	use serde_json::json;

	use super::*;
	use crate::testing::{backend, MockTransport};

	#[tokio::test]
	async fn parses_profile() {
		let transport = MockTransport::new(|_| {
			Ok(TransportResponse::Json(json!({
				"login": "octocat",
				"id": 1,
				"name": "The Octocat",
				"email": null,
				"avatar_url": "https://avatars.githubusercontent.com/u/583231",
				"html_url": "https://github.com/octocat",
				"type": "User"
			})))
		});
		let backend = backend(transport.clone());

		let user = backend.fetch_user().await.unwrap();
		assert_eq!(user.login, "octocat");
		assert_eq!(user.name.as_deref(), Some("The Octocat"));
		assert!(user.email.is_none());
		assert_eq!(transport.requests()[0].url, "https://api.github.com/user");
	}

	#[tokio::test]
	async fn bad_token_is_a_transport_error() {
		let transport = MockTransport::new(|_| {
			Err(TransportError::Status {
				status: 401,
				body: "Bad credentials".to_string(),
			})
		});
		let err = backend(transport).fetch_user().await.unwrap_err();
		assert!(matches!(
			err,
			GithubBackendError::Transport(TransportError::Status { status: 401, .. })
		));
	}
}
