// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use quire_common_http::{Method, ResponseType};
use serde_json::json;
use tracing::{info, instrument};

use crate::client::GithubBackend;
use crate::error::GithubBackendError;

impl GithubBackend {
	/// Fire a `repository_dispatch` event so CI can rebuild the site.
	///
	/// Returns the HTTP status (GitHub answers 204). Callers treat failures
	/// as best effort.
	#[instrument(skip(self))]
	pub async fn trigger_deployment(&self) -> Result<u16, GithubBackendError> {
		let ctx = self.context()?;
		let event_type = self.config.deploy_event_type();
		let path = format!("/repos/{}/{}/dispatches", ctx.owner, ctx.repo);

		let request = self
			.api
			.rest_request(Method::POST, &path)
			.json(json!({ "event_type": event_type }))
			.response_type(ResponseType::Raw);
		let raw = self.api.send(request).await?.into_raw()?;

		info!(status = raw.status, event_type = %event_type, "Triggered deployment");
		Ok(raw.status)
	}
}
