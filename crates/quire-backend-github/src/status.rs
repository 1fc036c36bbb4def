// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub service health from the public status page.

use quire_common_http::{Transport, TransportRequest};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::client::GithubBackend;

pub const STATUS_CHECK_URL: &str = "https://www.githubstatus.com/api/v2/status.json";
pub const STATUS_DASHBOARD_URL: &str = "https://www.githubstatus.com/";

/// Severity reported by the status page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
	/// All systems operational.
	None,
	Minor,
	Major,
	/// The status page could not be read or reported something else.
	Unknown,
}

impl ServiceStatus {
	pub fn from_indicator(indicator: &str) -> Self {
		match indicator {
			"none" => Self::None,
			"minor" => Self::Minor,
			"major" | "critical" => Self::Major,
			_ => Self::Unknown,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Minor => "minor",
			Self::Major => "major",
			Self::Unknown => "unknown",
		}
	}
}

impl std::fmt::Display for ServiceStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Read the status page. Never fails; any problem yields `Unknown`.
#[instrument(skip_all)]
pub async fn check_status(transport: &dyn Transport) -> ServiceStatus {
	let body = match transport.send(TransportRequest::get(STATUS_CHECK_URL)).await {
		Ok(response) => response.into_json(),
		Err(e) => Err(e),
	};

	match body {
		Ok(body) => {
			let indicator = body["status"]["indicator"].as_str().unwrap_or_default();
			let status = ServiceStatus::from_indicator(indicator);
			debug!(indicator, %status, "GitHub status");
			status
		}
		Err(e) => {
			warn!(error = %e, "Failed to read GitHub status");
			ServiceStatus::Unknown
		}
	}
}

impl GithubBackend {
	/// See [`check_status`]. Needs neither `init` nor a valid token.
	pub async fn check_status(&self) -> ServiceStatus {
		check_status(self.api.transport().as_ref()).await
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;
	use quire_common_http::{TransportError, TransportResponse};
	use serde_json::json;

	use super::*;
	use crate::testing::MockTransport;

	#[test]
	fn indicator_mapping() {
		assert_eq!(ServiceStatus::from_indicator("none"), ServiceStatus::None);
		assert_eq!(ServiceStatus::from_indicator("minor"), ServiceStatus::Minor);
		assert_eq!(ServiceStatus::from_indicator("major"), ServiceStatus::Major);
		assert_eq!(ServiceStatus::from_indicator("critical"), ServiceStatus::Major);
		assert_eq!(ServiceStatus::from_indicator("maintenance"), ServiceStatus::Unknown);
		assert_eq!(ServiceStatus::from_indicator(""), ServiceStatus::Unknown);
	}

	#[tokio::test]
	async fn reads_indicator_from_status_page() {
		let transport = MockTransport::new(|_| {
			Ok(TransportResponse::Json(json!({
				"page": { "id": "kctbh9vrtdwd" },
				"status": { "indicator": "minor", "description": "Partially Degraded Service" }
			})))
		});

		assert_eq!(check_status(transport.as_ref()).await, ServiceStatus::Minor);
		let request = &transport.requests()[0];
		assert_eq!(request.url, STATUS_CHECK_URL);
		assert!(request.header_value("authorization").is_none());
	}

	#[tokio::test]
	async fn network_failure_is_unknown() {
		let transport = MockTransport::new(|_| Err(TransportError::Timeout));
		assert_eq!(check_status(transport.as_ref()).await, ServiceStatus::Unknown);
	}

	#[tokio::test]
	async fn unexpected_shape_is_unknown() {
		let transport =
			MockTransport::new(|_| Ok(TransportResponse::Json(json!({ "oops": true }))));
		assert_eq!(check_status(transport.as_ref()).await, ServiceStatus::Unknown);
	}

	proptest! {
		#[test]
		fn any_indicator_maps_without_error(indicator in ".*") {
			let status = ServiceStatus::from_indicator(&indicator);
			let known = ["none", "minor", "major", "critical"].contains(&indicator.as_str());
			prop_assert_eq!(status == ServiceStatus::Unknown, !known);
		}
	}
}
