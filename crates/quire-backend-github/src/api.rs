// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Authenticated REST and GraphQL calls over a [`Transport`].

use std::sync::Arc;

use quire_common_config::SecretString;
use quire_common_http::{Method, ResponseType, Transport, TransportRequest, TransportResponse};
use serde_json::{json, Value};
use tracing::debug;

use crate::context::ApiEndpoints;
use crate::error::GithubBackendError;
use crate::graphql::{collapse_whitespace, GraphQlResponse};

const ACCEPT_JSON: &str = "application/vnd.github+json";
pub(crate) const ACCEPT_RAW: &str = "application/vnd.github.raw";
const API_VERSION: &str = "2022-11-28";

pub(crate) struct GithubApi {
	transport: Arc<dyn Transport>,
	token: SecretString,
	endpoints: ApiEndpoints,
}

impl GithubApi {
	pub(crate) fn new(
		transport: Arc<dyn Transport>,
		token: SecretString,
		endpoints: ApiEndpoints,
	) -> Self {
		Self {
			transport,
			token,
			endpoints,
		}
	}

	pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
		&self.transport
	}

	/// REST request for `path` with auth and GitHub's JSON media type.
	pub(crate) fn rest_request(&self, method: Method, path: &str) -> TransportRequest {
		self.authorize(TransportRequest::new(method, self.endpoints.rest(path)))
			.header("Accept", ACCEPT_JSON)
	}

	pub(crate) async fn send(
		&self,
		request: TransportRequest,
	) -> Result<TransportResponse, GithubBackendError> {
		Ok(self.transport.send(request).await?)
	}

	pub(crate) async fn get_json(&self, path: &str) -> Result<Value, GithubBackendError> {
		let response = self.send(self.rest_request(Method::GET, path)).await?;
		Ok(response.into_json()?)
	}

	/// POST a GraphQL document. Line breaks in `query` are collapsed first.
	pub(crate) async fn graphql(
		&self,
		query: &str,
		variables: Value,
	) -> Result<GraphQlResponse, GithubBackendError> {
		let query = collapse_whitespace(query);
		debug!(bytes = query.len(), "Sending GraphQL query");

		let request = self
			.authorize(TransportRequest::post(self.endpoints.graphql()))
			.json(json!({ "query": query, "variables": variables }))
			.response_type(ResponseType::Json);

		let body = self.send(request).await?.into_json()?;
		GraphQlResponse::from_value(body)
	}

	fn authorize(&self, request: TransportRequest) -> TransportRequest {
		request
			.header("Authorization", format!("token {}", self.token.expose()))
			.header("X-GitHub-Api-Version", API_VERSION)
	}
}
