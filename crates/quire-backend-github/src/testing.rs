// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! In-memory transport for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quire_common_http::{Transport, TransportError, TransportRequest, TransportResponse};
use serde_json::{json, Value};

use crate::client::GithubBackend;
use crate::config::GithubBackendConfig;

type Handler = dyn Fn(&TransportRequest) -> Result<TransportResponse, TransportError> + Send + Sync;

/// Answers every request with `handler` and records what was sent.
pub(crate) struct MockTransport {
	handler: Box<Handler>,
	requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
	pub(crate) fn new<F>(handler: F) -> Arc<Self>
	where
		F: Fn(&TransportRequest) -> Result<TransportResponse, TransportError>
			+ Send
			+ Sync
			+ 'static,
	{
		Arc::new(Self {
			handler: Box::new(handler),
			requests: Mutex::new(Vec::new()),
		})
	}

	pub(crate) fn requests(&self) -> Vec<TransportRequest> {
		self.requests.lock().unwrap().clone()
	}

	pub(crate) fn request_count(&self) -> usize {
		self.requests.lock().unwrap().len()
	}
}

#[async_trait]
impl Transport for MockTransport {
	async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
		self.requests.lock().unwrap().push(request.clone());
		(self.handler)(&request)
	}
}

/// Initialized backend for `acme/site` on `main` with token `ghp_test`.
pub(crate) fn backend(transport: Arc<MockTransport>) -> GithubBackend {
	let backend = GithubBackend::new(
		GithubBackendConfig::new("acme/site", "ghp_test").with_branch("main"),
		transport,
	);
	backend.init();
	backend
}

pub(crate) fn graphql_ok(data: Value) -> Result<TransportResponse, TransportError> {
	Ok(TransportResponse::Json(json!({ "data": data })))
}

/// The `query` text of a GraphQL request, or empty for anything else.
pub(crate) fn query_of(request: &TransportRequest) -> String {
	request
		.body
		.as_ref()
		.and_then(|body| body["query"].as_str())
		.unwrap_or_default()
		.to_string()
}
