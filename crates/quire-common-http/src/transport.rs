// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Request/response transport used by remote backends.
//!
//! Backends compose [`TransportRequest`]s and interpret
//! [`TransportResponse`]s; they never touch sockets or reqwest directly. That
//! keeps the wire protocol logic testable against an in-memory transport.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, Method};
use thiserror::Error;
use tracing::{debug, error, instrument, trace};

use crate::retry::{retry, RetryConfig, RetryableError, RETRYABLE_STATUSES};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How the response body should be handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
	/// Parsed JSON document.
	#[default]
	Json,
	/// UTF-8 text.
	Text,
	/// Body bytes only.
	Blob,
	/// Status, headers and body bytes, uninterpreted.
	Raw,
}

/// A single outbound request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
	pub method: Method,
	pub url: String,
	pub headers: Vec<(String, String)>,
	pub body: Option<serde_json::Value>,
	pub response_type: ResponseType,
}

impl TransportRequest {
	pub fn new(method: Method, url: impl Into<String>) -> Self {
		Self {
			method,
			url: url.into(),
			headers: Vec::new(),
			body: None,
			response_type: ResponseType::Json,
		}
	}

	pub fn get(url: impl Into<String>) -> Self {
		Self::new(Method::GET, url)
	}

	pub fn post(url: impl Into<String>) -> Self {
		Self::new(Method::POST, url)
	}

	/// Add or replace a header. Header names compare case-insensitively.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		let name = name.into();
		self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
		self.headers.push((name, value.into()));
		self
	}

	/// Attach a JSON body.
	pub fn json(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);
		self
	}

	pub fn response_type(mut self, response_type: ResponseType) -> Self {
		self.response_type = response_type;
		self
	}

	/// Look up a header value by case-insensitive name.
	pub fn header_value(&self, name: &str) -> Option<&str> {
		self
			.headers
			.iter()
			.find(|(n, _)| n.eq_ignore_ascii_case(name))
			.map(|(_, v)| v.as_str())
	}

	/// Only GET and HEAD are replayed on transient failure.
	pub fn is_idempotent(&self) -> bool {
		self.method == Method::GET || self.method == Method::HEAD
	}
}

/// An uninterpreted HTTP response.
#[derive(Debug, Clone)]
pub struct RawResponse {
	pub status: u16,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl RawResponse {
	/// The `Content-Type` header, verbatim.
	pub fn content_type(&self) -> Option<&str> {
		self
			.headers
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
	}
}

/// Response body shaped according to [`ResponseType`].
#[derive(Debug, Clone)]
pub enum TransportResponse {
	Json(serde_json::Value),
	Text(String),
	Blob(Bytes),
	Raw(RawResponse),
}

impl TransportResponse {
	pub fn into_json(self) -> Result<serde_json::Value, TransportError> {
		match self {
			Self::Json(value) => Ok(value),
			Self::Text(text) => serde_json::from_str(&text)
				.map_err(|e| TransportError::InvalidResponse(format!("JSON parse error: {e}"))),
			other => Err(TransportError::InvalidResponse(format!(
				"expected a JSON response, got {}",
				other.kind()
			))),
		}
	}

	pub fn into_raw(self) -> Result<RawResponse, TransportError> {
		match self {
			Self::Raw(raw) => Ok(raw),
			other => Err(TransportError::InvalidResponse(format!(
				"expected a raw response, got {}",
				other.kind()
			))),
		}
	}

	fn kind(&self) -> &'static str {
		match self {
			Self::Json(_) => "json",
			Self::Text(_) => "text",
			Self::Blob(_) => "blob",
			Self::Raw(_) => "raw",
		}
	}
}

/// Errors surfaced by a [`Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
	/// Network-level error during HTTP communication.
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	/// Request timed out.
	#[error("Request timed out")]
	Timeout,

	/// The server answered with a non-success status.
	#[error("HTTP {status}: {body}")]
	Status { status: u16, body: String },

	/// The body could not be interpreted as requested.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
}

impl TransportError {
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			Self::Network(e) => e.status().map(|s| s.as_u16()),
			_ => None,
		}
	}
}

impl RetryableError for TransportError {
	fn is_retryable(&self) -> bool {
		match self {
			Self::Network(e) => e.is_retryable(),
			Self::Timeout => true,
			Self::Status { status, .. } => RETRYABLE_STATUSES.iter().any(|s| s.as_u16() == *status),
			Self::InvalidResponse(_) => false,
		}
	}
}

/// The single "send request" capability backends depend on.
#[async_trait]
pub trait Transport: Send + Sync {
	async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// [`Transport`] over a shared reqwest client.
///
/// Idempotent requests are retried per [`RetryConfig`]; everything else is
/// sent exactly once so that a mutation is never replayed.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	client: Client,
	retry_config: RetryConfig,
}

impl HttpTransport {
	pub fn new() -> Result<Self, TransportError> {
		let client = crate::client::builder().timeout(REQUEST_TIMEOUT).build()?;
		Ok(Self::with_client(client))
	}

	pub fn with_client(client: Client) -> Self {
		Self {
			client,
			retry_config: RetryConfig::default(),
		}
	}

	pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
		self.retry_config = config;
		self
	}

	pub fn retry_config(&self) -> &RetryConfig {
		&self.retry_config
	}

	async fn send_once(
		&self,
		request: &TransportRequest,
	) -> Result<TransportResponse, TransportError> {
		let mut builder = self.client.request(request.method.clone(), &request.url);
		for (name, value) in &request.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}
		if let Some(body) = &request.body {
			builder = builder.json(body);
		}

		debug!(method = %request.method, url = %request.url, "Sending request");

		let response = builder.send().await.map_err(|e| {
			if e.is_timeout() {
				error!(url = %request.url, "Request timed out");
				return TransportError::Timeout;
			}
			error!(error = %e, url = %request.url, "Network error");
			TransportError::Network(e)
		})?;

		let status = response.status();
		trace!(status = %status, "Received response");

		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			debug!(status = status.as_u16(), body = %body, "Request failed");
			return Err(TransportError::Status {
				status: status.as_u16(),
				body,
			});
		}

		match request.response_type {
			ResponseType::Json => {
				let body = response.bytes().await?;
				serde_json::from_slice(&body)
					.map(TransportResponse::Json)
					.map_err(|e| {
						error!(error = %e, url = %request.url, "Failed to parse JSON response");
						TransportError::InvalidResponse(format!("JSON parse error: {e}"))
					})
			}
			ResponseType::Text => Ok(TransportResponse::Text(response.text().await?)),
			ResponseType::Blob => Ok(TransportResponse::Blob(response.bytes().await?)),
			ResponseType::Raw => {
				let headers = response.headers().clone();
				let body = response.bytes().await?;
				Ok(TransportResponse::Raw(RawResponse {
					status: status.as_u16(),
					headers,
					body,
				}))
			}
		}
	}
}

#[async_trait]
impl Transport for HttpTransport {
	#[instrument(skip_all, fields(method = %request.method, url = %request.url))]
	async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
		if request.is_idempotent() {
			retry(&self.retry_config, || self.send_once(&request)).await
		} else {
			self.send_once(&request).await
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn header_replaces_case_insensitively() {
		let request = TransportRequest::get("https://api.github.com/user")
			.header("Accept", "application/json")
			.header("accept", "application/vnd.github.raw");

		assert_eq!(request.headers.len(), 1);
		assert_eq!(
			request.header_value("ACCEPT"),
			Some("application/vnd.github.raw")
		);
	}

	#[test]
	fn only_reads_are_idempotent() {
		assert!(TransportRequest::get("https://x.test").is_idempotent());
		assert!(!TransportRequest::post("https://x.test").is_idempotent());
	}

	#[test]
	fn default_response_type_is_json() {
		assert_eq!(
			TransportRequest::get("https://x.test").response_type,
			ResponseType::Json
		);
	}

	#[test]
	fn text_response_converts_to_json() {
		let value = TransportResponse::Text("{\"ok\":true}".to_string())
			.into_json()
			.unwrap();
		assert_eq!(value["ok"], true);
	}

	#[test]
	fn blob_response_is_not_json() {
		let err = TransportResponse::Blob(Bytes::from_static(b"\x00"))
			.into_json()
			.unwrap_err();
		assert!(matches!(err, TransportError::InvalidResponse(_)));
	}

	#[test]
	fn retryable_statuses() {
		let unavailable = TransportError::Status {
			status: 503,
			body: String::new(),
		};
		let not_found = TransportError::Status {
			status: 404,
			body: String::new(),
		};
		assert!(unavailable.is_retryable());
		assert!(!not_found.is_retryable());
		assert!(TransportError::Timeout.is_retryable());
		assert_eq!(not_found.status(), Some(404));
	}
}
