// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HttpTransport against a local mock server.

use std::time::Duration;

use quire_common_http::{
	HttpTransport, ResponseType, RetryConfig, Transport, TransportError, TransportRequest,
	TransportResponse,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry() -> RetryConfig {
	RetryConfig {
		max_attempts: 3,
		base_delay: Duration::from_millis(1),
		max_delay: Duration::from_millis(5),
		backoff_factor: 2.0,
		jitter: false,
	}
}

fn transport() -> HttpTransport {
	HttpTransport::new().unwrap().with_retry_config(fast_retry())
}

#[tokio::test]
async fn json_get_forwards_headers_and_query() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/repos/acme/site/git/trees/main"))
		.and(query_param("recursive", "1"))
		.and(header("authorization", "token ghp_test"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tree": [] })))
		.expect(1)
		.mount(&server)
		.await;

	let request = TransportRequest::get(format!(
		"{}/repos/acme/site/git/trees/main?recursive=1",
		server.uri()
	))
	.header("Authorization", "token ghp_test");

	let body = transport().send(request).await.unwrap().into_json().unwrap();
	assert_eq!(body, json!({ "tree": [] }));
}

#[tokio::test]
async fn post_sends_json_body() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/graphql"))
		.and(body_json(json!({ "query": "query { viewer { login } }", "variables": {} })))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_json(json!({ "data": { "viewer": { "login": "octocat" } } })),
		)
		.expect(1)
		.mount(&server)
		.await;

	let request = TransportRequest::post(format!("{}/graphql", server.uri()))
		.json(json!({ "query": "query { viewer { login } }", "variables": {} }));

	let body = transport().send(request).await.unwrap().into_json().unwrap();
	assert_eq!(body["data"]["viewer"]["login"], "octocat");
}

#[tokio::test]
async fn not_found_is_a_status_error_and_not_retried() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
		.expect(1)
		.mount(&server)
		.await;

	let err = transport()
		.send(TransportRequest::get(format!("{}/missing", server.uri())))
		.await
		.unwrap_err();

	match err {
		TransportError::Status { status, body } => {
			assert_eq!(status, 404);
			assert_eq!(body, "Not Found");
		}
		other => panic!("unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn get_is_retried_after_service_unavailable() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/flaky"))
		.respond_with(ResponseTemplate::new(503))
		.up_to_n_times(1)
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/flaky"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
		.expect(1)
		.mount(&server)
		.await;

	let body = transport()
		.send(TransportRequest::get(format!("{}/flaky", server.uri())))
		.await
		.unwrap()
		.into_json()
		.unwrap();

	assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn post_is_never_replayed() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(502))
		.expect(1)
		.mount(&server)
		.await;

	let err = transport()
		.send(TransportRequest::post(format!("{}/graphql", server.uri())).json(json!({})))
		.await
		.unwrap_err();

	assert_eq!(err.status(), Some(502));
}

#[tokio::test]
async fn raw_response_keeps_content_type_and_bytes() {
	let server = MockServer::start().await;
	let payload = vec![0x89, b'P', b'N', b'G', 0x00, 0xff];
	Mock::given(method("GET"))
		.and(path("/blob"))
		.respond_with(
			ResponseTemplate::new(200).set_body_raw(payload.clone(), "application/octet-stream"),
		)
		.mount(&server)
		.await;

	let response = transport()
		.send(
			TransportRequest::get(format!("{}/blob", server.uri()))
				.response_type(ResponseType::Raw),
		)
		.await
		.unwrap();

	let raw = response.into_raw().unwrap();
	assert_eq!(raw.status, 200);
	assert_eq!(raw.content_type(), Some("application/octet-stream"));
	assert_eq!(raw.body.as_ref(), payload.as_slice());
}

#[tokio::test]
async fn text_and_blob_response_types() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/readme"))
		.respond_with(ResponseTemplate::new(200).set_body_string("# Hello"))
		.mount(&server)
		.await;

	let url = format!("{}/readme", server.uri());

	let text = transport()
		.send(TransportRequest::get(url.clone()).response_type(ResponseType::Text))
		.await
		.unwrap();
	assert!(matches!(text, TransportResponse::Text(ref t) if t == "# Hello"));

	let blob = transport()
		.send(TransportRequest::get(url).response_type(ResponseType::Blob))
		.await
		.unwrap();
	assert!(matches!(blob, TransportResponse::Blob(ref b) if b.as_ref() == b"# Hello"));
}

#[tokio::test]
async fn malformed_json_is_invalid_response() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
		.mount(&server)
		.await;

	let err = transport()
		.send(TransportRequest::get(server.uri()))
		.await
		.unwrap_err();

	assert!(matches!(err, TransportError::InvalidResponse(_)));
}
