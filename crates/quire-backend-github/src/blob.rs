// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Raw blob retrieval.

use bytes::Bytes;
use quire_common_http::{Method, RawResponse, ResponseType};
use tracing::{debug, instrument};

use crate::api::ACCEPT_RAW;
use crate::client::GithubBackend;
use crate::error::GithubBackendError;
use crate::types::FileListItem;

const OCTET_STREAM: &str = "application/octet-stream";
const FALLBACK_MIME: &str = "text/plain";

/// Content of one blob.
///
/// GitHub serves the raw media type as `application/octet-stream` for binary
/// files and as `text/plain` for anything it detects as text, so text is
/// re-typed from the path extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobContent {
	Binary(Bytes),
	Text { text: String, mime_type: String },
}

impl BlobContent {
	pub fn mime_type(&self) -> &str {
		match self {
			Self::Binary(_) => OCTET_STREAM,
			Self::Text { mime_type, .. } => mime_type.as_str(),
		}
	}

	pub fn len(&self) -> usize {
		match self {
			Self::Binary(bytes) => bytes.len(),
			Self::Text { text, .. } => text.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn into_bytes(self) -> Bytes {
		match self {
			Self::Binary(bytes) => bytes,
			Self::Text { text, .. } => Bytes::from(text),
		}
	}

	/// Interpret a raw blob response for the file at `path`.
	pub fn from_response(path: &str, response: RawResponse) -> Self {
		if response.content_type() == Some(OCTET_STREAM) {
			return Self::Binary(response.body);
		}

		Self::Text {
			text: String::from_utf8_lossy(&response.body).into_owned(),
			mime_type: mime_for_path(path),
		}
	}
}

/// MIME type inferred from the extension of `path`, `text/plain` if unknown.
pub fn mime_for_path(path: &str) -> String {
	mime_guess::from_path(path)
		.first_raw()
		.unwrap_or(FALLBACK_MIME)
		.to_string()
}

impl GithubBackend {
	/// Download one blob by its content hash.
	#[instrument(skip_all, fields(path = %file.path, sha = %file.sha))]
	pub async fn fetch_blob(&self, file: &FileListItem) -> Result<BlobContent, GithubBackendError> {
		let ctx = self.context()?;
		let path = format!("/repos/{}/{}/git/blobs/{}", ctx.owner, ctx.repo, file.sha);

		let request = self
			.api
			.rest_request(Method::GET, &path)
			.header("Accept", ACCEPT_RAW)
			.response_type(ResponseType::Raw);
		let raw = self.api.send(request).await?.into_raw()?;

		let content = BlobContent::from_response(&file.path, raw);
		debug!(bytes = content.len(), mime_type = %content.mime_type(), "Fetched blob");
		Ok(content)
	}
}

#[cfg(test)]
mod tests {
	use quire_common_http::{HeaderMap, HeaderValue, TransportResponse, CONTENT_TYPE};

	use super::*;
	use crate::testing::{backend, MockTransport};

	fn raw(content_type: &'static str, body: &'static [u8]) -> RawResponse {
		let mut headers = HeaderMap::new();
		headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
		RawResponse {
			status: 200,
			headers,
			body: Bytes::from_static(body),
		}
	}

	fn item(path: &str) -> FileListItem {
		FileListItem {
			path: path.to_string(),
			sha: "deadbeef".to_string(),
			size: 0,
		}
	}

	#[test]
	fn octet_stream_is_returned_unmodified() {
		let png = b"\x89PNG\r\n\x1a\n\x00\xff";
		let content =
			BlobContent::from_response("images/logo.png", raw("application/octet-stream", png));
		assert_eq!(content, BlobContent::Binary(Bytes::from_static(png)));
		assert_eq!(content.mime_type(), "application/octet-stream");
	}

	#[test]
	fn text_is_retyped_from_extension() {
		let svg = b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>";
		let content =
			BlobContent::from_response("images/icon.svg", raw("text/plain; charset=utf-8", svg));
		assert_eq!(
			content,
			BlobContent::Text {
				text: "<svg xmlns=\"http://www.w3.org/2000/svg\"/>".to_string(),
				mime_type: "image/svg+xml".to_string(),
			}
		);
	}

	#[test]
	fn unknown_extension_defaults_to_text_plain() {
		assert_eq!(mime_for_path("LICENSE"), "text/plain");
		assert_eq!(mime_for_path("notes.zzqq"), "text/plain");
		assert_eq!(mime_for_path("data/site.json"), "application/json");
	}

	#[test]
	fn invalid_utf8_is_decoded_lossily() {
		let content = BlobContent::from_response("a.txt", raw("text/plain", b"ok\xff"));
		assert!(matches!(content, BlobContent::Text { ref text, .. } if text == "ok\u{fffd}"));
	}

	#[tokio::test]
	async fn requests_raw_media_type() {
		let transport = MockTransport::new(|_| {
			Ok(TransportResponse::Raw(raw("application/octet-stream", b"\x00\x01")))
		});
		let backend = backend(transport.clone());

		let content = backend.fetch_blob(&item("images/a.bin")).await.unwrap();
		assert_eq!(content.into_bytes().as_ref(), b"\x00\x01");

		let request = &transport.requests()[0];
		assert_eq!(
			request.url,
			"https://api.github.com/repos/acme/site/git/blobs/deadbeef"
		);
		assert_eq!(request.header_value("accept"), Some("application/vnd.github.raw"));
		assert_eq!(request.response_type, ResponseType::Raw);
	}
}
