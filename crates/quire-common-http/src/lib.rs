// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for Quire.
//!
//! This crate provides:
//! - A pre-configured HTTP client with a consistent User-Agent header
//! - Retry logic with exponential backoff for transient failures
//! - The [`Transport`] seam every remote backend talks through, with a reqwest
//!   implementation in [`HttpTransport`]

mod client;
mod retry;
mod transport;

pub use client::{builder, new_client, new_client_with_timeout, user_agent};
pub use retry::{retry, RetryConfig, RetryableError, RETRYABLE_STATUSES};
pub use transport::{
	HttpTransport, RawResponse, ResponseType, Transport, TransportError, TransportRequest,
	TransportResponse,
};

pub use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
pub use reqwest::{Method, StatusCode};
