// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GraphQL helpers: query text normalization, response envelopes and aliased
//! batch queries.
//!
//! A batch query asks for the same shape of data for many items in one round
//! trip by giving each item's fragment an alias `{prefix}_{index}`. The
//! response object is keyed by those aliases and split back per item.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::error::GithubBackendError;

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*").unwrap());

/// Collapse every line break and the whitespace that follows it into a single
/// space. Whitespace inside a line is left alone.
pub fn collapse_whitespace(query: &str) -> String {
	LINE_BREAK.replace_all(query, " ").trim().to_string()
}

/// Render `value` as a GraphQL string literal.
pub fn quote(value: &str) -> String {
	Value::String(value.to_string()).to_string()
}

/// Alias for item `index` in a batch: `{prefix}_{index}`.
pub fn alias(prefix: &str, index: usize) -> String {
	format!("{prefix}_{index}")
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
	pub message: String,
	#[serde(default, rename = "type")]
	pub kind: Option<String>,
}

/// The `{ data, errors }` envelope of every GraphQL response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphQlResponse {
	#[serde(default)]
	pub data: Option<Value>,
	#[serde(default)]
	pub errors: Vec<GraphQlError>,
}

impl GraphQlResponse {
	pub fn from_value(value: Value) -> Result<Self, GithubBackendError> {
		serde_json::from_value(value).map_err(|e| {
			error!(error = %e, "Failed to parse GraphQL envelope");
			GithubBackendError::InvalidResponse(format!("GraphQL envelope: {e}"))
		})
	}

	/// All error messages joined with `; `.
	pub fn error_message(&self) -> String {
		self
			.errors
			.iter()
			.map(|e| e.message.as_str())
			.collect::<Vec<_>>()
			.join("; ")
	}

	/// Deserialize `data`. GitHub returns partial data alongside errors for
	/// things like a missing repository, so errors only fail the call when
	/// there is no data at all.
	pub fn into_data<T: DeserializeOwned>(self) -> Result<T, GithubBackendError> {
		let message = self.error_message();
		let data = match self.data {
			Some(data) if !data.is_null() => data,
			_ if !message.is_empty() => return Err(GithubBackendError::GraphQl(message)),
			_ => {
				return Err(GithubBackendError::InvalidResponse(
					"GraphQL response has no data".to_string(),
				))
			}
		};

		if !message.is_empty() {
			debug!(errors = %message, "GraphQL returned partial data");
		}

		serde_json::from_value(data).map_err(|e| {
			error!(error = %e, "Failed to parse GraphQL data");
			GithubBackendError::InvalidResponse(format!("GraphQL data: {e}"))
		})
	}
}

/// Builds one aliased fragment per item and joins them into a selection set.
pub struct BatchQuery<'a, T> {
	items: &'a [T],
}

impl<'a, T> BatchQuery<'a, T> {
	pub fn new(items: &'a [T]) -> Self {
		Self { items }
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Concatenate `fragment(index, item)` for every item.
	pub fn compose<F>(&self, fragment: F) -> String
	where
		F: Fn(usize, &T) -> String,
	{
		self
			.items
			.iter()
			.enumerate()
			.map(|(index, item)| fragment(index, item))
			.collect::<Vec<_>>()
			.join(" ")
	}

	/// Walk the items in order, handing each one the response so it can take
	/// its own aliases out.
	pub fn demux<R, F>(
		&self,
		mut response: BatchResponse,
		mut f: F,
	) -> Result<Vec<R>, GithubBackendError>
	where
		F: FnMut(usize, &T, &mut BatchResponse) -> Result<R, GithubBackendError>,
	{
		self
			.items
			.iter()
			.enumerate()
			.map(|(index, item)| f(index, item, &mut response))
			.collect()
	}
}

/// A batch response object keyed by alias.
#[derive(Debug, Default)]
pub struct BatchResponse {
	fields: Map<String, Value>,
}

impl BatchResponse {
	pub fn new(fields: Map<String, Value>) -> Self {
		Self { fields }
	}

	/// Remove and deserialize `{prefix}_{index}`. Absent and `null` both
	/// yield `None`.
	pub fn take<D: DeserializeOwned>(
		&mut self,
		prefix: &str,
		index: usize,
	) -> Result<Option<D>, GithubBackendError> {
		let key = alias(prefix, index);
		match self.fields.remove(&key) {
			None | Some(Value::Null) => Ok(None),
			Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
				error!(alias = %key, error = %e, "Failed to parse batch field");
				GithubBackendError::InvalidResponse(format!("{key}: {e}"))
			}),
		}
	}
}
