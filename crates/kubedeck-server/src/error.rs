// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	/// The cluster reported that the requested object does not exist.
	#[error("{message}: {details}")]
	NotFound { message: String, details: String },

	/// The cluster call failed for any other reason.
	#[error("{message}: {details}")]
	Upstream { message: String, details: String },

	#[error("Unknown resource path: {0}")]
	UnknownPath(String),

	#[error("Terminal session not found: {0}")]
	SessionNotFound(Uuid),
}

/// Error response body, shaped the way the dashboard expects it.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub error: String,
	pub details: String,
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, body) = match self {
			ServerError::NotFound { message, details } => (
				StatusCode::NOT_FOUND,
				ErrorResponse {
					error: message,
					details,
				},
			),
			ServerError::Upstream { message, details } => {
				tracing::warn!(error = %details, "{message}");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse {
						error: message,
						details,
					},
				)
			}
			ServerError::UnknownPath(path) => (
				StatusCode::NOT_FOUND,
				ErrorResponse {
					error: "Unknown resource path".to_string(),
					details: path,
				},
			),
			ServerError::SessionNotFound(id) => (
				StatusCode::NOT_FOUND,
				ErrorResponse {
					error: "Terminal session not found".to_string(),
					details: id.to_string(),
				},
			),
		};

		(status, Json(body)).into_response()
	}
}
