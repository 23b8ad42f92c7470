// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP route handlers.

pub mod exec;
pub mod health;
pub mod resources;
pub mod sessions;

use axum::http::Uri;

use crate::error::ServerError;

/// Fallback for paths no route matches.
pub async fn not_found(uri: Uri) -> ServerError {
	ServerError::UnknownPath(uri.path().to_string())
}
