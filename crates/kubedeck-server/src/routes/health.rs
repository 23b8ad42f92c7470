// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Liveness handlers.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
	Ok,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: HealthStatus,
	pub active_sessions: usize,
	pub cache_enabled: bool,
}

/// GET / - Plain-text banner.
pub async fn root() -> &'static str {
	"Kubernetes Dashboard Backend is running!"
}

/// GET /health - Process liveness plus a few counters.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
	Json(HealthResponse {
		status: HealthStatus::Ok,
		active_sessions: state.sessions.active_count().await,
		cache_enabled: state.cache.is_some(),
	})
}
