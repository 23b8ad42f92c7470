// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Terminal session management handlers.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	Json,
};
use kubedeck_server_terminal::SessionInfo;
use serde::Serialize;
use uuid::Uuid;

use crate::{api::AppState, error::ServerError};

#[derive(Debug, Serialize)]
pub struct ListSessionsResponse {
	pub sessions: Vec<SessionInfo>,
}

/// GET /api/terminal/sessions - List live terminal sessions.
pub async fn list_sessions(State(state): State<AppState>) -> Json<ListSessionsResponse> {
	Json(ListSessionsResponse {
		sessions: state.sessions.list().await,
	})
}

/// DELETE /api/terminal/sessions/{id} - Terminate a live session.
///
/// The session tears down asynchronously: the shell is killed and the client
/// receives a normal close frame.
pub async fn terminate_session(
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
	if state.sessions.terminate(id).await {
		tracing::info!(session_id = %id, "terminal session terminated by request");
		Ok(StatusCode::NO_CONTENT)
	} else {
		Err(ServerError::SessionNotFound(id))
	}
}
