// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! WebSocket terminal endpoint.
//!
//! The upgrade gate has already validated the path and stored the
//! [`ExecTarget`] in the request extensions; this handler only completes the
//! handshake and hands the socket to a [`SessionRunner`].

use axum::{
	extract::{
		ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
		State,
	},
	response::Response,
	Extension,
};
use futures::{future, SinkExt, StreamExt};
use kubedeck_server_terminal::{ClientMessage, ExecTarget, ServerMessage, SessionRunner};
use tracing::{info, warn};

use crate::api::AppState;

/// GET /exec-session/{namespace}/{pod}/exec - Attach a terminal to a
/// container.
pub async fn exec_session(
	ws: WebSocketUpgrade,
	State(state): State<AppState>,
	Extension(target): Extension<ExecTarget>,
) -> Response {
	ws.on_failed_upgrade(|e| warn!(error = %e, "terminal websocket upgrade failed"))
		.on_upgrade(move |socket| run_terminal(socket, state, target))
}

async fn run_terminal(socket: WebSocket, state: AppState, target: ExecTarget) {
	info!(
		namespace = %target.namespace,
		pod = %target.pod,
		container = %target.container,
		"terminal websocket connected"
	);

	let (sink, stream) = socket.split();

	let stream = stream.filter_map(|msg| {
		future::ready(match msg {
			Ok(Message::Text(text)) => Some(Ok(ClientMessage::Text(text.as_str().to_owned()))),
			Ok(Message::Binary(data)) => Some(Ok(ClientMessage::Binary(data))),
			Ok(Message::Close(_)) => Some(Ok(ClientMessage::Close)),
			// Ping/Pong are answered by the websocket layer.
			Ok(Message::Ping(_) | Message::Pong(_)) => None,
			Err(e) => Some(Err(e)),
		})
	});

	let sink = sink.with(|msg: ServerMessage| {
		future::ready(Ok::<_, axum::Error>(match msg {
			ServerMessage::Output(data) => Message::Binary(data),
			ServerMessage::Close { code, reason } => Message::Close(Some(CloseFrame {
				code,
				reason: reason.into(),
			})),
		}))
	});

	let runner = SessionRunner::new(state.launcher.clone(), target, state.terminal_size);
	state.sessions.run(runner, stream, sink).await;
}
