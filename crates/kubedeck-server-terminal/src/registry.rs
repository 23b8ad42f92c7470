// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Live terminal sessions, addressable by id for external termination.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, Stream};
use serde::Serialize;
use tokio::sync::{watch, Notify, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::lifecycle::{ClientMessage, ServerMessage, SessionOutcome, SessionRunner, SessionState};
use crate::types::ExecTarget;

struct RegisteredSession {
	target: ExecTarget,
	cancel: CancellationToken,
	state: watch::Receiver<SessionState>,
}

/// Snapshot of one registered session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
	pub id: Uuid,
	#[serde(flatten)]
	pub target: ExecTarget,
	pub state: SessionState,
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
	sessions: Arc<RwLock<HashMap<Uuid, RegisteredSession>>>,
	/// Signalled whenever the last session is removed.
	idle: Arc<Notify>,
}

impl SessionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn register(&self, runner: &SessionRunner) -> Uuid {
		let id = Uuid::new_v4();
		let session = RegisteredSession {
			target: runner.target().clone(),
			cancel: runner.cancel_token(),
			state: runner.subscribe(),
		};
		self.sessions.write().await.insert(id, session);
		debug!(session_id = %id, "terminal session registered");
		id
	}

	pub async fn remove(&self, id: Uuid) {
		let mut sessions = self.sessions.write().await;
		sessions.remove(&id);
		if sessions.is_empty() {
			self.idle.notify_waiters();
		}
	}

	/// Requests termination of one session. Returns false for unknown ids.
	pub async fn terminate(&self, id: Uuid) -> bool {
		match self.sessions.read().await.get(&id) {
			Some(session) => {
				info!(session_id = %id, "terminating terminal session");
				session.cancel.cancel();
				true
			}
			None => false,
		}
	}

	/// Requests termination of every session. Returns how many were signalled.
	pub async fn terminate_all(&self) -> usize {
		let sessions = self.sessions.read().await;
		for session in sessions.values() {
			session.cancel.cancel();
		}
		sessions.len()
	}

	/// Waits until every session has finished its teardown and been removed.
	/// Returns false if sessions remain after `timeout`.
	pub async fn wait_idle(&self, timeout: Duration) -> bool {
		let drained = tokio::time::timeout(timeout, async {
			loop {
				let notified = self.idle.notified();
				if self.sessions.read().await.is_empty() {
					return;
				}
				notified.await;
			}
		})
		.await
		.is_ok();

		if !drained {
			warn!(
				remaining = self.active_count().await,
				"terminal sessions still running after shutdown timeout"
			);
		}
		drained
	}

	/// Terminates every session and waits for their teardown to finish.
	pub async fn shutdown(&self, timeout: Duration) -> bool {
		let signalled = self.terminate_all().await;
		info!(sessions = signalled, "shutting down terminal sessions");
		self.wait_idle(timeout).await
	}

	pub async fn active_count(&self) -> usize {
		self.sessions.read().await.len()
	}

	pub async fn list(&self) -> Vec<SessionInfo> {
		let sessions = self.sessions.read().await;
		let mut infos: Vec<_> = sessions
			.iter()
			.map(|(id, session)| SessionInfo {
				id: *id,
				target: session.target.clone(),
				state: *session.state.borrow(),
			})
			.collect();
		infos.sort_by(|a, b| a.target.pod.cmp(&b.target.pod).then(a.id.cmp(&b.id)));
		infos
	}

	/// Registers `runner`, runs it to completion and removes it again.
	pub async fn run<St, Si, E>(&self, runner: SessionRunner, stream: St, sink: Si) -> SessionOutcome
	where
		St: Stream<Item = Result<ClientMessage, E>> + Unpin,
		Si: Sink<ServerMessage> + Unpin,
		Si::Error: Display,
		E: Display,
	{
		let id = self.register(&runner).await;
		let outcome = runner.run(stream, sink).await;
		self.remove(id).await;
		debug!(session_id = %id, reason = ?outcome.reason, "terminal session removed");
		outcome
	}
}
