// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One terminal session from upgrade to teardown.
//!
//! A session is a single task that owns both the client connection and the
//! shell process. It selects over every teardown trigger (process exit,
//! client close, socket error, external cancel) so whichever fires first
//! wins and teardown runs exactly once.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::ProtocolError;
use crate::launcher::ShellLauncher;
use crate::protocol::{decode_binary, decode_text, ClientFrame};
use crate::session::{PtySession, ShellEvents};
use crate::types::{ExecTarget, ShellExit, TerminalSize};

/// Normal closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// Internal error, used when the shell could not be started.
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;

/// Output still buffered when the process exits is flushed for at most this
/// long before the close frame is sent.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

/// Close frame reasons are limited to 123 bytes.
const MAX_CLOSE_REASON: usize = 123;

/// A message received from the client, independent of the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
	Text(String),
	Binary(Bytes),
	Close,
}

/// A message for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
	Output(Bytes),
	Close { code: u16, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
	Connecting,
	Active,
	Closing,
	Closed,
}

impl SessionState {
	pub fn can_transition_to(self, next: SessionState) -> bool {
		use SessionState::*;
		matches!(
			(self, next),
			(Connecting, Active) | (Connecting, Closing) | (Active, Closing) | (Closing, Closed)
		)
	}
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
	ShellExited(ShellExit),
	ClientClosed,
	SocketError(String),
	Terminated,
	SpawnFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
	pub reason: CloseReason,
	/// Whether teardown had to kill the shell.
	pub kill_issued: bool,
}

/// Drives a single terminal session.
pub struct SessionRunner {
	launcher: Arc<dyn ShellLauncher>,
	target: ExecTarget,
	size: TerminalSize,
	cancel: CancellationToken,
	state: watch::Sender<SessionState>,
}

impl SessionRunner {
	pub fn new(launcher: Arc<dyn ShellLauncher>, target: ExecTarget, size: TerminalSize) -> Self {
		let (state, _) = watch::channel(SessionState::Connecting);
		Self {
			launcher,
			target,
			size,
			cancel: CancellationToken::new(),
			state,
		}
	}

	pub fn target(&self) -> &ExecTarget {
		&self.target
	}

	/// Token that terminates the session when cancelled.
	pub fn cancel_token(&self) -> CancellationToken {
		self.cancel.clone()
	}

	pub fn subscribe(&self) -> watch::Receiver<SessionState> {
		self.state.subscribe()
	}

	fn transition(&self, next: SessionState) {
		let current = *self.state.borrow();
		if current.can_transition_to(next) {
			self.state.send_replace(next);
			debug!(from = ?current, to = ?next, "session state changed");
		} else {
			warn!(from = ?current, to = ?next, "ignoring invalid session state transition");
		}
	}

	/// Runs the session to completion over a client message stream and sink.
	#[instrument(
		skip_all,
		fields(namespace = %self.target.namespace, pod = %self.target.pod, container = %self.target.container)
	)]
	pub async fn run<St, Si, E>(self, mut stream: St, mut sink: Si) -> SessionOutcome
	where
		St: Stream<Item = Result<ClientMessage, E>> + Unpin,
		Si: Sink<ServerMessage> + Unpin,
		Si::Error: Display,
		E: Display,
	{
		let (mut pty, events) =
			match PtySession::spawn(self.launcher.as_ref(), &self.target, self.size).await {
				Ok(spawned) => spawned,
				Err(e) => {
					warn!(error = %e, "failed to start pty session");
					self.transition(SessionState::Closing);
					let reason = close_reason(&format!("Failed to start PTY session: {e}"));
					let _ = sink
						.send(ServerMessage::Close {
							code: CLOSE_INTERNAL_ERROR,
							reason,
						})
						.await;
					let _ = sink.close().await;
					self.transition(SessionState::Closed);
					return SessionOutcome {
						reason: CloseReason::SpawnFailed(e.to_string()),
						kill_issued: false,
					};
				}
			};

		self.transition(SessionState::Active);
		info!("terminal session active");

		let ShellEvents {
			mut output,
			mut exit,
		} = events;
		let mut output_open = true;

		let reason = loop {
			tokio::select! {
				biased;

				_ = self.cancel.cancelled() => break CloseReason::Terminated,

				chunk = output.recv(), if output_open => match chunk {
					Some(data) => {
						if let Err(e) = sink.send(ServerMessage::Output(data)).await {
							break CloseReason::SocketError(e.to_string());
						}
					}
					None => output_open = false,
				},

				status = &mut exit => {
					let status = status.unwrap_or(ShellExit { code: None, terminated: false });
					pty.mark_exited(status);
					if output_open {
						if let Err(e) = drain_output(&mut output, &mut sink).await {
							break CloseReason::SocketError(e);
						}
					}
					break CloseReason::ShellExited(status);
				},

				message = stream.next() => match message {
					Some(Ok(ClientMessage::Text(text))) => dispatch(&mut pty, decode_text(&text)),
					Some(Ok(ClientMessage::Binary(data))) => dispatch(&mut pty, decode_binary(&data)),
					Some(Ok(ClientMessage::Close)) | None => break CloseReason::ClientClosed,
					Some(Err(e)) => break CloseReason::SocketError(e.to_string()),
				},
			}
		};

		self.transition(SessionState::Closing);

		// The process may have exited while another trigger won the select.
		if let Ok(status) = exit.try_recv() {
			pty.mark_exited(status);
		}
		let kill_issued = pty.terminate();

		if !matches!(
			reason,
			CloseReason::ClientClosed | CloseReason::SocketError(_)
		) {
			let _ = sink
				.send(ServerMessage::Close {
					code: CLOSE_NORMAL,
					reason: String::new(),
				})
				.await;
		}
		let _ = sink.close().await;

		drop(output);
		drop(exit);
		drop(pty);
		drop(stream);

		self.transition(SessionState::Closed);
		info!(reason = ?reason, kill_issued, "terminal session closed");

		SessionOutcome {
			reason,
			kill_issued,
		}
	}
}

fn dispatch(pty: &mut PtySession, frame: Result<ClientFrame, ProtocolError>) {
	match frame {
		Ok(ClientFrame::Input(data)) => pty.write(&data),
		Ok(ClientFrame::Resize(request)) => {
			pty.resize(request.width, request.height);
		}
		Err(e) => warn!(error = %e, "dropping unexpected terminal message"),
	}
}

async fn drain_output<Si>(output: &mut mpsc::Receiver<Bytes>, sink: &mut Si) -> Result<(), String>
where
	Si: Sink<ServerMessage> + Unpin,
	Si::Error: Display,
{
	let deadline = tokio::time::sleep(DRAIN_TIMEOUT);
	tokio::pin!(deadline);

	loop {
		tokio::select! {
			_ = &mut deadline => {
				debug!("output drain timed out");
				return Ok(());
			}
			chunk = output.recv() => match chunk {
				Some(data) => sink
					.send(ServerMessage::Output(data))
					.await
					.map_err(|e| e.to_string())?,
				None => return Ok(()),
			},
		}
	}
}

fn close_reason(reason: &str) -> String {
	if reason.len() <= MAX_CLOSE_REASON {
		return reason.to_string();
	}
	let mut end = MAX_CLOSE_REASON;
	while !reason.is_char_boundary(end) {
		end -= 1;
	}
	reason[..end].to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mock::{MockLauncher, MockShell};
	use futures::channel::mpsc as fmpsc;
	use tokio::task::JoinHandle;

	struct Harness {
		client: fmpsc::UnboundedSender<Result<ClientMessage, String>>,
		server: fmpsc::UnboundedReceiver<ServerMessage>,
		state: watch::Receiver<SessionState>,
		cancel: CancellationToken,
		handle: JoinHandle<SessionOutcome>,
	}

	impl Harness {
		fn send_text(&self, text: &str) {
			self
				.client
				.unbounded_send(Ok(ClientMessage::Text(text.to_string())))
				.unwrap();
		}

		fn send(&self, message: ClientMessage) {
			self.client.unbounded_send(Ok(message)).unwrap();
		}

		async fn finish(self) -> (SessionOutcome, Vec<ServerMessage>, SessionState) {
			let outcome = self.handle.await.unwrap();
			let messages: Vec<_> = self.server.collect().await;
			let state = *self.state.borrow();
			(outcome, messages, state)
		}
	}

	fn target(pod: &str) -> ExecTarget {
		ExecTarget {
			namespace: "ns1".to_string(),
			pod: pod.to_string(),
			container: "app".to_string(),
			command: None,
		}
	}

	fn start(launcher: &MockLauncher, pod: &str) -> Harness {
		let runner = SessionRunner::new(
			Arc::new(launcher.clone()),
			target(pod),
			TerminalSize::default(),
		);
		let state = runner.subscribe();
		let cancel = runner.cancel_token();
		let (client, stream) = fmpsc::unbounded();
		let (sink, server) = fmpsc::unbounded();
		let handle = tokio::spawn(runner.run(stream, sink));
		Harness {
			client,
			server,
			state,
			cancel,
			handle,
		}
	}

	async fn started(launcher: &MockLauncher, pod: &str, index: usize) -> (Harness, MockShell) {
		let harness = start(launcher, pod);
		let shell = launcher.wait_for_shell(index).await;
		(harness, shell)
	}

	fn normal_close() -> ServerMessage {
		ServerMessage::Close {
			code: CLOSE_NORMAL,
			reason: String::new(),
		}
	}

	#[test]
	fn test_state_transitions() {
		use SessionState::*;
		assert!(Connecting.can_transition_to(Active));
		assert!(Connecting.can_transition_to(Closing));
		assert!(Active.can_transition_to(Closing));
		assert!(Closing.can_transition_to(Closed));

		assert!(!Active.can_transition_to(Connecting));
		assert!(!Active.can_transition_to(Closed));
		assert!(!Closed.can_transition_to(Active));
		assert!(!Closed.can_transition_to(Closing));
	}

	#[test]
	fn test_close_reason_is_truncated_on_char_boundary() {
		let long = "é".repeat(100);
		let reason = close_reason(&long);
		assert!(reason.len() <= MAX_CLOSE_REASON);
		assert!(long.starts_with(&reason));
		assert_eq!(close_reason("short"), "short");
	}

	#[tokio::test]
	async fn test_input_channel_writes_payload_only() {
		let launcher = MockLauncher::new();
		let (harness, shell) = started(&launcher, "pod1", 0).await;

		harness.send_text("0hello");
		harness.send(ClientMessage::Close);
		let (outcome, _, _) = harness.finish().await;

		assert_eq!(outcome.reason, CloseReason::ClientClosed);
		assert_eq!(shell.written(), b"hello".to_vec());
	}

	#[tokio::test]
	async fn test_resize_channel_validates_dimensions() {
		let launcher = MockLauncher::new();
		let (harness, shell) = started(&launcher, "pod1", 0).await;

		harness.send_text(r#"4{"Width":120,"Height":40}"#);
		harness.send_text(r#"4{"Width":-1,"Height":40}"#);
		harness.send_text("4garbage");
		harness.send_text("");
		harness.send_text("7unknown");
		harness.send_text("0still here");
		harness.send(ClientMessage::Close);
		let (outcome, _, _) = harness.finish().await;

		assert_eq!(outcome.reason, CloseReason::ClientClosed);
		assert_eq!(shell.resizes(), vec![TerminalSize { cols: 120, rows: 40 }]);
		assert_eq!(shell.written(), b"still here".to_vec());
	}

	#[tokio::test]
	async fn test_binary_frames() {
		let launcher = MockLauncher::new();
		let (harness, shell) = started(&launcher, "pod1", 0).await;

		harness.send(ClientMessage::Binary(Bytes::from_static(b"0ls\r")));
		harness.send(ClientMessage::Binary(Bytes::from_static(&[0xff, 0xfe])));
		harness.send(ClientMessage::Close);
		harness.finish().await;

		assert_eq!(
			shell.writes(),
			vec![
				Bytes::from_static(b"ls\r"),
				Bytes::from_static(&[0xff, 0xfe])
			]
		);
	}

	#[tokio::test]
	async fn test_shell_exit_closes_normally() {
		let launcher = MockLauncher::new();
		let (harness, shell) = started(&launcher, "pod1", 0).await;

		shell.emit("bye\r\n").await;
		shell.exit(0);
		let (outcome, messages, state) = harness.finish().await;

		assert_eq!(
			outcome.reason,
			CloseReason::ShellExited(ShellExit {
				code: Some(0),
				terminated: false
			})
		);
		assert!(!outcome.kill_issued);
		assert_eq!(shell.kill_count(), 0);
		assert_eq!(state, SessionState::Closed);
		assert_eq!(
			messages,
			vec![ServerMessage::Output(Bytes::from_static(b"bye\r\n")), normal_close()]
		);
	}

	#[tokio::test]
	async fn test_output_order_is_preserved() {
		let launcher = MockLauncher::new();
		let (harness, shell) = started(&launcher, "pod1", 0).await;

		for i in 0..20 {
			shell.emit(format!("line {i}\n")).await;
		}
		shell.exit(0);
		let (_, messages, _) = harness.finish().await;

		let expected: Vec<_> = (0..20)
			.map(|i| ServerMessage::Output(Bytes::from(format!("line {i}\n"))))
			.chain(std::iter::once(normal_close()))
			.collect();
		assert_eq!(messages, expected);
	}

	#[tokio::test]
	async fn test_client_close_kills_exactly_once() {
		let launcher = MockLauncher::new();
		let (harness, shell) = started(&launcher, "pod1", 0).await;

		harness.send(ClientMessage::Close);
		let (outcome, messages, state) = harness.finish().await;

		assert_eq!(outcome.reason, CloseReason::ClientClosed);
		assert!(outcome.kill_issued);
		assert_eq!(shell.kill_count(), 1);
		assert!(shell.has_exited());
		assert_eq!(state, SessionState::Closed);
		assert!(messages.is_empty());

		// The process's own exit arriving late changes nothing.
		shell.exit(0);
		assert_eq!(shell.kill_count(), 1);
	}

	#[tokio::test]
	async fn test_exit_wins_over_queued_close() {
		for exit_first in [false, true] {
			let launcher = MockLauncher::new();
			let (harness, shell) = started(&launcher, "pod1", 0).await;

			if exit_first {
				shell.exit(0);
				harness.send(ClientMessage::Close);
			} else {
				harness.send(ClientMessage::Close);
				shell.exit(0);
			}
			let (outcome, messages, state) = harness.finish().await;

			assert_eq!(
				outcome.reason,
				CloseReason::ShellExited(ShellExit {
					code: Some(0),
					terminated: false
				})
			);
			assert!(!outcome.kill_issued);
			assert_eq!(shell.kill_count(), 0);
			assert_eq!(messages, vec![normal_close()]);
			assert_eq!(state, SessionState::Closed);
		}
	}

	#[tokio::test]
	async fn test_exit_pending_at_teardown_skips_kill() {
		let launcher = MockLauncher::new();
		let (harness, shell) = started(&launcher, "pod1", 0).await;

		// Both land before the session task runs again; cancellation is
		// checked first, so the exit is only seen during teardown.
		shell.exit(0);
		harness.cancel.cancel();
		let (outcome, messages, state) = harness.finish().await;

		assert_eq!(outcome.reason, CloseReason::Terminated);
		assert!(!outcome.kill_issued);
		assert_eq!(shell.kill_count(), 0);
		assert_eq!(messages, vec![normal_close()]);
		assert_eq!(state, SessionState::Closed);
	}

	#[tokio::test]
	async fn test_stream_end_counts_as_client_close() {
		let launcher = MockLauncher::new();
		let (harness, shell) = started(&launcher, "pod1", 0).await;

		harness.client.close_channel();
		let (outcome, _, _) = harness.finish().await;

		assert_eq!(outcome.reason, CloseReason::ClientClosed);
		assert_eq!(shell.kill_count(), 1);
	}

	#[tokio::test]
	async fn test_socket_error_tears_down() {
		let launcher = MockLauncher::new();
		let (harness, shell) = started(&launcher, "pod1", 0).await;

		harness
			.client
			.unbounded_send(Err("connection reset".to_string()))
			.unwrap();
		let (outcome, messages, _) = harness.finish().await;

		assert_eq!(
			outcome.reason,
			CloseReason::SocketError("connection reset".to_string())
		);
		assert_eq!(shell.kill_count(), 1);
		assert!(messages.is_empty());
	}

	#[tokio::test]
	async fn test_external_terminate() {
		let launcher = MockLauncher::new();
		let (harness, shell) = started(&launcher, "pod1", 0).await;

		harness.cancel.cancel();
		let (outcome, messages, state) = harness.finish().await;

		assert_eq!(outcome.reason, CloseReason::Terminated);
		assert!(outcome.kill_issued);
		assert_eq!(shell.kill_count(), 1);
		assert_eq!(messages, vec![normal_close()]);
		assert_eq!(state, SessionState::Closed);
	}

	#[tokio::test]
	async fn test_spawn_failure_closes_with_diagnostic() {
		let launcher = MockLauncher::failing("pods \"pod1\" not found");
		let harness = start(&launcher, "pod1");
		let (outcome, messages, state) = harness.finish().await;

		assert!(matches!(outcome.reason, CloseReason::SpawnFailed(_)));
		assert!(!outcome.kill_issued);
		assert_eq!(state, SessionState::Closed);
		assert_eq!(
			messages,
			vec![ServerMessage::Close {
				code: CLOSE_INTERNAL_ERROR,
				reason: "Failed to start PTY session: pods \"pod1\" not found".to_string(),
			}]
		);
	}

	#[tokio::test]
	async fn test_sessions_are_isolated() {
		let launcher = MockLauncher::new();
		let (a, shell_a) = started(&launcher, "pod-a", 0).await;
		let (b, shell_b) = started(&launcher, "pod-b", 1).await;

		a.send_text("0only-a");
		b.send_text("0only-b");
		a.send(ClientMessage::Close);
		let (outcome_a, _, _) = a.finish().await;

		assert_eq!(outcome_a.reason, CloseReason::ClientClosed);
		assert_eq!(shell_b.kill_count(), 0);

		b.send(ClientMessage::Close);
		b.finish().await;

		assert_eq!(shell_a.target().pod, "pod-a");
		assert_eq!(shell_b.target().pod, "pod-b");
		assert_eq!(shell_a.written(), b"only-a".to_vec());
		assert_eq!(shell_b.written(), b"only-b".to_vec());
	}

	#[tokio::test]
	async fn test_state_is_active_while_running() {
		let launcher = MockLauncher::new();
		let (harness, _shell) = started(&launcher, "pod1", 0).await;

		let mut state = harness.state.clone();
		state
			.wait_for(|s| *s == SessionState::Active)
			.await
			.unwrap();

		harness.cancel.cancel();
		harness.finish().await;
	}
}
