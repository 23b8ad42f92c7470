// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Owned handle to one remote shell process.

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::SpawnError;
use crate::launcher::{ShellControl, ShellLauncher, SpawnedShell};
use crate::types::{ExecTarget, ShellExit, TerminalSize};

/// Output and exit notifications of a spawned shell.
pub struct ShellEvents {
	pub output: mpsc::Receiver<Bytes>,
	pub exit: oneshot::Receiver<ShellExit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessState {
	Running,
	Exited(ShellExit),
	Killed,
}

/// Exclusive handle to a running shell.
///
/// Once the process has exited or been killed every operation is a no-op,
/// so callers never write to or signal a dead process.
pub struct PtySession {
	control: Box<dyn ShellControl>,
	state: ProcessState,
}

impl PtySession {
	pub async fn spawn(
		launcher: &dyn ShellLauncher,
		target: &ExecTarget,
		size: TerminalSize,
	) -> Result<(Self, ShellEvents), SpawnError> {
		let SpawnedShell {
			control,
			output,
			exit,
		} = launcher.spawn(target, size).await?;
		Ok((Self::new(control), ShellEvents { output, exit }))
	}

	pub fn new(control: Box<dyn ShellControl>) -> Self {
		Self {
			control,
			state: ProcessState::Running,
		}
	}

	pub fn is_alive(&self) -> bool {
		self.state == ProcessState::Running
	}

	pub fn exit_status(&self) -> Option<ShellExit> {
		match self.state {
			ProcessState::Exited(status) => Some(status),
			_ => None,
		}
	}

	/// Forwards keystrokes to the process.
	pub fn write(&mut self, data: &[u8]) {
		if !self.is_alive() || data.is_empty() {
			return;
		}
		if let Err(e) = self.control.write(data) {
			warn!(error = %e, "failed to write to pty");
		}
	}

	/// Resizes the terminal. Returns false when the dimensions were rejected
	/// or the process is gone.
	pub fn resize(&mut self, cols: i64, rows: i64) -> bool {
		let Some(size) = TerminalSize::new(cols, rows) else {
			warn!(cols, rows, "ignoring invalid terminal size");
			return false;
		};
		if !self.is_alive() {
			return false;
		}
		match self.control.resize(size) {
			Ok(()) => {
				debug!(cols = size.cols, rows = size.rows, "terminal resized");
				true
			}
			Err(e) => {
				warn!(error = %e, "failed to resize pty");
				false
			}
		}
	}

	/// Kills the process if it is still running. Returns true only for the
	/// call that actually issued the kill.
	pub fn terminate(&mut self) -> bool {
		if !self.is_alive() {
			return false;
		}
		self.state = ProcessState::Killed;
		if let Err(e) = self.control.kill() {
			warn!(error = %e, "failed to kill pty process");
		}
		true
	}

	/// Records that the process exited on its own.
	pub fn mark_exited(&mut self, status: ShellExit) {
		if self.state == ProcessState::Running {
			self.state = ProcessState::Exited(status);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mock::MockLauncher;

	fn target() -> ExecTarget {
		ExecTarget {
			namespace: "ns1".to_string(),
			pod: "pod1".to_string(),
			container: "app".to_string(),
			command: None,
		}
	}

	#[tokio::test]
	async fn test_write_after_exit_is_noop() {
		let launcher = MockLauncher::new();
		let (mut session, _events) = PtySession::spawn(&launcher, &target(), TerminalSize::default())
			.await
			.unwrap();
		let shell = launcher.shell(0).unwrap();

		session.write(b"ls\r");
		session.mark_exited(ShellExit {
			code: Some(0),
			terminated: false,
		});
		session.write(b"whoami\r");

		assert_eq!(shell.written(), b"ls\r".to_vec());
		assert!(!session.is_alive());
		assert_eq!(session.exit_status().and_then(|s| s.code), Some(0));
	}

	#[tokio::test]
	async fn test_resize_validation() {
		let launcher = MockLauncher::new();
		let (mut session, _events) = PtySession::spawn(&launcher, &target(), TerminalSize::default())
			.await
			.unwrap();
		let shell = launcher.shell(0).unwrap();

		assert!(session.resize(120, 40));
		assert!(!session.resize(-1, 40));
		assert!(!session.resize(120, 100_000));

		assert_eq!(shell.resizes(), vec![TerminalSize { cols: 120, rows: 40 }]);
	}

	#[tokio::test]
	async fn test_terminate_is_idempotent() {
		let launcher = MockLauncher::new();
		let (mut session, _events) = PtySession::spawn(&launcher, &target(), TerminalSize::default())
			.await
			.unwrap();
		let shell = launcher.shell(0).unwrap();

		assert!(session.terminate());
		assert!(!session.terminate());
		assert_eq!(shell.kill_count(), 1);
	}

	#[tokio::test]
	async fn test_no_kill_after_exit() {
		let launcher = MockLauncher::new();
		let (mut session, _events) = PtySession::spawn(&launcher, &target(), TerminalSize::default())
			.await
			.unwrap();
		let shell = launcher.shell(0).unwrap();

		session.mark_exited(ShellExit {
			code: Some(1),
			terminated: false,
		});
		assert!(!session.terminate());
		assert_eq!(shell.kill_count(), 0);
	}
}
