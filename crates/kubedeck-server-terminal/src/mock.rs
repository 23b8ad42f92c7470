// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process [`ShellLauncher`] for tests.
//!
//! Each spawn records a [`MockShell`]. Tests drive the fake process from the
//! outside (emit output, exit) and inspect what the session sent to it.

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, Notify};

use crate::error::SpawnError;
use crate::launcher::{ShellControl, ShellLauncher, SpawnedShell};
use crate::types::{ExecTarget, ShellExit, TerminalSize};

#[derive(Default)]
struct LauncherState {
	shells: Vec<MockShell>,
	failure: Option<String>,
}

/// Mock launcher recording every spawned shell.
#[derive(Clone, Default)]
pub struct MockLauncher {
	state: Arc<Mutex<LauncherState>>,
	spawned: Arc<Notify>,
}

impl MockLauncher {
	pub fn new() -> Self {
		Self::default()
	}

	/// A launcher whose every spawn fails with `message`.
	pub fn failing(message: impl Into<String>) -> Self {
		let launcher = Self::new();
		launcher.state.lock().unwrap().failure = Some(message.into());
		launcher
	}

	pub fn spawn_count(&self) -> usize {
		self.state.lock().unwrap().shells.len()
	}

	pub fn shell(&self, index: usize) -> Option<MockShell> {
		self.state.lock().unwrap().shells.get(index).cloned()
	}

	/// Waits until the shell with the given spawn index exists.
	pub async fn wait_for_shell(&self, index: usize) -> MockShell {
		loop {
			let notified = self.spawned.notified();
			if let Some(shell) = self.shell(index) {
				return shell;
			}
			notified.await;
		}
	}
}

#[async_trait]
impl ShellLauncher for MockLauncher {
	async fn spawn(
		&self,
		target: &ExecTarget,
		size: TerminalSize,
	) -> Result<SpawnedShell, SpawnError> {
		if let Some(message) = self.state.lock().unwrap().failure.clone() {
			return Err(SpawnError::Rejected(message));
		}

		let (output_tx, output_rx) = mpsc::channel(64);
		let (exit_tx, exit_rx) = oneshot::channel();
		let shell = MockShell {
			inner: Arc::new(ShellInner {
				target: target.clone(),
				size,
				state: Mutex::new(ShellState {
					output: Some(output_tx),
					exit: Some(exit_tx),
					..Default::default()
				}),
			}),
		};

		self.state.lock().unwrap().shells.push(shell.clone());
		self.spawned.notify_waiters();

		Ok(SpawnedShell {
			control: Box::new(MockControl { shell }),
			output: output_rx,
			exit: exit_rx,
		})
	}
}

#[derive(Default)]
struct ShellState {
	writes: Vec<Bytes>,
	resizes: Vec<TerminalSize>,
	kills: usize,
	output: Option<mpsc::Sender<Bytes>>,
	exit: Option<oneshot::Sender<ShellExit>>,
}

struct ShellInner {
	target: ExecTarget,
	size: TerminalSize,
	state: Mutex<ShellState>,
}

/// Test handle to one fake shell process.
#[derive(Clone)]
pub struct MockShell {
	inner: Arc<ShellInner>,
}

impl MockShell {
	pub fn target(&self) -> &ExecTarget {
		&self.inner.target
	}

	pub fn initial_size(&self) -> TerminalSize {
		self.inner.size
	}

	/// Produces terminal output. Ignored once the shell has exited.
	pub async fn emit(&self, data: impl Into<Bytes>) {
		let sender = self.inner.state.lock().unwrap().output.clone();
		if let Some(sender) = sender {
			let _ = sender.send(data.into()).await;
		}
	}

	/// Exits the fake process with `code`. No-op if it already exited.
	pub fn exit(&self, code: u32) {
		self.finish(ShellExit {
			code: Some(code),
			terminated: false,
		});
	}

	pub fn has_exited(&self) -> bool {
		self.inner.state.lock().unwrap().exit.is_none()
	}

	/// All bytes written to the shell, concatenated.
	pub fn written(&self) -> Vec<u8> {
		self.writes().concat()
	}

	pub fn writes(&self) -> Vec<Bytes> {
		self.inner.state.lock().unwrap().writes.clone()
	}

	pub fn resizes(&self) -> Vec<TerminalSize> {
		self.inner.state.lock().unwrap().resizes.clone()
	}

	pub fn kill_count(&self) -> usize {
		self.inner.state.lock().unwrap().kills
	}

	fn finish(&self, status: ShellExit) {
		let mut state = self.inner.state.lock().unwrap();
		state.output = None;
		if let Some(exit) = state.exit.take() {
			let _ = exit.send(status);
		}
	}
}

struct MockControl {
	shell: MockShell,
}

impl ShellControl for MockControl {
	fn write(&mut self, data: &[u8]) -> io::Result<()> {
		let mut state = self.shell.inner.state.lock().unwrap();
		if state.exit.is_none() {
			return Err(io::Error::new(io::ErrorKind::BrokenPipe, "shell exited"));
		}
		state.writes.push(Bytes::copy_from_slice(data));
		Ok(())
	}

	fn resize(&mut self, size: TerminalSize) -> io::Result<()> {
		self.shell.inner.state.lock().unwrap().resizes.push(size);
		Ok(())
	}

	fn kill(&mut self) -> io::Result<()> {
		self.shell.inner.state.lock().unwrap().kills += 1;
		self.shell.finish(ShellExit {
			code: None,
			terminated: true,
		});
		Ok(())
	}
}
