// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The seam between a terminal session and whatever runs the remote shell.

use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use crate::error::SpawnError;
use crate::types::{ExecTarget, ShellExit, TerminalSize};

/// Synchronous control surface of a running shell.
///
/// Implementations must not block: `write` hands data to a writer thread or
/// buffer, `resize` is a single ioctl, `kill` only signals.
pub trait ShellControl: Send {
	fn write(&mut self, data: &[u8]) -> io::Result<()>;
	fn resize(&mut self, size: TerminalSize) -> io::Result<()>;
	fn kill(&mut self) -> io::Result<()>;
}

/// A freshly started shell.
pub struct SpawnedShell {
	pub control: Box<dyn ShellControl>,
	/// Output chunks in the order the process produced them. Closed when the
	/// process side hangs up.
	pub output: mpsc::Receiver<Bytes>,
	/// Fires once when the process exits.
	pub exit: oneshot::Receiver<ShellExit>,
}

/// Starts an interactive, TTY-backed shell inside a container.
#[async_trait]
pub trait ShellLauncher: Send + Sync {
	async fn spawn(
		&self,
		target: &ExecTarget,
		size: TerminalSize,
	) -> Result<SpawnedShell, SpawnError>;
}
