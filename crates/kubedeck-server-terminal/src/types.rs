// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Serialize;

/// The container a terminal session attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecTarget {
	pub namespace: String,
	pub pod: String,
	pub container: String,
	/// Argv to run in the container. `None` uses the launcher's default shell.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub command: Option<Vec<String>>,
}

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TerminalSize {
	pub cols: u16,
	pub rows: u16,
}

impl TerminalSize {
	/// Validates client-supplied dimensions. Both must be positive and fit
	/// in a `u16`.
	pub fn new(cols: i64, rows: i64) -> Option<Self> {
		let cols = u16::try_from(cols).ok().filter(|c| *c > 0)?;
		let rows = u16::try_from(rows).ok().filter(|r| *r > 0)?;
		Some(Self { cols, rows })
	}
}

impl Default for TerminalSize {
	fn default() -> Self {
		Self { cols: 80, rows: 24 }
	}
}

/// How the remote shell process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellExit {
	/// Exit code, when the process reported one.
	pub code: Option<u32>,
	/// True when the exit followed a kill issued by this server.
	pub terminated: bool,
}

impl ShellExit {
	pub fn success(&self) -> bool {
		self.code == Some(0)
	}
}
