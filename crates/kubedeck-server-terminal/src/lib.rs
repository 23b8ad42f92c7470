// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Interactive container terminals bridged over a message-oriented client
//! connection.
//!
//! This crate provides:
//! - [`ShellLauncher`], the seam to whatever starts the remote shell, with a
//!   `kubectl exec` implementation running in a local pty
//! - The channel-multiplexed wire format spoken by the dashboard terminal
//! - [`SessionRunner`], the per-connection state machine, and
//!   [`SessionRegistry`] for listing and terminating live sessions
//!
//! The crate does not depend on a particular WebSocket implementation; the
//! server adapts its socket into [`ClientMessage`]/[`ServerMessage`] streams.

mod error;
mod launcher;
mod lifecycle;
mod mock;
mod protocol;
mod pty;
mod registry;
mod session;
mod types;

pub use error::{ProtocolError, SpawnError};
pub use launcher::{ShellControl, ShellLauncher, SpawnedShell};
pub use lifecycle::{
	ClientMessage, CloseReason, ServerMessage, SessionOutcome, SessionRunner, SessionState,
	CLOSE_INTERNAL_ERROR, CLOSE_NORMAL,
};
pub use mock::{MockLauncher, MockShell};
pub use protocol::{decode_binary, decode_text, Channel, ClientFrame, ResizeRequest};
pub use pty::KubectlLauncher;
pub use registry::{SessionInfo, SessionRegistry};
pub use session::{PtySession, ShellEvents};
pub use types::{ExecTarget, ShellExit, TerminalSize};
