// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// The remote shell could not be started. The session never becomes active.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpawnError {
	#[error("failed to open pty: {0}")]
	OpenPty(String),

	#[error("failed to spawn {program}: {message}")]
	Command { program: String, message: String },

	#[error("pty i/o setup failed: {0}")]
	Io(String),

	#[error("{0}")]
	Rejected(String),
}

/// A single inbound message could not be decoded. The message is dropped and
/// the session continues.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
	#[error("empty message")]
	EmptyMessage,

	#[error("unknown channel {0:?}")]
	UnknownChannel(char),

	#[error("invalid resize payload: {0}")]
	InvalidResize(String),
}
