// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Channel-multiplexed terminal wire format.
//!
//! Every inbound message starts with a one-character channel discriminator:
//!
//! | Channel | Payload |
//! |---------|---------|
//! | `0`     | keystrokes, forwarded verbatim |
//! | `4`     | `{"Width": n, "Height": m}` |
//!
//! Outbound terminal output is sent unprefixed.

use bytes::Bytes;
use serde::Deserialize;

use crate::error::ProtocolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
	Input,
	Resize,
}

impl Channel {
	pub fn from_discriminator(c: char) -> Option<Self> {
		match c {
			'0' => Some(Channel::Input),
			'4' => Some(Channel::Resize),
			_ => None,
		}
	}

	pub fn discriminator(self) -> char {
		match self {
			Channel::Input => '0',
			Channel::Resize => '4',
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ResizeRequest {
	#[serde(rename = "Width")]
	pub width: i64,
	#[serde(rename = "Height")]
	pub height: i64,
}

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
	Input(Bytes),
	Resize(ResizeRequest),
}

pub fn decode_text(text: &str) -> Result<ClientFrame, ProtocolError> {
	let mut chars = text.chars();
	let discriminator = chars.next().ok_or(ProtocolError::EmptyMessage)?;
	let payload = chars.as_str();

	match Channel::from_discriminator(discriminator) {
		Some(Channel::Input) => Ok(ClientFrame::Input(Bytes::copy_from_slice(
			payload.as_bytes(),
		))),
		Some(Channel::Resize) => serde_json::from_str(payload)
			.map(ClientFrame::Resize)
			.map_err(|e| ProtocolError::InvalidResize(e.to_string())),
		None => Err(ProtocolError::UnknownChannel(discriminator)),
	}
}

/// Decodes a binary frame as UTF-8 text.
///
/// Frames that are not valid UTF-8 are passed through whole as keystrokes.
/// Some clients send raw input this way and dropping it would lose data.
pub fn decode_binary(data: &[u8]) -> Result<ClientFrame, ProtocolError> {
	match std::str::from_utf8(data) {
		Ok(text) => decode_text(text),
		Err(_) => Ok(ClientFrame::Input(Bytes::copy_from_slice(data))),
	}
}
