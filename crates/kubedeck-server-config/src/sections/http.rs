// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Listener and browser-origin settings for the dashboard API.

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_HOST: &str = "0.0.0.0";

/// Resolved listener settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
	pub host: String,
	pub port: u16,
	/// Origins the dashboard frontend is served from. Empty allows any
	/// origin, which suits a frontend dev server on another port.
	pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
	fn default() -> Self {
		HttpConfigLayer::default().finalize()
	}
}

impl HttpConfig {
	pub fn allows_any_origin(&self) -> bool {
		self.cors_origins.is_empty()
	}

	pub(crate) fn validate(&self) -> Result<(), ConfigError> {
		if self.host.trim().is_empty() {
			return Err(ConfigError::Validation(
				"http host must not be empty".to_string(),
			));
		}
		for origin in &self.cors_origins {
			let scheme_ok = origin.starts_with("http://") || origin.starts_with("https://");
			if !scheme_ok || origin.ends_with('/') {
				return Err(ConfigError::Validation(format!(
					"cors origin '{origin}' must be scheme://host[:port] with no path"
				)));
			}
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfigLayer {
	#[serde(default)]
	pub host: Option<String>,
	#[serde(default)]
	pub port: Option<u16>,
	#[serde(default)]
	pub cors_origins: Option<Vec<String>>,
}

impl HttpConfigLayer {
	pub fn merge(&mut self, other: HttpConfigLayer) {
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.cors_origins.is_some() {
			self.cors_origins = other.cors_origins;
		}
	}

	pub fn finalize(self) -> HttpConfig {
		HttpConfig {
			host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
			port: self.port.unwrap_or(DEFAULT_PORT),
			cors_origins: self.cors_origins.unwrap_or_default(),
		}
	}
}
