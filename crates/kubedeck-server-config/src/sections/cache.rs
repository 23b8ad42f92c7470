// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Response cache configuration.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_TTL_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
	pub enabled: bool,
	pub default_ttl: Duration,
}

impl Default for CacheConfig {
	fn default() -> Self {
		CacheConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfigLayer {
	#[serde(default)]
	pub enabled: Option<bool>,
	#[serde(default)]
	pub default_ttl_ms: Option<u64>,
}

impl CacheConfigLayer {
	pub fn merge(&mut self, other: CacheConfigLayer) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.default_ttl_ms.is_some() {
			self.default_ttl_ms = other.default_ttl_ms;
		}
	}

	pub fn finalize(self) -> CacheConfig {
		CacheConfig {
			enabled: self.enabled.unwrap_or(true),
			default_ttl: Duration::from_millis(self.default_ttl_ms.unwrap_or(DEFAULT_TTL_MS)),
		}
	}
}
