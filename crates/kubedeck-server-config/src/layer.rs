// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{CacheConfigLayer, HttpConfigLayer, LoggingConfigLayer, TerminalConfigLayer};

/// Server configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub terminal: Option<TerminalConfigLayer>,
	#[serde(default)]
	pub cache: Option<CacheConfigLayer>,
}

impl ServerConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_option(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_option(
			&mut self.terminal,
			other.terminal,
			TerminalConfigLayer::merge,
		);
		merge_option(&mut self.cache, other.cache, CacheConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_merge_empty_layers() {
		let mut base = ServerConfigLayer::default();
		base.merge(ServerConfigLayer::default());
		assert!(base.http.is_none());
		assert!(base.terminal.is_none());
	}

	#[test]
	fn test_merge_adds_missing_sections() {
		let mut base = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(9000),
				..Default::default()
			}),
			..Default::default()
		};
		let other = ServerConfigLayer {
			terminal: Some(TerminalConfigLayer {
				context: Some("prod-eu".to_string()),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(other);
		assert_eq!(base.http.as_ref().unwrap().port, Some(9000));
		assert_eq!(
			base.terminal.as_ref().unwrap().context.as_deref(),
			Some("prod-eu")
		);
	}

	#[test]
	fn test_deserialize_full_file() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
[http]
port = 4000

[terminal]
kubectl_path = "/opt/bin/kubectl"
rows = 50

[cache]
enabled = false
"#,
		)
		.unwrap();
		assert_eq!(layer.http.unwrap().port, Some(4000));
		let terminal = layer.terminal.unwrap();
		assert_eq!(terminal.kubectl_path.as_deref(), Some("/opt/bin/kubectl"));
		assert_eq!(terminal.rows, Some(50));
		assert_eq!(layer.cache.unwrap().enabled, Some(false));
		assert!(layer.logging.is_none());
	}

	proptest! {
		#[test]
		fn later_layer_wins_when_set(base in proptest::option::of(any::<u16>()), over in proptest::option::of(any::<u16>())) {
			let mut merged = ServerConfigLayer {
				http: Some(HttpConfigLayer { port: base, ..Default::default() }),
				..Default::default()
			};
			merged.merge(ServerConfigLayer {
				http: Some(HttpConfigLayer { port: over, ..Default::default() }),
				..Default::default()
			});
			prop_assert_eq!(merged.http.unwrap().port, over.or(base));
		}
	}
}
