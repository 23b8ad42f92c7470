// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Interactive terminal (`kubectl exec`) configuration.

use std::path::PathBuf;

use serde::Deserialize;

fn default_kubectl_path() -> String {
	"kubectl".to_string()
}

fn default_command() -> Vec<String> {
	vec!["/bin/sh".to_string()]
}

fn default_term() -> String {
	"xterm-256color".to_string()
}

const DEFAULT_COLS: u16 = 80;
const DEFAULT_ROWS: u16 = 24;

/// Terminal configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalConfig {
	/// Program used to reach the container, normally `kubectl` on `PATH`.
	pub kubectl_path: String,
	pub kubeconfig: Option<PathBuf>,
	pub context: Option<String>,
	/// Argv run in the container when the client does not name a command.
	pub default_command: Vec<String>,
	pub term: String,
	pub cols: u16,
	pub rows: u16,
}

impl Default for TerminalConfig {
	fn default() -> Self {
		TerminalConfigLayer::default().finalize()
	}
}

/// Terminal configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TerminalConfigLayer {
	#[serde(default)]
	pub kubectl_path: Option<String>,
	#[serde(default)]
	pub kubeconfig: Option<PathBuf>,
	#[serde(default)]
	pub context: Option<String>,
	#[serde(default)]
	pub default_command: Option<Vec<String>>,
	#[serde(default)]
	pub term: Option<String>,
	#[serde(default)]
	pub cols: Option<u16>,
	#[serde(default)]
	pub rows: Option<u16>,
}

impl TerminalConfigLayer {
	pub fn merge(&mut self, other: TerminalConfigLayer) {
		if other.kubectl_path.is_some() {
			self.kubectl_path = other.kubectl_path;
		}
		if other.kubeconfig.is_some() {
			self.kubeconfig = other.kubeconfig;
		}
		if other.context.is_some() {
			self.context = other.context;
		}
		if other.default_command.is_some() {
			self.default_command = other.default_command;
		}
		if other.term.is_some() {
			self.term = other.term;
		}
		if other.cols.is_some() {
			self.cols = other.cols;
		}
		if other.rows.is_some() {
			self.rows = other.rows;
		}
	}

	pub fn finalize(self) -> TerminalConfig {
		TerminalConfig {
			kubectl_path: self.kubectl_path.unwrap_or_else(default_kubectl_path),
			kubeconfig: self.kubeconfig,
			context: self.context,
			default_command: self.default_command.unwrap_or_else(default_command),
			term: self.term.unwrap_or_else(default_term),
			cols: self.cols.unwrap_or(DEFAULT_COLS),
			rows: self.rows.unwrap_or(DEFAULT_ROWS),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = TerminalConfig::default();
		assert_eq!(config.kubectl_path, "kubectl");
		assert_eq!(config.default_command, vec!["/bin/sh".to_string()]);
		assert_eq!(config.term, "xterm-256color");
		assert_eq!((config.cols, config.rows), (80, 24));
		assert!(config.kubeconfig.is_none());
		assert!(config.context.is_none());
	}

	#[test]
	fn test_merge_overwrites_only_set_fields() {
		let mut base = TerminalConfigLayer {
			kubectl_path: Some("/usr/local/bin/kubectl".to_string()),
			cols: Some(120),
			..Default::default()
		};
		base.merge(TerminalConfigLayer {
			context: Some("staging".to_string()),
			cols: Some(100),
			..Default::default()
		});
		let config = base.finalize();
		assert_eq!(config.kubectl_path, "/usr/local/bin/kubectl");
		assert_eq!(config.context.as_deref(), Some("staging"));
		assert_eq!(config.cols, 100);
		assert_eq!(config.rows, 24);
	}

	#[test]
	fn test_deserialize_command_list() {
		let layer: TerminalConfigLayer = toml::from_str(
			r#"
default_command = ["/bin/bash", "-l"]
kubeconfig = "/home/ops/.kube/config"
"#,
		)
		.unwrap();
		let config = layer.finalize();
		assert_eq!(config.default_command, vec!["/bin/bash", "-l"]);
		assert_eq!(
			config.kubeconfig,
			Some(PathBuf::from("/home/ops/.kube/config"))
		);
	}
}
