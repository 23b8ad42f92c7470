// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the kubedeck server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`KUBEDECK_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use kubedeck_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}:{}", config.http.host, config.http.port);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub logging: LoggingConfig,
	pub terminal: TerminalConfig,
	pub cache: CacheConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`KUBEDECK_SERVER_*`)
/// 2. Config file (`/etc/kubedeck/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let terminal = layer.terminal.unwrap_or_default().finalize();
	let cache = layer.cache.unwrap_or_default().finalize();

	http.validate()?;
	validate_terminal(&terminal)?;

	info!(
		host = %http.host,
		port = http.port,
		cors_any_origin = http.allows_any_origin(),
		kubectl = %terminal.kubectl_path,
		kube_context = terminal.context.as_deref().unwrap_or("<current>"),
		cache_enabled = cache.enabled,
		cache_ttl_ms = cache.default_ttl.as_millis() as u64,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		logging,
		terminal,
		cache,
	})
}

fn validate_terminal(terminal: &TerminalConfig) -> Result<(), ConfigError> {
	if terminal.cols == 0 || terminal.rows == 0 {
		return Err(ConfigError::Validation(format!(
			"terminal size must be non-zero, got {}x{}",
			terminal.cols, terminal.rows
		)));
	}
	if terminal.default_command.is_empty() {
		return Err(ConfigError::Validation(
			"terminal default_command must not be empty".to_string(),
		));
	}
	if terminal.kubectl_path.trim().is_empty() {
		return Err(ConfigError::Validation(
			"terminal kubectl_path must not be empty".to_string(),
		));
	}

	Ok(())
}
