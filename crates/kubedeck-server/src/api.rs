// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Application state and router construction.

use std::sync::Arc;

use axum::{
	http::HeaderValue,
	middleware::from_fn,
	routing::{delete, get},
	Router,
};
use kubedeck_common_cache::TtlCache;
use kubedeck_server_config::{HttpConfig, ServerConfig};
use kubedeck_server_k8s::K8sClient;
use kubedeck_server_terminal::{SessionRegistry, ShellLauncher, TerminalSize};
use serde_json::Value;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::{routes, upgrade::upgrade_gate};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
	pub k8s: Arc<dyn K8sClient>,
	pub launcher: Arc<dyn ShellLauncher>,
	/// Response cache for resource reads; `None` when caching is disabled.
	pub cache: Option<Arc<TtlCache<Value>>>,
	pub sessions: SessionRegistry,
	pub terminal_size: TerminalSize,
}

pub fn create_app_state(
	config: &ServerConfig,
	k8s: Arc<dyn K8sClient>,
	launcher: Arc<dyn ShellLauncher>,
) -> AppState {
	let cache = config
		.cache
		.enabled
		.then(|| Arc::new(TtlCache::with_default_ttl(config.cache.default_ttl)));

	AppState {
		k8s,
		launcher,
		cache,
		sessions: SessionRegistry::new(),
		terminal_size: TerminalSize {
			cols: config.terminal.cols,
			rows: config.terminal.rows,
		},
	}
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/", get(routes::health::root))
		.route("/health", get(routes::health::health_check))
		.route("/api/v1/{*path}", get(routes::resources::get_resource))
		.route(
			"/api/terminal/sessions",
			get(routes::sessions::list_sessions),
		)
		.route(
			"/api/terminal/sessions/{id}",
			delete(routes::sessions::terminate_session),
		)
		.route(
			"/exec-session/{namespace}/{pod}/exec",
			get(routes::exec::exec_session),
		)
		.fallback(routes::not_found)
		.layer(from_fn(upgrade_gate))
		.with_state(state)
}

/// CORS for the dashboard frontend. Any origin when none are configured,
/// otherwise only the listed ones.
pub fn cors_layer(http: &HttpConfig) -> CorsLayer {
	let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
	if http.allows_any_origin() {
		return layer.allow_origin(Any);
	}

	let origins: Vec<HeaderValue> = http
		.cors_origins
		.iter()
		.filter_map(|origin| match HeaderValue::from_str(origin) {
			Ok(value) => Some(value),
			Err(_) => {
				tracing::warn!(%origin, "Ignoring unusable CORS origin");
				None
			}
		})
		.collect();
	layer.allow_origin(AllowOrigin::list(origins))
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::{body::Body, http::Request};
	use tower::ServiceExt;

	async fn allowed_origin(http: &HttpConfig, origin: &str) -> Option<String> {
		let app = Router::new()
			.route("/health", get(|| async { "ok" }))
			.layer(cors_layer(http));
		let request = Request::builder()
			.uri("/health")
			.header("origin", origin)
			.body(Body::empty())
			.unwrap();
		let response = app.oneshot(request).await.unwrap();
		response
			.headers()
			.get("access-control-allow-origin")
			.map(|v| v.to_str().unwrap().to_string())
	}

	#[tokio::test]
	async fn test_cors_any_origin_by_default() {
		let http = HttpConfig::default();
		assert_eq!(
			allowed_origin(&http, "http://localhost:5173").await.as_deref(),
			Some("*")
		);
	}

	#[tokio::test]
	async fn test_cors_restricted_to_configured_origins() {
		let http = HttpConfig {
			cors_origins: vec!["https://deck.example.com".to_string()],
			..Default::default()
		};
		assert_eq!(
			allowed_origin(&http, "https://deck.example.com").await.as_deref(),
			Some("https://deck.example.com")
		);
		assert_eq!(allowed_origin(&http, "https://evil.example.com").await, None);
	}
}
