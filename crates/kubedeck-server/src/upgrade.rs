// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Routing and validation of WebSocket upgrade requests.
//!
//! [`upgrade_gate`] is a router-level layer, so it wraps every route and the
//! fallback and inspects each upgrade request after route matching but
//! before any handler runs. Only
//! `/exec-session/{namespace}/{pod}/exec?container=...` is accepted. Anything else is refused with a bare 400 and the connection is
//! closed without a handshake.

use axum::{
	extract::Request,
	http::{header, HeaderMap, StatusCode, Uri},
	middleware::Next,
	response::{IntoResponse, Response},
};
use kubedeck_server_terminal::ExecTarget;
use tracing::{debug, warn};

/// Path prefix shared by all terminal upgrade URLs.
pub const EXEC_SESSION_PREFIX: &str = "/exec-session/";

/// Longest name Kubernetes accepts for a namespaced object.
const MAX_NAME_LEN: usize = 253;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpgradeRejected {
	#[error("no upgrade route for {0}")]
	UnknownPath(String),

	#[error("invalid {field} name: {value:?}")]
	InvalidName { field: &'static str, value: String },

	#[error("missing container query parameter")]
	MissingContainer,
}

/// Resolves an upgrade URI to the container it should attach to.
pub fn route_upgrade(uri: &Uri) -> Result<ExecTarget, UpgradeRejected> {
	let path = uri.path();
	let unknown = || UpgradeRejected::UnknownPath(path.to_string());

	let rest = path.strip_prefix(EXEC_SESSION_PREFIX).ok_or_else(unknown)?;
	let segments: Vec<&str> = rest.split('/').collect();
	let [namespace, pod, "exec"] = segments.as_slice() else {
		return Err(unknown());
	};

	validate_name("namespace", namespace)?;
	validate_name("pod", pod)?;

	let mut container = None;
	let mut command = None;
	for (key, value) in url::form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes()) {
		match key.as_ref() {
			"container" => container = Some(value.into_owned()),
			"command" => command = Some(value.into_owned()),
			_ => {}
		}
	}

	let container = container
		.filter(|c| !c.is_empty())
		.ok_or(UpgradeRejected::MissingContainer)?;
	validate_name("container", &container)?;

	let command = command
		.map(|c| c.split_whitespace().map(str::to_string).collect::<Vec<_>>())
		.filter(|argv| !argv.is_empty());

	Ok(ExecTarget {
		namespace: namespace.to_string(),
		pod: pod.to_string(),
		container,
		command,
	})
}

/// Kubernetes object names: lowercase alphanumerics, `-` and `.`, starting
/// and ending with an alphanumeric.
fn validate_name(field: &'static str, value: &str) -> Result<(), UpgradeRejected> {
	let alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();
	let bytes = value.as_bytes();
	let valid = !bytes.is_empty()
		&& bytes.len() <= MAX_NAME_LEN
		&& bytes.first().is_some_and(alnum)
		&& bytes.last().is_some_and(alnum)
		&& bytes.iter().all(|b| alnum(b) || *b == b'-' || *b == b'.');

	if valid {
		Ok(())
	} else {
		Err(UpgradeRejected::InvalidName {
			field,
			value: value.to_string(),
		})
	}
}

/// True for requests asking to switch to the WebSocket protocol.
pub fn is_upgrade_request(headers: &HeaderMap) -> bool {
	let connection_upgrade = headers
		.get_all(header::CONNECTION)
		.iter()
		.filter_map(|v| v.to_str().ok())
		.flat_map(|v| v.split(','))
		.any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

	let upgrade_websocket = headers
		.get(header::UPGRADE)
		.and_then(|v| v.to_str().ok())
		.is_some_and(|v| v.trim().eq_ignore_ascii_case("websocket"));

	connection_upgrade && upgrade_websocket
}

/// Middleware that routes upgrade requests before any handler runs.
///
/// Accepted requests carry their [`ExecTarget`] in the request extensions.
pub async fn upgrade_gate(mut request: Request, next: Next) -> Response {
	if !is_upgrade_request(request.headers()) {
		return next.run(request).await;
	}

	match route_upgrade(request.uri()) {
		Ok(target) => {
			debug!(
				namespace = %target.namespace,
				pod = %target.pod,
				container = %target.container,
				"accepting terminal upgrade"
			);
			request.extensions_mut().insert(target);
			next.run(request).await
		}
		Err(e) => {
			warn!(path = %request.uri().path(), error = %e, "rejecting upgrade request");
			reject()
		}
	}
}

fn reject() -> Response {
	(StatusCode::BAD_REQUEST, [(header::CONNECTION, "close")]).into_response()
}
