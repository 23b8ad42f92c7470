// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Read-only passthrough to the cluster API for the dashboard views.

use std::future::Future;

use axum::{
	extract::{Path, Query, State},
	Json,
};
use kubedeck_server_k8s::{find_kind, K8sError, ResourceKind};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{api::AppState, error::ServerError};

/// Namespace value meaning "across all namespaces".
pub const ALL_NAMESPACES: &str = "all";

#[derive(Debug, Default, Deserialize)]
pub struct ResourceParams {
	pub namespace: Option<String>,
}

/// A parsed `/api/v1/...` request.
#[derive(Debug, Clone)]
pub enum ResourceQuery {
	List {
		kind: &'static ResourceKind,
		namespace: Option<String>,
	},
	Get {
		kind: &'static ResourceKind,
		namespace: Option<String>,
		name: String,
	},
}

impl ResourceQuery {
	/// Parses the path below `/api/v1/`.
	///
	/// `namespace_param` is the `namespace` query parameter and only applies
	/// to the short list form.
	pub fn parse(path: &str, namespace_param: Option<&str>) -> Option<Self> {
		let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

		match segments.as_slice() {
			[kind] => {
				let kind = find_kind(kind)?;
				let namespace = if kind.is_namespaced() {
					match namespace_param {
						Some(ns) => scoped(ns),
						None => kind.default_namespace.map(str::to_string),
					}
				} else {
					None
				};
				Some(Self::List { kind, namespace })
			}
			[kind, name] => {
				let kind = find_kind(kind)?;
				(!kind.is_namespaced() && !name.is_empty()).then(|| Self::Get {
					kind,
					namespace: None,
					name: name.to_string(),
				})
			}
			["namespaces", namespace, kind] => {
				let kind = find_kind(kind)?;
				(kind.is_namespaced() && !namespace.is_empty()).then(|| Self::List {
					kind,
					namespace: scoped(namespace),
				})
			}
			["namespaces", namespace, kind, name] => {
				let kind = find_kind(kind)?;
				let valid = kind.is_namespaced()
					&& !namespace.is_empty()
					&& *namespace != ALL_NAMESPACES
					&& !name.is_empty();
				valid.then(|| Self::Get {
					kind,
					namespace: Some(namespace.to_string()),
					name: name.to_string(),
				})
			}
			_ => None,
		}
	}

	pub fn cache_key(&self) -> String {
		match self {
			Self::List { kind, namespace } => {
				format!("list:{}:{}", kind.name, namespace.as_deref().unwrap_or("*"))
			}
			Self::Get {
				kind,
				namespace,
				name,
			} => format!(
				"get:{}:{}:{}",
				kind.name,
				namespace.as_deref().unwrap_or("-"),
				name
			),
		}
	}
}

fn scoped(namespace: &str) -> Option<String> {
	(namespace != ALL_NAMESPACES).then(|| namespace.to_string())
}

/// GET /api/v1/{*path} - List or get a Kubernetes resource.
pub async fn get_resource(
	State(state): State<AppState>,
	Path(path): Path<String>,
	Query(params): Query<ResourceParams>,
) -> Result<Json<Value>, ServerError> {
	let query = ResourceQuery::parse(&path, params.namespace.as_deref())
		.ok_or_else(|| ServerError::UnknownPath(format!("/api/v1/{path}")))?;
	let key = query.cache_key();

	let value = match &query {
		ResourceQuery::List { kind, namespace } => {
			let k8s = state.k8s.clone();
			cached(&state, &key, || async move {
				let items = k8s.list(kind, namespace.as_deref()).await?;
				Ok::<_, K8sError>(json!({ "items": items }))
			})
			.await
			.map_err(|e| ServerError::Upstream {
				message: format!("Failed to fetch {}", kind.list_noun),
				details: e.to_string(),
			})?
		}
		ResourceQuery::Get {
			kind,
			namespace,
			name,
		} => {
			let k8s = state.k8s.clone();
			cached(&state, &key, || async move {
				k8s.get(kind, namespace.as_deref(), name).await
			})
			.await
			.map_err(|e| match e {
				K8sError::NotFound { .. } => ServerError::NotFound {
					message: format!("{} not found", kind.label),
					details: e.to_string(),
				},
				other => ServerError::Upstream {
					message: format!("Failed to fetch {} details", kind.detail_noun),
					details: other.to_string(),
				},
			})?
		}
	};

	Ok(Json(value))
}

async fn cached<F, Fut>(state: &AppState, key: &str, fetch: F) -> Result<Value, K8sError>
where
	F: FnOnce() -> Fut,
	Fut: Future<Output = Result<Value, K8sError>>,
{
	match &state.cache {
		Some(cache) => cache.get_or_fetch(key, fetch, None).await,
		None => fetch().await,
	}
}
