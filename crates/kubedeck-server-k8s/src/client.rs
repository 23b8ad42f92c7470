// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use serde_json::Value;

use crate::error::K8sError;
use crate::resources::ResourceKind;

/// Read-only K8s operations needed by the dashboard.
///
/// Objects are returned as raw JSON so the dashboard receives them exactly as
/// the API server produced them.
#[async_trait]
pub trait K8sClient: Send + Sync {
	/// List objects of `kind`. `None` lists across all namespaces (or the
	/// whole cluster for cluster-scoped kinds).
	async fn list(&self, kind: &ResourceKind, namespace: Option<&str>)
		-> Result<Vec<Value>, K8sError>;

	/// Get a single object by name. `namespace` is ignored for
	/// cluster-scoped kinds.
	async fn get(
		&self,
		kind: &ResourceKind,
		namespace: Option<&str>,
		name: &str,
	) -> Result<Value, K8sError>;
}
