// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! In-memory [`K8sClient`] for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::K8sClient;
use crate::error::K8sError;
use crate::resources::ResourceKind;

#[derive(Debug, Clone)]
struct StoredObject {
	kind: &'static str,
	namespace: Option<String>,
	name: String,
	object: Value,
}

/// Mock K8s client serving objects inserted by the test.
///
/// Counts every `list`/`get` call so callers can assert caching behavior.
#[derive(Debug, Default)]
pub struct MockK8sClient {
	objects: Mutex<Vec<StoredObject>>,
	failure: Mutex<Option<String>>,
	calls: AtomicUsize,
}

impl MockK8sClient {
	pub fn new() -> Self {
		Self::default()
	}

	/// Store `object` under `kind`. The name is read from `metadata.name`.
	pub fn insert(&self, kind: &ResourceKind, namespace: Option<&str>, object: Value) {
		let name = object["metadata"]["name"]
			.as_str()
			.unwrap_or_default()
			.to_string();
		self.objects.lock().unwrap().push(StoredObject {
			kind: kind.name,
			namespace: namespace.map(str::to_string),
			name,
			object,
		});
	}

	/// Make every subsequent call fail with an API error.
	pub fn fail_with(&self, message: impl Into<String>) {
		*self.failure.lock().unwrap() = Some(message.into());
	}

	pub fn clear_failure(&self) {
		*self.failure.lock().unwrap() = None;
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn check_failure(&self) -> Result<(), K8sError> {
		match self.failure.lock().unwrap().as_ref() {
			Some(message) => Err(K8sError::ApiError {
				message: message.clone(),
			}),
			None => Ok(()),
		}
	}
}

#[async_trait]
impl K8sClient for MockK8sClient {
	async fn list(
		&self,
		kind: &ResourceKind,
		namespace: Option<&str>,
	) -> Result<Vec<Value>, K8sError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.check_failure()?;

		let objects = self.objects.lock().unwrap();
		Ok(objects
			.iter()
			.filter(|o| o.kind == kind.name)
			.filter(|o| namespace.is_none() || o.namespace.as_deref() == namespace)
			.map(|o| o.object.clone())
			.collect())
	}

	async fn get(
		&self,
		kind: &ResourceKind,
		namespace: Option<&str>,
		name: &str,
	) -> Result<Value, K8sError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.check_failure()?;

		let objects = self.objects.lock().unwrap();
		objects
			.iter()
			.find(|o| {
				o.kind == kind.name
					&& o.name == name
					&& (!kind.is_namespaced() || o.namespace.as_deref() == namespace)
			})
			.map(|o| o.object.clone())
			.ok_or_else(|| K8sError::NotFound {
				kind: kind.label,
				name: name.to_string(),
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::resources::find_kind;
	use serde_json::json;

	fn pod(name: &str) -> Value {
		json!({ "metadata": { "name": name } })
	}

	#[tokio::test]
	async fn test_list_filters_by_namespace() {
		let client = MockK8sClient::new();
		let pods = find_kind("pods").unwrap();
		client.insert(pods, Some("default"), pod("web-0"));
		client.insert(pods, Some("kube-system"), pod("coredns-0"));

		let default = client.list(pods, Some("default")).await.unwrap();
		assert_eq!(default, vec![pod("web-0")]);

		let all = client.list(pods, None).await.unwrap();
		assert_eq!(all.len(), 2);
		assert_eq!(client.calls(), 2);
	}

	#[tokio::test]
	async fn test_get_missing_is_not_found() {
		let client = MockK8sClient::new();
		let nodes = find_kind("nodes").unwrap();
		client.insert(nodes, None, pod("node-a"));

		assert_eq!(client.get(nodes, None, "node-a").await.unwrap(), pod("node-a"));
		let err = client.get(nodes, None, "node-b").await.unwrap_err();
		assert!(err.is_not_found());
		assert_eq!(err.to_string(), "Node not found: node-b");
	}

	#[test]
	fn test_injected_failure() {
		let client = MockK8sClient::new();
		client.fail_with("connection refused");
		let result = tokio_test::block_on(client.list(find_kind("services").unwrap(), None));
		assert!(matches!(result, Err(K8sError::ApiError { .. })));

		client.clear_failure();
		let result = tokio_test::block_on(client.list(find_kind("services").unwrap(), None));
		assert!(result.unwrap().is_empty());
	}
}
