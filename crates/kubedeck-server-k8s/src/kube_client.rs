// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::Path;

use async_trait::async_trait;
use kube::{
	api::{Api, DynamicObject, ListParams},
	config::{KubeConfigOptions, Kubeconfig},
	Client, Config,
};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::client::K8sClient;
use crate::error::K8sError;
use crate::resources::ResourceKind;

/// Production K8s client implementation using the kube crate.
pub struct KubeClient {
	client: Client,
}

impl KubeClient {
	/// Create a new KubeClient that auto-discovers cluster configuration.
	///
	/// This will attempt to load config from:
	/// 1. In-cluster service account (when running in K8s)
	/// 2. KUBECONFIG environment variable
	/// 3. ~/.kube/config
	pub async fn new() -> Result<Self, K8sError> {
		let client = Client::try_default().await?;
		debug!("K8s client initialized");
		Ok(Self { client })
	}

	/// Create a client from an explicit kubeconfig file and/or context.
	///
	/// Falls back to [`KubeClient::new`] when neither is given, so the
	/// in-process client and `kubectl` talk to the same cluster.
	pub async fn from_kubeconfig(
		path: Option<&Path>,
		context: Option<&str>,
	) -> Result<Self, K8sError> {
		if path.is_none() && context.is_none() {
			return Self::new().await;
		}

		let kubeconfig = match path {
			Some(path) => Kubeconfig::read_from(path)?,
			None => Kubeconfig::read()?,
		};
		let options = KubeConfigOptions {
			context: context.map(str::to_string),
			..Default::default()
		};
		let config = Config::from_custom_kubeconfig(kubeconfig, &options).await?;
		let client = Client::try_from(config)?;
		debug!(context = ?context, "K8s client initialized from kubeconfig");
		Ok(Self { client })
	}

	fn api(&self, kind: &ResourceKind, namespace: Option<&str>) -> Api<DynamicObject> {
		let ar = kind.api_resource();
		match namespace {
			Some(ns) if kind.is_namespaced() => Api::namespaced_with(self.client.clone(), ns, &ar),
			_ => Api::all_with(self.client.clone(), &ar),
		}
	}
}

#[async_trait]
impl K8sClient for KubeClient {
	#[instrument(skip(self, kind), fields(kind = kind.name))]
	async fn list(
		&self,
		kind: &ResourceKind,
		namespace: Option<&str>,
	) -> Result<Vec<Value>, K8sError> {
		let api = self.api(kind, namespace);
		let list = api.list(&ListParams::default()).await?;
		debug!(count = list.items.len(), "listed objects");
		list
			.items
			.into_iter()
			.map(|obj| serde_json::to_value(obj).map_err(K8sError::from))
			.collect()
	}

	#[instrument(skip(self, kind), fields(kind = kind.name))]
	async fn get(
		&self,
		kind: &ResourceKind,
		namespace: Option<&str>,
		name: &str,
	) -> Result<Value, K8sError> {
		let api = self.api(kind, namespace);
		match api.get(name).await {
			Ok(obj) => Ok(serde_json::to_value(obj)?),
			Err(kube::Error::Api(err)) if err.code == 404 => Err(K8sError::NotFound {
				kind: kind.label,
				name: name.into(),
			}),
			Err(e) => Err(e.into()),
		}
	}
}
