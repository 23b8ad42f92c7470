// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Table of resource kinds exposed through the dashboard API.
//!
//! Each entry maps the URL segment used by the dashboard (`pods`,
//! `deployments`, ...) to the API group/version/plural the cluster serves it
//! under. Handlers never branch on the kind; they look it up here and go
//! through the dynamic API.

use k8s_openapi::api::{
	apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet},
	autoscaling::v2::HorizontalPodAutoscaler,
	batch::v1::{CronJob, Job},
	core::v1::{
		ConfigMap, Endpoints, Event, LimitRange, Namespace, Node, PersistentVolume,
		PersistentVolumeClaim, Pod, ResourceQuota, Secret, Service,
	},
	networking::v1::{Ingress, NetworkPolicy},
	policy::v1::PodDisruptionBudget,
	storage::v1::StorageClass,
};
use kube::api::ApiResource;
use kube::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
	Namespaced,
	Cluster,
}

/// A resource kind the dashboard can list and get.
#[derive(Debug, Clone, Copy)]
pub struct ResourceKind {
	/// URL segment and cache-key component, e.g. `persistentvolumeclaims`.
	pub name: &'static str,
	/// Kind name, used in "not found" messages.
	pub label: &'static str,
	/// Noun in list failure messages, e.g. `ConfigMaps` or `network policies`.
	pub list_noun: &'static str,
	/// Noun in get failure messages, e.g. `ConfigMap` or `network policy`.
	pub detail_noun: &'static str,
	pub scope: Scope,
	/// Namespace listed when the client does not pass one. `None` lists
	/// across all namespaces.
	pub default_namespace: Option<&'static str>,
	api_resource: fn() -> ApiResource,
}

impl ResourceKind {
	pub fn api_resource(&self) -> ApiResource {
		(self.api_resource)()
	}

	pub fn is_namespaced(&self) -> bool {
		self.scope == Scope::Namespaced
	}
}

fn erased<K: Resource<DynamicType = ()>>() -> ApiResource {
	ApiResource::erase::<K>(&())
}

/// How failures for a kind are worded: plural for lists, singular for gets.
#[derive(Clone, Copy)]
struct Nouns(&'static str, &'static str);

const fn namespaced(
	name: &'static str,
	label: &'static str,
	nouns: Nouns,
	default_namespace: Option<&'static str>,
	api_resource: fn() -> ApiResource,
) -> ResourceKind {
	ResourceKind {
		name,
		label,
		list_noun: nouns.0,
		detail_noun: nouns.1,
		scope: Scope::Namespaced,
		default_namespace,
		api_resource,
	}
}

const fn cluster(
	name: &'static str,
	label: &'static str,
	nouns: Nouns,
	api_resource: fn() -> ApiResource,
) -> ResourceKind {
	ResourceKind {
		name,
		label,
		list_noun: nouns.0,
		detail_noun: nouns.1,
		scope: Scope::Cluster,
		default_namespace: None,
		api_resource,
	}
}

const DEFAULT: Option<&str> = Some("default");

pub static RESOURCE_KINDS: &[ResourceKind] = &[
	namespaced("pods", "Pod", Nouns("pods", "pod"), DEFAULT, erased::<Pod>),
	cluster("nodes", "Node", Nouns("nodes", "node"), erased::<Node>),
	cluster(
		"namespaces",
		"Namespace",
		Nouns("namespaces", "namespace"),
		erased::<Namespace>,
	),
	namespaced(
		"resourcequotas",
		"ResourceQuota",
		Nouns("resource quotas", "resource quota"),
		DEFAULT,
		erased::<ResourceQuota>,
	),
	namespaced(
		"limitranges",
		"LimitRange",
		Nouns("LimitRanges", "LimitRange"),
		None,
		erased::<LimitRange>,
	),
	namespaced("events", "Event", Nouns("events", "event"), DEFAULT, erased::<Event>),
	namespaced(
		"deployments",
		"Deployment",
		Nouns("deployments", "deployment"),
		DEFAULT,
		erased::<Deployment>,
	),
	namespaced(
		"statefulsets",
		"StatefulSet",
		Nouns("statefulsets", "statefulset"),
		DEFAULT,
		erased::<StatefulSet>,
	),
	namespaced(
		"daemonsets",
		"DaemonSet",
		Nouns("daemonsets", "daemonset"),
		DEFAULT,
		erased::<DaemonSet>,
	),
	namespaced(
		"replicasets",
		"ReplicaSet",
		Nouns("replicasets", "replicaset"),
		DEFAULT,
		erased::<ReplicaSet>,
	),
	namespaced("jobs", "Job", Nouns("jobs", "job"), DEFAULT, erased::<Job>),
	namespaced(
		"cronjobs",
		"CronJob",
		Nouns("cronjobs", "cronjob"),
		DEFAULT,
		erased::<CronJob>,
	),
	namespaced(
		"persistentvolumeclaims",
		"PersistentVolumeClaim",
		Nouns("PVCs", "PVC"),
		DEFAULT,
		erased::<PersistentVolumeClaim>,
	),
	cluster(
		"persistentvolumes",
		"PersistentVolume",
		Nouns("PVs", "PV"),
		erased::<PersistentVolume>,
	),
	cluster(
		"storageclasses",
		"StorageClass",
		Nouns("StorageClasses", "StorageClass"),
		erased::<StorageClass>,
	),
	namespaced(
		"configmaps",
		"ConfigMap",
		Nouns("ConfigMaps", "ConfigMap"),
		DEFAULT,
		erased::<ConfigMap>,
	),
	namespaced(
		"secrets",
		"Secret",
		Nouns("Secrets", "Secret"),
		DEFAULT,
		erased::<Secret>,
	),
	namespaced(
		"services",
		"Service",
		Nouns("Services", "Service"),
		DEFAULT,
		erased::<Service>,
	),
	namespaced(
		"endpoints",
		"Endpoints",
		Nouns("Endpoints", "Endpoints"),
		DEFAULT,
		erased::<Endpoints>,
	),
	namespaced(
		"ingresses",
		"Ingress",
		Nouns("ingresses", "ingress"),
		DEFAULT,
		erased::<Ingress>,
	),
	namespaced(
		"horizontalpodautoscalers",
		"HorizontalPodAutoscaler",
		Nouns("HPAs", "HPA"),
		DEFAULT,
		erased::<HorizontalPodAutoscaler>,
	),
	namespaced(
		"networkpolicies",
		"NetworkPolicy",
		Nouns("network policies", "network policy"),
		DEFAULT,
		erased::<NetworkPolicy>,
	),
	namespaced(
		"poddisruptionbudgets",
		"PodDisruptionBudget",
		Nouns("pod disruption budgets", "pod disruption budget"),
		DEFAULT,
		erased::<PodDisruptionBudget>,
	),
];

/// Looks up a kind by its URL segment.
pub fn find_kind(name: &str) -> Option<&'static ResourceKind> {
	RESOURCE_KINDS.iter().find(|kind| kind.name == name)
}
