// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Read-only K8s client abstraction for the kubedeck dashboard.
//!
//! This crate provides:
//! - A trait-based K8s client abstraction for testability
//! - Production implementation using the kube dynamic API
//! - The table of resource kinds the dashboard exposes

mod client;
mod error;
mod kube_client;
mod mock;
mod resources;

pub use client::K8sClient;
pub use error::{K8sError, K8sResult};
pub use kube_client::KubeClient;
pub use mock::MockK8sClient;
pub use resources::{find_kind, ResourceKind, Scope, RESOURCE_KINDS};
