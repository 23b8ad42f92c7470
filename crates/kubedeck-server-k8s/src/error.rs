// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Result type alias for K8s operations.
pub type K8sResult<T> = Result<T, K8sError>;

/// Errors that can occur during K8s operations.
#[derive(Error, Debug, Clone)]
pub enum K8sError {
	#[error("K8s API error: {message}")]
	ApiError { message: String },

	#[error("{kind} not found: {name}")]
	NotFound { kind: &'static str, name: String },

	#[error("K8s client configuration error: {message}")]
	Config { message: String },

	#[error("Failed to decode K8s object: {message}")]
	Decode { message: String },
}

impl K8sError {
	pub fn is_not_found(&self) -> bool {
		matches!(self, K8sError::NotFound { .. })
	}
}

impl From<kube::Error> for K8sError {
	fn from(err: kube::Error) -> Self {
		K8sError::ApiError {
			message: err.to_string(),
		}
	}
}

impl From<kube::config::KubeconfigError> for K8sError {
	fn from(err: kube::config::KubeconfigError) -> Self {
		K8sError::Config {
			message: err.to_string(),
		}
	}
}

impl From<serde_json::Error> for K8sError {
	fn from(err: serde_json::Error) -> Self {
		K8sError::Decode {
			message: err.to_string(),
		}
	}
}
