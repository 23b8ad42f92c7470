// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! kubedeck dashboard backend.
//!
//! This crate provides the HTTP server behind the kubedeck web dashboard: a
//! read-only passthrough to the cluster API and interactive container
//! terminals over WebSocket.

pub mod api;
pub mod error;
pub mod routes;
pub mod upgrade;

pub use api::{create_app_state, create_router, AppState};
pub use error::ServerError;
pub use kubedeck_server_config::ServerConfig;
pub use upgrade::{route_upgrade, UpgradeRejected};
