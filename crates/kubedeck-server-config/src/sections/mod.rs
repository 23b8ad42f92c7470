// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for kubedeck-server.

pub mod cache;
pub mod http;
pub mod logging;
pub mod terminal;

pub use cache::{CacheConfig, CacheConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use terminal::{TerminalConfig, TerminalConfigLayer};
