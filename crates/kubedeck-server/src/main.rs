// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! kubedeck dashboard backend binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use kubedeck_server::{api::cors_layer, create_app_state, create_router};
use kubedeck_server_k8s::KubeClient;
use kubedeck_server_terminal::KubectlLauncher;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod version;

/// How long shutdown waits for terminal sessions to kill their shells and
/// send close frames.
const SESSION_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// kubedeck server - backend for the kubedeck Kubernetes dashboard.
#[derive(Parser, Debug)]
#[command(
	name = "kubedeck-server",
	about = "Kubernetes dashboard backend with container terminals",
	version
)]
struct Args {
	/// Path to a TOML config file, replacing /etc/kubedeck/server.toml
	#[arg(long, env = "KUBEDECK_SERVER_CONFIG")]
	config: Option<PathBuf>,

	/// Subcommands for kubedeck-server (e.g., `version`)
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version information
	Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => kubedeck_server_config::load_config_with_file(path)?,
		None => kubedeck_server_config::load_config()?,
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		kubectl = %config.terminal.kubectl_path,
		cache_enabled = config.cache.enabled,
		"Starting kubedeck-server"
	);

	let k8s = KubeClient::from_kubeconfig(
		config.terminal.kubeconfig.as_deref(),
		config.terminal.context.as_deref(),
	)
	.await?;
	let launcher = KubectlLauncher::from_config(&config.terminal);

	let state = create_app_state(&config, Arc::new(k8s), Arc::new(launcher));
	let sessions = state.sessions.clone();

	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(cors_layer(&config.http));

	let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
	tracing::info!(addr = %config.socket_addr(), "Server listening");

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
			tracing::info!("Closing terminal sessions...");
			sessions.shutdown(SESSION_SHUTDOWN_TIMEOUT).await;
		}
	}

	tracing::info!("Server shutdown complete");
	Ok(())
}
