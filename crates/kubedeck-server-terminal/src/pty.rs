// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `kubectl exec` running inside a local pseudo-terminal.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread;

use async_trait::async_trait;
use bytes::Bytes;
use kubedeck_server_config::TerminalConfig;
use portable_pty::{native_pty_system, Child, ChildKiller, CommandBuilder, MasterPty, PtySize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::SpawnError;
use crate::launcher::{ShellControl, ShellLauncher, SpawnedShell};
use crate::types::{ExecTarget, ShellExit, TerminalSize};

const READ_BUFFER_SIZE: usize = 8192;
const OUTPUT_CHANNEL_CAPACITY: usize = 256;
/// Keystroke chunks queued for the pty writer. Input past this is dropped.
const INPUT_CHANNEL_CAPACITY: usize = 1024;

impl From<TerminalSize> for PtySize {
	fn from(size: TerminalSize) -> Self {
		PtySize {
			rows: size.rows,
			cols: size.cols,
			pixel_width: 0,
			pixel_height: 0,
		}
	}
}

/// Launches `kubectl exec -i -t` in a PTY.
#[derive(Debug, Clone)]
pub struct KubectlLauncher {
	kubectl_path: String,
	kubeconfig: Option<PathBuf>,
	context: Option<String>,
	default_command: Vec<String>,
	term: String,
}

impl KubectlLauncher {
	pub fn from_config(config: &TerminalConfig) -> Self {
		Self {
			kubectl_path: config.kubectl_path.clone(),
			kubeconfig: config.kubeconfig.clone(),
			context: config.context.clone(),
			default_command: config.default_command.clone(),
			term: config.term.clone(),
		}
	}

	/// Arguments passed to kubectl for `target`, excluding the program name.
	pub fn build_args(&self, target: &ExecTarget) -> Vec<String> {
		let mut args = Vec::new();
		if let Some(kubeconfig) = &self.kubeconfig {
			args.push("--kubeconfig".to_string());
			args.push(kubeconfig.display().to_string());
		}
		if let Some(context) = &self.context {
			args.push("--context".to_string());
			args.push(context.clone());
		}
		args.extend(
			[
				"exec",
				"-i",
				"-t",
				"-n",
				target.namespace.as_str(),
				target.pod.as_str(),
				"-c",
				target.container.as_str(),
				"--",
			]
			.map(str::to_string),
		);
		match &target.command {
			Some(command) if !command.is_empty() => args.extend(command.iter().cloned()),
			_ => args.extend(self.default_command.iter().cloned()),
		}
		args
	}
}

#[async_trait]
impl ShellLauncher for KubectlLauncher {
	async fn spawn(
		&self,
		target: &ExecTarget,
		size: TerminalSize,
	) -> Result<SpawnedShell, SpawnError> {
		let program = self.kubectl_path.clone();
		let args = self.build_args(target);
		let term = self.term.clone();
		debug!(program = %program, args = ?args, "spawning kubectl exec");

		tokio::task::spawn_blocking(move || spawn_in_pty(program, args, term, size))
			.await
			.map_err(|e| SpawnError::Io(format!("spawn task failed: {e}")))?
	}
}

fn spawn_in_pty(
	program: String,
	args: Vec<String>,
	term: String,
	size: TerminalSize,
) -> Result<SpawnedShell, SpawnError> {
	let pair = native_pty_system()
		.openpty(size.into())
		.map_err(|e| SpawnError::OpenPty(e.to_string()))?;

	let mut cmd = CommandBuilder::new(&program);
	cmd.args(&args);
	cmd.env("TERM", term);

	let mut child = pair
		.slave
		.spawn_command(cmd)
		.map_err(|e| SpawnError::Command {
			program: program.clone(),
			message: e.to_string(),
		})?;
	// The reader only sees EOF once every slave handle is closed.
	drop(pair.slave);

	let mut killer = child.clone_killer();
	let io_parts = pair
		.master
		.try_clone_reader()
		.and_then(|reader| Ok((reader, pair.master.take_writer()?)));
	let (reader, writer) = match io_parts {
		Ok(parts) => parts,
		Err(e) => {
			let _ = killer.kill();
			return Err(SpawnError::Io(e.to_string()));
		}
	};

	let terminated = Arc::new(AtomicBool::new(false));
	let (output_tx, output_rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
	let (exit_tx, exit_rx) = oneshot::channel();
	let (input_tx, input_rx) = std_mpsc::sync_channel::<Vec<u8>>(INPUT_CHANNEL_CAPACITY);

	let started = spawn_reader(reader, output_tx)
		.and_then(|_| spawn_writer(writer, input_rx))
		.and_then(|_| spawn_waiter(child, terminated.clone(), exit_tx));
	if let Err(e) = started {
		let _ = killer.kill();
		return Err(SpawnError::Io(format!("failed to start pty thread: {e}")));
	}

	info!(program = %program, cols = size.cols, rows = size.rows, "pty session spawned");

	Ok(SpawnedShell {
		control: Box::new(KubectlControl {
			master: pair.master,
			input: input_tx,
			killer,
			terminated,
		}),
		output: output_rx,
		exit: exit_rx,
	})
}

fn spawn_reader(
	mut reader: Box<dyn Read + Send>,
	output: mpsc::Sender<Bytes>,
) -> io::Result<()> {
	thread::Builder::new()
		.name("pty-reader".to_string())
		.spawn(move || {
			let mut buffer = [0u8; READ_BUFFER_SIZE];
			loop {
				match reader.read(&mut buffer) {
					Ok(0) => break,
					Ok(n) => {
						if output
							.blocking_send(Bytes::copy_from_slice(&buffer[..n]))
							.is_err()
						{
							break;
						}
					}
					// EIO once the child side of the pty is gone.
					Err(_) => break,
				}
			}
			debug!("pty reader finished");
		})
		.map(|_| ())
}

fn spawn_writer(
	mut writer: Box<dyn Write + Send>,
	input: std_mpsc::Receiver<Vec<u8>>,
) -> io::Result<()> {
	thread::Builder::new()
		.name("pty-writer".to_string())
		.spawn(move || {
			for data in input {
				if let Err(e) = writer.write_all(&data).and_then(|_| writer.flush()) {
					warn!(error = %e, "pty write failed");
					break;
				}
			}
		})
		.map(|_| ())
}

fn spawn_waiter(
	mut child: Box<dyn Child + Send + Sync>,
	terminated: Arc<AtomicBool>,
	exit: oneshot::Sender<ShellExit>,
) -> io::Result<()> {
	thread::Builder::new()
		.name("pty-waiter".to_string())
		.spawn(move || {
			let code = match child.wait() {
				Ok(status) => Some(status.exit_code()),
				Err(e) => {
					warn!(error = %e, "waiting for kubectl failed");
					None
				}
			};
			let _ = exit.send(ShellExit {
				code,
				terminated: terminated.load(Ordering::SeqCst),
			});
		})
		.map(|_| ())
}

/// Hands input to the writer thread without blocking. A full queue means the
/// shell has stopped reading, so the chunk is dropped.
fn queue_input(input: &std_mpsc::SyncSender<Vec<u8>>, data: &[u8]) -> io::Result<()> {
	match input.try_send(data.to_vec()) {
		Ok(()) => Ok(()),
		Err(std_mpsc::TrySendError::Full(dropped)) => {
			warn!(bytes = dropped.len(), "pty input queue full, dropping input");
			Ok(())
		}
		Err(std_mpsc::TrySendError::Disconnected(_)) => Err(io::Error::new(
			io::ErrorKind::BrokenPipe,
			"pty writer closed",
		)),
	}
}

struct KubectlControl {
	master: Box<dyn MasterPty + Send>,
	input: std_mpsc::SyncSender<Vec<u8>>,
	killer: Box<dyn ChildKiller + Send + Sync>,
	terminated: Arc<AtomicBool>,
}

impl ShellControl for KubectlControl {
	fn write(&mut self, data: &[u8]) -> io::Result<()> {
		queue_input(&self.input, data)
	}

	fn resize(&mut self, size: TerminalSize) -> io::Result<()> {
		self.master
			.resize(size.into())
			.map_err(|e| io::Error::other(e.to_string()))
	}

	fn kill(&mut self) -> io::Result<()> {
		self.terminated.store(true, Ordering::SeqCst);
		self.killer.kill()
	}
}
