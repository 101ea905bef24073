//! Terminal Manager - PTY-backed process spawner for sessions
//!
//! This module provides a manager for session processes that:
//! - Spawns PTY processes with proper shell detection
//! - Streams PTY output into the session's output buffer
//! - Reports each process exit exactly once through the async bridge
//! - Handles terminal resize

use crate::host::{ProcessSpawner, SpawnError, SpawnRequest};
use crate::model::CommandLine;
use crate::services::async_bridge::{AsyncBridge, AsyncMessage};
use crate::services::output::OutputSink;
use crate::services::shell::resolve_shell;
use crate::types::ProcessId;
use portable_pty::{native_pty_system, CommandBuilder, PtySize};
use std::collections::HashMap;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How often the control thread polls the child for exit
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Messages sent to a process's control thread
enum TerminalCommand {
    /// Resize the PTY
    Resize { cols: u16, rows: u16 },
    /// Kill the process
    Shutdown,
}

/// Handle to a running PTY process
struct TerminalHandle {
    /// Command sender to the control thread
    command_tx: mpsc::Sender<TerminalCommand>,
    /// Whether the process is still alive
    alive: Arc<AtomicBool>,
    /// Current dimensions
    cols: u16,
    rows: u16,
}

impl TerminalHandle {
    /// Resize the terminal
    fn resize(&mut self, cols: u16, rows: u16) {
        if cols != self.cols || rows != self.rows {
            self.cols = cols;
            self.rows = rows;
            let _ = self.command_tx.send(TerminalCommand::Resize { cols, rows });
        }
    }

    /// Check if the process is still running
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    /// Kill the process
    fn shutdown(&self) {
        let _ = self.command_tx.send(TerminalCommand::Shutdown);
    }
}

/// Manager for session processes
pub struct TerminalManager {
    /// Map from process ID to handle
    terminals: HashMap<ProcessId, TerminalHandle>,
    /// Next process ID
    next_id: u64,
    /// Shell used for string commands
    shell: String,
    /// Async bridge for sending notifications to main loop
    async_bridge: AsyncBridge,
}

impl TerminalManager {
    /// Create a new terminal manager posting exits to `bridge`
    pub fn new(bridge: AsyncBridge, shell: Option<String>) -> Self {
        Self {
            terminals: HashMap::new(),
            next_id: 1,
            shell: resolve_shell(shell.as_deref()),
            async_bridge: bridge,
        }
    }

    /// Get count of tracked processes
    pub fn count(&self) -> usize {
        self.terminals.len()
    }

    /// Shutdown all processes
    pub fn shutdown_all(&mut self) {
        for (_, handle) in self.terminals.drain() {
            handle.shutdown();
        }
    }

    fn build_command(&self, request: &SpawnRequest) -> Result<CommandBuilder, SpawnError> {
        let mut cmd = match &request.command {
            CommandLine::Shell(text) => {
                if text.trim().is_empty() {
                    return Err(SpawnError::EmptyCommand);
                }
                let mut cmd = CommandBuilder::new(&self.shell);
                cmd.arg(shell_command_flag(&self.shell));
                cmd.arg(text);
                cmd
            }
            CommandLine::Argv(argv) => {
                let (program, args) = argv.split_first().ok_or(SpawnError::EmptyCommand)?;
                if program.trim().is_empty() {
                    return Err(SpawnError::EmptyCommand);
                }
                let mut cmd = CommandBuilder::new(program);
                cmd.args(args);
                cmd
            }
        };

        if let Some(ref dir) = request.cwd {
            cmd.cwd(dir);
        }
        for (key, value) in &request.env {
            cmd.env(key, value);
        }
        Ok(cmd)
    }
}

impl ProcessSpawner for TerminalManager {
    fn spawn(&mut self, request: &SpawnRequest, sink: OutputSink) -> Result<ProcessId, SpawnError> {
        let cmd = self.build_command(request)?;
        let cols = request.cols.max(1);
        let rows = request.rows.max(1);

        // Create PTY
        let pty_system = native_pty_system();
        let pty_pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| SpawnError::Pty(e.to_string()))?;

        let mut reader = pty_pair
            .master
            .try_clone_reader()
            .map_err(|e| SpawnError::Pty(format!("failed to get PTY reader: {}", e)))?;

        // Spawn the process
        let mut child = pty_pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| SpawnError::Launch {
                command: request.command.normalized(),
                reason: e.to_string(),
            })?;
        // The slave end belongs to the child now; dropping ours lets reads hit EOF
        drop(pty_pair.slave);

        let id = ProcessId(self.next_id);
        self.next_id += 1;

        let (command_tx, command_rx) = mpsc::channel::<TerminalCommand>();
        let alive = Arc::new(AtomicBool::new(true));

        // Reader thread: PTY output into the session buffer
        let process_id = id;
        thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => {
                        tracing::debug!("{} EOF", process_id);
                        break;
                    }
                    Ok(n) => sink.write(&buf[..n]),
                    Err(e) => {
                        tracing::debug!("{} read ended: {}", process_id, e);
                        break;
                    }
                }
            }
        });

        // Control thread: resize, shutdown and exit detection
        let sender = self.async_bridge.sender();
        let alive_clone = alive.clone();
        let master = pty_pair.master;
        thread::spawn(move || {
            let code = loop {
                match command_rx.recv_timeout(EXIT_POLL_INTERVAL) {
                    Ok(TerminalCommand::Resize { cols, rows }) => {
                        if let Err(e) = master.resize(PtySize {
                            rows,
                            cols,
                            pixel_width: 0,
                            pixel_height: 0,
                        }) {
                            tracing::warn!("Failed to resize PTY: {}", e);
                        }
                    }
                    Ok(TerminalCommand::Shutdown) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                        let _ = child.kill();
                        break child.wait().map(|s| s.exit_code() as i32).unwrap_or(-1);
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                }
                match child.try_wait() {
                    Ok(Some(status)) => break status.exit_code() as i32,
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!("{} wait error: {}", process_id, e);
                        break -1;
                    }
                }
            };
            alive_clone.store(false, Ordering::Relaxed);
            tracing::info!("{} exited with code {}", process_id, code);
            let _ = sender.send(AsyncMessage::ProcessExited {
                process: process_id,
                code,
            });
        });

        self.terminals.insert(
            id,
            TerminalHandle {
                command_tx,
                alive,
                cols,
                rows,
            },
        );
        tracing::info!(
            "Spawned {} for '{}' ({}x{})",
            id,
            request.command.normalized(),
            cols,
            rows
        );

        Ok(id)
    }

    fn is_alive(&self, process: ProcessId) -> bool {
        self.terminals
            .get(&process)
            .map(|h| h.is_alive())
            .unwrap_or(false)
    }

    fn terminate(&mut self, process: ProcessId) {
        if let Some(handle) = self.terminals.remove(&process) {
            tracing::debug!("Terminating {}", process);
            handle.shutdown();
        }
    }

    fn resize(&mut self, process: ProcessId, cols: u16, rows: u16) {
        if let Some(handle) = self.terminals.get_mut(&process) {
            handle.resize(cols.max(1), rows.max(1));
        }
    }

    fn forget(&mut self, process: ProcessId) {
        if self.terminals.get(&process).is_some_and(|h| !h.is_alive()) {
            tracing::trace!("Forgetting {}", process);
            self.terminals.remove(&process);
        }
    }
}

impl Drop for TerminalManager {
    fn drop(&mut self) {
        self.shutdown_all();
    }
}

/// Flag that makes `shell` run a command string
fn shell_command_flag(shell: &str) -> &'static str {
    let name = shell
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(shell)
        .to_ascii_lowercase();
    match name.as_str() {
        "cmd" | "cmd.exe" => "/C",
        "powershell" | "powershell.exe" | "pwsh" | "pwsh.exe" => "-Command",
        _ => "-c",
    }
}
