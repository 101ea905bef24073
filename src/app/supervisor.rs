//! Process Supervisor - starts session processes and collects their exits
//!
//! Exits are reported by the spawner's background threads over the
//! [`AsyncBridge`]; the controller drains them at the top of each operation.

use crate::config::{Config, SessionConfig};
use crate::host::{ProcessSpawner, SpawnError, SpawnRequest};
use crate::model::CommandLine;
use crate::services::async_bridge::{AsyncBridge, AsyncMessage};
use crate::services::output::OutputSink;
use crate::types::ProcessId;
use std::time::{Duration, Instant};

/// How an exit code should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDisposition {
    /// Exit code 0
    Clean,
    /// Code 1 from an interactive app, which is how most of them quit
    Quit,
    /// Anything else; the user gets one warning
    Failed,
}

/// Classify an exit code for `command`
pub fn exit_disposition(command: &CommandLine, code: i32, config: &Config) -> ExitDisposition {
    match code {
        0 => ExitDisposition::Clean,
        1 if command
            .program_name()
            .is_some_and(|program| config.is_interactive_app(&program)) =>
        {
            ExitDisposition::Quit
        }
        _ => ExitDisposition::Failed,
    }
}

pub struct ProcessSupervisor {
    spawner: Box<dyn ProcessSpawner>,
    bridge: AsyncBridge,
}

impl ProcessSupervisor {
    pub fn new(spawner: Box<dyn ProcessSpawner>, bridge: AsyncBridge) -> Self {
        Self { spawner, bridge }
    }

    /// Spawn `command` with its output going to `sink`
    pub fn start(
        &mut self,
        command: &CommandLine,
        config: &SessionConfig,
        sink: OutputSink,
        (cols, rows): (u16, u16),
    ) -> Result<ProcessId, SpawnError> {
        if command.is_empty() {
            return Err(SpawnError::EmptyCommand);
        }
        let request = SpawnRequest {
            command: command.clone(),
            env: config.env.clone(),
            cwd: config.cwd.clone(),
            cols,
            rows,
        };
        let process = self.spawner.spawn(&request, sink)?;
        tracing::info!("Started {} for '{}' ({}x{})", process, command, cols, rows);
        Ok(process)
    }

    pub fn is_alive(&self, process: ProcessId) -> bool {
        self.spawner.is_alive(process)
    }

    /// Fire-and-forget; the exit (if any) arrives later over the bridge
    pub fn terminate(&mut self, process: ProcessId) {
        tracing::debug!("Terminating {}", process);
        self.spawner.terminate(process);
    }

    pub fn resize(&mut self, process: ProcessId, (cols, rows): (u16, u16)) {
        self.spawner.resize(process, cols, rows);
    }

    /// Exits posted since the last call, in arrival order
    ///
    /// The spawner forgets each reported process.
    pub fn drain_exits(&mut self) -> Vec<(ProcessId, i32)> {
        let exits: Vec<_> = self.bridge.try_recv_all().into_iter().map(exit_of).collect();
        for (process, _) in &exits {
            self.spawner.forget(*process);
        }
        exits
    }

    /// Wait up to `timeout` for the exits of `pending`
    ///
    /// Used when a process is already gone but its exit has not been posted
    /// yet. Other exits received meanwhile are returned too.
    pub fn wait_for_exits(
        &mut self,
        pending: &[ProcessId],
        timeout: Duration,
    ) -> Vec<(ProcessId, i32)> {
        let deadline = Instant::now() + timeout;
        let mut remaining: Vec<ProcessId> = pending.to_vec();
        let mut exits = Vec::new();

        while !remaining.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                tracing::debug!("No exit code yet for {:?}", remaining);
                break;
            }
            let Some(message) = self.bridge.recv_timeout(deadline - now) else {
                continue;
            };
            let (process, code) = exit_of(message);
            self.spawner.forget(process);
            remaining.retain(|p| *p != process);
            exits.push((process, code));
        }
        exits
    }
}

fn exit_of(message: AsyncMessage) -> (ProcessId, i32) {
    match message {
        AsyncMessage::ProcessExited { process, code } => (process, code),
    }
}
