//! Lifecycle Controller
//!
//! [`SessionController`] owns the session registry and drives the host
//! collaborators (windows, output buffers, processes) through the session
//! lifecycle:
//!
//! ```text
//! Absent -> Starting -> Visible <-> Hidden -> closed (Absent)
//! ```
//!
//! It is single-threaded. Process exits reach it as messages over the async
//! bridge and are applied at the top of every operation, before anything
//! else looks at session state.

mod error;
pub mod presenter;
mod session_actions;
pub mod supervisor;
mod window_actions;

pub use error::SessionError;
pub use presenter::ResizeAmount;
pub use session_actions::{OpenOutcome, OpenRequest};
pub use supervisor::{ExitDisposition, ProcessSupervisor};
pub use window_actions::MaximizeOutcome;

use crate::config::Config;
use crate::host::{OutputStore, ProcessSpawner, WindowSystem};
use crate::model::{Layout, Session, SessionKey, SessionRegistry, SessionState};
use crate::services::async_bridge::AsyncBridge;
use crate::types::{BufferId, WindowId};
use std::collections::HashMap;
use std::time::Duration;

/// How long to wait for the exit code of a process already seen as dead
const EXIT_EVENT_GRACE: Duration = Duration::from_millis(200);

/// Something the user should be told about outside of a direct reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A session's process failed; reported once per exit
    ExitWarning {
        key: SessionKey,
        command: String,
        code: i32,
    },
    /// An autoclose session ended and was torn down
    AutoClosed { key: SessionKey, code: i32 },
}

/// One row of the `list` output
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub key: SessionKey,
    pub state: SessionState,
    pub alive: bool,
    pub exit_code: Option<i32>,
    pub layout: Layout,
    pub command: String,
    pub window: Option<WindowId>,
    pub maximized: bool,
}

impl SessionSummary {
    fn of(session: &Session) -> Self {
        Self {
            key: session.key.clone(),
            state: session.state(),
            alive: session.is_alive(),
            exit_code: session.exit_code(),
            layout: session.layout,
            command: session.command.to_string(),
            window: session.window,
            maximized: session.maximized,
        }
    }
}

pub struct SessionController {
    config: Config,
    registry: SessionRegistry,
    windows: Box<dyn WindowSystem>,
    buffers: Box<dyn OutputStore>,
    supervisor: ProcessSupervisor,
    /// Key of the session most recently opened, resized or maximized
    last_used: Option<SessionKey>,
    /// Buffers of closed `persist` sessions, reattached when the key is opened again
    retained: HashMap<SessionKey, BufferId>,
    notices: Vec<Notice>,
}

impl SessionController {
    /// `bridge` must be the one the spawner posts exits to
    pub fn new(
        config: Config,
        windows: Box<dyn WindowSystem>,
        buffers: Box<dyn OutputStore>,
        spawner: Box<dyn ProcessSpawner>,
        bridge: AsyncBridge,
    ) -> Self {
        Self {
            config,
            registry: SessionRegistry::new(),
            windows,
            buffers,
            supervisor: ProcessSupervisor::new(spawner, bridge),
            last_used: None,
            retained: HashMap::new(),
            notices: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn session(&self, key: &SessionKey) -> Option<&Session> {
        self.registry.lookup(key)
    }

    pub fn buffers(&self) -> &dyn OutputStore {
        self.buffers.as_ref()
    }

    pub fn last_used(&self) -> Option<&SessionKey> {
        self.last_used.as_ref()
    }

    /// Notices queued since the last call
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Apply pending exits and host-side changes without doing anything else
    pub fn process_async_messages(&mut self) {
        self.sync();
    }

    /// Key an operation without an explicit key applies to
    ///
    /// Order: explicit key, then the session shown in the focused window,
    /// then the last-used session.
    pub fn resolve_key(&self, explicit: Option<&str>) -> Result<SessionKey, SessionError> {
        if let Some(key) = explicit {
            return Ok(SessionKey::new(key));
        }
        if let Some(key) = self
            .windows
            .focused_window()
            .and_then(|window| self.registry.find_by_window(window))
        {
            return Ok(key.clone());
        }
        self.last_used.clone().ok_or(SessionError::NoTarget)
    }

    /// Every session, sorted by key
    pub fn list(&mut self) -> Vec<SessionSummary> {
        self.sync();
        let mut summaries: Vec<SessionSummary> = self
            .registry
            .list_all()
            .map(|(_, session)| SessionSummary::of(session))
            .collect();
        summaries.sort_by(|a, b| a.key.cmp(&b.key));
        summaries
    }

    /// Last `lines` lines of a session's output
    ///
    /// Closed `persist` sessions can still be peeked at until the key is
    /// opened again.
    pub fn peek(&mut self, key: Option<&str>, lines: usize) -> Result<Vec<String>, SessionError> {
        self.sync();
        let key = self.resolve_key(key)?;
        let buffer = match self.registry.lookup(&key) {
            Some(session) => session.buffer,
            None => Some(
                *self
                    .retained
                    .get(&key)
                    .ok_or_else(|| SessionError::NotFound(key.clone()))?,
            ),
        };
        Ok(buffer
            .map(|buffer| self.buffers.tail(buffer, lines))
            .unwrap_or_default())
    }

    /// Bring the registry up to date with the outside world
    ///
    /// Runs first in every operation: applies exit events, waits briefly for
    /// the exit code of processes that are gone but unreported, and forgets
    /// windows or buffers the host destroyed on its own.
    fn sync(&mut self) {
        for (process, code) in self.supervisor.drain_exits() {
            self.handle_exit(process, code);
        }

        let unreported: Vec<_> = self
            .registry
            .list_all()
            .filter_map(|(_, session)| session.running_process())
            .filter(|process| !self.supervisor.is_alive(*process))
            .collect();
        if !unreported.is_empty() {
            for (process, code) in self
                .supervisor
                .wait_for_exits(&unreported, EXIT_EVENT_GRACE)
            {
                self.handle_exit(process, code);
            }
        }

        self.reconcile_host();
        let buffers = &self.buffers;
        self.retained
            .retain(|_, buffer| buffers.is_buffer_valid(*buffer));
    }
}
