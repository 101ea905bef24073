//! Session open/hide/close actions and exit handling

use super::presenter;
use super::supervisor::{exit_disposition, ExitDisposition, ProcessSupervisor};
use super::{Notice, SessionController, SessionError};
use crate::config::SessionConfig;
use crate::host::OutputStore;
use crate::model::{derive_key, CommandLine, Layout, ProcessSlot, Session, SessionKey};
use crate::partial_config::{Merge, PartialSessionConfig};
use crate::services::shell::resolve_shell;
use crate::types::ProcessId;

/// Arguments of an open/toggle request
#[derive(Debug, Clone, Default)]
pub struct OpenRequest {
    /// Command for a new session; `None` reuses the stored one
    pub command: Option<CommandLine>,
    /// Layout for a new session; `None` reuses the stored one (or floats)
    pub layout: Option<Layout>,
    /// Call-site overrides, layered over the stored or default config
    pub options: PartialSessionConfig,
}

/// What an open did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// New session created and shown
    Started,
    /// Hidden session shown again with its buffer and process
    Shown,
    /// Visible session hidden
    Hidden,
    /// Dead hidden session replaced by a fresh one
    Restarted,
}

/// Stop the process and drop the buffer; the next open starts over
fn release(session: &mut Session, supervisor: &mut ProcessSupervisor, buffers: &mut dyn OutputStore) {
    if let Some(process) = session.running_process() {
        supervisor.terminate(process);
    }
    if let Some(buffer) = session.buffer.take() {
        buffers.destroy_buffer(buffer);
    }
    session.process = ProcessSlot::Released;
    tracing::debug!("Released process and buffer of '{}'", session.key);
}

impl SessionController {
    /// Open, toggle or restart the session under `key`
    ///
    /// - absent: start it from `request`
    /// - visible: hide it
    /// - hidden with a live process: show it again
    /// - hidden and dead (or released): start it fresh
    pub fn open(&mut self, key: SessionKey, request: OpenRequest) -> Result<OpenOutcome, SessionError> {
        self.sync();

        let outcome = match self.registry.lookup(&key) {
            None => {
                let command = match request.command {
                    Some(command) => command,
                    None => self.default_shell_command(),
                };
                let layout = request.layout.unwrap_or_default();
                let config = request.options.apply_to(&self.config.defaults);
                self.start_session(key.clone(), command, layout, config)?;
                OpenOutcome::Started
            }
            Some(session) if session.window.is_some() => {
                self.hide_session(&key);
                OpenOutcome::Hidden
            }
            Some(session) if session.is_alive() && session.buffer.is_some() => {
                self.show_session(&key, &request.options);
                OpenOutcome::Shown
            }
            Some(session) => {
                let command = request.command.unwrap_or_else(|| session.command.clone());
                let layout = request.layout.unwrap_or(session.layout);
                let config = request.options.apply_to(&session.config);
                self.teardown(&key, false);
                self.start_session(key.clone(), command, layout, config)?;
                OpenOutcome::Restarted
            }
        };

        tracing::info!("open '{}': {:?}", key, outcome);
        self.last_used = Some(key);
        Ok(outcome)
    }

    /// Toggle a session without supplying a command
    ///
    /// With no key, acts on the focused or last-used session. An unknown
    /// explicit key starts the default shell under that key.
    pub fn toggle(&mut self, key: Option<&str>) -> Result<(SessionKey, OpenOutcome), SessionError> {
        self.sync();
        let key = self.resolve_key(key)?;
        let outcome = self.open(key.clone(), OpenRequest::default())?;
        Ok((key, outcome))
    }

    /// Open a command under a key derived from it (or `key` if given)
    pub fn run(
        &mut self,
        command: CommandLine,
        layout: Layout,
        key: Option<SessionKey>,
        options: PartialSessionConfig,
    ) -> Result<(SessionKey, OpenOutcome), SessionError> {
        let key = key.unwrap_or_else(|| derive_key(&command, &layout));
        let outcome = self.open(
            key.clone(),
            OpenRequest {
                command: Some(command),
                layout: Some(layout),
                options,
            },
        )?;
        Ok((key, outcome))
    }

    /// Open a configured app under `app:<name>`
    ///
    /// Call-site options win over the app's configured options.
    pub fn open_app(
        &mut self,
        name: &str,
        layout: Option<Layout>,
        mut options: PartialSessionConfig,
    ) -> Result<(SessionKey, OpenOutcome), SessionError> {
        let entry = self
            .config
            .apps
            .get(name)
            .ok_or_else(|| SessionError::UnknownApp(name.to_string()))?;
        options.merge_from(&entry.options);
        let request = OpenRequest {
            command: Some(entry.command.clone()),
            layout: Some(layout.or(entry.layout).unwrap_or_default()),
            options,
        };
        let key = SessionKey::new(format!("app:{}", name));
        let outcome = self.open(key.clone(), request)?;
        Ok((key, outcome))
    }

    /// Close a session for good
    ///
    /// The process is asked to stop and not waited for. The buffer survives
    /// only when the session was started with `persist`; it is kept under the
    /// key and reused by the next session opened there.
    pub fn close(&mut self, key: Option<&str>) -> Result<SessionKey, SessionError> {
        self.sync();
        let key = self.resolve_key(key)?;
        if !self.registry.contains(&key) {
            return Err(SessionError::NotFound(key));
        }
        let keep_buffer = self
            .registry
            .lookup(&key)
            .is_some_and(|session| session.config.persist);
        self.teardown(&key, keep_buffer);
        tracing::info!("Closed session '{}'", key);
        Ok(key)
    }

    /// Configured apps with their commands, sorted by name
    pub fn apps(&self) -> Vec<(&str, &CommandLine)> {
        self.config
            .apps
            .iter()
            .map(|(name, entry)| (name.as_str(), &entry.command))
            .collect()
    }

    fn default_shell_command(&self) -> CommandLine {
        CommandLine::Argv(vec![resolve_shell(self.config.shell.as_deref())])
    }

    /// Create (or reattach) the buffer, present window, spawn; undo all of it
    /// if the spawn fails
    fn start_session(
        &mut self,
        key: SessionKey,
        command: CommandLine,
        layout: Layout,
        config: SessionConfig,
    ) -> Result<(), SessionError> {
        let reattached = self
            .retained
            .remove(&key)
            .filter(|buffer| self.buffers.is_buffer_valid(*buffer));
        let buffer = match reattached {
            Some(buffer) => {
                tracing::debug!("Reattaching {} to '{}'", buffer, key);
                buffer
            }
            None => self.buffers.create_buffer(),
        };
        let window = presenter::present(
            self.windows.as_mut(),
            buffer,
            &layout,
            &config,
            key.as_str(),
            self.config.split_size,
        );

        let mut session = Session::new(key.clone(), command, layout, config);
        session.buffer = Some(buffer);
        session.window = Some(window);

        let size = self
            .windows
            .window_geometry(window)
            .map(|geometry| presenter::content_size(geometry, &layout, session.config.border))
            .unwrap_or((80, 24));

        let spawned = match self.buffers.sink(buffer) {
            Some(sink) => self
                .supervisor
                .start(&session.command, &session.config, sink, size)
                .map_err(SessionError::from),
            None => Err(SessionError::NotFound(key.clone())),
        };

        let process = match spawned {
            Ok(process) => process,
            Err(e) => {
                tracing::warn!("Failed to start session '{}': {}", key, e);
                presenter::destroy(self.windows.as_mut(), window);
                if reattached.is_some() {
                    self.retained.insert(key, buffer);
                } else {
                    self.buffers.destroy_buffer(buffer);
                }
                return Err(e);
            }
        };

        session.process = ProcessSlot::Running(process);
        if session.config.enter {
            self.windows.focus_window(window);
        }
        self.registry.insert(session)
    }

    fn hide_session(&mut self, key: &SessionKey) {
        let Some(session) = self.registry.lookup_mut(key) else {
            return;
        };
        if let Some(window) = session.window.take() {
            presenter::dismiss(self.windows.as_mut(), window);
        }
        session.reset_geometry_state();
        if !session.config.persist {
            release(session, &mut self.supervisor, self.buffers.as_mut());
        }
    }

    fn show_session(&mut self, key: &SessionKey, options: &PartialSessionConfig) {
        let Some(session) = self.registry.lookup_mut(key) else {
            return;
        };
        let Some(buffer) = session.buffer else {
            return;
        };
        if !options.is_empty() {
            session.config = options.apply_to(&session.config);
        }

        let window = presenter::present(
            self.windows.as_mut(),
            buffer,
            &session.layout,
            &session.config,
            key.as_str(),
            self.config.split_size,
        );
        session.window = Some(window);

        if let (Some(process), Some(geometry)) =
            (session.running_process(), self.windows.window_geometry(window))
        {
            let size = presenter::content_size(geometry, &session.layout, session.config.border);
            self.supervisor.resize(process, size);
        }
        if session.config.enter {
            self.windows.focus_window(window);
        }
    }

    /// Remove a session and everything it holds
    fn teardown(&mut self, key: &SessionKey, keep_buffer: bool) {
        let Some(session) = self.registry.remove(key) else {
            return;
        };
        if let Some(process) = session.running_process() {
            self.supervisor.terminate(process);
        }
        if let Some(window) = session.window {
            presenter::destroy(self.windows.as_mut(), window);
        }
        if let Some(buffer) = session.buffer {
            if keep_buffer {
                tracing::debug!("Keeping {} of closed session '{}'", buffer, key);
                if let Some(old) = self.retained.insert(key.clone(), buffer) {
                    if old != buffer {
                        self.buffers.destroy_buffer(old);
                    }
                }
            } else {
                self.buffers.destroy_buffer(buffer);
            }
        }
        if self.last_used.as_ref() == Some(key) {
            self.last_used = None;
        }
    }

    /// Record a process exit and apply the exit policy
    ///
    /// Exits of processes no session owns (closed or released sessions) are
    /// ignored.
    pub(super) fn handle_exit(&mut self, process: ProcessId, code: i32) {
        let Some(key) = self.registry.find_by_process(process).cloned() else {
            tracing::debug!("Ignoring exit of unowned {} (code {})", process, code);
            return;
        };
        let Some(session) = self.registry.lookup_mut(&key) else {
            return;
        };
        if !session.mark_exited(code) {
            return;
        }

        match exit_disposition(&session.command, code, &self.config) {
            ExitDisposition::Failed => {
                tracing::warn!(
                    "Session '{}' ({}) exited with code {}",
                    key,
                    session.command,
                    code
                );
                self.notices.push(Notice::ExitWarning {
                    key: key.clone(),
                    command: session.command.to_string(),
                    code,
                });
            }
            disposition => {
                tracing::info!("Session '{}' exited ({:?}, code {})", key, disposition, code);
            }
        }

        if session.config.autoclose {
            self.teardown(&key, false);
            self.notices.push(Notice::AutoClosed { key, code });
        }
    }

    /// Forget windows and buffers the host destroyed without telling us
    pub(super) fn reconcile_host(&mut self) {
        for key in self.registry.keys() {
            let Some(session) = self.registry.lookup_mut(&key) else {
                continue;
            };

            if let Some(buffer) = session.buffer {
                if !self.buffers.is_buffer_valid(buffer) {
                    tracing::debug!("{} of '{}' disappeared", buffer, key);
                    session.buffer = None;
                    if let Some(window) = session.window.take() {
                        presenter::destroy(self.windows.as_mut(), window);
                    }
                    session.reset_geometry_state();
                    release(session, &mut self.supervisor, self.buffers.as_mut());
                    continue;
                }
            }

            if let Some(window) = session.window {
                if !self.windows.is_window_valid(window) {
                    tracing::debug!("{} of '{}' was closed by the host", window, key);
                    session.window = None;
                    session.reset_geometry_state();
                    if !session.config.persist {
                        release(session, &mut self.supervisor, self.buffers.as_mut());
                    }
                }
            }
        }
    }
}
