//! Session records
//!
//! A session ties one child process, one output buffer and zero or one
//! visible window together under a stable key.

use crate::config::SessionConfig;
use crate::types::{BufferId, Geometry, ProcessId, WindowId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique name of a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey(pub String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for SessionKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The executable a session runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CommandLine {
    /// A command string handed to the shell (`$SHELL -c "..."`)
    Shell(String),
    /// A program and its arguments, executed directly
    Argv(Vec<String>),
}

impl CommandLine {
    /// Whitespace-normalized text form, used for key derivation and display
    pub fn normalized(&self) -> String {
        match self {
            CommandLine::Shell(s) => s.split_whitespace().collect::<Vec<_>>().join(" "),
            CommandLine::Argv(argv) => argv
                .iter()
                .map(|a| a.trim())
                .filter(|a| !a.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// First word of the command without any leading path
    pub fn program_name(&self) -> Option<String> {
        let first = match self {
            CommandLine::Shell(s) => s.split_whitespace().next()?.to_string(),
            CommandLine::Argv(argv) => argv.first()?.trim().to_string(),
        };
        let name = first
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or(&first);
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized().is_empty()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}

/// Side of the screen a split window is carved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SplitDirection {
    Left,
    Right,
    Above,
    Below,
}

/// Axis along which a split divides the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Side-by-side windows, sized by width
    Vertical,
    /// Stacked windows, sized by height
    Horizontal,
}

impl SplitDirection {
    pub fn orientation(self) -> Orientation {
        match self {
            SplitDirection::Left | SplitDirection::Right => Orientation::Vertical,
            SplitDirection::Above | SplitDirection::Below => Orientation::Horizontal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SplitDirection::Left => "left",
            SplitDirection::Right => "right",
            SplitDirection::Above => "above",
            SplitDirection::Below => "below",
        }
    }

    pub fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "left" => Some(SplitDirection::Left),
            "right" => Some(SplitDirection::Right),
            "above" | "top" => Some(SplitDirection::Above),
            "below" | "bottom" => Some(SplitDirection::Below),
            _ => None,
        }
    }
}

/// How a session's window is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Overlay centered over the main area
    #[default]
    Floating,
    /// Region carved from the main layout
    Split { direction: SplitDirection },
}

impl Layout {
    pub fn split(direction: SplitDirection) -> Self {
        Layout::Split { direction }
    }

    /// Short name used in derived keys and listings
    pub fn kind(&self) -> &'static str {
        match self {
            Layout::Floating => "float",
            Layout::Split { direction } => direction.as_str(),
        }
    }
}

/// Observable lifecycle state of a registered session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Registered but the window/process are not both attached yet
    Starting,
    /// Shown in exactly one window
    Visible,
    /// No window; buffer and process may still be alive
    Hidden,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Starting => "starting",
            SessionState::Visible => "visible",
            SessionState::Hidden => "hidden",
        }
    }
}

/// Where the session's child process is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessSlot {
    /// Not spawned yet
    Pending,
    Running(ProcessId),
    /// Dead-process marker; the final output stays in the buffer
    Exited { process: ProcessId, code: i32 },
    /// Stopped by us together with its buffer; the next open restarts it
    Released,
}

/// A named terminal session
#[derive(Debug, Clone)]
pub struct Session {
    pub key: SessionKey,
    pub command: CommandLine,
    pub layout: Layout,
    /// Resolved configuration snapshot taken at creation
    pub config: SessionConfig,
    pub window: Option<WindowId>,
    pub buffer: Option<BufferId>,
    pub process: ProcessSlot,
    /// Geometry captured on the first maximize, cleared on restore
    pub original_geometry: Option<Geometry>,
    pub maximized: bool,
}

impl Session {
    pub fn new(key: SessionKey, command: CommandLine, layout: Layout, config: SessionConfig) -> Self {
        Self {
            key,
            command,
            layout,
            config,
            window: None,
            buffer: None,
            process: ProcessSlot::Pending,
            original_geometry: None,
            maximized: false,
        }
    }

    pub fn state(&self) -> SessionState {
        match (self.window, self.process) {
            (_, ProcessSlot::Pending) => SessionState::Starting,
            (Some(_), _) => SessionState::Visible,
            (None, _) => SessionState::Hidden,
        }
    }

    /// The running process, if any
    pub fn running_process(&self) -> Option<ProcessId> {
        match self.process {
            ProcessSlot::Running(pid) => Some(pid),
            _ => None,
        }
    }

    /// Whether the process has not been observed to exit
    pub fn is_alive(&self) -> bool {
        matches!(self.process, ProcessSlot::Running(_))
    }

    /// Exit code of the finished process
    pub fn exit_code(&self) -> Option<i32> {
        match self.process {
            ProcessSlot::Exited { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Record the process exit; returns false unless the process was running
    pub fn mark_exited(&mut self, code: i32) -> bool {
        match self.process {
            ProcessSlot::Running(process) => {
                self.process = ProcessSlot::Exited { process, code };
                true
            }
            _ => false,
        }
    }

    /// Drop maximize bookkeeping (the window it applied to is gone)
    pub fn reset_geometry_state(&mut self) {
        self.maximized = false;
        self.original_geometry = None;
    }
}

/// Derive the key addressed by `run`/`apps` for a command and layout
///
/// The same command text and window type always produce the same key, so
/// running a command twice toggles its session instead of duplicating it.
pub fn derive_key(command: &CommandLine, layout: &Layout) -> SessionKey {
    SessionKey(format!("{}:{}", layout.kind(), command.normalized()))
}
