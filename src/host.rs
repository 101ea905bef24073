//! Collaborator contracts consumed by the session core
//!
//! The controller never draws windows, allocates buffers or forks processes
//! itself. It drives these three traits and records the handles they return.
//! [`crate::services`] provides a headless window system, an in-memory output
//! store and a PTY-backed spawner; tests substitute their own.

use crate::config::BorderStyle;
use crate::model::{CommandLine, SplitDirection};
use crate::services::output::OutputSink;
use crate::types::{BufferId, Geometry, ProcessId, Viewport, WindowId};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Decoration of a floating window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowStyle {
    pub border: BorderStyle,
    pub title: Option<String>,
}

/// Windowing surface of the host
pub trait WindowSystem {
    /// Current screen size and reserved chrome rows
    fn viewport(&self) -> Viewport;

    /// The screen was resized; later placements use the new size
    fn set_viewport(&mut self, viewport: Viewport);

    fn create_floating_window(
        &mut self,
        buffer: BufferId,
        geometry: Geometry,
        style: &WindowStyle,
    ) -> WindowId;

    /// Carve a window from the main layout; `size` is width for left/right
    /// splits and height for above/below. `None` lets the host pick.
    fn create_split_window(
        &mut self,
        buffer: BufferId,
        direction: SplitDirection,
        size: Option<u16>,
    ) -> WindowId;

    /// Take the window off screen; its buffer is untouched
    fn hide_window(&mut self, window: WindowId);

    fn close_window(&mut self, window: WindowId);

    fn is_window_valid(&self, window: WindowId) -> bool;

    fn window_geometry(&self, window: WindowId) -> Option<Geometry>;

    /// Returns false if the window no longer exists
    fn set_window_geometry(&mut self, window: WindowId, geometry: Geometry) -> bool;

    fn focused_window(&self) -> Option<WindowId>;

    fn focus_window(&mut self, window: WindowId);
}

/// Errors starting a child process
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpawnError {
    #[error("empty command")]
    EmptyCommand,

    #[error("failed to open PTY: {0}")]
    Pty(String),

    #[error("failed to launch '{command}': {reason}")]
    Launch { command: String, reason: String },
}

/// Everything needed to start a session's process
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub command: CommandLine,
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
    pub cols: u16,
    pub rows: u16,
}

/// Process execution for sessions
///
/// Implementations report exits by posting
/// [`crate::services::async_bridge::AsyncMessage::ProcessExited`] exactly once
/// per spawned process.
pub trait ProcessSpawner {
    fn spawn(&mut self, request: &SpawnRequest, sink: OutputSink) -> Result<ProcessId, SpawnError>;

    fn is_alive(&self, process: ProcessId) -> bool;

    /// Ask the process to stop; does not wait for it
    fn terminate(&mut self, process: ProcessId);

    /// Tell the process its terminal changed size
    fn resize(&mut self, _process: ProcessId, _cols: u16, _rows: u16) {}

    /// The exit of `process` has been delivered; drop whatever is still
    /// tracked for it
    fn forget(&mut self, _process: ProcessId) {}
}

/// Storage for session output
pub trait OutputStore {
    fn create_buffer(&mut self) -> BufferId;

    fn destroy_buffer(&mut self, buffer: BufferId);

    fn is_buffer_valid(&self, buffer: BufferId) -> bool;

    /// Write handle for a live buffer
    fn sink(&self, buffer: BufferId) -> Option<OutputSink>;

    /// Last `lines` lines of a buffer; empty for unknown buffers
    fn tail(&self, buffer: BufferId, lines: usize) -> Vec<String>;

    fn buffer_count(&self) -> usize;
}
