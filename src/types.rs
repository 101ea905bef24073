//! Shared handle and geometry types
//!
//! Handles are opaque ids issued by the host collaborators. They carry no
//! ownership; validity is always checked against the issuing collaborator.

use serde::{Deserialize, Serialize};

/// Identifier of a window issued by a [`crate::host::WindowSystem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

/// Identifier of an output buffer issued by a [`crate::host::OutputStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

/// Identifier of a child process issued by a [`crate::host::ProcessSpawner`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub u64);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Window-{}", self.0)
    }
}

impl std::fmt::Display for BufferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Buffer-{}", self.0)
    }
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Process-{}", self.0)
    }
}

/// Position and size of a window, in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub row: u16,
    pub col: u16,
    pub width: u16,
    pub height: u16,
}

impl Geometry {
    pub fn new(row: u16, col: u16, width: u16, height: u16) -> Self {
        Self {
            row,
            col,
            width,
            height,
        }
    }
}

/// Host screen dimensions
///
/// `reserved_top` and `reserved_bottom` are rows taken by host chrome
/// (tab line, status line, command line) that windows must not cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
    pub reserved_top: u16,
    pub reserved_bottom: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            reserved_top: 0,
            reserved_bottom: 0,
        }
    }

    pub fn with_chrome(mut self, top: u16, bottom: u16) -> Self {
        self.reserved_top = top;
        self.reserved_bottom = bottom;
        self
    }

    /// Rows available to windows once chrome is subtracted (never below 1)
    pub fn usable_height(&self) -> u16 {
        self.height
            .saturating_sub(self.reserved_top)
            .saturating_sub(self.reserved_bottom)
            .max(1)
    }

    /// The area windows may occupy
    pub fn usable_area(&self) -> Geometry {
        Geometry::new(self.reserved_top, 0, self.width.max(1), self.usable_height())
    }
}
