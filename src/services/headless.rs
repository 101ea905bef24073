//! Headless window system
//!
//! Keeps a table of windows with their geometry and focus, without drawing
//! anything. Used by the standalone binary and by tests.

use crate::host::{WindowStyle, WindowSystem};
use crate::model::{Orientation, SplitDirection};
use crate::types::{BufferId, Geometry, Viewport, WindowId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowKind {
    Floating(WindowStyle),
    Split(SplitDirection),
}

#[derive(Debug, Clone)]
pub struct HeadlessWindow {
    pub buffer: BufferId,
    pub geometry: Geometry,
    pub kind: WindowKind,
}

pub struct HeadlessWindows {
    viewport: Viewport,
    windows: BTreeMap<WindowId, HeadlessWindow>,
    focus: Option<WindowId>,
    next_id: u64,
}

impl HeadlessWindows {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            windows: BTreeMap::new(),
            focus: None,
            next_id: 1,
        }
    }

    pub fn window(&self, id: WindowId) -> Option<&HeadlessWindow> {
        self.windows.get(&id)
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Windows currently showing `buffer`
    pub fn windows_for_buffer(&self, buffer: BufferId) -> Vec<WindowId> {
        self.windows
            .iter()
            .filter(|(_, w)| w.buffer == buffer)
            .map(|(id, _)| *id)
            .collect()
    }

    fn insert(&mut self, window: HeadlessWindow) -> WindowId {
        let id = WindowId(self.next_id);
        self.next_id += 1;
        self.windows.insert(id, window);
        id
    }

    fn remove(&mut self, window: WindowId) -> bool {
        let removed = self.windows.remove(&window).is_some();
        if self.focus == Some(window) {
            // Focus returns to the main editing area
            self.focus = None;
        }
        removed
    }
}

/// Geometry of a split carved from `area` on the given side
pub fn split_geometry(area: Geometry, direction: SplitDirection, size: Option<u16>) -> Geometry {
    let full = match direction.orientation() {
        Orientation::Vertical => area.width,
        Orientation::Horizontal => area.height,
    };
    let size = size.unwrap_or(full / 2).clamp(1, full.max(1));
    match direction {
        SplitDirection::Left => Geometry::new(area.row, area.col, size, area.height),
        SplitDirection::Right => Geometry::new(
            area.row,
            area.col + area.width.saturating_sub(size),
            size,
            area.height,
        ),
        SplitDirection::Above => Geometry::new(area.row, area.col, area.width, size),
        SplitDirection::Below => Geometry::new(
            area.row + area.height.saturating_sub(size),
            area.col,
            area.width,
            size,
        ),
    }
}

impl WindowSystem for HeadlessWindows {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn create_floating_window(
        &mut self,
        buffer: BufferId,
        geometry: Geometry,
        style: &WindowStyle,
    ) -> WindowId {
        let id = self.insert(HeadlessWindow {
            buffer,
            geometry,
            kind: WindowKind::Floating(style.clone()),
        });
        tracing::debug!("Created floating window {} for {} at {:?}", id, buffer, geometry);
        id
    }

    fn create_split_window(
        &mut self,
        buffer: BufferId,
        direction: SplitDirection,
        size: Option<u16>,
    ) -> WindowId {
        let geometry = split_geometry(self.viewport.usable_area(), direction, size);
        let id = self.insert(HeadlessWindow {
            buffer,
            geometry,
            kind: WindowKind::Split(direction),
        });
        tracing::debug!(
            "Created {} split window {} for {} at {:?}",
            direction.as_str(),
            id,
            buffer,
            geometry
        );
        id
    }

    fn hide_window(&mut self, window: WindowId) {
        if self.remove(window) {
            tracing::debug!("Hid window {}", window);
        }
    }

    fn close_window(&mut self, window: WindowId) {
        if self.remove(window) {
            tracing::debug!("Closed window {}", window);
        }
    }

    fn is_window_valid(&self, window: WindowId) -> bool {
        self.windows.contains_key(&window)
    }

    fn window_geometry(&self, window: WindowId) -> Option<Geometry> {
        self.windows.get(&window).map(|w| w.geometry)
    }

    fn set_window_geometry(&mut self, window: WindowId, geometry: Geometry) -> bool {
        match self.windows.get_mut(&window) {
            Some(w) => {
                w.geometry = geometry;
                true
            }
            None => false,
        }
    }

    fn focused_window(&self) -> Option<WindowId> {
        self.focus
    }

    fn focus_window(&mut self, window: WindowId) {
        if self.windows.contains_key(&window) {
            self.focus = Some(window);
        }
    }
}
