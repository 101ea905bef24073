//! Window Presenter - turns a layout and a session config into a host window
//!
//! Floating windows are centered over the usable viewport (the screen minus
//! the rows reserved for chrome). Splits are carved by the host; we only pick
//! their size. Dimension values in `(0, 1]` are fractions of the available
//! space, values above 1 are absolute cells.

use super::SessionError;
use crate::config::{BorderStyle, SessionConfig};
use crate::host::{WindowStyle, WindowSystem};
use crate::model::{Layout, Orientation, SplitDirection};
use crate::types::{BufferId, Geometry, Viewport, WindowId};

/// Share of the usable area a floating window takes by default
pub const DEFAULT_FLOAT_FRACTION: f64 = 0.8;

/// A parsed resize request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAmount {
    /// `+N` or `-N`
    Relative(i32),
    /// `N`
    Absolute(u16),
}

impl ResizeAmount {
    pub fn parse(text: &str) -> Result<Self, SessionError> {
        let text = text.trim();
        let invalid = || SessionError::InvalidAmount(text.to_string());

        let (sign, digits) = match text.as_bytes().first() {
            Some(b'+') => (Some(1), &text[1..]),
            Some(b'-') => (Some(-1), &text[1..]),
            _ => (None, text),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let n: u16 = digits.parse().map_err(|_| invalid())?;

        Ok(match sign {
            Some(sign) => ResizeAmount::Relative(sign * i32::from(n)),
            None => ResizeAmount::Absolute(n),
        })
    }

    /// New extent for an axis currently `current` cells long (never below 1)
    pub fn apply(self, current: u16) -> u16 {
        let target = match self {
            ResizeAmount::Relative(delta) => i32::from(current) + delta,
            ResizeAmount::Absolute(n) => i32::from(n),
        };
        target.clamp(1, i32::from(u16::MAX)) as u16
    }
}

/// Cells for one dimension out of `total` available
fn resolve_dimension(value: Option<f64>, total: u16) -> u16 {
    let total_f = f64::from(total);
    let cells = match value {
        Some(v) if v > 1.0 => v.floor(),
        Some(v) if v > 0.0 => (total_f * v).floor(),
        _ => (total_f * DEFAULT_FLOAT_FRACTION).floor(),
    };
    // `as` saturates for out-of-range floats
    (cells as u16).clamp(1, total.max(1))
}

/// Centered geometry for a floating window
pub fn floating_geometry(viewport: &Viewport, config: &SessionConfig) -> Geometry {
    let area = viewport.usable_area();
    let width = resolve_dimension(config.width, area.width);
    let height = resolve_dimension(config.height, area.height);
    Geometry::new(
        area.row + (area.height - height) / 2,
        area.col + (area.width - width) / 2,
        width,
        height,
    )
}

/// Requested size of a split along its axis; `None` leaves it to the host
pub fn split_size(
    viewport: &Viewport,
    direction: SplitDirection,
    config: &SessionConfig,
    default_size: Option<u16>,
) -> Option<u16> {
    let area = viewport.usable_area();
    let (value, total) = match direction.orientation() {
        Orientation::Vertical => (config.width, area.width),
        Orientation::Horizontal => (config.height, area.height),
    };
    match value {
        Some(v) => Some(resolve_dimension(Some(v), total)),
        None => default_size.map(|size| size.clamp(1, total.max(1))),
    }
}

/// Geometry of a maximized window
pub fn maximized_geometry(viewport: &Viewport, layout: &Layout) -> Geometry {
    let area = viewport.usable_area();
    match layout {
        Layout::Floating if area.width > 2 && area.height > 2 => Geometry::new(
            area.row + 1,
            area.col + 1,
            area.width - 2,
            area.height - 2,
        ),
        _ => area,
    }
}

/// Apply a resize along the layout's axis
///
/// Vertical splits grow in width; floats and horizontal splits in height.
pub fn resize_geometry(geometry: Geometry, layout: &Layout, amount: ResizeAmount) -> Geometry {
    let mut resized = geometry;
    match layout {
        Layout::Split { direction } if direction.orientation() == Orientation::Vertical => {
            resized.width = amount.apply(geometry.width);
        }
        _ => {
            resized.height = amount.apply(geometry.height);
        }
    }
    resized
}

/// Terminal size inside a window, accounting for a floating border
pub fn content_size(geometry: Geometry, layout: &Layout, border: BorderStyle) -> (u16, u16) {
    let inset = match (layout, border) {
        (Layout::Floating, BorderStyle::None) => 0,
        (Layout::Floating, _) => 2,
        _ => 0,
    };
    (
        geometry.width.saturating_sub(inset).max(1),
        geometry.height.saturating_sub(inset).max(1),
    )
}

/// Show `buffer` in a new window laid out per `layout` and `config`
pub fn present(
    windows: &mut dyn WindowSystem,
    buffer: BufferId,
    layout: &Layout,
    config: &SessionConfig,
    default_title: &str,
    default_split_size: Option<u16>,
) -> WindowId {
    let viewport = windows.viewport();
    match layout {
        Layout::Floating => {
            let style = WindowStyle {
                border: config.border,
                title: match config.border {
                    BorderStyle::None => None,
                    _ => Some(
                        config
                            .title
                            .clone()
                            .unwrap_or_else(|| default_title.to_string()),
                    ),
                },
            };
            let geometry = floating_geometry(&viewport, config);
            windows.create_floating_window(buffer, geometry, &style)
        }
        Layout::Split { direction } => {
            let size = split_size(&viewport, *direction, config, default_split_size);
            windows.create_split_window(buffer, *direction, size)
        }
    }
}

/// Take a window off screen, keeping its buffer
pub fn dismiss(windows: &mut dyn WindowSystem, window: WindowId) {
    if windows.is_window_valid(window) {
        windows.hide_window(window);
    }
}

/// Close a window for good
pub fn destroy(windows: &mut dyn WindowSystem, window: WindowId) {
    if windows.is_window_valid(window) {
        windows.close_window(window);
    }
}
