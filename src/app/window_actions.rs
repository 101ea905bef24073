//! Resize and maximize actions on a session's window

use super::presenter::{self, ResizeAmount};
use super::{SessionController, SessionError};
use crate::model::SessionKey;
use crate::types::{Geometry, Viewport, WindowId};

/// What a maximize toggle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaximizeOutcome {
    Maximized(Geometry),
    Restored(Geometry),
}

impl SessionController {
    /// Grow, shrink or set the size of a session's window
    ///
    /// `amount` is `+N`, `-N` or `N` cells along the layout's axis.
    pub fn resize(&mut self, key: Option<&str>, amount: &str) -> Result<Geometry, SessionError> {
        self.sync();
        let amount = ResizeAmount::parse(amount)?;
        let key = self.resolve_key(key)?;
        let (window, current) = self.visible_window(&key)?;

        let Some(session) = self.registry.lookup(&key) else {
            return Err(SessionError::NotFound(key));
        };
        let resized = presenter::resize_geometry(current, &session.layout, amount);
        if !self.windows.set_window_geometry(window, resized) {
            return Err(SessionError::InvalidWindow(key));
        }
        if let Some(process) = session.running_process() {
            let size = presenter::content_size(resized, &session.layout, session.config.border);
            self.supervisor.resize(process, size);
        }

        tracing::debug!("Resized '{}' to {:?}", key, resized);
        self.last_used = Some(key);
        Ok(resized)
    }

    /// Toggle a session's window between maximized and its previous size
    pub fn maximize(&mut self, key: Option<&str>) -> Result<MaximizeOutcome, SessionError> {
        self.sync();
        let key = self.resolve_key(key)?;
        let (window, current) = self.visible_window(&key)?;
        let viewport = self.windows.viewport();

        let Some(session) = self.registry.lookup_mut(&key) else {
            return Err(SessionError::NotFound(key));
        };
        let outcome = if session.maximized {
            let original = session.original_geometry.take().unwrap_or(current);
            session.maximized = false;
            MaximizeOutcome::Restored(original)
        } else {
            // Captured once; a second maximize must not overwrite it
            if session.original_geometry.is_none() {
                session.original_geometry = Some(current);
            }
            session.maximized = true;
            MaximizeOutcome::Maximized(presenter::maximized_geometry(&viewport, &session.layout))
        };

        let geometry = match outcome {
            MaximizeOutcome::Maximized(g) | MaximizeOutcome::Restored(g) => g,
        };
        self.windows.set_window_geometry(window, geometry);
        if let Some(process) = session.running_process() {
            let size = presenter::content_size(geometry, &session.layout, session.config.border);
            self.supervisor.resize(process, size);
        }

        tracing::debug!("maximize '{}': {:?}", key, outcome);
        self.last_used = Some(key);
        Ok(outcome)
    }

    /// The host screen changed size
    ///
    /// Later maximize toggles use the new size, and windows that are
    /// maximized right now are refitted to it.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.windows.viewport() == viewport {
            return;
        }
        tracing::debug!("Viewport changed to {}x{}", viewport.width, viewport.height);
        self.windows.set_viewport(viewport);

        for key in self.registry.keys() {
            let Ok((window, _)) = self.visible_window(&key) else {
                continue;
            };
            let Some(session) = self.registry.lookup(&key) else {
                continue;
            };
            if !session.maximized {
                continue;
            }
            let geometry = presenter::maximized_geometry(&viewport, &session.layout);
            self.windows.set_window_geometry(window, geometry);
            if let Some(process) = session.running_process() {
                let size = presenter::content_size(geometry, &session.layout, session.config.border);
                self.supervisor.resize(process, size);
            }
        }
    }

    /// The session's window and its geometry, if it is on screen
    fn visible_window(&self, key: &SessionKey) -> Result<(WindowId, Geometry), SessionError> {
        let session = self
            .registry
            .lookup(key)
            .ok_or_else(|| SessionError::NotFound(key.clone()))?;
        session
            .window
            .filter(|window| self.windows.is_window_valid(*window))
            .and_then(|window| Some((window, self.windows.window_geometry(window)?)))
            .ok_or_else(|| SessionError::InvalidWindow(key.clone()))
    }
}
