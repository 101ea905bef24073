//! Session Registry - the single source of truth for which sessions exist
//!
//! The registry only aggregates [`Session`] records. Windows, buffers and
//! processes referenced by a session are owned by the host collaborators.

use super::session::{Session, SessionKey};
use crate::app::SessionError;
use crate::types::{ProcessId, WindowId};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionKey, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, key: &SessionKey) -> Option<&Session> {
        self.sessions.get(key)
    }

    pub fn lookup_mut(&mut self, key: &SessionKey) -> Option<&mut Session> {
        self.sessions.get_mut(key)
    }

    pub fn contains(&self, key: &SessionKey) -> bool {
        self.sessions.contains_key(key)
    }

    /// Register a session under its key
    ///
    /// Fails if the key is taken; callers remove the old record first.
    pub fn insert(&mut self, session: Session) -> Result<(), SessionError> {
        if self.sessions.contains_key(&session.key) {
            return Err(SessionError::DuplicateKey(session.key.clone()));
        }
        self.sessions.insert(session.key.clone(), session);
        Ok(())
    }

    /// Remove a session; removing an absent key is a no-op
    pub fn remove(&mut self, key: &SessionKey) -> Option<Session> {
        self.sessions.remove(key)
    }

    /// All sessions, in no particular order
    pub fn list_all(&self) -> impl Iterator<Item = (&SessionKey, &Session)> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// The session currently shown in `window`
    pub fn find_by_window(&self, window: WindowId) -> Option<&SessionKey> {
        self.sessions
            .values()
            .find(|s| s.window == Some(window))
            .map(|s| &s.key)
    }

    /// The session whose running process is `process`
    pub fn find_by_process(&self, process: ProcessId) -> Option<&SessionKey> {
        self.sessions
            .values()
            .find(|s| s.running_process() == Some(process))
            .map(|s| &s.key)
    }

    pub fn keys(&self) -> Vec<SessionKey> {
        self.sessions.keys().cloned().collect()
    }
}
