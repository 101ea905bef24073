use crate::host::SpawnError;
use crate::model::SessionKey;

/// Errors from session operations
///
/// Every error is scoped to the session it names; the registry is left as it
/// was before the failed operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("no session '{0}'")]
    NotFound(SessionKey),

    #[error("no session to act on: give a key or focus a session window")]
    NoTarget,

    #[error("session '{0}' has no visible window")]
    InvalidWindow(SessionKey),

    #[error("failed to start process: {0}")]
    Spawn(#[from] SpawnError),

    #[error("invalid resize amount '{0}' (expected +N, -N or N)")]
    InvalidAmount(String),

    #[error("session '{0}' already exists")]
    DuplicateKey(SessionKey),

    #[error("unknown app '{0}'")]
    UnknownApp(String),
}
