//! Bridge from background I/O threads to the controller's loop
//!
//! PTY reader and waiter threads never touch session state. They post
//! [`AsyncMessage`]s here and the owner of the receiving end applies them
//! between user-driven operations.

use crate::types::ProcessId;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

/// Messages posted by background threads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncMessage {
    /// A process ended; sent exactly once per process
    ProcessExited { process: ProcessId, code: i32 },
}

/// Cloneable handle to the message channel
///
/// Clones share the same receiver, so any clone can drain what any other
/// clone (or a sender obtained from one) posted.
#[derive(Clone)]
pub struct AsyncBridge {
    sender: mpsc::Sender<AsyncMessage>,
    receiver: Arc<Mutex<mpsc::Receiver<AsyncMessage>>>,
}

impl AsyncBridge {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Sender for background threads
    pub fn sender(&self) -> mpsc::Sender<AsyncMessage> {
        self.sender.clone()
    }

    /// Take every message posted so far without blocking
    pub fn try_recv_all(&self) -> Vec<AsyncMessage> {
        match self.receiver.lock() {
            Ok(rx) => rx.try_iter().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Wait up to `timeout` for one message
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<AsyncMessage> {
        self.receiver.lock().ok()?.recv_timeout(timeout).ok()
    }
}

impl Default for AsyncBridge {
    fn default() -> Self {
        Self::new()
    }
}
