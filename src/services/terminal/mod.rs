//! Process execution service for sessions
//!
//! This module provides PTY-backed process support using `portable-pty` for
//! cross-platform PTY management. Output is streamed into the session's
//! output buffer; exits are reported through the async bridge.

mod manager;

pub use manager::TerminalManager;
