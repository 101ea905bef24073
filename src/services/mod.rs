//! Asynchronous services and host implementations

pub mod async_bridge;
pub mod headless;
pub mod output;
pub mod shell;
#[cfg(feature = "runtime")]
pub mod terminal;
pub mod tracing_setup;
