//! Input pipeline
//!
//! Turns text lines into [`commands::Action`]s for the controller.

pub mod commands;

pub use commands::{parse_line, Action, ParseError};
