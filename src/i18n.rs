//! User-facing messages
//!
//! Every string printed by the binary goes through here so that the
//! translation lookups live in the crate that loads the locale files.

use crate::app::{MaximizeOutcome, Notice, OpenOutcome, SessionSummary};
use crate::model::{CommandLine, SessionKey};
use crate::types::Geometry;
use rust_i18n::t;

/// Pick the message locale: explicit override, then `LANG`, then English
pub fn init(locale_override: Option<&str>) {
    let locale = locale_override
        .map(str::to_string)
        .or_else(locale_from_env)
        .unwrap_or_else(|| "en".to_string());
    rust_i18n::set_locale(&locale);
}

/// `LANG=de_DE.UTF-8` -> `de`
fn locale_from_env() -> Option<String> {
    let lang = std::env::var("LANG").ok()?;
    let code = lang.split(['_', '.', '@']).next()?;
    if code.is_empty() || code == "C" || code == "POSIX" {
        None
    } else {
        Some(code.to_string())
    }
}

pub fn open_message(key: &SessionKey, outcome: OpenOutcome) -> String {
    let key = key.as_str();
    match outcome {
        OpenOutcome::Started => t!("session.started", key = key),
        OpenOutcome::Shown => t!("session.shown", key = key),
        OpenOutcome::Hidden => t!("session.hidden", key = key),
        OpenOutcome::Restarted => t!("session.restarted", key = key),
    }
    .to_string()
}

pub fn closed_message(key: &SessionKey) -> String {
    t!("session.closed", key = key.as_str()).to_string()
}

pub fn resized_message(key: &str, geometry: Geometry) -> String {
    t!(
        "session.resized",
        key = key,
        width = geometry.width,
        height = geometry.height
    )
    .to_string()
}

pub fn maximize_message(key: &str, outcome: MaximizeOutcome) -> String {
    match outcome {
        MaximizeOutcome::Maximized(_) => t!("session.maximized", key = key),
        MaximizeOutcome::Restored(g) => t!(
            "session.restored",
            key = key,
            width = g.width,
            height = g.height
        ),
    }
    .to_string()
}

pub fn notice_message(notice: &Notice) -> String {
    match notice {
        Notice::ExitWarning { key, command, code } => t!(
            "session.exit_warning",
            key = key.as_str(),
            command = command,
            code = code
        ),
        Notice::AutoClosed { key, code } => {
            t!("session.autoclosed", key = key.as_str(), code = code)
        }
    }
    .to_string()
}

/// One row of `list` output
pub fn summary_line(summary: &SessionSummary) -> String {
    let status = match (summary.alive, summary.exit_code) {
        (true, _) => t!("list.alive").to_string(),
        (false, Some(code)) => t!("list.exited", code = code).to_string(),
        (false, None) => t!("list.released").to_string(),
    };
    format!(
        "{:<32} {:<8} {:<10} {:<6} {}{}",
        summary.key,
        summary.state.as_str(),
        status,
        summary.layout.kind(),
        summary.command,
        if summary.maximized { " [max]" } else { "" }
    )
}

pub fn error_message(error: &dyn std::fmt::Display) -> String {
    t!("session.error", error = error.to_string()).to_string()
}

pub fn parse_error_message(error: &dyn std::fmt::Display) -> String {
    t!("parse.error", error = error.to_string()).to_string()
}

pub fn list_empty() -> String {
    t!("list.empty").to_string()
}

pub fn apps_header() -> String {
    t!("apps.header").to_string()
}

/// One row of the apps listing
pub fn app_line(name: &str, command: &CommandLine) -> String {
    format!("  {:<16} {}", name, command)
}

pub fn apps_empty() -> String {
    t!("apps.empty").to_string()
}

pub fn peek_empty() -> String {
    t!("peek.empty").to_string()
}

pub fn help_text() -> String {
    t!("help.text").to_string()
}
