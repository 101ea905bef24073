use crate::model::{CommandLine, Layout};
use crate::partial_config::PartialSessionConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Settings every new session starts from
    #[serde(default)]
    pub defaults: SessionConfig,

    /// Shell used by `toggle` for sessions with no command.
    /// Falls back to `$SHELL`, then the platform default.
    #[serde(default)]
    pub shell: Option<String>,

    /// Default size (cells) of split windows; half the screen when unset
    #[serde(default)]
    pub split_size: Option<u16>,

    /// Programs whose exit code 1 means "user quit" rather than failure
    #[serde(default = "default_interactive_apps")]
    pub interactive_apps: Vec<String>,

    /// Named applications available to the `apps` action
    #[serde(default = "default_apps")]
    pub apps: BTreeMap<String, AppEntry>,

    /// Lines of output kept per session
    #[serde(default = "default_scrollback_lines")]
    pub scrollback_lines: usize,

    /// Rows reserved for host chrome above and below windows
    #[serde(default)]
    pub chrome: ChromeRows,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            defaults: SessionConfig::default(),
            shell: None,
            split_size: None,
            interactive_apps: default_interactive_apps(),
            apps: default_apps(),
            scrollback_lines: default_scrollback_lines(),
            chrome: ChromeRows::default(),
        }
    }
}

impl Config {
    /// Whether a program's exit code 1 should be treated as a normal close
    pub fn is_interactive_app(&self, program: &str) -> bool {
        self.interactive_apps.iter().any(|app| app == program)
    }
}

fn default_interactive_apps() -> Vec<String> {
    [
        "lazygit",
        "lazydocker",
        "htop",
        "btop",
        "top",
        "k9s",
        "yazi",
        "ranger",
        "nnn",
        "lf",
        "tig",
        "gitui",
        "less",
        "man",
        "vim",
        "nvim",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_apps() -> BTreeMap<String, AppEntry> {
    ["lazygit", "lazydocker", "btop", "htop", "yazi"]
        .iter()
        .map(|name| {
            (
                name.to_string(),
                AppEntry {
                    command: CommandLine::Shell(name.to_string()),
                    layout: None,
                    options: PartialSessionConfig::default(),
                },
            )
        })
        .collect()
}

fn default_scrollback_lines() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

/// A predefined application launched by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AppEntry {
    pub command: CommandLine,
    /// Layout override; floating when unset
    #[serde(default)]
    pub layout: Option<Layout>,
    /// Session settings for this app, below call-site options
    #[serde(default, skip_serializing_if = "PartialSessionConfig::is_empty")]
    pub options: PartialSessionConfig,
}

/// Rows taken by host chrome (tab line, status line, command line)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChromeRows {
    #[serde(default = "default_chrome_top")]
    pub top: u16,
    #[serde(default = "default_chrome_bottom")]
    pub bottom: u16,
}

fn default_chrome_top() -> u16 {
    1
}

fn default_chrome_bottom() -> u16 {
    2
}

impl Default for ChromeRows {
    fn default() -> Self {
        Self {
            top: default_chrome_top(),
            bottom: default_chrome_bottom(),
        }
    }
}

/// Window border drawn around floating sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    None,
    Single,
    Double,
    #[default]
    Rounded,
    Solid,
    Shadow,
}

impl BorderStyle {
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "none" => Some(BorderStyle::None),
            "single" => Some(BorderStyle::Single),
            "double" => Some(BorderStyle::Double),
            "rounded" => Some(BorderStyle::Rounded),
            "solid" => Some(BorderStyle::Solid),
            "shadow" => Some(BorderStyle::Shadow),
            _ => None,
        }
    }
}

/// Per-session settings
///
/// A resolved copy is stored with each session when it is created and is
/// reused whenever a hidden session's window is recreated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SessionConfig {
    #[serde(default)]
    pub border: BorderStyle,

    /// Window title; the session key when unset
    #[serde(default)]
    pub title: Option<String>,

    /// Window width: a fraction of the screen when in (0, 1], cells otherwise
    #[serde(default)]
    pub width: Option<f64>,

    /// Window height: a fraction of the screen when in (0, 1], cells otherwise
    #[serde(default)]
    pub height: Option<f64>,

    /// Extra environment variables for the child process
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Working directory for the child process
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Keep the output buffer when the window is hidden or closed
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Tear the session down when its process exits
    #[serde(default = "default_false")]
    pub autoclose: bool,

    /// Focus the window when it is shown
    #[serde(default = "default_true")]
    pub enter: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            border: BorderStyle::default(),
            title: None,
            width: None,
            height: None,
            env: BTreeMap::new(),
            cwd: None,
            persist: true,
            autoclose: false,
            enter: true,
        }
    }
}

/// Errors from loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    IoError(String),

    #[error("failed to parse config: {0}")]
    ParseError(String),

    #[error("invalid config: {0}")]
    ValidationError(String),
}

impl Config {
    /// Check values serde cannot reject on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("width", self.defaults.width), ("height", self.defaults.height)] {
            if let Some(v) = value {
                if !(v.is_finite() && v > 0.0) {
                    return Err(ConfigError::ValidationError(format!(
                        "defaults.{} must be positive, got {}",
                        name, v
                    )));
                }
            }
        }
        if self.scrollback_lines == 0 {
            return Err(ConfigError::ValidationError(
                "scrollback_lines must be at least 1".to_string(),
            ));
        }
        for (name, app) in &self.apps {
            if app.command.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "apps.{} has an empty command",
                    name
                )));
            }
        }
        Ok(())
    }
}
