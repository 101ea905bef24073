//! Parsing of action lines
//!
//! Syntax: `<verb> [window-type] [option=value ...] [args]`
//!
//! - `run [float|left|right|above|below] [key=K] [opts] <command text>`
//! - `toggle [key]`, `maximize [key]`, `close [key]`
//! - `resize [key] <+N|-N|N>`
//! - `apps [name] [window-type] [opts]`
//! - `peek [key] [lines=N]`, `list`, `help`, `quit`
//!
//! Options: `width`, `height`, `border`, `title`, `persist`, `autoclose`,
//! `enter`, `cwd` and `env.NAME`. Everything after the options of `run` is
//! the command, passed to the shell as written.

use crate::config::BorderStyle;
use crate::model::{CommandLine, Layout, SessionKey, SplitDirection};
use crate::partial_config::PartialSessionConfig;
use std::path::PathBuf;

/// Lines shown by `peek` unless `lines=` is given
pub const DEFAULT_PEEK_LINES: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Run {
        key: Option<SessionKey>,
        layout: Layout,
        options: PartialSessionConfig,
        command: CommandLine,
    },
    Toggle {
        key: Option<String>,
    },
    Resize {
        key: Option<String>,
        amount: String,
    },
    Maximize {
        key: Option<String>,
    },
    Close {
        key: Option<String>,
    },
    List,
    /// Open a configured app, or list them when `name` is `None`
    Apps {
        name: Option<String>,
        layout: Option<Layout>,
        options: PartialSessionConfig,
    },
    Peek {
        key: Option<String>,
        lines: usize,
    },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("'{verb}' needs {what}")]
    Missing { verb: &'static str, what: &'static str },

    #[error("invalid value '{value}' for option '{option}'")]
    InvalidOption { option: String, value: String },

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("unexpected argument '{0}'")]
    Unexpected(String),
}

/// Split off the first whitespace-separated word
fn next_word(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    match text.find(char::is_whitespace) {
        Some(end) => Some((&text[..end], &text[end..])),
        None => Some((text, "")),
    }
}

fn parse_window_type(word: &str) -> Option<Layout> {
    match word.to_ascii_lowercase().as_str() {
        "float" | "floating" => Some(Layout::Floating),
        other => SplitDirection::parse(other).map(Layout::split),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_dimension(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Options and other words collected from the head of a line
#[derive(Debug, Default)]
struct Parsed<'a> {
    layout: Option<Layout>,
    key: Option<String>,
    lines: Option<usize>,
    options: PartialSessionConfig,
    /// Remaining words, in order
    words: Vec<&'a str>,
    /// For `run`: untouched text starting at the first plain word
    rest: &'a str,
}

/// Whether `word` looks like one of our `name=value` options
fn is_option(word: &str) -> bool {
    match word.split_once('=') {
        Some((name, _)) => {
            matches!(
                name,
                "key"
                    | "lines"
                    | "width"
                    | "height"
                    | "border"
                    | "title"
                    | "persist"
                    | "autoclose"
                    | "enter"
                    | "cwd"
            ) || name.starts_with("env.")
        }
        None => false,
    }
}

fn apply_option(parsed: &mut Parsed<'_>, word: &str) -> Result<(), ParseError> {
    let Some((name, value)) = word.split_once('=') else {
        return Err(ParseError::UnknownOption(word.to_string()));
    };
    let invalid = || ParseError::InvalidOption {
        option: name.to_string(),
        value: value.to_string(),
    };
    let options = &mut parsed.options;
    match name {
        "key" if !value.is_empty() => parsed.key = Some(value.to_string()),
        "lines" => parsed.lines = Some(value.parse().map_err(|_| invalid())?),
        "width" => options.width = Some(parse_dimension(value).ok_or_else(invalid)?),
        "height" => options.height = Some(parse_dimension(value).ok_or_else(invalid)?),
        "border" => options.border = Some(BorderStyle::parse(value).ok_or_else(invalid)?),
        "title" => options.title = Some(value.to_string()),
        "persist" => options.persist = Some(parse_bool(value).ok_or_else(invalid)?),
        "autoclose" => options.autoclose = Some(parse_bool(value).ok_or_else(invalid)?),
        "enter" => options.enter = Some(parse_bool(value).ok_or_else(invalid)?),
        "cwd" if !value.is_empty() => options.cwd = Some(PathBuf::from(value)),
        _ => match name.strip_prefix("env.") {
            Some(var) if !var.is_empty() => {
                options.env.insert(var.to_string(), value.to_string());
            }
            _ => return Err(invalid()),
        },
    }
    Ok(())
}

/// Parse the arguments after the verb
///
/// A window type is only recognized as the first word, and only when
/// `with_layout` is set. With `stop_at_plain`, parsing stops at the first
/// word that is neither and the remainder is kept verbatim.
fn parse_args(
    mut text: &str,
    with_layout: bool,
    stop_at_plain: bool,
) -> Result<Parsed<'_>, ParseError> {
    let mut parsed = Parsed::default();
    while let Some((word, rest)) = next_word(text) {
        if with_layout && parsed.layout.is_none() && parsed.words.is_empty() {
            if let Some(layout) = parse_window_type(word) {
                parsed.layout = Some(layout);
                text = rest;
                continue;
            }
        }
        if is_option(word) {
            apply_option(&mut parsed, word)?;
        } else if stop_at_plain {
            parsed.rest = text.trim();
            break;
        } else {
            parsed.words.push(word);
        }
        text = rest;
    }
    Ok(parsed)
}

fn no_options(parsed: &Parsed<'_>) -> Result<(), ParseError> {
    if !parsed.options.is_empty() || parsed.lines.is_some() {
        return Err(ParseError::Unexpected(
            "options are only accepted by run, apps and peek".to_string(),
        ));
    }
    Ok(())
}

/// At most one plain word: the session key
fn single_key(parsed: Parsed<'_>) -> Result<Option<String>, ParseError> {
    no_options(&parsed)?;
    match parsed.words.as_slice() {
        [] => Ok(parsed.key),
        [key] => Ok(Some(key.to_string())),
        [_, extra, ..] => Err(ParseError::Unexpected(extra.to_string())),
    }
}

/// Parse one input line; blank lines and `#` comments yield `None`
pub fn parse_line(line: &str) -> Result<Option<Action>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let Some((verb, rest)) = next_word(line) else {
        return Ok(None);
    };

    let action = match verb.to_ascii_lowercase().as_str() {
        "run" => {
            let parsed = parse_args(rest, true, true)?;
            if parsed.rest.is_empty() {
                return Err(ParseError::Missing {
                    verb: "run",
                    what: "a command",
                });
            }
            Action::Run {
                key: parsed.key.map(SessionKey::new),
                layout: parsed.layout.unwrap_or_default(),
                options: parsed.options,
                command: CommandLine::Shell(parsed.rest.to_string()),
            }
        }
        "toggle" | "t" => Action::Toggle {
            key: single_key(parse_args(rest, false, false)?)?,
        },
        "maximize" | "max" => Action::Maximize {
            key: single_key(parse_args(rest, false, false)?)?,
        },
        "close" => Action::Close {
            key: single_key(parse_args(rest, false, false)?)?,
        },
        "resize" => {
            // Amounts like `-5` must not be taken for anything else
            let words: Vec<&str> = rest.split_whitespace().collect();
            match words.as_slice() {
                [amount] => Action::Resize {
                    key: None,
                    amount: amount.to_string(),
                },
                [key, amount] => Action::Resize {
                    key: Some(key.to_string()),
                    amount: amount.to_string(),
                },
                [] => {
                    return Err(ParseError::Missing {
                        verb: "resize",
                        what: "an amount (+N, -N or N)",
                    })
                }
                [_, _, extra, ..] => return Err(ParseError::Unexpected(extra.to_string())),
            }
        }
        "list" | "ls" => {
            if let Some((extra, _)) = next_word(rest) {
                return Err(ParseError::Unexpected(extra.to_string()));
            }
            Action::List
        }
        "apps" | "app" => {
            let parsed = parse_args(rest, true, false)?;
            if let [_, extra, ..] = parsed.words.as_slice() {
                return Err(ParseError::Unexpected(extra.to_string()));
            }
            Action::Apps {
                name: parsed.words.first().map(|s| s.to_string()),
                layout: parsed.layout,
                options: parsed.options,
            }
        }
        "peek" => {
            let parsed = parse_args(rest, false, false)?;
            let lines = parsed.lines.unwrap_or(DEFAULT_PEEK_LINES);
            let key = match parsed.words.as_slice() {
                [] => parsed.key,
                [key] => Some(key.to_string()),
                [_, extra, ..] => return Err(ParseError::Unexpected(extra.to_string())),
            };
            Action::Peek { key, lines }
        }
        "help" | "?" => Action::Help,
        "quit" | "exit" | "q" => Action::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Some(action))
}
