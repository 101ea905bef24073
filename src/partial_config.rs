//! Partial session settings and merge precedence
//!
//! Call sites pass a [`PartialSessionConfig`] holding only the fields they
//! want to override. Resolution order, highest first:
//!
//! 1. explicit call-site options (for `apps`, merged over the app's own
//!    options with [`Merge`])
//! 2. the session's stored snapshot (for sessions that already exist)
//! 3. the global defaults from [`crate::config::Config`]

use crate::config::{BorderStyle, SessionConfig};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Fill unset values of `self` from a lower-precedence layer
pub trait Merge {
    fn merge_from(&mut self, other: &Self);
}

impl<T: Clone> Merge for Option<T> {
    fn merge_from(&mut self, other: &Self) {
        if self.is_none() {
            *self = other.clone();
        }
    }
}

/// Session settings where every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PartialSessionConfig {
    pub border: Option<BorderStyle>,
    pub title: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Added on top of the base environment; keys here win
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
    pub persist: Option<bool>,
    pub autoclose: Option<bool>,
    pub enter: Option<bool>,
}

impl Merge for PartialSessionConfig {
    fn merge_from(&mut self, other: &Self) {
        self.border.merge_from(&other.border);
        self.title.merge_from(&other.title);
        self.width.merge_from(&other.width);
        self.height.merge_from(&other.height);
        self.cwd.merge_from(&other.cwd);
        self.persist.merge_from(&other.persist);
        self.autoclose.merge_from(&other.autoclose);
        self.enter.merge_from(&other.enter);
        for (k, v) in &other.env {
            self.env.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
}

impl PartialSessionConfig {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay the set fields onto `base`, producing a resolved config
    pub fn apply_to(&self, base: &SessionConfig) -> SessionConfig {
        let mut env = base.env.clone();
        env.extend(self.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        SessionConfig {
            border: self.border.unwrap_or(base.border),
            title: self.title.clone().or_else(|| base.title.clone()),
            width: self.width.or(base.width),
            height: self.height.or(base.height),
            env,
            cwd: self.cwd.clone().or_else(|| base.cwd.clone()),
            persist: self.persist.unwrap_or(base.persist),
            autoclose: self.autoclose.unwrap_or(base.autoclose),
            enter: self.enter.unwrap_or(base.enter),
        }
    }
}
