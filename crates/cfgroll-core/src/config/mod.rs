//! Configuration parsing for the servers manifest and environment rules.
//!
//! Two JSON documents drive a run: the servers manifest (which roots to
//! process) and the environment rules (which rewrites to apply). Both are
//! loaded once, up front, and are immutable for the rest of the run; a
//! missing or malformed file aborts the run before any server is touched.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// One configured server installation: a display name and the root path
/// that holds its version folders.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerEntry {
    /// Display name, used only in progress and error output.
    pub name: String,

    /// Root directory containing this server's version folders.
    pub path: PathBuf,
}

/// Top-level shape of the servers file: `{"servers": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerManifest {
    /// Servers in processing order.
    pub servers: Vec<ServerEntry>,
}

impl ServerManifest {
    /// Load the servers manifest from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file is absent, or an I/O
    /// or parse error otherwise.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json(&read_config(path)?)
    }

    /// Parse the servers manifest from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the JSON is invalid or does not
    /// match the expected shape.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(ConfigError::Parse)
    }
}

/// One literal substitution, applied with plain `str::replace`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceRule {
    /// Literal string to search for.
    pub from: String,

    /// Literal replacement text.
    pub to: String,
}

/// The rewrite rules selected for one environment label.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentRuleset {
    /// Ordered literal substitutions.
    ///
    /// The JSON document is an object, but document order is what the
    /// rewriter applies, so it is kept as an explicit sequence here.
    /// Substitution is sequential: a later rule's `from` that appears in an
    /// earlier rule's `to` will be rewritten again.
    #[serde(deserialize_with = "ordered_replace_rules")]
    pub replace: Vec<ReplaceRule>,

    /// Additive offset applied to port numbers in the rewrite window.
    pub port_offset: i64,
}

/// Mapping from environment label to ruleset: `{"<LABEL>": {...}, ...}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentRules(HashMap<String, EnvironmentRuleset>);

impl EnvironmentRules {
    /// Load the environment rules from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file is absent, or an I/O
    /// or parse error otherwise.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json(&read_config(path)?)
    }

    /// Parse the environment rules from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the JSON is invalid or does not
    /// match the expected shape.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(ConfigError::Parse)
    }

    /// Look up the ruleset for an (already uppercased) environment label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&EnvironmentRuleset> {
        self.0.get(label)
    }

    /// Known environment labels, sorted for stable error output.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.0.keys().map(String::as_str).collect();
        labels.sort_unstable();
        labels
    }
}

/// Read a required configuration file to a string.
///
/// The existence check is explicit so that an absent file surfaces as
/// [`ConfigError::NotFound`] rather than a bare I/O error.
fn read_config(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(ConfigError::Io)
}

/// Deserialize a JSON object into replacement rules in document order.
fn ordered_replace_rules<'de, D>(deserializer: D) -> Result<Vec<ReplaceRule>, D::Error>
where
    D: Deserializer<'de>,
{
    struct RulesVisitor;

    impl<'de> Visitor<'de> for RulesVisitor {
        type Value = Vec<ReplaceRule>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a map of literal replacements")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut rules = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((from, to)) = map.next_entry::<String, String>()? {
                rules.push(ReplaceRule { from, to });
            }
            Ok(rules)
        }
    }

    deserializer.deserialize_map(RulesVisitor)
}

/// Errors raised while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required configuration file is absent.
    #[error("required file not found: {}", path.display())]
    NotFound {
        /// The missing file.
        path: PathBuf,
    },

    /// I/O error reading a configuration file.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
