//! Core library for `cfgroll`, a version-folder roll-forward tool.
//!
//! A "version folder" is a directory named after a version string that holds
//! one deployable snapshot of a server's configuration files. For each
//! configured server root, cfgroll finds the most recently created version
//! folder, clones it under a new version name, and rewrites
//! environment-specific values (literal string substitutions and additive
//! port renumbering) inside every `.ini` file of the clone.
//!
//! Modules:
//!
//! - [`config`] — servers manifest and environment rulesets (JSON).
//! - [`version`] — latest-version resolution and existence checks.
//! - [`clone`] — recursive version-folder duplication.
//! - [`rewrite`] — in-place `.ini` rewriting (substitutions + port window).
//! - [`pipeline`] — the sequential, fault-isolated per-server run.

pub mod clone;
pub mod config;
pub mod pipeline;
pub mod rewrite;
pub mod version;

pub use config::{ConfigError, EnvironmentRules, EnvironmentRuleset, ServerEntry, ServerManifest};
pub use pipeline::{RunOptions, RunReport, ServerOutcome, run};
