//! The roll command: load configuration, validate the environment label,
//! and drive the per-server pipeline.
//!
//! Configuration loading and label validation happen before any server is
//! touched; a failure there aborts the run with no filesystem changes.
//! Per-server failures are reported in the final summary and never abort
//! the run.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use cfgroll_core::config::{EnvironmentRules, ServerManifest};
use cfgroll_core::pipeline::{self, RunOptions};

/// Run a roll-forward across every configured server.
///
/// `release` and `env` fall back to interactive stdin prompts when not
/// given on the command line. The version name is used verbatim as a
/// directory name; the environment label is trimmed and uppercased before
/// lookup.
pub fn run(
    servers_file: &Path,
    rules_file: &Path,
    release: Option<&str>,
    env: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    println!("=== cfgroll configuration roll-forward ===\n");

    let new_version = match release {
        Some(version) => version.trim().to_string(),
        None => prompt("Enter new version name (e.g. 3.8.0): ")?,
    };
    let label = match env {
        Some(label) => label.trim().to_uppercase(),
        None => prompt("Enter environment: ")?.to_uppercase(),
    };

    let manifest =
        ServerManifest::from_file(servers_file).context("failed to load servers manifest")?;
    let rules =
        EnvironmentRules::from_file(rules_file).context("failed to load environment rules")?;

    let Some(ruleset) = rules.get(&label) else {
        bail!(
            "invalid environment '{label}'; known environments: {}",
            rules.labels().join(", ")
        );
    };

    println!("Found {} server(s) in configuration.\n", manifest.servers.len());

    let report = pipeline::run(&manifest.servers, &new_version, ruleset, RunOptions { dry_run });

    println!("{report}");
    Ok(())
}

/// Print a prompt and read one trimmed line from stdin.
fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush().context("failed to flush stdout")?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("failed to read input")?;
    Ok(input.trim().to_string())
}
