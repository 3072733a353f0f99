//! End-to-end pipeline tests on real temporary directory trees.
//!
//! Covers the full roll-forward flow: manifest and rules parsed from JSON,
//! latest version resolved, tree cloned, `.ini` files rewritten, and the
//! skip and dry-run paths leaving the filesystem untouched.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use cfgroll_core::config::{EnvironmentRules, ServerEntry};
use cfgroll_core::pipeline::{RunOptions, ServerOutcome, run};
use tempfile::TempDir;

/// Relative paths of all files under `root`, for file-set comparison.
fn file_set(root: &Path) -> BTreeSet<PathBuf> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeSet<PathBuf>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                out.insert(path.strip_prefix(root).unwrap().to_path_buf());
            }
        }
    }
    let mut out = BTreeSet::new();
    walk(root, root, &mut out);
    out
}

fn rules_from(json: &str, label: &str) -> cfgroll_core::EnvironmentRuleset {
    EnvironmentRules::from_json(json).unwrap().get(label).unwrap().clone()
}

#[test]
fn rolls_one_server_and_shifts_ports() {
    // The canonical scenario: /srv/api1 holds only 3.7.0 with one ini file,
    // empty replace map, offset 100, target 3.8.0.
    let root = TempDir::new().unwrap();
    let src = root.path().join("3.7.0");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("app.ini"), "port=4500\n").unwrap();

    let servers = vec![ServerEntry {
        name: "api1".to_string(),
        path: root.path().to_path_buf(),
    }];
    let ruleset = rules_from(r#"{"A": {"replace": {}, "port_offset": 100}}"#, "A");

    let report = run(&servers, "3.8.0", &ruleset, RunOptions::default());

    assert_eq!(report.failed(), 0);
    assert_eq!(
        report.entries[0].1.as_ref().unwrap(),
        &ServerOutcome::Updated {
            from: "3.7.0".to_string(),
            to: "3.8.0".to_string()
        }
    );
    assert_eq!(
        fs::read_to_string(root.path().join("3.8.0/app.ini")).unwrap(),
        "port=4600\n"
    );
    // Source untouched.
    assert_eq!(fs::read_to_string(src.join("app.ini")).unwrap(), "port=4500\n");
}

#[test]
fn clone_has_identical_file_set() {
    let root = TempDir::new().unwrap();
    let src = root.path().join("2.1.0");
    fs::create_dir_all(src.join("conf/modules")).unwrap();
    fs::write(src.join("app.ini"), "port=4100\n").unwrap();
    fs::write(src.join("conf/db.ini"), "host=staging.local\n").unwrap();
    fs::write(src.join("conf/modules/cache.ini"), "cache_port=5100\n").unwrap();
    fs::write(src.join("conf/modules/start.sh"), "#!/bin/sh\n").unwrap();

    let servers = vec![ServerEntry {
        name: "web".to_string(),
        path: root.path().to_path_buf(),
    }];
    let ruleset = rules_from(
        r#"{"B": {"replace": {"staging.local": "prod.local"}, "port_offset": 500}}"#,
        "B",
    );

    let report = run(&servers, "2.2.0", &ruleset, RunOptions::default());
    assert_eq!(report.updated(), 1);

    let dst = root.path().join("2.2.0");
    assert_eq!(file_set(&src), file_set(&dst));

    // Replacement key is gone from the rewritten clone.
    let db = fs::read_to_string(dst.join("conf/db.ini")).unwrap();
    assert!(!db.contains("staging.local"));
    assert_eq!(db, "host=prod.local\n");
    assert_eq!(
        fs::read_to_string(dst.join("conf/modules/cache.ini")).unwrap(),
        "cache_port=5600\n"
    );
    // Non-ini files cloned but never rewritten.
    assert_eq!(
        fs::read_to_string(dst.join("conf/modules/start.sh")).unwrap(),
        "#!/bin/sh\n"
    );
}

#[test]
fn existing_target_version_skips_without_touching_files() {
    let root = TempDir::new().unwrap();
    let src = root.path().join("3.7.0");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("app.ini"), "port=4500\n").unwrap();
    let existing = root.path().join("3.8.0");
    fs::create_dir(&existing).unwrap();
    fs::write(existing.join("app.ini"), "port=9999\n").unwrap();

    let servers = vec![ServerEntry {
        name: "api1".to_string(),
        path: root.path().to_path_buf(),
    }];
    let ruleset = rules_from(r#"{"A": {"replace": {}, "port_offset": 100}}"#, "A");

    let report = run(&servers, "3.8.0", &ruleset, RunOptions::default());

    assert_eq!(report.skipped(), 1);
    assert_eq!(report.updated(), 0);
    // Neither tree was modified.
    assert_eq!(fs::read_to_string(src.join("app.ini")).unwrap(), "port=4500\n");
    assert_eq!(
        fs::read_to_string(existing.join("app.ini")).unwrap(),
        "port=9999\n"
    );
}

#[test]
fn dry_run_reports_without_filesystem_changes() {
    let root = TempDir::new().unwrap();
    let src = root.path().join("3.7.0");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("app.ini"), "port=4500\n").unwrap();

    let servers = vec![ServerEntry {
        name: "api1".to_string(),
        path: root.path().to_path_buf(),
    }];
    let ruleset = rules_from(r#"{"A": {"replace": {}, "port_offset": 100}}"#, "A");

    let before = file_set(root.path());
    let report = run(&servers, "3.8.0", &ruleset, RunOptions { dry_run: true });

    assert_eq!(report.updated(), 1);
    assert_eq!(
        report.entries[0].1.as_ref().unwrap(),
        &ServerOutcome::WouldUpdate {
            from: "3.7.0".to_string(),
            to: "3.8.0".to_string()
        }
    );
    assert_eq!(before, file_set(root.path()));
    assert_eq!(fs::read_to_string(src.join("app.ini")).unwrap(), "port=4500\n");
}

#[test]
fn latest_of_several_versions_is_the_clone_source() {
    let root = TempDir::new().unwrap();
    let old = root.path().join("3.6.0");
    fs::create_dir(&old).unwrap();
    fs::write(old.join("app.ini"), "port=4100\n").unwrap();
    std::thread::sleep(std::time::Duration::from_millis(25));
    let newer = root.path().join("3.7.0");
    fs::create_dir(&newer).unwrap();
    fs::write(newer.join("app.ini"), "port=4200\n").unwrap();

    let servers = vec![ServerEntry {
        name: "api1".to_string(),
        path: root.path().to_path_buf(),
    }];
    let ruleset = rules_from(r#"{"A": {"replace": {}, "port_offset": 0}}"#, "A");

    let report = run(&servers, "3.8.0", &ruleset, RunOptions::default());

    assert_eq!(report.updated(), 1);
    assert_eq!(
        fs::read_to_string(root.path().join("3.8.0/app.ini")).unwrap(),
        "port=4200\n"
    );
}
