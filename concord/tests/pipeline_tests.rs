use anyhow::{Context, Result};
use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Copy of the demo store project in a throwaway directory.
struct ConcordTestEnv {
    _tmp: TempDir,
    root: PathBuf,
}

impl ConcordTestEnv {
    fn new() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let project_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .context("Workspace root not found")?
            .join("demos/store_pipeline");

        let dest = tmp.path().join("store_pipeline");
        Self::copy_dir(&project_root, &dest)?;

        Ok(Self {
            _tmp: tmp,
            root: dest,
        })
    }

    fn copy_dir(src: &Path, dst: &Path) -> std::io::Result<()> {
        let mut options = fs_extra::dir::CopyOptions::new();
        options.skip_exist = true;
        options.content_only = true;

        std::fs::create_dir_all(dst)?;
        fs_extra::dir::copy(src, dst, &options)
            .map(|_| ())
            .map_err(|e| std::io::Error::other(e.to_string()))
    }

    fn concord(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("concord"));
        cmd.current_dir(&self.root);
        cmd
    }

    fn target(&self, file: &str) -> PathBuf {
        self.root.join("target").join(file)
    }

    fn json(&self, file: &str) -> Result<Value> {
        let content = fs::read_to_string(self.target(file))?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[test]
fn test_run_publishes_reconciled_dataset() -> Result<()> {
    let env = ConcordTestEnv::new()?;

    env.concord()
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("SUCCESS"));

    let csv = fs::read_to_string(env.target("canonical_transactions.csv"))?;
    let mut lines = csv.lines();
    let header = lines.next().context("empty export")?;
    assert!(header.starts_with("canonical_id,raw_id,store_id"));
    assert!(header.ends_with("persona"));
    // Cardinality of the raw feed is preserved, invalid identifier included
    assert_eq!(lines.count(), 6);

    let report = env.json("quality_report.json")?;
    assert_eq!(report["total_transactions"], 6);
    assert_eq!(report["matched_transactions"], 3);
    assert_eq!(report["unmatched_transactions"], 3);
    assert_eq!(report["invalid_identifiers"], 1);
    assert_eq!(report["malformed_payloads"], 1);
    assert_eq!(report["override_applied"], 1);
    assert_eq!(report["override_rejected"], 1);

    let run = env.json("run_results.json")?;
    assert_eq!(run["success"], true);
    assert_eq!(run["row_count"], 6);
    Ok(())
}

#[test]
fn test_run_scores_personas() -> Result<()> {
    let env = ConcordTestEnv::new()?;
    env.concord().arg("run").assert().success();

    let scores = env.json("persona_scores.json")?;
    let scores = scores.as_array().context("persona scores must be a list")?;
    assert_eq!(scores.len(), 6);

    let by_id = |id: &str| {
        scores
            .iter()
            .find(|s| s["canonical_id"] == id)
            .cloned()
            .with_context(|| format!("no score for {id}"))
    };

    let parent = by_id("tx1005")?;
    assert_eq!(parent["label"], "Parent");
    assert_eq!(parent["source"], "explicit");

    let student = by_id("tx1001")?;
    assert_eq!(student["label"], "Student");
    assert_eq!(student["source"], "scored");
    Ok(())
}

#[test]
fn test_second_run_republishes_wholesale() -> Result<()> {
    let env = ConcordTestEnv::new()?;
    env.concord().arg("run").assert().success();
    let first = fs::read_to_string(env.target("canonical_transactions.csv"))?;

    env.concord().arg("run").assert().success();
    let second = fs::read_to_string(env.target("canonical_transactions.csv"))?;

    assert_eq!(first, second);
    let run = env.json("run_results.json")?;
    assert_eq!(run["previous_row_count"], 6);
    Ok(())
}

#[test]
fn test_contract_violation_aborts_publication() -> Result<()> {
    let env = ConcordTestEnv::new()?;
    fs::write(
        env.root.join("config/contract.yml"),
        "columns:\n  - { name: canonical_id, type: VARCHAR }\n  - { name: store_id, type: VARCHAR }\n",
    )?;

    env.concord()
        .arg("run")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("CRITICAL PIPELINE ERROR"));

    assert!(!env.target("canonical_transactions.csv").exists());
    assert!(!env.target("quality_report.json").exists());
    Ok(())
}

#[test]
fn test_report_renders_last_run() -> Result<()> {
    let env = ConcordTestEnv::new()?;

    env.concord().arg("report").assert().failure();

    env.concord().arg("run").assert().success();
    env.concord()
        .arg("report")
        .assert()
        .success()
        .stdout(predicate::str::contains("Completeness score"))
        .stdout(predicate::str::contains("canonical_id"));
    Ok(())
}

#[test]
fn test_clean_removes_artefacts() -> Result<()> {
    let env = ConcordTestEnv::new()?;
    env.concord().arg("run").assert().success();
    assert!(env.root.join("target").exists());

    env.concord().arg("clean").assert().success();
    assert!(!env.root.join("target").exists());
    assert!(!env.root.join("concord.duckdb").exists());
    Ok(())
}

#[test]
fn test_normalize_prints_canonical_form() -> Result<()> {
    let env = ConcordTestEnv::new()?;

    env.concord()
        .args(["normalize", "AB-12", "Ab_12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AB-12\tab12"))
        .stdout(predicate::str::contains("Ab_12\tab12"));

    env.concord().args(["normalize", "  "]).assert().failure();
    Ok(())
}
