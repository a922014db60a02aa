//! Git sync against a throwaway bare remote; skipped when git is missing

use sheetcast::config::PublishConfig;
use sheetcast::publish::emit;
use sheetcast::sync::{GitSync, SyncOutcome};
use sheetcast::types::{CellValue, RowRecord, SheetExtract};
use sheetcast::SheetError;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Work tree with one commit, optionally wired to a bare `origin`
fn work_tree(root: &TempDir, with_remote: bool) -> std::path::PathBuf {
    let work = root.path().join("work");
    fs::create_dir_all(&work).unwrap();
    git(&work, &["init", "-q"]);
    git(&work, &["config", "user.email", "publisher@example.com"]);
    git(&work, &["config", "user.name", "Publisher"]);
    git(&work, &["config", "commit.gpgsign", "false"]);
    fs::write(work.join("README.md"), "board\n").unwrap();
    git(&work, &["add", "README.md"]);
    git(&work, &["commit", "-q", "-m", "init"]);

    if with_remote {
        let remote = root.path().join("remote.git");
        git(root.path(), &["init", "-q", "--bare", remote.to_str().unwrap()]);
        git(&work, &["remote", "add", "origin", remote.to_str().unwrap()]);
    }
    work
}

fn extract() -> SheetExtract {
    let mut row = RowRecord::new();
    row.push("Event #", CellValue::Int(101));
    row.push("Win%", CellValue::Float(0.55));
    SheetExtract {
        header_row: 1,
        columns: vec!["Event #".to_string(), "Win%".to_string()],
        rows: vec![row],
        ..Default::default()
    }
}

fn config(work: &Path) -> PublishConfig {
    PublishConfig {
        output: work.join("data/latest.csv"),
        timestamp_path: work.join("data/updated_at.txt"),
        sync: true,
        repo_dir: work.to_path_buf(),
        ..Default::default()
    }
}

#[test]
fn test_publish_commits_and_pushes() {
    if !git_available() {
        return;
    }
    let root = TempDir::new().unwrap();
    let work = work_tree(&root, true);

    let report = emit(extract(), &config(&work)).unwrap();

    let Some(SyncOutcome::Pushed { commit, remote }) = report.sync else {
        panic!("expected a push");
    };
    assert_eq!(remote, "origin");
    assert!(!commit.is_empty());

    let remote_log = git(&root.path().join("remote.git"), &["log", "--oneline", "-1"]);
    assert!(remote_log.contains(&commit));
    assert!(remote_log.contains("Publish"));

    let files = git(&work, &["show", "--name-only", "--format=", "HEAD"]);
    assert!(files.contains("data/latest.csv"));
    assert!(files.contains("data/updated_at.txt"));
}

#[test]
fn test_unchanged_files_skip_commit() {
    if !git_available() {
        return;
    }
    let root = TempDir::new().unwrap();
    let work = work_tree(&root, true);
    emit(extract(), &config(&work)).unwrap();
    let head = git(&work, &["rev-parse", "HEAD"]);

    let outcome = GitSync::new(&work)
        .publish(&[work.join("data/latest.csv")], "Publish again")
        .unwrap();

    assert_eq!(outcome, SyncOutcome::NoChanges);
    assert_eq!(git(&work, &["rev-parse", "HEAD"]), head);
}

#[test]
fn test_other_changes_stay_out_of_the_commit() {
    if !git_available() {
        return;
    }
    let root = TempDir::new().unwrap();
    let work = work_tree(&root, true);
    fs::write(work.join("README.md"), "edited\n").unwrap();
    git(&work, &["add", "README.md"]);

    emit(extract(), &config(&work)).unwrap();

    let files = git(&work, &["show", "--name-only", "--format=", "HEAD"]);
    assert!(!files.contains("README.md"));
    // Still staged, not committed
    let staged = git(&work, &["diff", "--cached", "--name-only"]);
    assert!(staged.contains("README.md"));
}

#[test]
fn test_missing_remote_is_an_error() {
    if !git_available() {
        return;
    }
    let root = TempDir::new().unwrap();
    let work = work_tree(&root, false);

    let result = emit(extract(), &config(&work));
    assert!(matches!(result, Err(SheetError::Git(msg)) if msg.contains("no remote")));
    // The artifact is written before the sync step
    assert!(work.join("data/latest.csv").exists());
}
