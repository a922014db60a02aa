//! Push the published artifact to a git remote
//!
//! Shells out to the `git` binary. Only the artifact files are staged and
//! committed; when staging produces no diff the commit and push are skipped.

use crate::error::{SheetError, SheetResult};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info};

/// What a sync run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Committed and pushed to `remote`
    Pushed { commit: String, remote: String },
    /// The files matched HEAD already
    NoChanges,
}

pub struct GitSync {
    repo_dir: PathBuf,
}

impl GitSync {
    pub fn new<P: AsRef<Path>>(repo_dir: P) -> Self {
        Self {
            repo_dir: repo_dir.as_ref().to_path_buf(),
        }
    }

    /// Stage `files`, commit them when they changed, and push
    pub fn publish(&self, files: &[PathBuf], message: &str) -> SheetResult<SyncOutcome> {
        self.ensure_work_tree()?;
        let remote = self.first_remote()?;

        let paths = files
            .iter()
            .map(|f| {
                f.canonicalize().map_err(|e| {
                    SheetError::Git(format!("Cannot stage {}: {}", f.display(), e))
                })
            })
            .collect::<SheetResult<Vec<PathBuf>>>()?;

        let mut add = vec!["add".to_string(), "--".to_string()];
        add.extend(paths.iter().map(|p| p.display().to_string()));
        self.git_checked(&add)?;

        if !self.has_staged_changes(&paths)? {
            info!("no changes in published files, skipping commit");
            return Ok(SyncOutcome::NoChanges);
        }

        let mut commit = vec![
            "commit".to_string(),
            "-m".to_string(),
            message.to_string(),
            "--".to_string(),
        ];
        commit.extend(paths.iter().map(|p| p.display().to_string()));
        self.git_checked(&commit)?;

        let head = self.git_checked(&["rev-parse", "--short", "HEAD"])?;
        let head = String::from_utf8_lossy(&head.stdout).trim().to_string();

        info!("pushing {} to {}", head, remote);
        self.git_checked(&["push", remote.as_str(), "HEAD"])?;

        Ok(SyncOutcome::Pushed {
            commit: head,
            remote,
        })
    }

    fn ensure_work_tree(&self) -> SheetResult<()> {
        let output = self.git(&["rev-parse", "--is-inside-work-tree"])?;
        if output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true" {
            Ok(())
        } else {
            Err(SheetError::Git(format!(
                "{} is not inside a git work tree",
                self.repo_dir.display()
            )))
        }
    }

    /// Name of the first configured remote
    fn first_remote(&self) -> SheetResult<String> {
        let output = self.git_checked(&["remote"])?;
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                SheetError::Git(format!(
                    "no remote configured in {}",
                    self.repo_dir.display()
                ))
            })
    }

    /// `git diff --cached --quiet` exits 1 when there is a staged diff
    fn has_staged_changes(&self, paths: &[PathBuf]) -> SheetResult<bool> {
        let mut args: Vec<String> = ["diff", "--cached", "--quiet", "--"]
            .iter()
            .map(|a| a.to_string())
            .collect();
        args.extend(paths.iter().map(|p| p.display().to_string()));
        let output = self.git(&args)?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(git_failure(&args, &output)),
        }
    }

    fn git<S: AsRef<str>>(&self, args: &[S]) -> SheetResult<Output> {
        debug!("git {}", join_args(args));
        Command::new("git")
            .args(args.iter().map(AsRef::<str>::as_ref))
            .current_dir(&self.repo_dir)
            .output()
            .map_err(|e| SheetError::Git(format!("Failed to run git: {}", e)))
    }

    fn git_checked<S: AsRef<str>>(&self, args: &[S]) -> SheetResult<Output> {
        let output = self.git(args)?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(git_failure(args, &output))
        }
    }
}

fn join_args<S: AsRef<str>>(args: &[S]) -> String {
    args.iter().map(AsRef::<str>::as_ref).collect::<Vec<&str>>().join(" ")
}

fn git_failure<S: AsRef<str>>(args: &[S], output: &Output) -> SheetError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    SheetError::Git(format!(
        "`git {}` failed ({}): {}",
        args.first().map(AsRef::<str>::as_ref).unwrap_or(""),
        output.status,
        stderr.trim()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_outside_work_tree_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("latest.csv");
        std::fs::write(&file, "a\n1\n").unwrap();

        let result = GitSync::new(dir.path()).publish(&[file], "Publish");
        assert!(matches!(result, Err(SheetError::Git(_))));
    }
}
