//! Working-clone operations over the `git` binary.
//!
//! The daemon owns a single local clone of the tracked repository and
//! mutates it explicitly through [`WorkingRepo::sync`] and
//! [`WorkingRepo::checkout`]. All operations shell out to `git`; a failed
//! invocation surfaces its stderr in the error message.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Result, ShipyardError};

/// An exclusively owned local clone of the tracked repository.
#[derive(Debug)]
pub struct WorkingRepo {
    root: PathBuf,
}

impl WorkingRepo {
    /// Clone `remote` into `root`, destroying any pre-existing directory at
    /// that location first. The daemon always starts from a fresh clone.
    pub fn clone_from(remote: &str, root: &Path) -> Result<Self> {
        if root.exists() {
            std::fs::remove_dir_all(root)?;
        }
        let root_arg = root.to_string_lossy().into_owned();
        run_git(None, &["clone", remote, &root_arg])?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Open an existing clone without touching it. Fails if `root` is not
    /// inside a git work tree.
    pub fn open(root: &Path) -> Result<Self> {
        run_git(Some(root), &["rev-parse", "--is-inside-work-tree"])?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Root directory of the working clone.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check out a branch or commit.
    pub fn checkout(&self, rev: &str) -> Result<()> {
        self.git(&["checkout", rev]).map(|_| ())
    }

    /// Fast-forward the current branch from its remote.
    pub fn pull(&self) -> Result<()> {
        self.git(&["pull"]).map(|_| ())
    }

    /// Re-sync the tracked branch: check it out, then pull.
    pub fn sync(&self, branch: &str) -> Result<()> {
        self.checkout(branch)?;
        self.pull()
    }

    /// Run a git subcommand in the clone and return its trimmed stdout.
    pub(crate) fn git(&self, args: &[&str]) -> Result<String> {
        run_git(Some(&self.root), args)
    }
}

fn run_git(cwd: Option<&Path>, args: &[&str]) -> Result<String> {
    let mut command = Command::new("git");
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    let output = command
        .output()
        .map_err(|e| ShipyardError::Repository(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ShipyardError::Repository(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::path::Path;
    use std::process::Command;

    pub fn run_git(repo_dir: &Path, args: &[&str]) {
        let output = Command::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    /// Create a temp repository with a single empty commit on `master`.
    pub fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init", "-b", "master"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["commit", "--allow-empty", "-m", "initial"]);
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::{make_git_repo, run_git};
    use super::*;

    #[test]
    fn open_succeeds_inside_repo() {
        let repo = make_git_repo();
        assert!(WorkingRepo::open(repo.path()).is_ok());
    }

    #[test]
    fn open_fails_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        assert!(WorkingRepo::open(dir.path()).is_err());
    }

    #[test]
    fn clone_from_local_remote() {
        let upstream = make_git_repo();
        let workdir = tempfile::tempdir().unwrap();
        let root = workdir.path().join("checkout");
        let remote = upstream.path().to_string_lossy().into_owned();

        let repo = WorkingRepo::clone_from(&remote, &root).unwrap();
        assert!(repo.root().join(".git").exists());
    }

    #[test]
    fn clone_from_destroys_stale_checkout() {
        let upstream = make_git_repo();
        let workdir = tempfile::tempdir().unwrap();
        let root = workdir.path().join("checkout");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("stale.txt"), "leftover").unwrap();
        let remote = upstream.path().to_string_lossy().into_owned();

        let repo = WorkingRepo::clone_from(&remote, &root).unwrap();
        assert!(!repo.root().join("stale.txt").exists());
    }

    #[test]
    fn checkout_moves_head() {
        let upstream = make_git_repo();
        run_git(
            upstream.path(),
            &["commit", "--allow-empty", "-m", "second"],
        );
        let workdir = tempfile::tempdir().unwrap();
        let root = workdir.path().join("checkout");
        let remote = upstream.path().to_string_lossy().into_owned();
        let repo = WorkingRepo::clone_from(&remote, &root).unwrap();

        let first = repo.git(&["rev-list", "--max-parents=0", "HEAD"]).unwrap();
        repo.checkout(&first).unwrap();
        let head = repo.git(&["rev-parse", "HEAD"]).unwrap();
        assert_eq!(head, first);
    }

    #[test]
    fn sync_returns_to_branch_tip() {
        let upstream = make_git_repo();
        let workdir = tempfile::tempdir().unwrap();
        let root = workdir.path().join("checkout");
        let remote = upstream.path().to_string_lossy().into_owned();
        let repo = WorkingRepo::clone_from(&remote, &root).unwrap();

        run_git(
            upstream.path(),
            &["commit", "--allow-empty", "-m", "second"],
        );
        repo.sync("master").unwrap();
        let local = repo.git(&["rev-parse", "HEAD"]).unwrap();
        let output = std::process::Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(upstream.path())
            .output()
            .unwrap();
        let upstream_head = String::from_utf8_lossy(&output.stdout).trim().to_string();
        assert_eq!(local, upstream_head);
    }
}
