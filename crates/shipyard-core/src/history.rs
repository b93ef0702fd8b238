//! Commit enumeration and version assignment.
//!
//! A commit's version is its 1-based ordinal along the first-parent chain:
//! the count of first-parent ancestors including itself. Merge side-branches
//! never receive versions, so the version axis stays linear even on
//! repositories with merges.

use crate::error::{Result, ShipyardError};
use crate::git::WorkingRepo;

/// An immutable commit identifier on the tracked branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit(String);

impl Commit {
    pub fn new(sha: impl Into<String>) -> Self {
        Self(sha.into())
    }

    pub fn sha(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Commit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A commit paired with its resolved version number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedCommit {
    pub commit: Commit,
    pub version: u64,
}

/// List the first-parent chain from HEAD, oldest first.
///
/// Fails with [`ShipyardError::Repository`] when no commits are reachable.
pub fn list_commits(repo: &WorkingRepo) -> Result<Vec<Commit>> {
    let output = repo.git(&["rev-list", "--first-parent", "HEAD"])?;
    let mut commits: Vec<Commit> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Commit::new)
        .collect();
    if commits.is_empty() {
        return Err(ShipyardError::Repository(
            "no commits reachable from HEAD".to_string(),
        ));
    }
    // rev-list emits newest first.
    commits.reverse();
    Ok(commits)
}

/// Count of first-parent ancestors of `commit`, inclusive. 1-based.
pub fn version_of(repo: &WorkingRepo, commit: &Commit) -> Result<u64> {
    let output = repo.git(&["rev-list", "--count", "--first-parent", commit.sha()])?;
    output.parse::<u64>().map_err(|e| {
        ShipyardError::Repository(format!(
            "unparseable commit count for {}: {e}",
            commit.sha()
        ))
    })
}

/// The full first-parent chain with versions attached, oldest first.
///
/// Verifies the density invariant while building: the commit at position
/// `i` must carry version `i + 1`. A gap or duplicate means first-parent
/// history was altered underneath us, and building on top of it would
/// produce overlapping build records.
pub fn versioned_chain(repo: &WorkingRepo) -> Result<Vec<VersionedCommit>> {
    let commits = list_commits(repo)?;
    let mut chain = Vec::with_capacity(commits.len());
    for (position, commit) in commits.into_iter().enumerate() {
        let version = version_of(repo, &commit)?;
        let expected = position as u64 + 1;
        if version != expected {
            return Err(ShipyardError::VersionResolution(format!(
                "commit {} has version {version}, expected {expected}; \
                 first-parent history is no longer dense",
                commit.sha()
            )));
        }
        chain.push(VersionedCommit { commit, version });
    }
    Ok(chain)
}
