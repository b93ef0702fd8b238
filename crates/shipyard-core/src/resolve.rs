//! Version resolution: which commits still need building.
//!
//! The destination directory is the only persistent record of what has been
//! built. Its integer-named subdirectories form the [`DestinationIndex`];
//! everything newer than the newest commit whose version appears in the
//! index is the unbuilt suffix.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{Result, ShipyardError};
use crate::history::VersionedCommit;

/// The set of version numbers already present in the output path.
#[derive(Debug, Clone, Default)]
pub struct DestinationIndex {
    versions: BTreeSet<u64>,
}

impl DestinationIndex {
    /// Read the index fresh from the destination root. Only subdirectories
    /// whose names parse as integers count; files and other entries are
    /// ignored.
    pub fn read(destination: &Path) -> Result<Self> {
        let mut versions = BTreeSet::new();
        for entry in std::fs::read_dir(destination)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(version) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u64>().ok())
            {
                versions.insert(version);
            }
        }
        Ok(Self { versions })
    }

    #[cfg(test)]
    pub(crate) fn from_versions(versions: impl IntoIterator<Item = u64>) -> Self {
        Self {
            versions: versions.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn contains(&self, version: u64) -> bool {
        self.versions.contains(&version)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Highest built version, if any.
    pub fn newest(&self) -> Option<u64> {
        self.versions.iter().next_back().copied()
    }
}

/// Narrow the full chain to the commits that still need building,
/// oldest first.
///
/// With an empty index the daemon bootstraps from the repository root: the
/// suffix is the single oldest commit, not the whole history. Otherwise the
/// newest commit whose version appears in the index marks the boundary, and
/// everything strictly newer is returned.
///
/// When the index is non-empty but no commit's version appears in it (for
/// example after a history rewrite or a destination populated by a
/// different branch), resolution fails rather than guessing between a full
/// rebuild and skipping everything.
pub fn unbuilt_suffix<'a>(
    chain: &'a [VersionedCommit],
    index: &DestinationIndex,
) -> Result<&'a [VersionedCommit]> {
    if chain.is_empty() {
        return Ok(chain);
    }
    if index.is_empty() {
        return Ok(&chain[..1]);
    }
    for position in (0..chain.len()).rev() {
        if index.contains(chain[position].version) {
            return Ok(&chain[position + 1..]);
        }
    }
    Err(ShipyardError::VersionResolution(format!(
        "destination holds {} built version(s) but none match a commit on \
         the tracked branch; refusing to rebuild or skip",
        index.len()
    )))
}
