//! One build pass: resolve the unbuilt suffix and drive each commit
//! through checkout, toolchain, packaging, and archiving.
//!
//! The orchestrator exclusively owns the working clone and the destination
//! directory while a pass runs. Commits are processed strictly oldest to
//! newest, one at a time; a commit whose build fails still produces a
//! finalized record, with the failure visible only in its build log.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::archive::{archive_file_name, archive_version, finalize_record};
use crate::error::Result;
use crate::git::WorkingRepo;
use crate::history::{versioned_chain, VersionedCommit};
use crate::manifest::{Manifest, Platform};
use crate::package::Packager;
use crate::resolve::{unbuilt_suffix, DestinationIndex};
use crate::toolchain::{render_build_log, ToolchainRunner};

/// Outcome of one orchestrator pass.
#[derive(Debug, Default)]
pub struct PassSummary {
    /// Versions finalized during this pass, in build order.
    pub built: Vec<u64>,
}

/// Drives the build pipeline over the unbuilt commit suffix.
pub struct BuildOrchestrator {
    repo: WorkingRepo,
    destination: PathBuf,
    dependencies_dir: PathBuf,
    manifest: Manifest,
    platform: Platform,
    toolchain: ToolchainRunner,
}

impl BuildOrchestrator {
    pub fn new(
        repo: WorkingRepo,
        destination: PathBuf,
        dependencies_dir: PathBuf,
        manifest: Manifest,
        platform: Platform,
        step_timeout: Option<Duration>,
    ) -> Self {
        let toolchain = ToolchainRunner::new(dependencies_dir.clone(), step_timeout);
        Self {
            repo,
            destination,
            dependencies_dir,
            manifest,
            platform,
            toolchain,
        }
    }

    /// The working clone, for branch syncs between passes.
    pub fn repo(&self) -> &WorkingRepo {
        &self.repo
    }

    /// Run one pass over everything currently unbuilt.
    ///
    /// Version-resolution failures halt the pass; per-commit failures are
    /// logged and the pass continues with the next commit.
    pub async fn run_pass(&self) -> Result<PassSummary> {
        let chain = versioned_chain(&self.repo)?;
        let index = DestinationIndex::read(&self.destination)?;
        let suffix = unbuilt_suffix(&chain, &index)?;

        if suffix.is_empty() {
            debug!("destination is up to date, nothing to build");
            return Ok(PassSummary::default());
        }
        info!(pending = suffix.len(), "commits awaiting build");

        let mut summary = PassSummary::default();
        for candidate in suffix {
            match self.build_one(candidate).await {
                Ok(()) => summary.built.push(candidate.version),
                Err(e) => {
                    error!(
                        version = candidate.version,
                        commit = candidate.commit.sha(),
                        error = %e,
                        "failed to produce build record, continuing with next commit"
                    );
                }
            }
        }
        Ok(summary)
    }

    async fn build_one(&self, candidate: &VersionedCommit) -> Result<()> {
        info!(
            version = candidate.version,
            commit = candidate.commit.sha(),
            "building"
        );

        // The checkout is reused between commits rather than cloned fresh,
        // so toolchain caches survive from one build to the next.
        self.repo.checkout(candidate.commit.sha())?;

        let steps = self.toolchain.run(self.repo.root(), self.platform).await;
        for step in &steps {
            if step.exit_code != 0 {
                warn!(
                    version = candidate.version,
                    step = %step.step,
                    exit_code = step.exit_code,
                    "toolchain step failed, packaging anyway"
                );
            }
        }
        let log = render_build_log(&steps);

        let version_dir = self.destination.join(candidate.version.to_string());
        std::fs::create_dir_all(&version_dir)?;

        let packager = Packager::new(&self.manifest, self.platform);
        let report =
            packager.package_version(&version_dir, self.repo.root(), &self.dependencies_dir);
        if let Some(reason) = &report.aborted {
            warn!(version = candidate.version, reason = %reason, "packaging aborted early");
        }
        for failure in &report.failures {
            warn!(
                version = candidate.version,
                path = %failure.path.display(),
                error = %failure.error,
                "file skipped during packaging"
            );
        }

        let archive_path = self.destination.join(archive_file_name(
            &self.manifest.archive_prefix,
            candidate.version,
            self.platform,
        ));
        archive_version(&version_dir, &archive_path, self.platform)?;
        finalize_record(&version_dir, &archive_path, &log)?;

        info!(
            version = candidate.version,
            copied = report.copied,
            "build record finalized"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testutil::make_git_repo;

    #[tokio::test]
    async fn fully_built_destination_yields_empty_pass() {
        let upstream = make_git_repo();
        let workdir = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        // One commit, already recorded as version 1.
        std::fs::create_dir(dest.path().join("1")).unwrap();

        let remote = upstream.path().to_string_lossy().into_owned();
        let repo = WorkingRepo::clone_from(&remote, &workdir.path().join("checkout")).unwrap();
        let orchestrator = BuildOrchestrator::new(
            repo,
            dest.path().to_path_buf(),
            workdir.path().join("Dependencies"),
            Manifest::default(),
            Platform::Unix,
            None,
        );

        let summary = orchestrator.run_pass().await.unwrap();
        assert!(summary.built.is_empty());
    }

    #[tokio::test]
    async fn unmatchable_destination_halts_the_pass() {
        let upstream = make_git_repo();
        let workdir = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        // A built version far beyond the chain: nothing matches.
        std::fs::create_dir(dest.path().join("40")).unwrap();

        let remote = upstream.path().to_string_lossy().into_owned();
        let repo = WorkingRepo::clone_from(&remote, &workdir.path().join("checkout")).unwrap();
        let orchestrator = BuildOrchestrator::new(
            repo,
            dest.path().to_path_buf(),
            workdir.path().join("Dependencies"),
            Manifest::default(),
            Platform::Unix,
            None,
        );

        let err = orchestrator.run_pass().await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::ShipyardError::VersionResolution(_)
        ));
    }
}
