//! Shipyard Core Library
//!
//! The continuous-build pipeline: commit enumeration and version
//! assignment, unbuilt-suffix resolution against the destination
//! directory, toolchain invocation with log capture, per-version artifact
//! packaging, archiving, and the polling loop that ties them together.

pub mod archive;
pub mod error;
pub mod git;
pub mod history;
pub mod manifest;
pub mod orchestrator;
pub mod package;
pub mod poller;
pub mod resolve;
pub mod telemetry;
pub mod toolchain;

pub use archive::{archive_file_name, archive_version, finalize_record, BUILD_LOG_NAME};
pub use error::{Result, ShipyardError};
pub use git::WorkingRepo;
pub use history::{list_commits, version_of, versioned_chain, Commit, VersionedCommit};
pub use manifest::{FileRules, Manifest, Platform, ProductSpec, SourceRoot};
pub use orchestrator::{BuildOrchestrator, PassSummary};
pub use package::{PackageFailure, PackageReport, Packager};
pub use poller::Poller;
pub use resolve::{unbuilt_suffix, DestinationIndex};
pub use telemetry::init_tracing;
pub use toolchain::{render_build_log, StepOutput, ToolchainRunner, LOG_DELIMITER};

/// Shipyard version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
