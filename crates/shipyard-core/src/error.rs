//! Error taxonomy for the Shipyard build pipeline.
//!
//! Toolchain failures are deliberately absent: a non-zero exit from the
//! external configure/build scripts is recorded in the build log, never
//! raised. Packaging failures travel in a [`crate::package::PackageReport`].

/// Shipyard pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum ShipyardError {
    #[error("repository error: {0}")]
    Repository(String),

    #[error("version resolution error: {0}")]
    VersionResolution(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Shipyard pipeline operations.
pub type Result<T> = std::result::Result<T, ShipyardError>;
