//! Per-version artifact packaging.
//!
//! Assembles `<destination>/<version>/` from the manifest's product lines:
//! each application's directory is copied with the extension rules applied,
//! subdirectories are copied verbatim, and each product's release libraries
//! land flat in a shared `Libraries` directory. Packaging is best-effort,
//! but never silent: every file that fails to copy is recorded in the
//! [`PackageReport`] so the caller can log it before archiving whatever was
//! copied.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::manifest::{Manifest, Platform, ProductSpec};

/// Directory under a product source root holding application trees.
const APPLICATIONS_DIR: &str = "Applications";

/// Subdirectory of an application that holds its distributable files.
const APPLICATION_SUBDIR: &str = "Application";

/// Shared library directory name inside a version tree.
const LIBRARIES_DIR: &str = "Libraries";

/// One file or directory that could not be copied.
#[derive(Debug)]
pub struct PackageFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Aggregated outcome of packaging one version.
#[derive(Debug, Default)]
pub struct PackageReport {
    /// Files copied successfully.
    pub copied: usize,

    /// Individual copy failures; packaging continued past these.
    pub failures: Vec<PackageFailure>,

    /// Set when a structural error (unreadable application directory,
    /// uncreatable destination) aborted the remaining packaging actions.
    pub aborted: Option<String>,
}

impl PackageReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.aborted.is_none()
    }

    fn fail(&mut self, path: &Path, error: impl std::fmt::Display) {
        self.failures.push(PackageFailure {
            path: path.to_path_buf(),
            error: error.to_string(),
        });
    }

    fn abort(&mut self, message: impl Into<String>) {
        self.aborted = Some(message.into());
    }
}

/// Copies the files relevant to the target platform into a version tree.
pub struct Packager<'a> {
    manifest: &'a Manifest,
    platform: Platform,
}

impl<'a> Packager<'a> {
    pub fn new(manifest: &'a Manifest, platform: Platform) -> Self {
        Self { manifest, platform }
    }

    /// Assemble the full version tree: every product line in manifest
    /// order, then the top-level setup and operational files.
    pub fn package_version(
        &self,
        version_dir: &Path,
        working_dir: &Path,
        dependencies_dir: &Path,
    ) -> PackageReport {
        let mut report = PackageReport::default();
        for product in &self.manifest.products {
            self.package_product(product, version_dir, working_dir, dependencies_dir, &mut report);
            if report.aborted.is_some() {
                return report;
            }
        }
        self.copy_operational_files(working_dir, version_dir, &mut report);
        report
    }

    fn package_product(
        &self,
        product: &ProductSpec,
        version_dir: &Path,
        working_dir: &Path,
        dependencies_dir: &Path,
        report: &mut PackageReport,
    ) {
        let source_root = product.source.resolve(working_dir, dependencies_dir);
        for application in product.applications_for(self.platform) {
            let app_source = source_root
                .join(APPLICATIONS_DIR)
                .join(application)
                .join(APPLICATION_SUBDIR);
            let app_dest = version_dir.join(application);
            if let Err(e) = std::fs::create_dir_all(&app_dest) {
                report.abort(format!("cannot create {}: {e}", app_dest.display()));
                return;
            }
            if let Err(e) = self.copy_application(&app_source, &app_dest, report) {
                report.abort(format!("cannot read {}: {e}", app_source.display()));
                return;
            }
        }
        self.copy_libraries(&source_root.join(product.name.as_str()), version_dir, report);
    }

    /// Copy one application directory: subdirectories verbatim, files only
    /// when the extension table admits them for this platform.
    fn copy_application(
        &self,
        app_source: &Path,
        app_dest: &Path,
        report: &mut PackageReport,
    ) -> std::io::Result<()> {
        for entry in std::fs::read_dir(app_source)? {
            let entry = entry?;
            let source = entry.path();
            let dest = app_dest.join(entry.file_name());
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                copy_dir_recursive(&source, &dest, report);
                continue;
            }
            if !file_type.is_file() {
                continue;
            }
            if self
                .manifest
                .rules
                .includes(extension_of(&source), self.platform)
            {
                match std::fs::copy(&source, &dest) {
                    Ok(_) => report.copied += 1,
                    Err(e) => report.fail(&source, e),
                }
            }
        }
        Ok(())
    }

    /// Flat, unfiltered copy of `<product>/Libraries/Release` into the
    /// shared version-level `Libraries` directory.
    fn copy_libraries(&self, product_root: &Path, version_dir: &Path, report: &mut PackageReport) {
        let source = product_root.join(LIBRARIES_DIR).join("Release");
        let dest = version_dir.join(LIBRARIES_DIR);
        if let Err(e) = std::fs::create_dir_all(&dest) {
            report.abort(format!("cannot create {}: {e}", dest.display()));
            return;
        }
        let entries = match std::fs::read_dir(&source) {
            Ok(entries) => entries,
            Err(e) => {
                report.abort(format!("cannot read {}: {e}", source.display()));
                return;
            }
        };
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    report.fail(&source, e);
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match std::fs::copy(&path, dest.join(entry.file_name())) {
                Ok(_) => report.copied += 1,
                Err(e) => report.fail(&path, e),
            }
        }
    }

    /// Top-level setup files (all platforms) and operational scripts
    /// (Unix only), copied from the working copy's `Applications` dir into
    /// the version root.
    fn copy_operational_files(
        &self,
        working_dir: &Path,
        version_dir: &Path,
        report: &mut PackageReport,
    ) {
        let scripts_dir = working_dir.join(APPLICATIONS_DIR);
        let mut names: Vec<&str> = self.manifest.setup_files.iter().map(String::as_str).collect();
        if self.platform == Platform::Unix {
            names.extend(self.manifest.unix_scripts.iter().map(String::as_str));
        }
        for name in names {
            let source = scripts_dir.join(name);
            match std::fs::copy(&source, version_dir.join(name)) {
                Ok(_) => report.copied += 1,
                Err(e) => report.fail(&source, e),
            }
        }
    }
}

fn extension_of(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}

/// Recursively copy a directory tree verbatim, recording failures per
/// entry rather than stopping at the first one.
fn copy_dir_recursive(source: &Path, dest: &Path, report: &mut PackageReport) {
    for entry in WalkDir::new(source) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.fail(source, e);
                continue;
            }
        };
        let relative = match entry.path().strip_prefix(source) {
            Ok(relative) => relative,
            Err(e) => {
                report.fail(entry.path(), e);
                continue;
            }
        };
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            if let Err(e) = std::fs::create_dir_all(&target) {
                report.fail(entry.path(), e);
            }
        } else if entry.file_type().is_file() {
            match std::fs::copy(entry.path(), &target) {
                Ok(_) => report.copied += 1,
                Err(e) => report.fail(entry.path(), e),
            }
        }
    }
}
