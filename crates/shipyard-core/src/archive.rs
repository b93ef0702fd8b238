//! Version-tree archiving and build-record finalization.
//!
//! A packaged version tree is wrapped into one compressed archive whose
//! internal paths are relative to the tree root: `.tar.gz` on Unix, `.zip`
//! on Windows, matching the unpacking tooling native to each platform.
//! Finalization then replaces the raw tree with a minimal directory holding
//! exactly the build log and the archive. Ordering matters: the tree is
//! archived in full before truncation, and the log is written after, so the
//! log is never inside the archive.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{Result, ShipyardError};
use crate::manifest::Platform;

/// File name of the embedded build log inside a finalized record.
pub const BUILD_LOG_NAME: &str = "build.log";

/// Archive the full recursive contents of `version_dir` into
/// `archive_path`, format chosen by `platform`.
pub fn archive_version(version_dir: &Path, archive_path: &Path, platform: Platform) -> Result<()> {
    match platform {
        Platform::Unix => make_tarball(version_dir, archive_path),
        Platform::Windows => make_zip(version_dir, archive_path),
    }
    .map_err(|e| {
        ShipyardError::Archive(format!(
            "failed to archive {} into {}: {e}",
            version_dir.display(),
            archive_path.display()
        ))
    })
}

/// Replace the raw version tree with the finalized build record:
/// delete and recreate `version_dir`, write the build log into it, then
/// move the archive in. A finalized record contains exactly those two
/// entries.
pub fn finalize_record(version_dir: &Path, archive_path: &Path, log: &[u8]) -> Result<()> {
    std::fs::remove_dir_all(version_dir)?;
    std::fs::create_dir_all(version_dir)?;
    std::fs::write(version_dir.join(BUILD_LOG_NAME), log)?;

    let archive_name = archive_path.file_name().ok_or_else(|| {
        ShipyardError::Archive(format!("archive path has no file name: {}", archive_path.display()))
    })?;
    std::fs::rename(archive_path, version_dir.join(archive_name))?;
    Ok(())
}

/// Archive file name for one version: `<prefix>-<version>.<ext>`.
pub fn archive_file_name(prefix: &str, version: u64, platform: Platform) -> PathBuf {
    PathBuf::from(format!("{prefix}-{version}.{}", platform.archive_ext()))
}

fn make_tarball(source: &Path, dest: &Path) -> std::io::Result<()> {
    let file = File::create(dest)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let name = PathBuf::from(entry.file_name());
        if entry.file_type()?.is_dir() {
            builder.append_dir_all(&name, entry.path())?;
        } else {
            builder.append_path_with_name(entry.path(), &name)?;
        }
    }
    builder.into_inner()?.finish()?.flush()?;
    Ok(())
}

fn make_zip(source: &Path, dest: &Path) -> std::io::Result<()> {
    let file = File::create(dest)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for entry in WalkDir::new(source) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(std::io::Error::other)?;
        // Zip member names always use forward slashes.
        let member = relative.to_string_lossy().replace('\\', "/");
        writer.start_file(member, options).map_err(std::io::Error::other)?;
        let mut input = File::open(entry.path())?;
        std::io::copy(&mut input, &mut writer)?;
    }
    writer.finish().map_err(std::io::Error::other)?;
    Ok(())
}
