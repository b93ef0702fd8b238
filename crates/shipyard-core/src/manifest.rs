//! Packaging manifest: which applications ship, from where, and which
//! file kinds belong in a distributable.
//!
//! The manifest is static configuration. A built-in default covers the
//! standard deployment; `shipyardd --manifest <file.json>` substitutes a
//! site-specific one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Target platform for packaging and archive-format decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    /// The platform this process is running on.
    pub fn host() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    /// Extension of the toolchain entry scripts (`configure.*`, `build.*`).
    pub fn script_ext(&self) -> &'static str {
        match self {
            Platform::Windows => "bat",
            Platform::Unix => "sh",
        }
    }

    /// Archive format native to the platform's unpacking tooling.
    pub fn archive_ext(&self) -> &'static str {
        match self {
            Platform::Windows => "zip",
            Platform::Unix => "tar.gz",
        }
    }
}

/// Declarative file-extension table deciding what gets copied into an
/// application's distributable footprint. Extensions are stored without the
/// leading dot; the empty string matches extensionless files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRules {
    /// Copied on every platform (configuration and script sources).
    pub always: Vec<String>,

    /// Copied only when packaging for Windows.
    pub windows_only: Vec<String>,

    /// Copied only when packaging for Unix.
    pub unix_only: Vec<String>,
}

impl FileRules {
    /// Whether a file with `extension` belongs in the package for `platform`.
    pub fn includes(&self, extension: &str, platform: Platform) -> bool {
        if self.always.iter().any(|e| e == extension) {
            return true;
        }
        let exclusive = match platform {
            Platform::Windows => &self.windows_only,
            Platform::Unix => &self.unix_only,
        };
        exclusive.iter().any(|e| e == extension)
    }
}

impl Default for FileRules {
    fn default() -> Self {
        Self {
            always: vec!["py".into(), "yml".into()],
            windows_only: vec!["bat".into(), "exe".into()],
            unix_only: vec!["sh".into(), String::new()],
        }
    }
}

/// Where a product's source tree lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRoot {
    /// The working clone itself.
    WorkingCopy,

    /// A named subdirectory of the dependencies directory.
    Dependency(PathBuf),
}

impl SourceRoot {
    /// Resolve to a concrete path given the working clone and the
    /// dependencies directory.
    pub fn resolve(&self, working_dir: &Path, dependencies_dir: &Path) -> PathBuf {
        match self {
            SourceRoot::WorkingCopy => working_dir.to_path_buf(),
            SourceRoot::Dependency(sub) => dependencies_dir.join(sub),
        }
    }
}

/// One product line: a set of applications sharing a source root and a
/// release-library directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSpec {
    /// Product name; also the subdirectory holding `Libraries/Release`.
    pub name: String,

    /// Source tree the applications are packaged from.
    pub source: SourceRoot,

    /// Applications packaged on every platform.
    pub applications: Vec<String>,

    /// Applications packaged only on Windows (GUI frontends and the like).
    #[serde(default)]
    pub windows_only_applications: Vec<String>,
}

impl ProductSpec {
    /// Application names to package for `platform`, in manifest order.
    pub fn applications_for(&self, platform: Platform) -> impl Iterator<Item = &str> {
        let windows_only: &[String] = match platform {
            Platform::Windows => &self.windows_only_applications,
            Platform::Unix => &[],
        };
        self.applications
            .iter()
            .chain(windows_only)
            .map(String::as_str)
    }
}

/// Complete packaging configuration for one deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Prefix for archive file names (`<prefix>-<version>.tar.gz`).
    pub archive_prefix: String,

    /// Product lines packaged into each version, in order.
    pub products: Vec<ProductSpec>,

    /// File-extension rules applied to application directories.
    #[serde(default)]
    pub rules: FileRules,

    /// Files copied from the working copy's `Applications` directory into
    /// the version root on every platform.
    #[serde(default)]
    pub setup_files: Vec<String>,

    /// Operational scripts copied alongside, Unix only.
    #[serde(default)]
    pub unix_scripts: Vec<String>,
}

impl Manifest {
    /// Load a manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            archive_prefix: "quay".to_string(),
            products: vec![
                ProductSpec {
                    name: "Quay".to_string(),
                    source: SourceRoot::WorkingCopy,
                    applications: vec![
                        "AdministrationServer".to_string(),
                        "ChartingServer".to_string(),
                        "ComplianceServer".to_string(),
                        "DefinitionsServer".to_string(),
                        "MarketDataRelayServer".to_string(),
                        "MarketDataServer".to_string(),
                        "RiskServer".to_string(),
                        "SimulationOrderExecutionServer".to_string(),
                        "WebPortal".to_string(),
                    ],
                    windows_only_applications: vec!["Workstation".to_string()],
                },
                ProductSpec {
                    name: "Ballast".to_string(),
                    source: SourceRoot::Dependency(PathBuf::from("Ballast")),
                    applications: vec![
                        "AdminClient".to_string(),
                        "RegistryServer".to_string(),
                        "ServiceLocator".to_string(),
                        "UidServer".to_string(),
                    ],
                    windows_only_applications: Vec::new(),
                },
            ],
            rules: FileRules::default(),
            setup_files: vec!["setup.py".to_string()],
            unix_scripts: vec![
                "check.sh".to_string(),
                "copy_all.sh".to_string(),
                "start.sh".to_string(),
                "stop.sh".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_always_set_applies_everywhere() {
        let rules = FileRules::default();
        assert!(rules.includes("py", Platform::Windows));
        assert!(rules.includes("py", Platform::Unix));
        assert!(rules.includes("yml", Platform::Unix));
    }

    #[test]
    fn rules_platform_sets_are_exclusive() {
        let rules = FileRules::default();
        assert!(rules.includes("exe", Platform::Windows));
        assert!(!rules.includes("exe", Platform::Unix));
        assert!(rules.includes("sh", Platform::Unix));
        assert!(!rules.includes("sh", Platform::Windows));
        // Extensionless executables ship on Unix only.
        assert!(rules.includes("", Platform::Unix));
        assert!(!rules.includes("", Platform::Windows));
    }

    #[test]
    fn rules_reject_unlisted_extensions() {
        let rules = FileRules::default();
        assert!(!rules.includes("obj", Platform::Windows));
        assert!(!rules.includes("o", Platform::Unix));
    }

    #[test]
    fn windows_only_applications_filtered_by_platform() {
        let manifest = Manifest::default();
        let product = &manifest.products[0];
        let unix: Vec<&str> = product.applications_for(Platform::Unix).collect();
        let windows: Vec<&str> = product.applications_for(Platform::Windows).collect();
        assert!(!unix.contains(&"Workstation"));
        assert!(windows.contains(&"Workstation"));
        assert_eq!(windows.len(), unix.len() + 1);
    }

    #[test]
    fn source_root_resolution() {
        let working = Path::new("/work/checkout");
        let deps = Path::new("/work/Dependencies");
        assert_eq!(
            SourceRoot::WorkingCopy.resolve(working, deps),
            PathBuf::from("/work/checkout")
        );
        assert_eq!(
            SourceRoot::Dependency(PathBuf::from("Ballast")).resolve(working, deps),
            PathBuf::from("/work/Dependencies/Ballast")
        );
    }

    #[test]
    fn manifest_round_trips_through_json() {
        let manifest = Manifest::default();
        let raw = serde_json::to_string_pretty(&manifest).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, raw).unwrap();

        let loaded = Manifest::load(&path).unwrap();
        assert_eq!(loaded.archive_prefix, manifest.archive_prefix);
        assert_eq!(loaded.products.len(), manifest.products.len());
        assert_eq!(loaded.unix_scripts, manifest.unix_scripts);
    }

    #[test]
    fn manifest_load_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, "{\"archive_prefix\": ").unwrap();
        assert!(Manifest::load(&path).is_err());
    }

    #[test]
    fn platform_script_and_archive_extensions() {
        assert_eq!(Platform::Windows.script_ext(), "bat");
        assert_eq!(Platform::Unix.script_ext(), "sh");
        assert_eq!(Platform::Windows.archive_ext(), "zip");
        assert_eq!(Platform::Unix.archive_ext(), "tar.gz");
    }
}
