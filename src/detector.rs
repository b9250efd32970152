//! Detection entry point: locate the root, scan it once, return the set

use crate::aggregate::ScanResult;
use crate::catalog::Catalog;
use crate::config::{CatalogSource, DetectConfig};
use crate::error::DetectError;
use crate::locator::locate_root_in;
use crate::manifest::ManifestInspector;
use crate::scanner::{ExclusionSet, ScanControl, ScanReport, ScanStats, TreeScanner};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Loaded catalog plus configuration, reusable across many roots
pub struct Detector {
    config: DetectConfig,
    scanner: TreeScanner,
}

impl Detector {
    /// Loads and validates the configured catalog
    pub fn new(config: DetectConfig) -> Result<Self, DetectError> {
        config.validate()?;
        let catalog = match &config.catalog {
            CatalogSource::Builtin => Catalog::builtin()?,
            CatalogSource::Path(path) => Catalog::from_path(path)?,
        };
        info!(
            source = %config.catalog,
            technologies = catalog.len(),
            "Detection catalog loaded"
        );
        Self::with_catalog(Arc::new(catalog), config)
    }

    pub fn with_catalog(catalog: Arc<Catalog>, config: DetectConfig) -> Result<Self, DetectError> {
        config.validate()?;

        let exclusions = ExclusionSet::default().with_extra(&config.extra_excluded_dirs);
        let inspector = ManifestInspector::new(config.match_mode)
            .with_max_manifest_bytes(config.max_manifest_bytes);
        let scanner = TreeScanner::new(catalog)
            .with_config(config.scan.clone())
            .with_exclusions(exclusions)
            .with_inspector(inspector);

        Ok(Self { config, scanner })
    }

    pub fn catalog(&self) -> &Catalog {
        self.scanner.catalog()
    }

    pub fn config(&self) -> &DetectConfig {
        &self.config
    }

    /// Directory that will actually be scanned for `candidate`
    pub fn resolve_root(&self, candidate: &Path) -> std::path::PathBuf {
        if self.config.locate_root {
            locate_root_in(candidate, &self.config.root_markers, &self.config.root_subdirs)
        } else {
            candidate.to_path_buf()
        }
    }

    pub fn detect(&self, candidate: &Path) -> ScanResult {
        self.detect_report(candidate).technologies
    }

    pub fn detect_report(&self, candidate: &Path) -> ScanReport {
        let control = match self.config.scan.timeout {
            Some(timeout) => ScanControl::with_timeout(timeout),
            None => ScanControl::unbounded(),
        };
        self.detect_with(candidate, &control)
    }

    /// Detection with caller-provided cancellation
    pub fn detect_with(&self, candidate: &Path, control: &ScanControl) -> ScanReport {
        if !candidate.exists() {
            warn!(path = %candidate.display(), "Detection root does not exist, nothing detected");
            return ScanReport {
                root: candidate.to_path_buf(),
                technologies: ScanResult::new(),
                stats: ScanStats::default(),
                elapsed_ms: 0,
            };
        }

        let root = self.resolve_root(candidate);
        debug!(candidate = %candidate.display(), root = %root.display(), "Resolved scan root");

        let report = self.scanner.scan_with(&root, control);
        info!(
            root = %report.root.display(),
            technologies = ?report.technologies.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
            "Detection complete"
        );
        report
    }
}

/// One-shot detection; fails only when the catalog or configuration is invalid
pub fn detect(root: &Path, config: &DetectConfig) -> Result<ScanResult, DetectError> {
    let detector = Detector::new(config.clone())?;
    Ok(detector.detect(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::scanner::{CancelToken, ScanConfig};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn config() -> DetectConfig {
        DetectConfig::default().with_scan(ScanConfig::sequential())
    }

    #[test]
    fn test_detects_from_located_subdir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("app")).unwrap();
        fs::write(dir.path().join("app/Gemfile"), "gem 'rails'\n").unwrap();
        fs::write(dir.path().join("README"), "#!/bin/sh\n").unwrap();

        let detector = Detector::new(config()).unwrap();
        assert_eq!(detector.resolve_root(dir.path()), dir.path().join("app"));

        let result = detector.detect(dir.path());
        assert!(result.contains("ruby"));
        assert!(!result.contains("shell"));
    }

    #[test]
    fn test_no_locate_scans_candidate() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("app")).unwrap();
        fs::write(dir.path().join("app/Gemfile"), "gem 'rails'\n").unwrap();
        fs::write(dir.path().join("README"), "#!/bin/sh\n").unwrap();

        let detector = Detector::new(config().with_locate_root(false)).unwrap();
        let result = detector.detect(dir.path());
        assert!(result.contains("ruby"));
        assert!(result.contains("shell"));
    }

    #[test]
    fn test_missing_root_is_empty_not_error() {
        let dir = TempDir::new().unwrap();
        let result = detect(&dir.path().join("missing"), &config()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_bad_catalog_path_fails() {
        let dir = TempDir::new().unwrap();
        let config = config().with_catalog_path(dir.path().join("absent.toml"));
        let err = detect(dir.path(), &config).err().unwrap();
        assert!(err.is_catalog_error());
    }

    #[test]
    fn test_invalid_config_fails() {
        let mut config = config();
        config.scan.sample_lines = 0;
        let err = Detector::new(config).err().unwrap();
        assert!(matches!(err, DetectError::Config(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn test_extra_exclusions_are_applied() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("generated")).unwrap();
        fs::write(dir.path().join("generated/api.kt"), "fun main() {}\n").unwrap();

        let plain = Detector::new(config().with_locate_root(false)).unwrap();
        assert!(plain.detect(dir.path()).contains("kotlin"));

        let excluding = Detector::new(
            config()
                .with_locate_root(false)
                .with_extra_excluded_dirs(["generated"]),
        )
        .unwrap();
        assert!(!excluding.detect(dir.path()).contains("kotlin"));
    }

    #[test]
    fn test_configured_timeout_truncates() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.go"), "package main\n").unwrap();

        let mut config = config();
        config.scan.timeout = Some(Duration::from_nanos(1));
        let report = Detector::new(config).unwrap().detect_report(dir.path());
        assert!(report.stats.truncated);
        assert!(report.technologies.is_empty());
    }

    #[test]
    fn test_caller_token_cancels() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.go"), "package main\n").unwrap();
        let detector = Detector::new(config()).unwrap();

        let token = CancelToken::new();
        let control = ScanControl::unbounded().with_token(token.clone());
        assert!(detector.detect_with(dir.path(), &control).technologies.contains("go"));

        token.cancel();
        let report = detector.detect_with(dir.path(), &control);
        assert!(report.stats.truncated);
        assert!(report.technologies.is_empty());
    }
}
