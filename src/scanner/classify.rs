//! Per-entry signal evaluation
//!
//! One generic loop over the catalog; nothing here knows about individual
//! technologies.

use super::sample::{sample_file, Sample};
use super::ScanStats;
use crate::aggregate::ScanResult;
use crate::catalog::Catalog;
use crate::manifest::ManifestInspector;
use std::path::Path;
use tracing::{debug, trace};

pub struct Classifier<'a> {
    catalog: &'a Catalog,
    inspector: ManifestInspector,
    sample_lines: usize,
    tail_window: u64,
    sample_content: bool,
}

impl<'a> Classifier<'a> {
    pub fn new(
        catalog: &'a Catalog,
        inspector: ManifestInspector,
        sample_lines: usize,
        tail_window: u64,
    ) -> Self {
        let sample_content = catalog.content_rules().next().is_some();
        Self {
            catalog,
            inspector,
            sample_lines,
            tail_window,
            sample_content,
        }
    }

    /// Directory-name signals
    pub fn classify_dir(&self, name: &str, result: &mut ScanResult) {
        for rule in self.catalog.directory_rules() {
            if rule.matches_directory(name) {
                trace!(directory = name, technology = %rule.id(), "Directory signal");
                result.insert(rule.id());
            }
        }
    }

    /// Extension, filename, pattern, content and manifest signals of one file
    pub fn classify_file(&self, path: &Path, result: &mut ScanResult, stats: &mut ScanStats) {
        stats.files_scanned += 1;

        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            result.extend(self.catalog.technologies_for_extension(ext));
        }

        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            debug!(path = %path.display(), "Skipping file with non UTF-8 name");
            return;
        };

        result.extend(self.catalog.technologies_for_filename(filename));

        for rule in self.catalog.pattern_rules() {
            if rule.matches_pattern(filename) {
                result.insert(rule.id());
            }
        }

        if self.sample_content {
            self.classify_content(path, result, stats);
        }

        self.classify_manifest(path, result, stats);
    }

    fn classify_content(&self, path: &Path, result: &mut ScanResult, stats: &mut ScanStats) {
        let sample = match sample_file(path, self.sample_lines, self.tail_window) {
            Ok(Sample::Text(sample)) => sample,
            Ok(Sample::Binary) => {
                stats.binary_files += 1;
                return;
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Failed to read file, skipping content signals");
                stats.unreadable_files += 1;
                return;
            }
        };

        let first_line = sample.first_line().unwrap_or_default();
        for rule in self.catalog.content_rules() {
            let matched = rule.matches_shebang(first_line)
                || rule.matches_modeline(sample.all_lines())
                || rule.matches_marker(sample.head_lines());
            if matched {
                trace!(path = %path.display(), technology = %rule.id(), "Content signal");
                result.insert(rule.id());
            }
        }
    }

    fn classify_manifest(&self, path: &Path, result: &mut ScanResult, stats: &mut ScanStats) {
        let Some(handle) = self.inspector.open(path) else {
            return;
        };
        stats.manifests_inspected += 1;

        let ids = self.catalog.ids();
        for rule in self.catalog.dependency_rules() {
            if result.contains(rule.id().as_str()) {
                continue;
            }
            if handle.matches_rule(rule, ids) {
                debug!(
                    manifest = %path.display(),
                    kind = %handle.kind(),
                    technology = %rule.id(),
                    "Dependency signal"
                );
                result.insert(rule.id());
            }
        }

        if handle.parse_failed() {
            stats.manifest_errors += 1;
        }
    }
}
