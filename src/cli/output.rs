//! Output formatting for detection reports and catalogs
//!
//! JSON and YAML output is built from serde types so the shape is stable for
//! scripts. Human output is a short, sorted listing.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;

use crate::catalog::{Catalog, DetectionRule};
use crate::scanner::{ScanReport, ScanStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable text
    Human,
}

/// Detection output; `stats` only when requested
#[derive(Debug, Serialize)]
struct DetectOutput<'a> {
    root: String,
    technologies: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<&'a ScanStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
struct CatalogOutput<'a> {
    version: u32,
    technologies: Vec<TechnologyOutput<'a>>,
}

#[derive(Debug, Serialize)]
struct TechnologyOutput<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    extensions: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    filenames: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    build_files: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    directories: &'a [String],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    patterns: Vec<&'a str>,
    #[serde(skip_serializing_if = "is_empty")]
    shebangs: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    modelines: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    markers: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    dependencies: &'a [String],
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    widen: bool,
}

impl<'a> From<&'a DetectionRule> for TechnologyOutput<'a> {
    fn from(rule: &'a DetectionRule) -> Self {
        Self {
            id: rule.id().as_str(),
            extensions: &rule.extensions,
            filenames: &rule.filenames,
            build_files: &rule.build_files,
            directories: &rule.directories,
            patterns: rule.patterns.iter().map(|p| p.as_str()).collect(),
            shebangs: &rule.shebangs,
            modelines: &rule.modelines,
            markers: &rule.markers,
            dependencies: &rule.dependencies,
            widen: rule.widen,
        }
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_report(&self, report: &ScanReport, include_stats: bool) -> Result<String> {
        let output = DetectOutput {
            root: report.root.display().to_string(),
            technologies: report.technologies.iter().map(|id| id.as_str()).collect(),
            stats: include_stats.then_some(&report.stats),
            elapsed_ms: include_stats.then_some(report.elapsed_ms),
        };

        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&output)
                .context("Failed to serialize detection result to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(&output)
                .context("Failed to serialize detection result to YAML"),
            OutputFormat::Human => Ok(self.format_report_human(&output)),
        }
    }

    fn format_report_human(&self, output: &DetectOutput<'_>) -> String {
        let mut out = String::new();
        if output.technologies.is_empty() {
            let _ = writeln!(out, "No technologies detected in {}", output.root);
        } else {
            let _ = writeln!(
                out,
                "Detected {} technologies in {}:",
                output.technologies.len(),
                output.root
            );
            for id in &output.technologies {
                let _ = writeln!(out, "  {}", id);
            }
        }

        if let Some(stats) = output.stats {
            let _ = writeln!(out);
            let _ = writeln!(out, "Scan statistics:");
            let _ = writeln!(out, "  Files scanned: {}", stats.files_scanned);
            let _ = writeln!(out, "  Directories visited: {}", stats.directories_visited);
            let _ = writeln!(out, "  Directories excluded: {}", stats.directories_excluded);
            let _ = writeln!(out, "  Manifests inspected: {}", stats.manifests_inspected);
            let _ = writeln!(out, "  Manifest errors: {}", stats.manifest_errors);
            let _ = writeln!(out, "  Binary files: {}", stats.binary_files);
            let _ = writeln!(out, "  Unreadable files: {}", stats.unreadable_files);
            let _ = writeln!(out, "  Walk errors: {}", stats.walk_errors);
            if let Some(ms) = output.elapsed_ms {
                let _ = writeln!(out, "  Elapsed: {}ms", ms);
            }
            if stats.truncated {
                let _ = writeln!(out, "  Truncated: yes (partial result)");
            }
        }

        out
    }

    pub fn format_catalog(&self, catalog: &Catalog) -> Result<String> {
        let output = CatalogOutput {
            version: catalog.version(),
            technologies: catalog.rules().map(TechnologyOutput::from).collect(),
        };

        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&output).context("Failed to serialize catalog to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(&output).context("Failed to serialize catalog to YAML")
            }
            OutputFormat::Human => Ok(self.format_catalog_human(&output)),
        }
    }

    fn format_catalog_human(&self, output: &CatalogOutput<'_>) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Catalog version {} ({} technologies)",
            output.version,
            output.technologies.len()
        );
        for tech in &output.technologies {
            let mut signals = Vec::new();
            push_signal(&mut signals, "ext", tech.extensions);
            push_signal(&mut signals, "files", tech.filenames);
            push_signal(&mut signals, "build", tech.build_files);
            push_signal(&mut signals, "dirs", tech.directories);
            if !tech.patterns.is_empty() {
                signals.push(format!("patterns: {}", tech.patterns.join(" ")));
            }
            push_signal(&mut signals, "shebang", tech.shebangs);
            push_signal(&mut signals, "deps", tech.dependencies);
            if !tech.modelines.is_empty() || !tech.markers.is_empty() {
                signals.push(format!(
                    "content: {}",
                    tech.modelines.len() + tech.markers.len()
                ));
            }
            if tech.widen {
                signals.push("widen".to_string());
            }
            let _ = writeln!(out, "  {:<14} {}", tech.id, signals.join("; "));
        }
        out
    }
}

fn is_empty(values: &&[String]) -> bool {
    values.is_empty()
}

fn push_signal(signals: &mut Vec<String>, label: &str, values: &[String]) {
    if !values.is_empty() {
        signals.push(format!("{}: {}", label, values.join(" ")));
    }
}
