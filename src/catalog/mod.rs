//! Detection catalog: technology identifiers and the signals that reveal them
//!
//! The catalog is a data-driven table. Every technology is described by a
//! [`DetectionRule`] holding zero or more signal sets (extensions, marker
//! filenames, shebangs, ...). The scanner evaluates all rules with one generic
//! loop, so adding a technology is a catalog edit rather than new code.
//!
//! Catalogs are loaded once at startup, validated eagerly and then shared
//! read-only (usually behind an `Arc`) by every scan worker.

mod loader;

pub use loader::{CatalogDocument, CatalogFormat, RuleDocument, CATALOG_VERSION};

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const BUILTIN_CATALOG: &str = include_str!("builtin.toml");

const PATTERN_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unknown catalog format for {0} (expected .toml, .json, .yaml or .yml)")]
    UnknownFormat(PathBuf),

    #[error("Failed to parse {format} catalog: {message}")]
    Parse {
        format: CatalogFormat,
        message: String,
    },

    #[error("Unsupported catalog version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Catalog defines no technologies")]
    Empty,

    #[error("Invalid technology id {0:?}")]
    InvalidId(String),

    #[error("Technology '{0}' is defined more than once")]
    DuplicateId(TechnologyId),

    #[error("Technology '{0}' has no detection signals")]
    EmptyRule(TechnologyId),

    #[error("Technology '{id}' has an empty entry in '{field}'")]
    EmptySignal { id: TechnologyId, field: &'static str },

    #[error("Technology '{id}' has invalid extension {extension:?}: extensions start with '.' and contain no further dots, whitespace or separators")]
    InvalidExtension { id: TechnologyId, extension: String },

    #[error("Technology '{id}' has invalid filename pattern {pattern:?}: {message}")]
    InvalidPattern {
        id: TechnologyId,
        pattern: String,
        message: String,
    },
}

/// Case-insensitive technology key (`"python"`, `"next.js"`, `"ibc"`)
///
/// The raw value is trimmed and lower-cased on construction, so two ids compare
/// equal whenever they differ only in case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TechnologyId(String);

impl TechnologyId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(&self) -> bool {
        !self.0.is_empty() && !self.0.chars().any(char::is_whitespace)
    }
}

impl From<String> for TechnologyId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for TechnologyId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<&TechnologyId> for TechnologyId {
    fn from(id: &TechnologyId) -> Self {
        id.clone()
    }
}

impl From<TechnologyId> for String {
    fn from(id: TechnologyId) -> Self {
        id.0
    }
}

impl AsRef<str> for TechnologyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TechnologyId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TechnologyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signals that indicate the presence of one technology
#[derive(Debug, Clone)]
pub struct DetectionRule {
    id: TechnologyId,
    /// Lower-case extensions including the leading dot
    pub extensions: Vec<String>,
    /// Exact filenames whose existence is sufficient evidence
    pub filenames: Vec<String>,
    /// Build manifests; existence is evidence and they are also inspected for dependencies
    pub build_files: Vec<String>,
    /// Directory names (case-insensitive) whose existence is evidence
    pub directories: Vec<String>,
    /// Filename globs, matched case-insensitively
    pub patterns: Vec<Pattern>,
    /// Substrings tested against a `#!` first line
    pub shebangs: Vec<String>,
    /// Substrings tested against the head and tail lines of a file
    pub modelines: Vec<String>,
    /// Substrings tested against the head lines of a file
    pub markers: Vec<String>,
    /// Substrings tested against dependency identifiers in manifests
    pub dependencies: Vec<String>,
    /// Also match JVM manifests whose dependencies name another catalog technology
    pub widen: bool,
}

impl DetectionRule {
    pub fn id(&self) -> &TechnologyId {
        &self.id
    }

    pub fn has_signals(&self) -> bool {
        !(self.extensions.is_empty()
            && self.filenames.is_empty()
            && self.build_files.is_empty()
            && self.directories.is_empty()
            && self.patterns.is_empty()
            && self.shebangs.is_empty()
            && self.modelines.is_empty()
            && self.markers.is_empty()
            && self.dependencies.is_empty()
            && !self.widen)
    }

    pub fn has_content_signals(&self) -> bool {
        !(self.shebangs.is_empty() && self.modelines.is_empty() && self.markers.is_empty())
    }

    pub fn has_dependency_check(&self) -> bool {
        !self.dependencies.is_empty() || self.widen
    }

    pub fn matches_shebang(&self, first_line: &str) -> bool {
        first_line.starts_with("#!") && self.shebangs.iter().any(|s| first_line.contains(s.as_str()))
    }

    pub fn matches_modeline<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> bool {
        contains_any(lines, &self.modelines)
    }

    pub fn matches_marker<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> bool {
        contains_any(lines, &self.markers)
    }

    pub fn matches_directory(&self, name: &str) -> bool {
        self.directories.iter().any(|d| d.eq_ignore_ascii_case(name))
    }

    pub fn matches_pattern(&self, filename: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(filename, PATTERN_OPTIONS))
    }
}

fn contains_any<'a>(lines: impl IntoIterator<Item = &'a str>, needles: &[String]) -> bool {
    if needles.is_empty() {
        return false;
    }
    lines
        .into_iter()
        .any(|line| needles.iter().any(|n| line.contains(n.as_str())))
}

/// Immutable, validated rule table with lookup indexes
#[derive(Debug, Clone)]
pub struct Catalog {
    version: u32,
    ids: Vec<TechnologyId>,
    rules: HashMap<TechnologyId, DetectionRule>,
    by_extension: HashMap<String, Vec<TechnologyId>>,
    by_filename: HashMap<String, Vec<TechnologyId>>,
    content_rules: Vec<TechnologyId>,
    dependency_rules: Vec<TechnologyId>,
    directory_rules: Vec<TechnologyId>,
    pattern_rules: Vec<TechnologyId>,
}

impl Catalog {
    /// The catalog shipped with the crate
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::parse(BUILTIN_CATALOG, CatalogFormat::Toml)
    }

    /// Loads a catalog file; the format is chosen from the file extension
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let format =
            CatalogFormat::from_path(path).ok_or_else(|| CatalogError::UnknownFormat(path.to_path_buf()))?;
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), %format, "Loading detection catalog");
        Self::parse(&content, format)
    }

    pub fn parse(content: &str, format: CatalogFormat) -> Result<Self, CatalogError> {
        let document = CatalogDocument::parse(content, format)?;
        Self::from_document(document)
    }

    pub fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        if document.version != CATALOG_VERSION {
            return Err(CatalogError::UnsupportedVersion {
                found: document.version,
                supported: CATALOG_VERSION,
            });
        }
        if document.technologies.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut rules = HashMap::with_capacity(document.technologies.len());
        for (raw_id, rule_doc) in document.technologies {
            let id = TechnologyId::new(&raw_id);
            if !id.is_valid() {
                return Err(CatalogError::InvalidId(raw_id));
            }
            if rules.contains_key(&id) {
                return Err(CatalogError::DuplicateId(id));
            }
            let rule = rule_doc.into_rule(id.clone())?;
            rules.insert(id, rule);
        }

        let mut ids: Vec<TechnologyId> = rules.keys().cloned().collect();
        ids.sort();

        let mut catalog = Self {
            version: document.version,
            ids,
            rules,
            by_extension: HashMap::new(),
            by_filename: HashMap::new(),
            content_rules: Vec::new(),
            dependency_rules: Vec::new(),
            directory_rules: Vec::new(),
            pattern_rules: Vec::new(),
        };
        catalog.build_indexes();

        debug!(
            version = catalog.version,
            technologies = catalog.len(),
            extensions = catalog.by_extension.len(),
            filenames = catalog.by_filename.len(),
            "Detection catalog ready"
        );

        Ok(catalog)
    }

    fn build_indexes(&mut self) {
        for id in &self.ids {
            let rule = &self.rules[id];

            for ext in &rule.extensions {
                push_unique(self.by_extension.entry(ext.clone()).or_default(), id);
            }
            for name in rule.filenames.iter().chain(&rule.build_files) {
                push_unique(self.by_filename.entry(name.clone()).or_default(), id);
            }
            if rule.has_content_signals() {
                self.content_rules.push(id.clone());
            }
            if rule.has_dependency_check() {
                self.dependency_rules.push(id.clone());
            }
            if !rule.directories.is_empty() {
                self.directory_rules.push(id.clone());
            }
            if !rule.patterns.is_empty() {
                self.pattern_rules.push(id.clone());
            }
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// All technology ids, sorted
    pub fn ids(&self) -> &[TechnologyId] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rules.contains_key(TechnologyId::new(id).as_str())
    }

    pub fn rule(&self, id: &str) -> Option<&DetectionRule> {
        self.rules.get(TechnologyId::new(id).as_str())
    }

    /// Rules in id order
    pub fn rules(&self) -> impl Iterator<Item = &DetectionRule> {
        self.ids.iter().map(move |id| &self.rules[id])
    }

    /// Owners of an extension such as `".tsx"` (case-insensitive, leading dot optional)
    pub fn technologies_for_extension(&self, extension: &str) -> &[TechnologyId] {
        let normalized = normalize_extension(extension);
        self.by_extension
            .get(&normalized)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Owners of an exact filename, from either `filenames` or `build_files`
    pub fn technologies_for_filename(&self, filename: &str) -> &[TechnologyId] {
        self.by_filename
            .get(filename)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn content_rules(&self) -> impl Iterator<Item = &DetectionRule> {
        self.rules_for(&self.content_rules)
    }

    pub fn dependency_rules(&self) -> impl Iterator<Item = &DetectionRule> {
        self.rules_for(&self.dependency_rules)
    }

    pub fn directory_rules(&self) -> impl Iterator<Item = &DetectionRule> {
        self.rules_for(&self.directory_rules)
    }

    pub fn pattern_rules(&self) -> impl Iterator<Item = &DetectionRule> {
        self.rules_for(&self.pattern_rules)
    }

    fn rules_for<'a>(&'a self, ids: &'a [TechnologyId]) -> impl Iterator<Item = &'a DetectionRule> {
        ids.iter().map(move |id| &self.rules[id])
    }
}

fn push_unique(ids: &mut Vec<TechnologyId>, id: &TechnologyId) {
    if !ids.contains(id) {
        ids.push(id.clone());
    }
}

pub(crate) fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim().to_lowercase();
    if trimmed.starts_with('.') {
        trimmed
    } else {
        format!(".{}", trimmed)
    }
}
