//! Manifest dependency inspection
//!
//! A manifest's [`ManifestKind`] is resolved from its filename. Each kind
//! reduces the file to one of three shapes (identifiers, lines, or whole text)
//! and the same dependency test is applied to that shape. Parsing is lazy and
//! happens at most once per [`ManifestHandle`]; a manifest that cannot be read
//! or parsed answers `false` to every question instead of failing the scan.

mod json;
mod maven;
mod structured;
mod text;

use crate::catalog::{DetectionRule, TechnologyId};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

/// Manifests larger than this are not parsed
pub const DEFAULT_MAX_MANIFEST_BYTES: u64 = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unexpected manifest shape: {0}")]
    Shape(String),
}

/// How a dependency name is compared with manifest identifiers
///
/// `Substring` accepts `"go"` inside `"gorilla/mux"`. `Token` requires the name
/// to be bounded by non-alphanumeric characters, so `"react"` still matches
/// `"react-dom"` and `"@types/react"` but `"go"` no longer matches `"gorilla"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Substring,
    Token,
}

impl MatchMode {
    /// Both arguments must already be lower-case
    pub fn matches(self, haystack: &str, needle: &str) -> bool {
        if needle.is_empty() {
            return false;
        }
        match self {
            MatchMode::Substring => haystack.contains(needle),
            MatchMode::Token => contains_token(haystack, needle),
        }
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "substring" => Ok(MatchMode::Substring),
            "token" => Ok(MatchMode::Token),
            other => Err(format!(
                "unknown match mode '{}' (expected 'substring' or 'token')",
                other
            )),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Substring => write!(f, "substring"),
            MatchMode::Token => write!(f, "token"),
        }
    }
}

fn contains_token(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Manifest format, resolved from the filename
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    /// JSON object; dependency names are the keys of `sections`, or the
    /// top-level keys when `sections` is empty
    Json { sections: &'static [&'static str] },
    /// Maven `pom.xml`
    Maven,
    /// Gradle build script, inspected as text
    Gradle,
    /// `Cargo.toml`
    Cargo,
    /// `pubspec.yaml`
    Pubspec,
    /// One requirement per line
    LineOriented,
    /// Any other build script, inspected as text
    FreeText,
}

const PACKAGE_JSON_SECTIONS: &[&str] = &[
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];
const COMPOSER_JSON_SECTIONS: &[&str] = &["require", "require-dev"];

impl ManifestKind {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let kind = match filename {
            "package.json" => ManifestKind::Json {
                sections: PACKAGE_JSON_SECTIONS,
            },
            "composer.json" => ManifestKind::Json {
                sections: COMPOSER_JSON_SECTIONS,
            },
            "app.json" => ManifestKind::Json { sections: &[] },
            "pom.xml" => ManifestKind::Maven,
            "build.gradle" | "build.gradle.kts" | "settings.gradle" | "settings.gradle.kts" => {
                ManifestKind::Gradle
            }
            "Cargo.toml" => ManifestKind::Cargo,
            "pubspec.yaml" => ManifestKind::Pubspec,
            "requirements.txt" | "requirements-dev.txt" | "go.mod" => ManifestKind::LineOriented,
            "Gemfile" | "Pipfile" | "pyproject.toml" | "setup.py" | "mix.exs" => {
                ManifestKind::FreeText
            }
            _ => return None,
        };
        Some(kind)
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(Self::from_filename)
    }

    /// JVM build descriptors take part in transitive widening
    pub fn supports_widening(&self) -> bool {
        matches!(self, ManifestKind::Maven | ManifestKind::Gradle)
    }

    fn parse(&self, content: &str) -> Result<Parsed, ManifestError> {
        let parsed = match self {
            ManifestKind::Json { sections } => {
                Parsed::Identifiers(json::dependency_keys(content, sections)?)
            }
            ManifestKind::Maven => Parsed::Identifiers(maven::dependency_coordinates(content)?),
            ManifestKind::Cargo => Parsed::Identifiers(structured::cargo_dependencies(content)?),
            ManifestKind::Pubspec => {
                Parsed::Identifiers(structured::pubspec_dependencies(content)?)
            }
            ManifestKind::LineOriented => Parsed::Lines(text::requirement_lines(content)),
            ManifestKind::Gradle | ManifestKind::FreeText => Parsed::Text(text::normalize(content)),
        };
        Ok(parsed)
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ManifestKind::Json { .. } => "json",
            ManifestKind::Maven => "maven",
            ManifestKind::Gradle => "gradle",
            ManifestKind::Cargo => "cargo",
            ManifestKind::Pubspec => "pubspec",
            ManifestKind::LineOriented => "lines",
            ManifestKind::FreeText => "text",
        };
        f.write_str(name)
    }
}

/// Parsed form of a manifest; every string is lower-case
#[derive(Debug)]
enum Parsed {
    Identifiers(Vec<String>),
    Lines(Vec<String>),
    Text(String),
    Unreadable,
}

impl Parsed {
    fn any(&self, mut f: impl FnMut(&str) -> bool) -> bool {
        match self {
            Parsed::Identifiers(items) | Parsed::Lines(items) => items.iter().any(|s| f(s.as_str())),
            Parsed::Text(text) => f(text.as_str()),
            Parsed::Unreadable => false,
        }
    }
}

/// A single manifest, parsed on first use
#[derive(Debug)]
pub struct ManifestHandle {
    path: PathBuf,
    kind: ManifestKind,
    mode: MatchMode,
    max_bytes: u64,
    parsed: OnceCell<Parsed>,
}

impl ManifestHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ManifestKind {
        self.kind
    }

    pub fn has_dependency(&self, name: &str) -> bool {
        let needle = name.trim().to_lowercase();
        let mode = self.mode;
        self.parsed().any(|item| mode.matches(item, &needle))
    }

    /// True when any dependency names a catalog technology other than `exclude`
    ///
    /// Only JVM manifests take part; technology ids are compared on token
    /// boundaries whatever the configured mode.
    pub fn has_dependency_widened(&self, exclude: &TechnologyId, ids: &[TechnologyId]) -> bool {
        if !self.kind.supports_widening() {
            return false;
        }
        let parsed = self.parsed();
        ids.iter()
            .filter(|id| *id != exclude)
            .any(|id| parsed.any(|item| MatchMode::Token.matches(item, id.as_str())))
    }

    /// Dependency test for one catalog rule: its own names, then widening
    pub fn matches_rule(&self, rule: &DetectionRule, ids: &[TechnologyId]) -> bool {
        if rule.dependencies.iter().any(|name| self.has_dependency(name)) {
            return true;
        }
        rule.widen && self.has_dependency_widened(rule.id(), ids)
    }

    /// Forces parsing and reports whether it failed
    pub fn parse_failed(&self) -> bool {
        matches!(self.parsed(), Parsed::Unreadable)
    }

    fn parsed(&self) -> &Parsed {
        self.parsed.get_or_init(|| match self.load() {
            Ok(parsed) => {
                debug!(path = %self.path.display(), kind = %self.kind, "Parsed manifest");
                parsed
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    kind = %self.kind,
                    error = %e,
                    "Failed to parse manifest, ignoring its dependencies"
                );
                Parsed::Unreadable
            }
        })
    }

    fn load(&self) -> Result<Parsed, ManifestError> {
        let size = std::fs::metadata(&self.path)?.len();
        if size > self.max_bytes {
            return Err(ManifestError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        let bytes = std::fs::read(&self.path)?;
        let content = String::from_utf8_lossy(&bytes);
        self.kind.parse(&content)
    }
}

/// Opens manifests and answers dependency questions about them
#[derive(Debug, Clone, Copy)]
pub struct ManifestInspector {
    mode: MatchMode,
    max_manifest_bytes: u64,
}

impl Default for ManifestInspector {
    fn default() -> Self {
        Self::new(MatchMode::default())
    }
}

impl ManifestInspector {
    pub fn new(mode: MatchMode) -> Self {
        Self {
            mode,
            max_manifest_bytes: DEFAULT_MAX_MANIFEST_BYTES,
        }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_manifest_bytes(mut self, limit: u64) -> Self {
        self.max_manifest_bytes = limit;
        self
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Returns `None` when the filename is not a recognized manifest
    pub fn open(&self, path: &Path) -> Option<ManifestHandle> {
        let kind = ManifestKind::from_path(path)?;
        Some(ManifestHandle {
            path: path.to_path_buf(),
            kind,
            mode: self.mode,
            max_bytes: self.max_manifest_bytes,
            parsed: OnceCell::new(),
        })
    }

    pub fn has_dependency(&self, path: &Path, name: &str) -> bool {
        self.open(path)
            .map(|handle| handle.has_dependency(name))
            .unwrap_or(false)
    }
}
