//! Versioned on-disk catalog document (TOML, JSON or YAML)

use super::{normalize_extension, CatalogError, DetectionRule, TechnologyId};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// The only document version this build understands
pub const CATALOG_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Toml,
    Json,
    Yaml,
}

impl CatalogFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

impl fmt::Display for CatalogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogFormat::Toml => write!(f, "TOML"),
            CatalogFormat::Json => write!(f, "JSON"),
            CatalogFormat::Yaml => write!(f, "YAML"),
        }
    }
}

/// Top-level catalog document
///
/// ```toml
/// version = 1
///
/// [technologies.go]
/// extensions = [".go"]
/// build_files = ["go.mod"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogDocument {
    pub version: u32,
    #[serde(default)]
    pub technologies: BTreeMap<String, RuleDocument>,
}

impl CatalogDocument {
    pub fn parse(content: &str, format: CatalogFormat) -> Result<Self, CatalogError> {
        let parsed = match format {
            CatalogFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            CatalogFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            CatalogFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| CatalogError::Parse { format, message })
    }
}

/// Raw signal sets of one technology, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDocument {
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub filenames: Vec<String>,
    #[serde(default)]
    pub build_files: Vec<String>,
    #[serde(default)]
    pub directories: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub shebangs: Vec<String>,
    #[serde(default)]
    pub modelines: Vec<String>,
    #[serde(default)]
    pub markers: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub widen: bool,
}

impl RuleDocument {
    pub(super) fn into_rule(self, id: TechnologyId) -> Result<DetectionRule, CatalogError> {
        let extensions = self
            .extensions
            .iter()
            .map(|ext| validate_extension(&id, ext))
            .collect::<Result<Vec<_>, _>>()?;

        let patterns = non_empty(&id, "patterns", self.patterns)?
            .into_iter()
            .map(|pattern| {
                Pattern::new(&pattern).map_err(|e| CatalogError::InvalidPattern {
                    id: id.clone(),
                    pattern: pattern.clone(),
                    message: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rule = DetectionRule {
            extensions: dedup(extensions),
            filenames: non_empty(&id, "filenames", self.filenames)?,
            build_files: non_empty(&id, "build_files", self.build_files)?,
            directories: non_empty(&id, "directories", self.directories)?,
            patterns,
            shebangs: non_empty(&id, "shebangs", self.shebangs)?,
            modelines: non_empty(&id, "modelines", self.modelines)?,
            markers: non_empty(&id, "markers", self.markers)?,
            dependencies: non_empty(&id, "dependencies", self.dependencies)?
                .into_iter()
                .map(|d| d.to_lowercase())
                .collect(),
            widen: self.widen,
            id,
        };

        if !rule.has_signals() {
            return Err(CatalogError::EmptyRule(rule.id));
        }
        Ok(rule)
    }
}

fn validate_extension(id: &TechnologyId, raw: &str) -> Result<String, CatalogError> {
    let ext = raw.trim();
    let valid = ext.len() > 1
        && ext.starts_with('.')
        && !ext[1..].contains('.')
        && !ext.contains(|c: char| c.is_whitespace() || c == '/' || c == '\\');
    if !valid {
        return Err(CatalogError::InvalidExtension {
            id: id.clone(),
            extension: raw.to_string(),
        });
    }
    Ok(normalize_extension(ext))
}

fn non_empty(
    id: &TechnologyId,
    field: &'static str,
    values: Vec<String>,
) -> Result<Vec<String>, CatalogError> {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(CatalogError::EmptySignal {
            id: id.clone(),
            field,
        });
    }
    Ok(dedup(values))
}

fn dedup(mut values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values.retain(|v| seen.insert(v.clone()));
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            CatalogFormat::from_path(&PathBuf::from("catalog.toml")),
            Some(CatalogFormat::Toml)
        );
        assert_eq!(
            CatalogFormat::from_path(&PathBuf::from("catalog.JSON")),
            Some(CatalogFormat::Json)
        );
        assert_eq!(
            CatalogFormat::from_path(&PathBuf::from("catalog.yml")),
            Some(CatalogFormat::Yaml)
        );
        assert_eq!(CatalogFormat::from_path(&PathBuf::from("catalog")), None);
    }

    #[test]
    fn test_parse_json_document() {
        let doc = CatalogDocument::parse(
            r#"{
                "version": 1,
                "technologies": {
                    "go": { "extensions": [".go"], "build_files": ["go.mod"] }
                }
            }"#,
            CatalogFormat::Json,
        )
        .unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.technologies["go"].build_files, vec!["go.mod"]);
    }

    #[test]
    fn test_parse_yaml_document() {
        let doc = CatalogDocument::parse(
            "version: 1\ntechnologies:\n  shell:\n    shebangs: [\"/bin/sh\"]\n",
            CatalogFormat::Yaml,
        )
        .unwrap();
        assert_eq!(doc.technologies["shell"].shebangs, vec!["/bin/sh"]);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = CatalogDocument::parse(
            "version = 1\n[technologies.go]\nextension = [\".go\"]\n",
            CatalogFormat::Toml,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::Parse { format: CatalogFormat::Toml, .. }));
    }

    #[test]
    fn test_missing_version_is_rejected() {
        let err = CatalogDocument::parse("[technologies.go]\nextensions = [\".go\"]\n", CatalogFormat::Toml)
            .unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[test]
    fn test_into_rule_normalizes() {
        let doc = RuleDocument {
            extensions: vec![".PY".to_string(), ".py".to_string()],
            dependencies: vec!["Django".to_string()],
            ..Default::default()
        };
        let rule = doc.into_rule(TechnologyId::new("python")).unwrap();
        assert_eq!(rule.extensions, vec![".py"]);
        assert_eq!(rule.dependencies, vec!["django"]);
    }

    #[test]
    fn test_widen_alone_counts_as_signal() {
        let doc = RuleDocument {
            widen: true,
            ..Default::default()
        };
        assert!(doc.into_rule(TechnologyId::new("jvm")).is_ok());
    }
}
