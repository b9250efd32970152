//! JSON manifests (`package.json`, `composer.json`, `app.json`)

use super::ManifestError;
use serde_json::Value;

/// Lower-cased keys of the named dependency sections
///
/// With no sections, the top-level keys of the document are returned. Missing
/// sections are fine; a section that is not an object is ignored.
pub(super) fn dependency_keys(content: &str, sections: &[&str]) -> Result<Vec<String>, ManifestError> {
    let value: Value = serde_json::from_str(content)?;
    let root = value
        .as_object()
        .ok_or_else(|| ManifestError::Shape("top-level value is not an object".to_string()))?;

    let keys = if sections.is_empty() {
        root.keys().map(|k| k.to_lowercase()).collect()
    } else {
        sections
            .iter()
            .filter_map(|section| root.get(*section).and_then(Value::as_object))
            .flat_map(|deps| deps.keys())
            .map(|k| k.to_lowercase())
            .collect()
    };

    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_requested_sections() {
        let keys = dependency_keys(
            r#"{"require": {"Laravel/Framework": "^10"}, "require-dev": {"phpunit/phpunit": "^10"}, "autoload": {"psr-4": {}}}"#,
            &["require", "require-dev"],
        )
        .unwrap();
        assert_eq!(keys, vec!["laravel/framework", "phpunit/phpunit"]);
    }

    #[test]
    fn test_top_level_keys_without_sections() {
        let keys = dependency_keys(r#"{"expo": {"name": "demo"}}"#, &[]).unwrap();
        assert_eq!(keys, vec!["expo"]);
    }

    #[test]
    fn test_non_object_section_is_ignored() {
        let keys = dependency_keys(r#"{"dependencies": ["react"]}"#, &["dependencies"]).unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn test_rejects_non_object_document() {
        let err = dependency_keys("[1, 2, 3]", &["dependencies"]).unwrap_err();
        assert!(matches!(err, ManifestError::Shape(_)));
    }

    #[test]
    fn test_rejects_invalid_json() {
        let err = dependency_keys("{ nope", &["dependencies"]).unwrap_err();
        assert!(matches!(err, ManifestError::Json(_)));
    }
}
