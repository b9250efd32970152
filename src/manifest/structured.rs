//! `Cargo.toml` and `pubspec.yaml`

use super::ManifestError;

const CARGO_SECTIONS: &[&str] = &["dependencies", "dev-dependencies", "build-dependencies"];
const PUBSPEC_SECTIONS: &[&str] = &["dependencies", "dev_dependencies"];

/// Crate names from the dependency tables, including `[workspace.dependencies]`
/// and `[target.'cfg(..)'.dependencies]`
pub(super) fn cargo_dependencies(content: &str) -> Result<Vec<String>, ManifestError> {
    let doc: toml::Table = toml::from_str(content)?;
    let mut names = Vec::new();

    collect_toml_sections(&doc, &mut names);
    if let Some(workspace) = doc.get("workspace").and_then(toml::Value::as_table) {
        collect_toml_sections(workspace, &mut names);
    }
    if let Some(targets) = doc.get("target").and_then(toml::Value::as_table) {
        for target in targets.values().filter_map(toml::Value::as_table) {
            collect_toml_sections(target, &mut names);
        }
    }

    Ok(names)
}

fn collect_toml_sections(table: &toml::Table, names: &mut Vec<String>) {
    for section in CARGO_SECTIONS {
        if let Some(deps) = table.get(*section).and_then(toml::Value::as_table) {
            names.extend(deps.keys().map(|k| k.to_lowercase()));
        }
    }
}

/// Package names from `dependencies` and `dev_dependencies`
pub(super) fn pubspec_dependencies(content: &str) -> Result<Vec<String>, ManifestError> {
    let doc: serde_yaml::Value = serde_yaml::from_str(content)?;
    let root = doc
        .as_mapping()
        .ok_or_else(|| ManifestError::Shape("pubspec is not a mapping".to_string()))?;

    let names = PUBSPEC_SECTIONS
        .iter()
        .filter_map(|section| root.get(*section).and_then(serde_yaml::Value::as_mapping))
        .flat_map(|deps| deps.keys())
        .filter_map(serde_yaml::Value::as_str)
        .map(str::to_lowercase)
        .collect();

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cargo_sections() {
        let names = cargo_dependencies(
            r#"
[package]
name = "tokio-free"

[dependencies]
Serde = "1"

[dev-dependencies]
tempfile = "3"

[target.'cfg(unix)'.dependencies]
nix = "0.27"

[workspace.dependencies]
anyhow = "1"
"#,
        )
        .unwrap();
        assert!(names.contains(&"serde".to_string()));
        assert!(names.contains(&"tempfile".to_string()));
        assert!(names.contains(&"nix".to_string()));
        assert!(names.contains(&"anyhow".to_string()));
        assert!(!names.contains(&"tokio-free".to_string()));
    }

    #[test]
    fn test_cargo_invalid_toml() {
        let err = cargo_dependencies("[dependencies\nserde = 1").unwrap_err();
        assert!(matches!(err, ManifestError::Toml(_)));
    }

    #[test]
    fn test_pubspec_sections() {
        let names = pubspec_dependencies(
            "name: app\ndependencies:\n  flutter:\n    sdk: flutter\n  flutter_bloc: ^8.1.0\ndev_dependencies:\n  Mocktail: ^1.0.0\n",
        )
        .unwrap();
        assert_eq!(names, vec!["flutter", "flutter_bloc", "mocktail"]);
    }

    #[test]
    fn test_pubspec_must_be_mapping() {
        let err = pubspec_dependencies("- just\n- a list\n").unwrap_err();
        assert!(matches!(err, ManifestError::Shape(_)));
    }
}
