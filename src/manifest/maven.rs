//! Maven `pom.xml`

use super::ManifestError;
use roxmltree::{Document, Node, ParsingOptions};

/// `groupId` and `artifactId` of every `<dependency>` element, lower-cased
///
/// Elements are compared by local name, so a POM with the usual
/// `xmlns="http://maven.apache.org/POM/4.0.0"` and one without any namespace
/// produce the same coordinates.
pub(super) fn dependency_coordinates(content: &str) -> Result<Vec<String>, ManifestError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(content, options)?;

    let coordinates = doc
        .descendants()
        .filter(|n| n.is_element() && n.has_tag_name("dependency"))
        .flat_map(|dep| {
            ["groupId", "artifactId"]
                .into_iter()
                .filter_map(move |field| child_text(dep, field))
        })
        .collect();

    Ok(coordinates)
}

fn child_text(node: Node, name: &str) -> Option<String> {
    node.children()
        .find(|n| n.is_element() && n.has_tag_name(name))
        .and_then(|n| n.text())
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
}
