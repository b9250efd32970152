//! Text manifests: line-oriented requirement lists and free-form build scripts

/// Non-blank, non-comment lines, lower-cased
pub(super) fn requirement_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("//"))
        .map(str::to_lowercase)
        .collect()
}

pub(super) fn normalize(content: &str) -> String {
    content.to_lowercase()
}
