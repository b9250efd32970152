//! Codebase root locator
//!
//! Picks the directory to scan from a candidate path. Repositories often keep
//! the real project one level down (`src/`, `app/`), so a start directory
//! without any project marker is searched one level deep before giving up.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Filenames that mark a project root
pub const DEFAULT_ROOT_MARKERS: &[&str] = &[
    "package.json",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "requirements.txt",
    "pyproject.toml",
    "Pipfile",
    "setup.py",
    "Gemfile",
    "Cargo.toml",
    "composer.json",
    "go.mod",
    "pubspec.yaml",
    "CMakeLists.txt",
    "tsconfig.json",
    "next.config.js",
    "openapi.yaml",
    "swagger.yaml",
    "security.txt",
    ".env",
    "trivy.config",
    "bandit.yaml",
    "style.css",
    "globals.css",
    "global.css",
    "index.html",
    "jest.config.js",
    "axe.config.js",
    "app.json",
];

/// Subdirectories tried, in this order, when the start directory has no marker
pub const DEFAULT_ROOT_SUBDIRS: &[&str] = &["src", "app"];

/// [`locate_root_in`] with the default subdirectories
pub fn locate_root<S: AsRef<str>>(start_dir: &Path, markers: &[S]) -> PathBuf {
    locate_root_in(start_dir, markers, DEFAULT_ROOT_SUBDIRS)
}

/// Returns `start_dir` if it holds a marker, else the first subdirectory that
/// does, else `start_dir` unchanged. Never fails.
pub fn locate_root_in<S, D>(start_dir: &Path, markers: &[S], subdirs: &[D]) -> PathBuf
where
    S: AsRef<str>,
    D: AsRef<str>,
{
    if has_marker(start_dir, markers) {
        debug!(root = %start_dir.display(), "Project marker found in start directory");
        return start_dir.to_path_buf();
    }

    for subdir in subdirs {
        let candidate = start_dir.join(subdir.as_ref());
        if candidate.is_dir() && has_marker(&candidate, markers) {
            debug!(root = %candidate.display(), "Project marker found in subdirectory");
            return candidate;
        }
    }

    warn!(
        start = %start_dir.display(),
        "No project marker found, scanning from the start directory"
    );
    start_dir.to_path_buf()
}

fn has_marker<S: AsRef<str>>(dir: &Path, markers: &[S]) -> bool {
    markers.iter().any(|m| dir.join(m.as_ref()).is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_marker_in_start_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("go.mod"), "module x\n").unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/package.json"), "{}").unwrap();

        assert_eq!(locate_root(dir.path(), DEFAULT_ROOT_MARKERS), dir.path());
    }

    #[test]
    fn test_marker_in_subdir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("app")).unwrap();
        fs::write(dir.path().join("app/package.json"), "{}").unwrap();

        assert_eq!(
            locate_root(dir.path(), DEFAULT_ROOT_MARKERS),
            dir.path().join("app")
        );
    }

    #[test]
    fn test_subdirs_checked_in_declared_order() {
        let dir = TempDir::new().unwrap();
        for sub in ["src", "app"] {
            fs::create_dir(dir.path().join(sub)).unwrap();
            fs::write(dir.path().join(sub).join("Cargo.toml"), "").unwrap();
        }

        assert_eq!(
            locate_root(dir.path(), DEFAULT_ROOT_MARKERS),
            dir.path().join("src")
        );
        assert_eq!(
            locate_root_in(dir.path(), DEFAULT_ROOT_MARKERS, &["app", "src"]),
            dir.path().join("app")
        );
    }

    #[test]
    fn test_no_marker_returns_start() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.c"), "int main() {}\n").unwrap();

        assert_eq!(locate_root(dir.path(), DEFAULT_ROOT_MARKERS), dir.path());
    }

    #[test]
    fn test_parent_marker_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("go.mod"), "module x\n").unwrap();
        fs::create_dir(dir.path().join("cmd")).unwrap();

        let start = dir.path().join("cmd");
        assert_eq!(locate_root(&start, DEFAULT_ROOT_MARKERS), start);
    }

    #[test]
    fn test_marker_must_be_a_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("package.json")).unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/pom.xml"), "<project/>").unwrap();

        assert_eq!(
            locate_root(dir.path(), DEFAULT_ROOT_MARKERS),
            dir.path().join("src")
        );
    }

    #[test]
    fn test_missing_start_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(locate_root(&missing, &["go.mod"]), missing);
    }
}
