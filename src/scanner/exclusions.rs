//! Noise directories that are never entered

use std::collections::HashSet;

/// Version control metadata, dependency caches, bytecode caches, virtual
/// environments and build output. Entries starting with `*` match by suffix.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    // VCS
    ".git",
    ".hg",
    ".svn",
    ".bzr",
    // JavaScript
    "node_modules",
    "bower_components",
    "jspm_packages",
    ".next",
    ".nuxt",
    // PHP / Go / Ruby
    "vendor",
    // Python
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
    ".tox",
    ".nox",
    "venv",
    ".venv",
    "env",
    ".eggs",
    "*.egg-info",
    // JVM
    ".gradle",
    ".m2",
    // Rust
    "target",
    ".cargo",
];

/// Case-insensitive set of excluded directory names
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    names: HashSet<String>,
    suffixes: Vec<String>,
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::from_names(DEFAULT_EXCLUDED_DIRS.iter().copied())
    }
}

impl ExclusionSet {
    /// Empty set; nothing is excluded
    pub fn none() -> Self {
        Self {
            names: HashSet::new(),
            suffixes: Vec::new(),
        }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::none();
        set.extend(names);
        set
    }

    pub fn with_extra<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extend(names);
        self
    }

    fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref().trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            match name.strip_prefix('*') {
                Some(suffix) if !suffix.is_empty() => self.suffixes.push(suffix.to_string()),
                Some(_) => {}
                None => {
                    self.names.insert(name);
                }
            }
        }
    }

    pub fn is_excluded(&self, dir_name: &str) -> bool {
        let name = dir_name.to_lowercase();
        self.names.contains(&name) || self.suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len() + self.suffixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
