//! Configuration for the detection entry point
//!
//! Everything the detector needs is an explicit field of [`DetectConfig`].
//! `DetectConfig::default()` never reads the environment; call
//! [`DetectConfig::from_env`] to overlay `STACKPROBE_*` variables.
//!
//! # Environment Variables
//!
//! - `STACKPROBE_CATALOG`: Path to a catalog file (.toml, .json, .yaml) - default: built-in catalog
//! - `STACKPROBE_THREADS`: Walker threads, 0 = auto, 1 = sequential - default: "0"
//! - `STACKPROBE_MAX_DEPTH`: Maximum walk depth - default: unlimited
//! - `STACKPROBE_TIMEOUT_SECS`: Scan deadline in seconds - default: none
//! - `STACKPROBE_MATCH_MODE`: Dependency matching (substring|token) - default: "substring"
//! - `STACKPROBE_RESPECT_GITIGNORE`: Honour .gitignore files (true|false) - default: "false"
//! - `STACKPROBE_EXCLUDE`: Extra excluded directory names, comma separated
//! - `STACKPROBE_NO_LOCATE`: Scan the given path as-is (true|false) - default: "false"

use crate::locator::{DEFAULT_ROOT_MARKERS, DEFAULT_ROOT_SUBDIRS};
use crate::manifest::{MatchMode, DEFAULT_MAX_MANIFEST_BYTES};
use crate::scanner::ScanConfig;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const MAX_THREADS: usize = 256;
const MAX_SAMPLE_LINES: usize = 100;
const MIN_TAIL_WINDOW_BYTES: u64 = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Where the detection catalog comes from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CatalogSource {
    #[default]
    Builtin,
    Path(PathBuf),
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::Builtin => write!(f, "built-in"),
            CatalogSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectConfig {
    pub catalog: CatalogSource,
    /// Run the root locator before scanning
    pub locate_root: bool,
    pub root_markers: Vec<String>,
    pub root_subdirs: Vec<String>,
    /// Excluded in addition to the default noise directories
    pub extra_excluded_dirs: Vec<String>,
    pub match_mode: MatchMode,
    pub max_manifest_bytes: u64,
    pub scan: ScanConfig,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogSource::Builtin,
            locate_root: true,
            root_markers: to_strings(DEFAULT_ROOT_MARKERS),
            root_subdirs: to_strings(DEFAULT_ROOT_SUBDIRS),
            extra_excluded_dirs: Vec::new(),
            match_mode: MatchMode::default(),
            max_manifest_bytes: DEFAULT_MAX_MANIFEST_BYTES,
            scan: ScanConfig::default(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl DetectConfig {
    /// Defaults overlaid with `STACKPROBE_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = env_var("STACKPROBE_CATALOG") {
            config.catalog = CatalogSource::Path(PathBuf::from(path));
        }
        if let Some(threads) = env_parse::<usize>("STACKPROBE_THREADS")? {
            config.scan.threads = threads;
        }
        if let Some(depth) = env_parse::<usize>("STACKPROBE_MAX_DEPTH")? {
            config.scan.max_depth = Some(depth);
        }
        if let Some(secs) = env_parse::<u64>("STACKPROBE_TIMEOUT_SECS")? {
            config.scan.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(mode) = env_parse::<MatchMode>("STACKPROBE_MATCH_MODE")? {
            config.match_mode = mode;
        }
        if let Some(respect) = env_parse::<bool>("STACKPROBE_RESPECT_GITIGNORE")? {
            config.scan.respect_gitignore = respect;
        }
        if let Some(no_locate) = env_parse::<bool>("STACKPROBE_NO_LOCATE")? {
            config.locate_root = !no_locate;
        }
        if let Some(extra) = env_var("STACKPROBE_EXCLUDE") {
            config.extra_excluded_dirs = extra
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog = CatalogSource::Path(path.into());
        self
    }

    pub fn with_scan(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn with_locate_root(mut self, locate: bool) -> Self {
        self.locate_root = locate;
        self
    }

    pub fn with_extra_excluded_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_excluded_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Checks that numeric values are in range and markers are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.sample_lines == 0 || self.scan.sample_lines > MAX_SAMPLE_LINES {
            return Err(ConfigError::ValidationFailed(format!(
                "Sample lines must be between 1 and {}",
                MAX_SAMPLE_LINES
            )));
        }
        if self.scan.threads > MAX_THREADS {
            return Err(ConfigError::ValidationFailed(format!(
                "Thread count cannot exceed {}",
                MAX_THREADS
            )));
        }
        if self.scan.tail_window_bytes < MIN_TAIL_WINDOW_BYTES {
            return Err(ConfigError::ValidationFailed(format!(
                "Tail window must be at least {} bytes",
                MIN_TAIL_WINDOW_BYTES
            )));
        }
        if self.scan.timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ValidationFailed(
                "Timeout must be at least 1 second".to_string(),
            ));
        }
        if self.max_manifest_bytes == 0 {
            return Err(ConfigError::ValidationFailed(
                "Manifest size limit must be positive".to_string(),
            ));
        }
        if self.root_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(ConfigError::ValidationFailed(
                "Root markers cannot be empty".to_string(),
            ));
        }
        if self
            .root_subdirs
            .iter()
            .any(|d| d.trim().is_empty() || d.contains(['/', '\\']))
        {
            return Err(ConfigError::ValidationFailed(
                "Root subdirectories must be single, non-empty names".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for DetectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Detection Configuration:")?;
        writeln!(f, "  Catalog: {}", self.catalog)?;
        writeln!(f, "  Locate Root: {}", self.locate_root)?;
        writeln!(f, "  Match Mode: {}", self.match_mode)?;
        writeln!(f, "  Threads: {}", self.scan.threads)?;
        match self.scan.max_depth {
            Some(depth) => writeln!(f, "  Max Depth: {}", depth)?,
            None => writeln!(f, "  Max Depth: unlimited")?,
        }
        match self.scan.timeout {
            Some(timeout) => writeln!(f, "  Timeout: {}s", timeout.as_secs())?,
            None => writeln!(f, "  Timeout: none")?,
        }
        if !self.extra_excluded_dirs.is_empty() {
            writeln!(f, "  Extra Exclusions: {}", self.extra_excluded_dirs.join(", "))?;
        }
        Ok(())
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env_var(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .to_lowercase()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::ParseError {
                field: key.to_string(),
                error: e.to_string(),
            }),
    }
}
