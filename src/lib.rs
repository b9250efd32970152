//! stackprobe - technology detection for source trees
//!
//! Given a directory, stackprobe reports the set of languages, runtimes,
//! frameworks and cross-cutting concerns the project uses. Detection is driven
//! by a declarative [`Catalog`] of rules and runs as one pass over the tree.
//!
//! # Core Concepts
//!
//! - **Catalog**: technology ids and the signals that identify them (file
//!   extensions, marker filenames, build files, directory names, shebangs,
//!   modelines, content markers and manifest dependencies)
//! - **Root locator**: checks the start directory for a project marker, then
//!   the conventional `src` and `app` subdirectories one level down; it never
//!   looks above the start directory
//! - **Manifest inspector**: answers "does this manifest declare dependency X?"
//!   for package.json, pom.xml, Gradle scripts, Cargo.toml, pubspec.yaml and
//!   line-oriented requirement files
//! - **Tree scanner**: the single traversal that applies every rule, with
//!   dependency caches and build output excluded
//! - **Aggregation**: results combine by set union, so the outcome does not
//!   depend on traversal order or thread count
//!
//! # Example Usage
//!
//! ```no_run
//! use stackprobe::{detect, DetectConfig};
//! use std::path::Path;
//!
//! let technologies = detect(Path::new("/path/to/repo"), &DetectConfig::default())?;
//! for id in &technologies {
//!     println!("{}", id);
//! }
//! # Ok::<(), stackprobe::DetectError>(())
//! ```

pub mod aggregate;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod locator;
pub mod manifest;
pub mod scanner;
pub mod util;

pub use aggregate::{aggregate, ScanResult};
pub use catalog::{Catalog, CatalogError, CatalogFormat, DetectionRule, TechnologyId};
pub use config::{CatalogSource, ConfigError, DetectConfig};
pub use detector::{detect, Detector};
pub use error::DetectError;
pub use locator::{locate_root, locate_root_in, DEFAULT_ROOT_MARKERS};
pub use manifest::{ManifestError, ManifestInspector, ManifestKind, MatchMode};
pub use scanner::{
    CancelToken, ScanConfig, ScanControl, ScanReport, ScanStats, TraversalOrder, TreeScanner,
};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
