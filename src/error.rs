//! Errors that abort detection before any file is scanned

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use thiserror::Error;

/// Fatal detection errors
///
/// Nothing that happens during the walk itself is fatal: unreadable files,
/// broken manifests and missing roots degrade to "not detected".
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Invalid detection catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DetectError {
    pub fn is_catalog_error(&self) -> bool {
        matches!(self, DetectError::Catalog(_))
    }
}
