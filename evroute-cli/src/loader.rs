use std::path::{Path, PathBuf};

use evroute_engine::constants::CATALOG_ENV_VAR;
use evroute_engine::{
    CatalogData, CatalogError, CatalogLoader, Optimizer, PlanError, PlannerConfig,
    StaticCatalogLoader,
};

/// Reads a catalog document from disk.
#[derive(Debug, Clone)]
pub struct FileCatalogLoader {
    path: PathBuf,
}

impl FileCatalogLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogLoader for FileCatalogLoader {
    type Error = CatalogError;

    fn load_catalog_data(&self) -> Result<CatalogData, Self::Error> {
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| CatalogError::Source(format!("{}: {e}", self.path.display())))?;
        serde_json::from_str(&raw).map_err(|e| CatalogError::Parse(e.to_string()))
    }
}

/// `--catalog` wins, then the environment variable, then the bundled catalog.
pub fn resolve_catalog_path(flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.or_else(|| {
        std::env::var_os(CATALOG_ENV_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
}

pub fn build_optimizer(
    catalog: Option<&Path>,
    config: PlannerConfig,
) -> Result<Optimizer, PlanError> {
    match catalog {
        Some(path) => {
            let loader = FileCatalogLoader::new(path);
            log::debug!("loading catalog from {}", loader.path().display());
            Optimizer::from_loader(&loader, config)
        }
        None => Optimizer::from_loader(&StaticCatalogLoader, config),
    }
}
