use crate::models::{CatalogItem, ModelBundle};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

/// Source of catalog rows. Parsing the underlying format is the loader's job.
pub trait CatalogLoader: Send + Sync {
    fn load_catalog(&self) -> Result<Vec<CatalogItem>>;
}

/// Source of the fitted `(schema, params, centroids)` bundle.
pub trait ModelLoader: Send + Sync {
    fn load_model(&self) -> Result<ModelBundle>;
}

/// Reads the catalog and model from JSON files.
#[derive(Debug, Clone)]
pub struct JsonFileLoader {
    catalog_path: PathBuf,
    model_path: PathBuf,
}

impl JsonFileLoader {
    pub fn new(catalog_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            model_path: model_path.into(),
        }
    }
}

impl CatalogLoader for JsonFileLoader {
    fn load_catalog(&self) -> Result<Vec<CatalogItem>> {
        let items: Vec<CatalogItem> = read_json(&self.catalog_path)?;
        info!("Read {} catalog rows from {}", items.len(), self.catalog_path.display());
        Ok(items)
    }
}

impl ModelLoader for JsonFileLoader {
    fn load_model(&self) -> Result<ModelBundle> {
        let bundle: ModelBundle = read_json(&self.model_path)?;
        info!(
            "Read model {} ({} features, {} centroids) from {}",
            bundle.version,
            bundle.schema.len(),
            bundle.centroids.len(),
            self.model_path.display()
        );
        Ok(bundle)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))
}
