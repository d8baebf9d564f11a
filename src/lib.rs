pub mod algorithms;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{RecommenderError, RecommenderResult};
pub use models::*;

use algorithms::ClusterModel;
use anyhow::Result;
use services::catalog::CatalogStore;
use services::loader::{CatalogLoader, JsonFileLoader, ModelLoader};
use services::recommendation::RecommendationService;
use std::sync::Arc;
use tracing::info;

/// Immutable state loaded once at startup and shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<CatalogStore>,
    pub model: Arc<ClusterModel>,
    pub recommendation_service: Arc<RecommendationService>,
}

impl AppState {
    /// Loads catalog and model from the paths in `config`.
    pub async fn new(config: Config) -> Result<Self> {
        let loader = JsonFileLoader::new(config.catalog.path.clone(), config.model.path.clone());
        Self::load(config, &loader, &loader).await
    }

    pub async fn load(
        config: Config,
        catalog_loader: &dyn CatalogLoader,
        model_loader: &dyn ModelLoader,
    ) -> Result<Self> {
        let retries = config.loader.max_retries;
        let delay = config.loader.initial_delay();

        let items =
            utils::retry_with_backoff(|| async move { catalog_loader.load_catalog() }, retries, delay)
                .await?;
        let bundle =
            utils::retry_with_backoff(|| async move { model_loader.load_model() }, retries, delay)
                .await?;

        Ok(Self::from_parts(config, CatalogStore::new(items), bundle)?)
    }

    /// Assembles state from already-loaded parts, checking the model for
    /// internal consistency.
    pub fn from_parts(
        config: Config,
        catalog: CatalogStore,
        bundle: ModelBundle,
    ) -> RecommenderResult<Self> {
        let config = Arc::new(config);
        let model = Arc::new(ClusterModel::from_bundle(bundle, config.model.aggregation)?);
        let catalog = Arc::new(catalog);

        let unmapped = catalog
            .cluster_ids()
            .filter(|id| !model.cluster_ids().any(|m| m == *id))
            .count();
        if unmapped > 0 {
            tracing::warn!("{} catalog clusters have no centroid", unmapped);
        }
        info!(
            "Model {} ready: {} features, {} catalog items",
            model.version(),
            model.schema().len(),
            catalog.len()
        );

        let recommendation_service = Arc::new(RecommendationService::new(
            catalog.clone(),
            model.clone(),
            config.clone(),
        ));

        Ok(Self {
            config,
            catalog,
            model,
            recommendation_service,
        })
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
