use crate::algorithms::{CategoryAggregation, DedupPolicy, RecommendationSelector, SelectionOrder};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub model: ModelConfig,
    pub loader: LoaderConfig,
    pub recommendation: RecommendationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub aggregation: CategoryAggregation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub max_retries: usize,
    pub initial_delay_ms: u64,
}

impl LoaderConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    pub max_picks: usize,
    pub default_limit: usize,
    pub max_limit: usize,
    pub min_rating: f32,
    pub max_rating: f32,
    pub ordering: SelectionOrder,
    pub dedup: DedupPolicy,
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl RecommendationConfig {
    pub fn selector(&self) -> RecommendationSelector {
        RecommendationSelector::new(self.ordering, self.dedup, self.random_seed)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                workers: num_cpus::get(),
            },
            catalog: CatalogConfig {
                path: PathBuf::from("data/catalog.json"),
            },
            model: ModelConfig {
                path: PathBuf::from("data/model.json"),
                aggregation: CategoryAggregation::Count,
            },
            loader: LoaderConfig {
                max_retries: 3,
                initial_delay_ms: 200,
            },
            recommendation: RecommendationConfig {
                max_picks: 6,
                default_limit: 10,
                max_limit: 100,
                min_rating: 0.5,
                max_rating: 5.0,
                ordering: SelectionOrder::Catalog,
                dedup: DedupPolicy::Title,
                random_seed: None,
            },
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("CINECLUSTER").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
