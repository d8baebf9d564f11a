use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use cinecluster::{
    init_tracing, AppState, ClusterAssignment, ClusterId, ClusterProfile, Config,
    PreferenceRequest, Recommendation, RecommendationRequest, RecommendationResponse,
    RecommenderError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const CLUSTER_PROFILE_TOP_N: usize = 5;

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
    limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    message: String,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, RecommenderError>;

async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HashMap<String, String>>> {
    let mut status = HashMap::new();
    status.insert("status".to_string(), "healthy".to_string());
    status.insert("service".to_string(), "cinecluster".to_string());
    status.insert("version".to_string(), env!("CARGO_PKG_VERSION").to_string());
    status.insert("model_version".to_string(), state.model.version().to_string());

    Json(ApiResponse::success(status))
}

async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> ApiResult<RecommendationResponse> {
    let response = state
        .recommendation_service
        .recommend(&request)
        .inspect_err(|e| tracing::warn!("Recommendation request rejected: {}", e))?;
    Ok(Json(ApiResponse::success(response)))
}

async fn assign_preferences(
    State(state): State<AppState>,
    Json(request): Json<PreferenceRequest>,
) -> ApiResult<ClusterAssignment> {
    let assignment = state.recommendation_service.assign_preferences(&request)?;
    Ok(Json(ApiResponse::success(assignment)))
}

async fn get_cluster(
    State(state): State<AppState>,
    Path(cluster_id): Path<ClusterId>,
) -> ApiResult<ClusterProfile> {
    let profile = state
        .recommendation_service
        .cluster_profile(cluster_id, CLUSTER_PROFILE_TOP_N)?;
    Ok(Json(ApiResponse::success(profile)))
}

async fn list_categories(State(state): State<AppState>) -> Json<ApiResponse<Vec<String>>> {
    Json(ApiResponse::success(
        state.recommendation_service.categories().to_vec(),
    ))
}

async fn search_titles(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<ApiResponse<Vec<Recommendation>>> {
    let limit = params
        .limit
        .unwrap_or(state.config.recommendation.default_limit)
        .min(state.config.recommendation.max_limit);
    Json(ApiResponse::success(
        state.recommendation_service.search_titles(&params.q, limit),
    ))
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/recommendations", post(recommend))
        .route("/profile/cluster", post(assign_preferences))
        .route("/clusters/:cluster_id", get(get_cluster))
        .route("/catalog/categories", get(list_categories))
        .route("/catalog/search", get(search_titles))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn load_config(path: &str) -> anyhow::Result<Option<Config>> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path).map(Some)
    } else {
        Ok(None)
    }
}

fn main() -> anyhow::Result<()> {
    let path = std::env::var("CINECLUSTER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let loaded = load_config(&path)?;
    let workers = loaded
        .as_ref()
        .map_or_else(num_cpus::get, |config| config.server.workers)
        .max(1);

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .enable_all()
        .build()?
        .block_on(serve(path, loaded))
}

async fn serve(path: String, loaded: Option<Config>) -> anyhow::Result<()> {
    init_tracing();

    let config = loaded.unwrap_or_else(|| {
        info!("Config file {} not found, using default configuration", path);
        Config::default()
    });
    info!("Starting cinecluster server with config: {:?}", config.server);

    let addr = config.server.socket_addr()?;
    let state = AppState::new(config).await?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
