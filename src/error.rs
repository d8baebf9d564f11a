use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::ClusterId;

/// Validation failures raised by the recommendation pipeline.
///
/// Every variant carries enough context to render a user-facing message.
/// None of them are worth retrying: the same input fails the same way.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RecommenderError {
    #[error("Unknown item: {title}")]
    UnknownItem { title: String },

    #[error("Unknown category: {category}")]
    UnknownCategory { category: String },

    #[error("Schema mismatch in {context}: expected {expected} features, got {actual}")]
    SchemaMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("No cluster centroids configured")]
    EmptyCentroidSet,

    #[error("Profile contains no picks")]
    EmptyProfile,

    #[error("Profile contains {count} picks (max {max})")]
    TooManyPicks { count: usize, max: usize },

    #[error("Invalid rating {rating} for '{title}'")]
    InvalidRating { title: String, rating: f32 },

    #[error("Feature {index} is NaN or Infinity")]
    NonFiniteFeature { index: usize },

    #[error("Scale for feature {index} must be finite and non-zero, got {value}")]
    DegenerateScale { index: usize, value: f32 },

    #[error("Recommendation limit {requested} is out of range")]
    InvalidLimit { requested: usize },

    #[error("Unknown cluster: {0}")]
    UnknownCluster(ClusterId),

    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

impl RecommenderError {
    pub fn schema_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::SchemaMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// True when the caller supplied bad input, as opposed to the loaded
    /// model being inconsistent.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownItem { .. }
                | Self::UnknownCategory { .. }
                | Self::EmptyProfile
                | Self::TooManyPicks { .. }
                | Self::InvalidRating { .. }
                | Self::InvalidLimit { .. }
                | Self::NonFiniteFeature { .. }
        )
    }
}

impl IntoResponse for RecommenderError {
    fn into_response(self) -> Response {
        let status = match &self {
            RecommenderError::UnknownCluster(_) => StatusCode::NOT_FOUND,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "success": false,
            "data": null,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type RecommenderResult<T> = Result<T, RecommenderError>;
