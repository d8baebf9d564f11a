pub mod assigner;
pub mod normalizer;
pub mod selector;
pub mod vectorizer;

pub use assigner::{assign, NearestCentroid};
pub use normalizer::{normalize, Normalizer};
pub use selector::{select, DedupPolicy, RecommendationSelector, SelectionOrder};
pub use vectorizer::{vectorize, vectorize_preferences, vectorize_with, CategoryAggregation};

use crate::error::{RecommenderError, RecommenderResult};
use crate::models::*;
use crate::services::catalog::CatalogStore;

/// The fitted schema, normalizer and centroids, checked against each other
/// once and then shared read-only.
#[derive(Debug, Clone)]
pub struct ClusterModel {
    version: String,
    schema: FeatureSchema,
    normalizer: Normalizer,
    assigner: NearestCentroid,
    aggregation: CategoryAggregation,
}

impl ClusterModel {
    pub fn from_bundle(
        bundle: ModelBundle,
        aggregation: CategoryAggregation,
    ) -> RecommenderResult<Self> {
        let expected = bundle.schema.len();
        let normalization = &bundle.normalization;

        if normalization.center.len() != expected {
            return Err(RecommenderError::schema_mismatch(
                "normalization center",
                expected,
                normalization.center.len(),
            ));
        }
        if normalization.scale.len() != expected {
            return Err(RecommenderError::schema_mismatch(
                "normalization scale",
                expected,
                normalization.scale.len(),
            ));
        }
        let normalizer = Normalizer::new(normalization)?;

        let assigner = NearestCentroid::new(&bundle.centroids)?;
        if assigner.dimension() != expected {
            return Err(RecommenderError::schema_mismatch(
                "centroids",
                expected,
                assigner.dimension(),
            ));
        }

        Ok(Self {
            version: bundle.version,
            schema: bundle.schema,
            normalizer,
            assigner,
            aggregation,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn aggregation(&self) -> CategoryAggregation {
        self.aggregation
    }

    pub fn cluster_ids(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.assigner.cluster_ids()
    }

    pub fn vectorize(
        &self,
        profile: &UserProfile,
        catalog: &CatalogStore,
    ) -> RecommenderResult<FeatureVector> {
        vectorize_with(profile, &self.schema, catalog, self.aggregation)
    }

    /// Normalizes a raw vector and finds its cluster.
    pub fn assign_vector(&self, raw: FeatureVector) -> RecommenderResult<ClusterAssignment> {
        let normalized = self.normalizer.normalize(&raw)?;
        let (cluster_id, distance) = self.assigner.nearest(&normalized)?;
        Ok(ClusterAssignment {
            cluster_id,
            distance,
            raw,
            normalized,
        })
    }

    pub fn assign_profile(
        &self,
        profile: &UserProfile,
        catalog: &CatalogStore,
    ) -> RecommenderResult<ClusterAssignment> {
        let raw = self.vectorize(profile, catalog)?;
        self.assign_vector(raw)
    }

    pub fn assign_preferences(
        &self,
        average_rating: f32,
        categories: &[String],
    ) -> RecommenderResult<ClusterAssignment> {
        let raw = vectorize_preferences(average_rating, categories, &self.schema)?;
        self.assign_vector(raw)
    }

    /// Centroid of `cluster_id` in raw feature units.
    pub fn raw_centroid(&self, cluster_id: ClusterId) -> RecommenderResult<FeatureVector> {
        let centroid = self
            .assigner
            .centroid(cluster_id)
            .ok_or(RecommenderError::UnknownCluster(cluster_id))?;
        self.normalizer.denormalize(&centroid)
    }
}
