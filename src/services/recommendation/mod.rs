use crate::algorithms::{ClusterModel, RecommendationSelector};
use crate::config::Config;
use crate::error::RecommenderResult;
use crate::models::*;
use crate::services::catalog::CatalogStore;
use crate::utils::{top_k_indices, validation};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Request-facing entry point composing vectorize, normalize, assign, select.
pub struct RecommendationService {
    catalog: Arc<CatalogStore>,
    model: Arc<ClusterModel>,
    selector: RecommendationSelector,
    config: Arc<Config>,
}

impl RecommendationService {
    pub fn new(catalog: Arc<CatalogStore>, model: Arc<ClusterModel>, config: Arc<Config>) -> Self {
        let selector = config.recommendation.selector();
        Self {
            catalog,
            model,
            selector,
            config,
        }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn model(&self) -> &ClusterModel {
        &self.model
    }

    pub fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> RecommenderResult<RecommendationResponse> {
        let request_id = Uuid::new_v4();
        let settings = &self.config.recommendation;

        let limit = request.limit.unwrap_or(settings.default_limit);
        validation::validate_limit(limit, settings.max_limit)?;

        let mut profile = UserProfile::new(request.picks.clone());
        let dropped = profile.dedup_by_title();
        if dropped > 0 {
            warn!("Request {} repeated {} picks, keeping first occurrences", request_id, dropped);
        }
        validation::validate_profile(&profile, settings)?;

        let assignment = self.model.assign_profile(&profile, &self.catalog)?;
        debug!(
            "Request {} vector {:?} -> cluster {} (distance {:.3})",
            request_id, assignment.raw.values, assignment.cluster_id, assignment.distance
        );

        let excluded: HashSet<String> = profile
            .titles()
            .map(str::to_string)
            .chain(request.exclude_titles.iter().cloned())
            .collect();

        let recommendations =
            self.selector
                .select(&self.catalog, assignment.cluster_id, &excluded, limit)?;

        info!(
            "Request {}: {} picks -> cluster {}, {} recommendations",
            request_id,
            profile.len(),
            assignment.cluster_id,
            recommendations.len()
        );

        Ok(RecommendationResponse {
            request_id,
            cluster_id: assignment.cluster_id,
            distance: assignment.distance,
            model_version: self.model.version().to_string(),
            recommendations,
            generated_at: Utc::now(),
        })
    }

    /// Cluster for a stated average rating and liked categories.
    pub fn assign_preferences(
        &self,
        request: &PreferenceRequest,
    ) -> RecommenderResult<ClusterAssignment> {
        validation::validate_rating(
            RATING_FEATURE,
            request.average_rating,
            &self.config.recommendation,
        )?;

        let assignment = self
            .model
            .assign_preferences(request.average_rating, &request.categories)?;
        info!(
            "Preference profile ({} categories) assigned to cluster {}",
            request.categories.len(),
            assignment.cluster_id
        );
        Ok(assignment)
    }

    pub fn cluster_profile(
        &self,
        cluster_id: ClusterId,
        top_n: usize,
    ) -> RecommenderResult<ClusterProfile> {
        let centroid = self.model.raw_centroid(cluster_id)?;
        let categories = self.model.schema().categories();
        let weights = &centroid.values[1..];

        let top_categories = top_k_indices(weights, top_n)
            .into_iter()
            .filter(|&i| weights[i] > 0.0)
            .map(|i| (categories[i].clone(), weights[i]))
            .collect();

        Ok(ClusterProfile {
            cluster_id,
            mean_rating: centroid.values[0],
            top_categories,
            item_count: self.catalog.cluster_size(cluster_id),
        })
    }

    pub fn categories(&self) -> &[String] {
        self.model.schema().categories()
    }

    pub fn search_titles(&self, query: &str, limit: usize) -> Vec<Recommendation> {
        self.catalog
            .search_titles(query, limit)
            .into_iter()
            .map(CatalogItem::to_recommendation)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{CategoryAggregation, SelectionOrder};
    use crate::error::RecommenderError;

    fn service(config: Config) -> RecommendationService {
        let catalog = CatalogStore::new(vec![
            CatalogItem::new(1, "A", 0).with_categories(["Action"]),
            CatalogItem::new(2, "B", 0).with_categories(["Action"]).with_popularity(1.0),
            CatalogItem::new(3, "C", 1).with_categories(["Drama"]),
            CatalogItem::new(4, "D", 0).with_categories(["Action", "Drama"]).with_popularity(5.0),
            CatalogItem::new(5, "B", 0).with_categories(["Action"]),
        ]);
        let bundle = ModelBundle {
            version: "unit".to_string(),
            schema: FeatureSchema::with_categories(["Action", "Drama"]).unwrap(),
            normalization: NormalizationParams::new(vec![3.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]),
            centroids: vec![
                Centroid::new(0, vec![0.0, 1.0, 0.0]),
                Centroid::new(1, vec![0.0, 0.0, 1.0]),
            ],
        };
        let model = ClusterModel::from_bundle(bundle, CategoryAggregation::Count).unwrap();
        RecommendationService::new(Arc::new(catalog), Arc::new(model), Arc::new(config))
    }

    #[test]
    fn test_recommend_excludes_picks_and_dedups() {
        let service = service(Config::default());
        let request = RecommendationRequest::new(vec![UserPick::new("A", 5.0)]);

        let response = service.recommend(&request).unwrap();
        assert_eq!(response.cluster_id, 0);
        assert_eq!(response.model_version, "unit");
        let titles: Vec<&str> = response.recommendations.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "D"]);
    }

    #[test]
    fn test_recommend_respects_request_exclusions_and_limit() {
        let service = service(Config::default());
        let request = RecommendationRequest::new(vec![UserPick::new("A", 5.0)])
            .with_exclusions(vec!["B".to_string()]);
        let response = service.recommend(&request).unwrap();
        assert_eq!(response.recommendations.len(), 1);
        assert_eq!(response.recommendations[0].title, "D");

        let request = RecommendationRequest::new(vec![UserPick::new("A", 5.0)]).with_limit(1);
        assert_eq!(service.recommend(&request).unwrap().recommendations.len(), 1);

        let request = RecommendationRequest::new(vec![UserPick::new("A", 5.0)]).with_limit(0);
        assert!(matches!(
            service.recommend(&request),
            Err(RecommenderError::InvalidLimit { requested: 0 })
        ));
    }

    #[test]
    fn test_duplicate_picks_are_tolerated() {
        let service = service(Config::default());
        let request = RecommendationRequest::new(vec![
            UserPick::new("A", 5.0),
            UserPick::new("A", 1.0),
        ]);
        let response = service.recommend(&request).unwrap();
        assert_eq!(response.cluster_id, 0);
    }

    #[test]
    fn test_profile_validation() {
        let service = service(Config::default());

        let empty = RecommendationRequest::new(Vec::new());
        assert_eq!(service.recommend(&empty).unwrap_err(), RecommenderError::EmptyProfile);

        let picks = (0..7).map(|i| UserPick::new(format!("T{}", i), 3.0)).collect();
        assert_eq!(
            service.recommend(&RecommendationRequest::new(picks)).unwrap_err(),
            RecommenderError::TooManyPicks { count: 7, max: 6 }
        );

        let out_of_range = RecommendationRequest::new(vec![UserPick::new("A", 9.0)]);
        assert!(matches!(
            service.recommend(&out_of_range),
            Err(RecommenderError::InvalidRating { .. })
        ));

        let unknown = RecommendationRequest::new(vec![UserPick::new("Z", 3.0)]);
        assert_eq!(
            service.recommend(&unknown).unwrap_err(),
            RecommenderError::UnknownItem { title: "Z".to_string() }
        );
    }

    #[test]
    fn test_popularity_ordering_from_config() {
        let mut config = Config::default();
        config.recommendation.ordering = SelectionOrder::Popularity;
        let service = service(config);

        let request = RecommendationRequest::new(vec![UserPick::new("A", 4.0)]);
        let response = service.recommend(&request).unwrap();
        assert_eq!(response.recommendations[0].title, "D");
    }

    #[test]
    fn test_preferences_and_cluster_profile() {
        let service = service(Config::default());
        let assignment = service
            .assign_preferences(&PreferenceRequest {
                average_rating: 3.0,
                categories: vec!["Drama".to_string()],
            })
            .unwrap();
        assert_eq!(assignment.cluster_id, 1);

        let profile = service.cluster_profile(0, 3).unwrap();
        assert_eq!(profile.mean_rating, 3.0);
        assert_eq!(profile.top_categories, vec![("Action".to_string(), 1.0)]);
        assert_eq!(profile.item_count, 4);

        assert_eq!(
            service.cluster_profile(5, 3).unwrap_err(),
            RecommenderError::UnknownCluster(5)
        );
    }

    #[test]
    fn test_lookups() {
        let service = service(Config::default());
        assert_eq!(service.categories(), &["Action".to_string(), "Drama".to_string()]);
        assert_eq!(service.search_titles("b", 10).len(), 1);
    }
}
