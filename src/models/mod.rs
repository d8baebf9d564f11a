use crate::error::RecommenderError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

pub type ClusterId = u32;

/// Name of the leading feature slot holding the mean pick rating.
pub const RATING_FEATURE: &str = "rating";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    pub cluster_id: ClusterId,
    #[serde(default)]
    pub popularity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureSchema {
    features: Vec<String>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPick {
    pub title: String,
    pub rating: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub picks: Vec<UserPick>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    pub center: Vec<f32>,
    pub scale: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub cluster_id: ClusterId,
    pub values: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: u64,
    pub title: String,
    pub categories: BTreeSet<String>,
}

/// Everything fitted offline, shipped together so the pieces cannot drift apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub version: String,
    pub schema: FeatureSchema,
    pub normalization: NormalizationParams,
    pub centroids: Vec<Centroid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub cluster_id: ClusterId,
    pub distance: f32,
    pub raw: FeatureVector,
    pub normalized: FeatureVector,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub picks: Vec<UserPick>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub exclude_titles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub request_id: Uuid,
    pub cluster_id: ClusterId,
    pub distance: f32,
    pub model_version: String,
    pub recommendations: Vec<Recommendation>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceRequest {
    pub average_rating: f32,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterProfile {
    pub cluster_id: ClusterId,
    pub mean_rating: f32,
    pub top_categories: Vec<(String, f32)>,
    pub item_count: usize,
}

impl CatalogItem {
    pub fn new(id: u64, title: impl Into<String>, cluster_id: ClusterId) -> Self {
        Self {
            id,
            title: title.into(),
            categories: BTreeSet::new(),
            cluster_id,
            popularity: 0.0,
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_popularity(mut self, popularity: f32) -> Self {
        self.popularity = popularity;
        self
    }

    pub fn to_recommendation(&self) -> Recommendation {
        Recommendation {
            id: self.id,
            title: self.title.clone(),
            categories: self.categories.clone(),
        }
    }
}

impl FeatureSchema {
    /// Builds `["rating", categories...]` in the given category order.
    pub fn with_categories<I, S>(categories: I) -> Result<Self, RecommenderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut features = vec![RATING_FEATURE.to_string()];
        features.extend(categories.into_iter().map(Into::into));
        Self::try_from(features)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Category features, i.e. everything after the rating slot.
    pub fn categories(&self) -> &[String] {
        &self.features[1..]
    }

    pub fn index_of(&self, feature: &str) -> Option<usize> {
        self.index.get(feature).copied()
    }

    /// Slot of a category feature. The rating slot is never a category.
    pub fn category_index(&self, category: &str) -> Option<usize> {
        self.index_of(category).filter(|&i| i != 0)
    }
}

impl TryFrom<Vec<String>> for FeatureSchema {
    type Error = RecommenderError;

    fn try_from(features: Vec<String>) -> Result<Self, Self::Error> {
        match features.first() {
            Some(first) if first == RATING_FEATURE => {}
            _ => {
                return Err(RecommenderError::InvalidModel(format!(
                    "feature schema must start with '{}'",
                    RATING_FEATURE
                )))
            }
        }

        let mut index = HashMap::with_capacity(features.len());
        for (i, name) in features.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(RecommenderError::InvalidModel(format!(
                    "duplicate feature '{}' in schema",
                    name
                )));
            }
        }

        Ok(Self { features, index })
    }
}

impl From<FeatureSchema> for Vec<String> {
    fn from(schema: FeatureSchema) -> Self {
        schema.features
    }
}

impl UserPick {
    pub fn new(title: impl Into<String>, rating: f32) -> Self {
        Self {
            title: title.into(),
            rating,
        }
    }
}

impl UserProfile {
    pub fn new(picks: Vec<UserPick>) -> Self {
        Self { picks }
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.picks.iter().map(|p| p.title.as_str())
    }

    /// Drops repeated titles, keeping the first pick for each.
    /// Returns how many picks were removed.
    pub fn dedup_by_title(&mut self) -> usize {
        let before = self.picks.len();
        let mut seen = std::collections::HashSet::new();
        self.picks.retain(|p| seen.insert(p.title.clone()));
        before - self.picks.len()
    }
}

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn rating(&self) -> Option<f32> {
        self.values.first().copied()
    }
}

impl NormalizationParams {
    pub fn new(center: Vec<f32>, scale: Vec<f32>) -> Self {
        Self { center, scale }
    }

    /// Params that leave vectors unchanged.
    pub fn identity(len: usize) -> Self {
        Self {
            center: vec![0.0; len],
            scale: vec![1.0; len],
        }
    }
}

impl Centroid {
    pub fn new(cluster_id: ClusterId, values: Vec<f32>) -> Self {
        Self { cluster_id, values }
    }
}

impl RecommendationRequest {
    pub fn new(picks: Vec<UserPick>) -> Self {
        Self {
            picks,
            limit: None,
            exclude_titles: Vec::new(),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_exclusions(mut self, titles: Vec<String>) -> Self {
        self.exclude_titles = titles;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_requires_leading_rating() {
        let schema = FeatureSchema::with_categories(["Action", "Drama"]).unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.index_of("rating"), Some(0));
        assert_eq!(schema.category_index("Drama"), Some(2));
        assert_eq!(schema.category_index("rating"), None);
        assert_eq!(schema.categories(), &["Action".to_string(), "Drama".to_string()]);

        let err = FeatureSchema::try_from(vec!["Action".to_string()]).unwrap_err();
        assert!(matches!(err, RecommenderError::InvalidModel(_)));
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        let result = FeatureSchema::with_categories(["Action", "Action"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_schema_serializes_as_list() {
        let schema = FeatureSchema::with_categories(["Comedy"]).unwrap();
        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(json, r#"["rating","Comedy"]"#);

        let parsed: FeatureSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, schema);
        assert!(serde_json::from_str::<FeatureSchema>(r#"["Comedy"]"#).is_err());
    }

    #[test]
    fn test_profile_dedup_keeps_first() {
        let mut profile = UserProfile::new(vec![
            UserPick::new("Alien", 4.0),
            UserPick::new("Heat", 3.0),
            UserPick::new("Alien", 1.0),
        ]);

        assert_eq!(profile.dedup_by_title(), 1);
        assert_eq!(profile.len(), 2);
        assert_eq!(profile.picks[0], UserPick::new("Alien", 4.0));
    }

    #[test]
    fn test_catalog_item_defaults() {
        let item: CatalogItem =
            serde_json::from_str(r#"{"id": 1, "title": "Up", "cluster_id": 2}"#).unwrap();
        assert!(item.categories.is_empty());
        assert_eq!(item.popularity, 0.0);

        let rec = item.with_categories(["Animation"]).to_recommendation();
        assert_eq!(rec.title, "Up");
        assert!(rec.categories.contains("Animation"));
    }
}
