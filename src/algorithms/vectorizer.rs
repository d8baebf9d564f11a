//! Profile vectorization.
//!
//! A profile becomes `[mean rating, category slot...]` aligned to the
//! [`FeatureSchema`]. Category slots aggregate across picks according to
//! [`CategoryAggregation`].

use crate::error::{RecommenderError, RecommenderResult};
use crate::models::*;
use crate::services::catalog::CatalogStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryAggregation {
    /// Each pick carrying a category adds 1 to its slot.
    #[default]
    Count,
    /// A slot is 1 when any pick carries the category.
    Presence,
}

/// Vectorizes with count aggregation.
pub fn vectorize(
    profile: &UserProfile,
    schema: &FeatureSchema,
    catalog: &CatalogStore,
) -> RecommenderResult<FeatureVector> {
    vectorize_with(profile, schema, catalog, CategoryAggregation::Count)
}

pub fn vectorize_with(
    profile: &UserProfile,
    schema: &FeatureSchema,
    catalog: &CatalogStore,
    aggregation: CategoryAggregation,
) -> RecommenderResult<FeatureVector> {
    if profile.is_empty() {
        return Err(RecommenderError::EmptyProfile);
    }

    // Resolve everything up front so a bad pick never yields a partial vector.
    // Repeated titles keep their first rating.
    let mut seen = HashSet::with_capacity(profile.len());
    let mut resolved = Vec::with_capacity(profile.len());
    for pick in &profile.picks {
        if !seen.insert(pick.title.as_str()) {
            continue;
        }
        if !pick.rating.is_finite() {
            return Err(RecommenderError::InvalidRating {
                title: pick.title.clone(),
                rating: pick.rating,
            });
        }
        let item = catalog
            .get_by_title(&pick.title)
            .ok_or_else(|| RecommenderError::UnknownItem {
                title: pick.title.clone(),
            })?;
        resolved.push((item, pick.rating));
    }

    let mut vector = FeatureVector::zeros(schema.len());
    let rating_sum: f32 = resolved.iter().map(|(_, rating)| rating).sum();
    vector.values[0] = rating_sum / resolved.len() as f32;

    for (item, _) in &resolved {
        for category in &item.categories {
            if let Some(slot) = schema.category_index(category) {
                match aggregation {
                    CategoryAggregation::Count => vector.values[slot] += 1.0,
                    CategoryAggregation::Presence => vector.values[slot] = 1.0,
                }
            }
        }
    }

    Ok(vector)
}

/// Builds a vector straight from a stated average rating and liked categories,
/// one-hot encoded. Every category must belong to the schema.
pub fn vectorize_preferences(
    average_rating: f32,
    categories: &[String],
    schema: &FeatureSchema,
) -> RecommenderResult<FeatureVector> {
    if !average_rating.is_finite() {
        return Err(RecommenderError::InvalidRating {
            title: RATING_FEATURE.to_string(),
            rating: average_rating,
        });
    }

    let mut vector = FeatureVector::zeros(schema.len());
    vector.values[0] = average_rating;

    for category in categories {
        let slot = schema
            .category_index(category)
            .ok_or_else(|| RecommenderError::UnknownCategory {
                category: category.clone(),
            })?;
        vector.values[slot] = 1.0;
    }

    Ok(vector)
}
