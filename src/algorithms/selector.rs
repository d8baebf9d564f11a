use crate::error::{RecommenderError, RecommenderResult};
use crate::models::{CatalogItem, ClusterId, Recommendation};
use crate::services::catalog::CatalogStore;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOrder {
    /// Catalog load order.
    #[default]
    Catalog,
    /// Highest popularity first, catalog order among equals.
    Popularity,
    /// Uniform sample without replacement.
    Random,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    #[default]
    Title,
    Id,
}

#[derive(Debug, Clone, Default)]
pub struct RecommendationSelector {
    pub order: SelectionOrder,
    pub dedup: DedupPolicy,
    /// Fixed seed for `Random`; fresh entropy per call when unset.
    pub seed: Option<u64>,
}

impl RecommendationSelector {
    pub fn new(order: SelectionOrder, dedup: DedupPolicy, seed: Option<u64>) -> Self {
        Self { order, dedup, seed }
    }

    pub fn select(
        &self,
        catalog: &CatalogStore,
        cluster_id: ClusterId,
        excluded: &HashSet<String>,
        limit: usize,
    ) -> RecommenderResult<Vec<Recommendation>> {
        if limit == 0 {
            return Err(RecommenderError::InvalidLimit { requested: limit });
        }

        let mut seen_titles = HashSet::new();
        let mut seen_ids = HashSet::new();
        let mut eligible: Vec<&CatalogItem> = catalog
            .items_in_cluster(cluster_id)
            .filter(|item| !excluded.contains(&item.title))
            .filter(|item| match self.dedup {
                DedupPolicy::Title => seen_titles.insert(item.title.as_str()),
                DedupPolicy::Id => seen_ids.insert(item.id),
            })
            .collect();

        match self.order {
            SelectionOrder::Catalog => eligible.truncate(limit),
            SelectionOrder::Popularity => {
                // stable sort keeps catalog order among equal scores
                eligible.sort_by(|a, b| {
                    b.popularity
                        .partial_cmp(&a.popularity)
                        .unwrap_or(Ordering::Equal)
                });
                eligible.truncate(limit);
            }
            SelectionOrder::Random => {
                let mut rng = match self.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                let amount = limit.min(eligible.len());
                let sampled = eligible.partial_shuffle(&mut rng, amount).0.to_vec();
                eligible = sampled;
            }
        }

        Ok(eligible.into_iter().map(CatalogItem::to_recommendation).collect())
    }
}

/// Stable catalog order, title dedup.
pub fn select(
    catalog: &CatalogStore,
    cluster_id: ClusterId,
    excluded: &HashSet<String>,
    limit: usize,
) -> RecommenderResult<Vec<Recommendation>> {
    RecommendationSelector::default().select(catalog, cluster_id, excluded, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> CatalogStore {
        CatalogStore::new(vec![
            CatalogItem::new(1, "Alien", 0).with_popularity(0.4),
            CatalogItem::new(2, "Aliens", 0).with_popularity(0.9),
            CatalogItem::new(3, "Alien", 0).with_popularity(1.0),
            CatalogItem::new(4, "Blade Runner", 0).with_popularity(0.9),
            CatalogItem::new(5, "Brazil", 1).with_popularity(0.2),
            CatalogItem::new(6, "The Thing", 0).with_popularity(0.1),
        ])
    }

    fn titles(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_catalog_order_dedups_and_excludes() {
        let excluded: HashSet<String> = ["Aliens".to_string()].into_iter().collect();
        let recs = select(&catalog(), 0, &excluded, 10).unwrap();
        assert_eq!(titles(&recs), vec!["Alien", "Blade Runner", "The Thing"]);
        assert_eq!(recs[0].id, 1);
    }

    #[test]
    fn test_limit_truncates() {
        let recs = select(&catalog(), 0, &HashSet::new(), 2).unwrap();
        assert_eq!(titles(&recs), vec!["Alien", "Aliens"]);

        let err = select(&catalog(), 0, &HashSet::new(), 0).unwrap_err();
        assert!(matches!(err, RecommenderError::InvalidLimit { requested: 0 }));
    }

    #[test]
    fn test_empty_cluster_is_not_an_error() {
        let recs = select(&catalog(), 42, &HashSet::new(), 5).unwrap();
        assert!(recs.is_empty());

        let excluded: HashSet<String> = ["Brazil".to_string()].into_iter().collect();
        assert!(select(&catalog(), 1, &excluded, 5).unwrap().is_empty());
    }

    #[test]
    fn test_popularity_order_is_stable() {
        let selector =
            RecommendationSelector::new(SelectionOrder::Popularity, DedupPolicy::Title, None);
        let recs = selector.select(&catalog(), 0, &HashSet::new(), 3).unwrap();
        // the popular duplicate "Alien" (id 3) was already dropped by dedup
        assert_eq!(titles(&recs), vec!["Aliens", "Blade Runner", "Alien"]);
    }

    #[test]
    fn test_id_dedup_keeps_repeated_titles() {
        let selector = RecommendationSelector::new(SelectionOrder::Catalog, DedupPolicy::Id, None);
        let recs = selector.select(&catalog(), 0, &HashSet::new(), 10).unwrap();
        assert_eq!(recs.len(), 5);
    }

    #[test]
    fn test_random_sample_is_seeded_and_valid() {
        let selector =
            RecommendationSelector::new(SelectionOrder::Random, DedupPolicy::Title, Some(7));
        let excluded: HashSet<String> = ["The Thing".to_string()].into_iter().collect();

        let first = selector.select(&catalog(), 0, &excluded, 2).unwrap();
        let second = selector.select(&catalog(), 0, &excluded, 2).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);

        let unique: HashSet<&str> = first.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(unique.len(), 2);
        assert!(!unique.contains("The Thing"));

        let unseeded = RecommendationSelector::new(SelectionOrder::Random, DedupPolicy::Title, None);
        let all = unseeded.select(&catalog(), 0, &HashSet::new(), 100).unwrap();
        assert_eq!(all.len(), 4);
    }
}
