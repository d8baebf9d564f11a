use crate::models::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

/// Read-only catalog held for the lifetime of the process.
///
/// Items keep their load order, which is the order the selector treats as
/// "catalog order". Title lookups resolve to the first item carrying that
/// title.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    items: Vec<CatalogItem>,
    by_title: HashMap<String, usize>,
    cluster_sizes: BTreeMap<ClusterId, usize>,
}

impl CatalogStore {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        let mut by_title = HashMap::with_capacity(items.len());
        let mut cluster_sizes = BTreeMap::new();
        let mut duplicates = 0usize;

        for (i, item) in items.iter().enumerate() {
            if by_title.contains_key(&item.title) {
                duplicates += 1;
            } else {
                by_title.insert(item.title.clone(), i);
            }
            *cluster_sizes.entry(item.cluster_id).or_insert(0) += 1;
        }

        if duplicates > 0 {
            debug!("Catalog contains {} duplicate titles", duplicates);
        }
        info!(
            "Catalog loaded: {} items across {} clusters",
            items.len(),
            cluster_sizes.len()
        );

        Self {
            items,
            by_title,
            cluster_sizes,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get_by_title(&self, title: &str) -> Option<&CatalogItem> {
        self.by_title.get(title).map(|&i| &self.items[i])
    }

    pub fn contains_title(&self, title: &str) -> bool {
        self.by_title.contains_key(title)
    }

    pub fn items_in_cluster(&self, cluster_id: ClusterId) -> impl Iterator<Item = &CatalogItem> {
        self.items.iter().filter(move |item| item.cluster_id == cluster_id)
    }

    /// Number of catalog rows tagged with the cluster, duplicates included.
    pub fn cluster_size(&self, cluster_id: ClusterId) -> usize {
        self.cluster_sizes.get(&cluster_id).copied().unwrap_or(0)
    }

    pub fn cluster_ids(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.cluster_sizes.keys().copied()
    }

    pub fn categories(&self) -> BTreeSet<&str> {
        self.items
            .iter()
            .flat_map(|item| item.categories.iter().map(String::as_str))
            .collect()
    }

    /// Case-insensitive substring match over distinct titles, in catalog order.
    pub fn search_titles(&self, query: &str, limit: usize) -> Vec<&CatalogItem> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.items
            .iter()
            .enumerate()
            .filter(|(i, item)| self.by_title.get(&item.title) == Some(i))
            .map(|(_, item)| item)
            .filter(|item| item.title.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }
}

impl From<Vec<CatalogItem>> for CatalogStore {
    fn from(items: Vec<CatalogItem>) -> Self {
        Self::new(items)
    }
}
