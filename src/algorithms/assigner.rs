use super::normalizer::check_finite;
use crate::error::{RecommenderError, RecommenderResult};
use crate::models::{Centroid, ClusterId, FeatureVector};
use nalgebra::DVector;
use rayon::prelude::*;
use std::collections::HashSet;

/// Nearest-centroid assignment under squared Euclidean distance.
#[derive(Debug, Clone)]
pub struct NearestCentroid {
    centroids: Vec<(ClusterId, DVector<f32>)>,
    dimension: usize,
}

impl NearestCentroid {
    pub fn new(centroids: &[Centroid]) -> RecommenderResult<Self> {
        let first = centroids.first().ok_or(RecommenderError::EmptyCentroidSet)?;
        let dimension = first.values.len();

        let mut seen = HashSet::with_capacity(centroids.len());
        let mut stored = Vec::with_capacity(centroids.len());
        for centroid in centroids {
            if centroid.values.len() != dimension {
                return Err(RecommenderError::schema_mismatch(
                    format!("centroid {}", centroid.cluster_id),
                    dimension,
                    centroid.values.len(),
                ));
            }
            if !seen.insert(centroid.cluster_id) {
                return Err(RecommenderError::InvalidModel(format!(
                    "duplicate centroid for cluster {}",
                    centroid.cluster_id
                )));
            }
            if centroid.values.iter().any(|v| !v.is_finite()) {
                return Err(RecommenderError::InvalidModel(format!(
                    "centroid {} contains NaN or Infinity",
                    centroid.cluster_id
                )));
            }
            stored.push((centroid.cluster_id, DVector::from_column_slice(&centroid.values)));
        }

        Ok(Self {
            centroids: stored,
            dimension,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn cluster_ids(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.centroids.iter().map(|(id, _)| *id)
    }

    pub fn centroid(&self, cluster_id: ClusterId) -> Option<FeatureVector> {
        self.centroids
            .iter()
            .find(|(id, _)| *id == cluster_id)
            .map(|(_, values)| FeatureVector::new(values.as_slice().to_vec()))
    }

    /// Closest cluster and its squared distance. Exact ties go to the lower id.
    pub fn nearest(&self, vector: &FeatureVector) -> RecommenderResult<(ClusterId, f32)> {
        if vector.len() != self.dimension {
            return Err(RecommenderError::schema_mismatch(
                "cluster assignment",
                self.dimension,
                vector.len(),
            ));
        }
        check_finite(vector)?;

        let query = DVector::from_column_slice(vector.as_slice());
        let mut best: Option<(ClusterId, f32)> = None;

        for (cluster_id, centroid) in &self.centroids {
            let distance = (&query - centroid).norm_squared();
            best = match best {
                Some((best_id, best_distance))
                    if best_distance < distance
                        || (best_distance == distance && best_id < *cluster_id) =>
                {
                    Some((best_id, best_distance))
                }
                _ => Some((*cluster_id, distance)),
            };
        }

        best.ok_or(RecommenderError::EmptyCentroidSet)
    }

    pub fn assign(&self, vector: &FeatureVector) -> RecommenderResult<ClusterId> {
        self.nearest(vector).map(|(cluster_id, _)| cluster_id)
    }

    /// Assigns many vectors in parallel, preserving input order.
    pub fn assign_batch(&self, vectors: &[FeatureVector]) -> Vec<RecommenderResult<ClusterId>> {
        vectors.par_iter().map(|v| self.assign(v)).collect()
    }
}

/// One-shot assignment against an ad hoc centroid list.
pub fn assign(vector: &FeatureVector, centroids: &[Centroid]) -> RecommenderResult<ClusterId> {
    NearestCentroid::new(centroids)?.assign(vector)
}
