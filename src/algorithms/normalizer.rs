use crate::error::{RecommenderError, RecommenderResult};
use crate::models::{FeatureVector, NormalizationParams};
use nalgebra::DVector;

/// Validated per-feature affine transform `(x - center) / scale`.
#[derive(Debug, Clone)]
pub struct Normalizer {
    center: DVector<f32>,
    scale: DVector<f32>,
}

impl Normalizer {
    pub fn new(params: &NormalizationParams) -> RecommenderResult<Self> {
        check_params(params)?;
        Ok(Self {
            center: DVector::from_column_slice(&params.center),
            scale: DVector::from_column_slice(&params.scale),
        })
    }

    pub fn dimension(&self) -> usize {
        self.center.len()
    }

    pub fn normalize(&self, vector: &FeatureVector) -> RecommenderResult<FeatureVector> {
        self.check_dimension(vector, "normalization input")?;
        check_finite(vector)?;
        let raw = DVector::from_column_slice(vector.as_slice());
        let out = (raw - &self.center).component_div(&self.scale);
        Ok(FeatureVector::new(out.as_slice().to_vec()))
    }

    /// Maps a normalized vector back into raw feature units.
    pub fn denormalize(&self, vector: &FeatureVector) -> RecommenderResult<FeatureVector> {
        self.check_dimension(vector, "denormalization input")?;
        check_finite(vector)?;
        let scaled = DVector::from_column_slice(vector.as_slice());
        let out = scaled.component_mul(&self.scale) + &self.center;
        Ok(FeatureVector::new(out.as_slice().to_vec()))
    }

    fn check_dimension(&self, vector: &FeatureVector, context: &str) -> RecommenderResult<()> {
        if vector.len() != self.dimension() {
            return Err(RecommenderError::schema_mismatch(
                context,
                self.dimension(),
                vector.len(),
            ));
        }
        Ok(())
    }
}

/// Applies `params` to `vector` in one shot.
pub fn normalize(
    vector: &FeatureVector,
    params: &NormalizationParams,
) -> RecommenderResult<FeatureVector> {
    if params.center.len() != vector.len() {
        return Err(RecommenderError::schema_mismatch(
            "normalization center",
            vector.len(),
            params.center.len(),
        ));
    }
    Normalizer::new(params)?.normalize(vector)
}

pub(crate) fn check_finite(vector: &FeatureVector) -> RecommenderResult<()> {
    match vector.values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(RecommenderError::NonFiniteFeature { index }),
        None => Ok(()),
    }
}

fn check_params(params: &NormalizationParams) -> RecommenderResult<()> {
    if params.center.len() != params.scale.len() {
        return Err(RecommenderError::schema_mismatch(
            "normalization scale",
            params.center.len(),
            params.scale.len(),
        ));
    }

    for (index, &value) in params.scale.iter().enumerate() {
        if value == 0.0 || !value.is_finite() {
            return Err(RecommenderError::DegenerateScale { index, value });
        }
    }

    if params.center.iter().any(|c| !c.is_finite()) {
        return Err(RecommenderError::InvalidModel(
            "normalization center contains NaN or Infinity".to_string(),
        ));
    }

    Ok(())
}
