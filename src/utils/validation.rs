use crate::config::RecommendationConfig;
use crate::error::{RecommenderError, RecommenderResult};
use crate::models::*;

pub fn validate_profile(profile: &UserProfile, settings: &RecommendationConfig) -> RecommenderResult<()> {
    if profile.is_empty() {
        return Err(RecommenderError::EmptyProfile);
    }

    if profile.len() > settings.max_picks {
        return Err(RecommenderError::TooManyPicks {
            count: profile.len(),
            max: settings.max_picks,
        });
    }

    for pick in &profile.picks {
        validate_rating(&pick.title, pick.rating, settings)?;
    }

    Ok(())
}

pub fn validate_rating(
    title: &str,
    rating: f32,
    settings: &RecommendationConfig,
) -> RecommenderResult<()> {
    if !rating.is_finite() || rating < settings.min_rating || rating > settings.max_rating {
        return Err(RecommenderError::InvalidRating {
            title: title.to_string(),
            rating,
        });
    }
    Ok(())
}

pub fn validate_limit(limit: usize, max_limit: usize) -> RecommenderResult<()> {
    if limit == 0 || limit > max_limit {
        return Err(RecommenderError::InvalidLimit { requested: limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_validate_rating_bounds() {
        let settings = Config::default().recommendation;
        assert!(validate_rating("Heat", 0.5, &settings).is_ok());
        assert!(validate_rating("Heat", 5.0, &settings).is_ok());
        assert!(validate_rating("Heat", 0.0, &settings).is_err());
        assert!(validate_rating("Heat", 5.5, &settings).is_err());
        assert!(validate_rating("Heat", f32::NAN, &settings).is_err());
    }

    #[test]
    fn test_validate_profile() {
        let settings = Config::default().recommendation;
        let profile = UserProfile::new(vec![UserPick::new("Heat", 4.0)]);
        assert!(validate_profile(&profile, &settings).is_ok());

        assert_eq!(
            validate_profile(&UserProfile::default(), &settings),
            Err(RecommenderError::EmptyProfile)
        );
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(1, 100).is_ok());
        assert!(validate_limit(100, 100).is_ok());
        assert_eq!(
            validate_limit(101, 100),
            Err(RecommenderError::InvalidLimit { requested: 101 })
        );
        assert!(validate_limit(0, 100).is_err());
    }
}
