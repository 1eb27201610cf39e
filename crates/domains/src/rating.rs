//! Running-mean rating aggregate stored on each story.

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Individual ratings are not kept at story level; only the mean and the
/// number of ratings folded into it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingAggregate {
    pub mean: f64,
    pub count: u64,
}

impl RatingAggregate {
    /// Folds one more rating into the mean: `(m*n + r) / (n + 1)`.
    pub fn record(self, value: u8) -> Result<Self> {
        validate_rating(value)?;
        let count = self.count + 1;
        let mean = (self.mean * self.count as f64 + f64::from(value)) / count as f64;
        Ok(Self { mean, count })
    }
}

pub fn validate_rating(value: u8) -> Result<()> {
    if (MIN_RATING..=MAX_RATING).contains(&value) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_updates_running_mean() {
        let agg = RatingAggregate { mean: 4.0, count: 10 };
        let next = agg.record(5).unwrap();
        assert_eq!(next.count, 11);
        assert!((next.mean - 45.0 / 11.0).abs() < 1e-9);
        assert!((next.mean - 4.0909).abs() < 1e-4);
    }

    #[test]
    fn first_rating_becomes_the_mean() {
        let next = RatingAggregate::default().record(3).unwrap();
        assert_eq!(next, RatingAggregate { mean: 3.0, count: 1 });
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(matches!(
            RatingAggregate::default().record(0),
            Err(AppError::ValidationError(_))
        ));
        assert!(RatingAggregate::default().record(6).is_err());
    }
}
