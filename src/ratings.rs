//! Rating aggregation: recomputes a product's denormalized rating summary
//! from its full review set.
//!
//! The summary is a materialized view. Stores apply it with an atomic
//! update (single SQL statement in Postgres, one write-lock section in
//! memory) synchronously after every review mutation, so a request never
//! completes while the product still shows a stale rating.

/// The denormalized (average, quantity) pair stored on a product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub quantity: i32,
    pub average: f64,
}

impl RatingSummary {
    /// Summarizes a review set. An empty set yields quantity 0 and the
    /// configured neutral default rather than 0, so a product with no
    /// reviews is not ranked as worst-rated.
    pub fn of(ratings: &[i32], neutral_default: f64) -> Self {
        if ratings.is_empty() {
            return Self {
                quantity: 0,
                average: neutral_default,
            };
        }
        let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
        #[allow(clippy::cast_precision_loss)]
        let mean = sum as f64 / ratings.len() as f64;
        Self {
            quantity: ratings.len() as i32,
            average: round_to_tenth(mean),
        }
    }
}

/// Rounds to one decimal, half away from zero.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
