//! Review entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

pub const MAX_REVIEW_LENGTH: usize = 2000;

/// A user's review of a product. At most one review exists per
/// (product, user) pair; that uniqueness is enforced by the store.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    #[sqlx(rename = "product_id")]
    pub product: Uuid,
    #[sqlx(rename = "user_id")]
    pub user: Uuid,
    /// Whole-star rating, 1 through 5.
    pub rating: i32,
    pub review: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    /// Builds a validated review.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the rating is outside 1–5 or the text is
    /// empty or too long.
    pub fn new(product: Uuid, user: Uuid, rating: i32, text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        validate_rating(rating)?;
        validate_text(&text)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            product,
            user,
            rating,
            review: text,
            created_at: now,
            updated_at: now,
        })
    }
}

pub fn validate_rating(rating: i32) -> Result<()> {
    if !(1..=5).contains(&rating) {
        return Err(Error::invalid("Rating must be between 1 and 5"));
    }
    Ok(())
}

pub fn validate_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::invalid("Review cannot be empty"));
    }
    if text.len() > MAX_REVIEW_LENGTH {
        return Err(Error::invalid(
            "A review must have less than or equal to 2000 characters",
        ));
    }
    Ok(())
}
