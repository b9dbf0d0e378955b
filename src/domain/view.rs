//! Per-user product view history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry of a user's view history. The store keeps entries in insertion
/// order, capped to the most recent N, so the last entry is the most
/// recently viewed product.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ViewedProduct {
    #[sqlx(rename = "product_id")]
    pub product: Uuid,
    pub viewed_at: DateTime<Utc>,
}
