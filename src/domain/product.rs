//! Product entity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::Error;

/// A purchasable catalog item with price, stock, and a denormalized rating
/// summary. `ratings_average`/`ratings_quantity` are maintained by the rating
/// aggregation engine; `stock`/`sold` are mutated by checkout.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    #[sqlx(try_from = "String")]
    pub category: Category,
    pub brand: String,
    pub images: Vec<String>,
    /// Mean of associated review ratings, rounded to one decimal.
    pub ratings_average: f64,
    pub ratings_quantity: i32,
    /// Units available; never negative.
    pub stock: i32,
    /// Units sold; monotonically non-decreasing.
    pub sold: i32,
    pub discount_percentage: Decimal,
    pub featured: bool,
    pub tags: Vec<String>,
    /// Per-unit shipping cost snapshotted onto order line items.
    pub shipping_cost: Decimal,
    /// Tax rate in percent snapshotted onto order line items.
    pub tax_percentage: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Price after the product-level discount is applied.
    pub fn discounted_price(&self) -> Decimal {
        self.price - self.price * self.discount_percentage / Decimal::from(100)
    }
}

/// Product category. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Electronics,
    Clothing,
    Books,
    Home,
    Beauty,
    Sports,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electronics => "electronics",
            Self::Clothing => "clothing",
            Self::Books => "books",
            Self::Home => "home",
            Self::Beauty => "beauty",
            Self::Sports => "sports",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "electronics" => Ok(Self::Electronics),
            "clothing" => Ok(Self::Clothing),
            "books" => Ok(Self::Books),
            "home" => Ok(Self::Home),
            "beauty" => Ok(Self::Beauty),
            "sports" => Ok(Self::Sports),
            "other" => Ok(Self::Other),
            _ => Err(Error::invalid(
                "Category is either: electronics, clothing, books, home, beauty, sports, other",
            )),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Widget".into(),
            description: "A widget".into(),
            price: Decimal::new(100, 0),
            category: Category::Electronics,
            brand: "Acme".into(),
            images: vec![],
            ratings_average: 0.0,
            ratings_quantity: 0,
            stock: 5,
            sold: 0,
            discount_percentage: Decimal::from(25),
            featured: false,
            tags: vec![],
            shipping_cost: Decimal::ZERO,
            tax_percentage: Decimal::ZERO,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_discounted_price() {
        assert_eq!(sample().discounted_price(), Decimal::new(75, 0));
    }

    #[test]
    fn test_category_round_trip() {
        let c: Category = "beauty".parse().unwrap();
        assert_eq!(c, Category::Beauty);
        assert_eq!(c.to_string(), "beauty");
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        assert!("furniture".parse::<Category>().is_err());
    }

    #[test]
    fn test_serializes_with_camel_case_fields() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("ratingsAverage").is_some());
        assert!(json.get("shippingCost").is_some());
        assert_eq!(json["category"], "electronics");
    }
}
