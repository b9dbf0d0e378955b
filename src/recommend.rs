//! Recommendation engine.
//!
//! Assembles at most [`RECOMMENDATION_LIMIT`] distinct products through three
//! strict tiers, stopping as soon as the quota is filled:
//!
//! 1. contextual — products sharing the current product's category;
//! 2. personalized — products in the category of the viewer's most recently
//!    viewed product, excluding everything already viewed;
//! 3. fallback — globally top-rated products.
//!
//! The current product is never returned, no id repeats across tiers, and
//! for a fixed catalog the output is deterministic.

use uuid::Uuid;

use crate::config::RECOMMENDATION_LIMIT;
use crate::domain::{Category, Product};
use crate::error::Result;
use crate::query::{CmpOp, ProductFilter, ProductQuery, SortKey};
use crate::store::Store;

pub async fn recommendations(
    store: &dyn Store,
    current_id: Option<Uuid>,
    viewer: Option<Uuid>,
) -> Result<Vec<Product>> {
    let mut picked: Vec<Product> = Vec::new();

    // Tier 1: contextual. A current product that no longer resolves
    // contributes nothing.
    if let Some(current_id) = current_id {
        if let Some(current) = store.product(current_id).await? {
            let query = category_query(current.category, vec![current_id], RECOMMENDATION_LIMIT);
            picked.extend(store.find_products(&query).await?);
            tracing::debug!(tier = "contextual", picked = picked.len());
        }
    }

    // Tier 2: personalized, seeded by the most recently viewed product.
    if picked.len() < RECOMMENDATION_LIMIT {
        if let Some(viewer) = viewer {
            let history = store.view_history(viewer).await?;
            if let Some(last) = history.last() {
                if let Some(last_product) = store.product(last.product).await? {
                    let mut exclude: Vec<Uuid> = history.iter().map(|v| v.product).collect();
                    exclude.extend(picked.iter().map(|p| p.id));
                    exclude.extend(current_id);
                    let query = category_query(
                        last_product.category,
                        exclude,
                        RECOMMENDATION_LIMIT - picked.len(),
                    );
                    picked.extend(store.find_products(&query).await?);
                    tracing::debug!(tier = "personalized", picked = picked.len());
                }
            }
        }
    }

    // Tier 3: fallback, top-rated across the catalog.
    if picked.len() < RECOMMENDATION_LIMIT {
        let mut exclude: Vec<Uuid> = picked.iter().map(|p| p.id).collect();
        exclude.extend(current_id);
        let query = ProductQuery {
            filter: ProductFilter::visible().excluding(exclude),
            sort: vec![
                SortKey::descending("ratingsAverage"),
                SortKey::descending("ratingsQuantity"),
            ],
            skip: 0,
            limit: (RECOMMENDATION_LIMIT - picked.len()) as u64,
        };
        picked.extend(store.find_products(&query).await?);
    }

    Ok(picked)
}

fn category_query(category: Category, exclude: Vec<Uuid>, quota: usize) -> ProductQuery {
    ProductQuery {
        filter: ProductFilter::visible()
            .condition("category", CmpOp::Eq, category.as_str())
            .excluding(exclude),
        sort: vec![SortKey::descending("createdAt")],
        skip: 0,
        limit: quota as u64,
    }
}
