//! Faceted product search: free text plus category/brand/price filters and
//! named sort presets, specialized over the generic query engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{QueryConfig, TRENDING_LIMIT};
use crate::query::{CmpOp, Pagination, ProductFilter, ProductQuery, SortKey};

/// The sentinel facet value meaning "no filter".
const ALL: &str = "all";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort_by: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SearchParams {
    /// Composes the executable query and the effective pagination.
    pub fn build(&self, cfg: &QueryConfig) -> (ProductQuery, Pagination) {
        let mut filter = ProductFilter::visible();
        filter.search = self.q.clone().filter(|q| !q.is_empty());
        if let Some(category) = facet(&self.category) {
            filter = filter.condition("category", CmpOp::Eq, category);
        }
        if let Some(brand) = facet(&self.brand) {
            filter = filter.condition("brand", CmpOp::Eq, brand);
        }
        if let Some(min) = self.min_price {
            filter = filter.condition("price", CmpOp::Gte, min.to_string());
        }
        if let Some(max) = self.max_price {
            filter = filter.condition("price", CmpOp::Lte, max.to_string());
        }

        let pagination = Pagination {
            page: self.page.filter(|p| *p >= 1).unwrap_or(1),
            limit: self
                .limit
                .filter(|l| *l >= 1)
                .unwrap_or(cfg.default_page_size)
                .min(cfg.max_page_size),
        };

        let query = ProductQuery {
            filter,
            sort: preset_sort(self.sort_by.as_deref()),
            skip: pagination.skip(),
            limit: u64::from(pagination.limit),
        };
        (query, pagination)
    }
}

fn facet(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty() && *v != ALL)
}

/// Maps a sort preset name to sort keys. Unknown names fall back to newest
/// first, like the default.
pub fn preset_sort(name: Option<&str>) -> Vec<SortKey> {
    match name {
        Some("price-low") => vec![SortKey::ascending("price")],
        Some("price-high") => vec![SortKey::descending("price")],
        Some("rating") => vec![SortKey::descending("ratingsAverage")],
        _ => vec![SortKey::descending("createdAt")],
    }
}

/// The trending read: globally top-rated products.
pub fn trending_query() -> ProductQuery {
    ProductQuery {
        filter: ProductFilter::visible(),
        sort: vec![
            SortKey::descending("ratingsAverage"),
            SortKey::descending("ratingsQuantity"),
        ],
        skip: 0,
        limit: u64::from(TRENDING_LIMIT),
    }
}

/// Pagination block returned alongside search results.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_products: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PaginationMeta {
    pub fn new(pagination: Pagination, total_products: u64) -> Self {
        let total_pages = total_products.div_ceil(u64::from(pagination.limit));
        Self {
            current_page: pagination.page,
            total_pages,
            total_products,
            has_next_page: u64::from(pagination.page) < total_pages,
            has_prev_page: pagination.page > 1,
        }
    }
}
