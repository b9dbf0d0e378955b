//! Catalog store abstraction.
//!
//! The engines consume the store only through these traits. `PgStore` is the
//! production implementation; `MemoryStore` backs the test suite. Both
//! resolve filter field names through [`crate::query::catalog_field`] so they
//! reject the same unknown fields and malformed values.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Order, Product, Review, ViewedProduct};
use crate::error::Result;
use crate::query::{ProductFilter, ProductQuery};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert_product(&self, product: Product) -> Result<Product>;

    async fn product(&self, id: Uuid) -> Result<Option<Product>>;

    /// Persists the full product row, replacing the stored one.
    async fn save_product(&self, product: Product) -> Result<Product>;

    /// Removes a product. `NotFound` if it does not exist.
    async fn delete_product(&self, id: Uuid) -> Result<()>;

    async fn find_products(&self, query: &ProductQuery) -> Result<Vec<Product>>;

    async fn count_products(&self, filter: &ProductFilter) -> Result<u64>;

    /// Atomically decrements stock and increments sold, conditioned on
    /// `stock >= quantity`, and returns the updated row. Fails with
    /// `InsufficientStock` (stock unchanged) on shortfall and `NotFound` for
    /// a missing product.
    async fn reserve_stock(&self, id: Uuid, quantity: u32) -> Result<Product>;

    /// Compensating increment for a reservation that must be undone. Only
    /// meaningful after a matching `reserve_stock`; `sold` is floored at
    /// zero so a stray release cannot drive it negative.
    async fn release_stock(&self, id: Uuid, quantity: u32) -> Result<()>;

    /// Atomically recomputes the product's rating summary from its current
    /// review set; an empty set yields quantity 0 and `neutral_default`.
    async fn refresh_rating_summary(&self, product_id: Uuid, neutral_default: f64) -> Result<()>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Inserts a review, enforcing at most one per (product, user) pair.
    /// A second attempt fails with `DuplicateReview`.
    async fn insert_review(&self, review: Review) -> Result<Review>;

    async fn review(&self, id: Uuid) -> Result<Option<Review>>;

    async fn reviews_for_product(&self, product: Uuid) -> Result<Vec<Review>>;

    async fn review_by_product_and_user(&self, product: Uuid, user: Uuid)
        -> Result<Option<Review>>;

    async fn save_review(&self, review: Review) -> Result<Review>;

    /// Removes a review and returns it, so the caller can refresh the owning
    /// product's summary. `NotFound` if it does not exist.
    async fn delete_review(&self, id: Uuid) -> Result<Review>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: Order) -> Result<Order>;

    async fn order(&self, id: Uuid) -> Result<Option<Order>>;

    /// Newest-first page of all orders.
    async fn orders(&self, skip: u64, limit: u64) -> Result<Vec<Order>>;

    async fn orders_for_user(&self, user: Uuid) -> Result<Vec<Order>>;

    async fn save_order(&self, order: Order) -> Result<Order>;

    async fn delete_order(&self, id: Uuid) -> Result<()>;

    async fn count_orders(&self) -> Result<u64>;
}

#[async_trait]
pub trait ViewStore: Send + Sync {
    /// Appends a view-history entry, evicting the oldest beyond `cap`.
    async fn record_view(&self, user: Uuid, product: Uuid, at: DateTime<Utc>, cap: usize)
        -> Result<()>;

    /// Insertion-ordered history; the last entry is the most recent view.
    async fn view_history(&self, user: Uuid) -> Result<Vec<ViewedProduct>>;
}

/// The full catalog store the application state holds.
pub trait Store: ProductStore + ReviewStore + OrderStore + ViewStore {}

impl<T: ProductStore + ReviewStore + OrderStore + ViewStore> Store for T {}
