//! Storefront - Catalog and Ordering Backend
//!
//! Domain-logic layer for an online catalog: flexible product queries,
//! faceted search, recommendations, checkout with stock reservation, and
//! review-driven rating aggregation.
//!
//! ## Features
//! - Parameter-driven product queries (filter, sort, paginate, project)
//! - Faceted search with named sort presets and a trending feed
//! - Three-tier product recommendations
//! - Checkout with atomic stock reservation and price snapshots
//! - Denormalized rating summaries recomputed on every review write

pub mod checkout;
pub mod config;
pub mod domain;
pub mod error;
pub mod query;
pub mod ratings;
pub mod recommend;
pub mod routes;
pub mod search;
pub mod state;
pub mod store;

pub use error::{Error, Result};
