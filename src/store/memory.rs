//! In-memory catalog store.
//!
//! Implements the same traits as the Postgres store over `RwLock`'d maps.
//! Used by the test suite, where its single-lock sections give the same
//! atomicity the SQL statements give in production.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{Order, Product, Review, ViewedProduct};
use crate::error::{Error, Result};
use crate::query::{catalog_field, CmpOp, Condition, FieldKind, ProductFilter, ProductQuery, SortKey};
use crate::ratings::RatingSummary;
use crate::store::{OrderStore, ProductStore, ReviewStore, ViewStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<Uuid, Product>,
    reviews: HashMap<Uuid, Review>,
    orders: HashMap<Uuid, Order>,
    views: HashMap<Uuid, Vec<ViewedProduct>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn insert_product(&self, product: Product) -> Result<Product> {
        let mut inner = self.inner.write().await;
        inner.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn product(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.inner.read().await.products.get(&id).cloned())
    }

    async fn save_product(&self, product: Product) -> Result<Product> {
        let mut inner = self.inner.write().await;
        if !inner.products.contains_key(&product.id) {
            return Err(Error::not_found("product"));
        }
        inner.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn delete_product(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("product"))
    }

    async fn find_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        for key in &query.sort {
            if catalog_field(&key.field).is_none() {
                return Err(Error::invalid(format!("Unknown sort field: {}", key.field)));
            }
        }
        validate_filter(&query.filter)?;
        let inner = self.inner.read().await;
        let mut matched = Vec::new();
        for product in inner.products.values() {
            if filter_matches(product, &query.filter)? {
                matched.push(product.clone());
            }
        }
        sort_products(&mut matched, &query.sort);
        Ok(matched
            .into_iter()
            .skip(query.skip as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn count_products(&self, filter: &ProductFilter) -> Result<u64> {
        validate_filter(filter)?;
        let inner = self.inner.read().await;
        let mut count = 0u64;
        for product in inner.products.values() {
            if filter_matches(product, filter)? {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn reserve_stock(&self, id: Uuid, quantity: u32) -> Result<Product> {
        let mut inner = self.inner.write().await;
        let product = inner
            .products
            .get_mut(&id)
            .ok_or_else(|| Error::product_missing(id))?;
        let quantity = quantity as i32;
        if product.stock < quantity {
            return Err(Error::InsufficientStock {
                product: product.name.clone(),
            });
        }
        product.stock -= quantity;
        product.sold += quantity;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn release_stock(&self, id: Uuid, quantity: u32) -> Result<()> {
        let mut inner = self.inner.write().await;
        let product = inner
            .products
            .get_mut(&id)
            .ok_or_else(|| Error::product_missing(id))?;
        let quantity = quantity as i32;
        product.stock += quantity;
        product.sold = (product.sold - quantity).max(0);
        product.updated_at = Utc::now();
        Ok(())
    }

    async fn refresh_rating_summary(&self, product_id: Uuid, neutral_default: f64) -> Result<()> {
        // One lock section: the recompute and the write-back are atomic with
        // respect to concurrent review mutations.
        let mut inner = self.inner.write().await;
        let ratings: Vec<i32> = inner
            .reviews
            .values()
            .filter(|r| r.product == product_id)
            .map(|r| r.rating)
            .collect();
        let summary = RatingSummary::of(&ratings, neutral_default);
        if let Some(product) = inner.products.get_mut(&product_id) {
            product.ratings_quantity = summary.quantity;
            product.ratings_average = summary.average;
            product.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn insert_review(&self, review: Review) -> Result<Review> {
        let mut inner = self.inner.write().await;
        let duplicate = inner
            .reviews
            .values()
            .any(|r| r.product == review.product && r.user == review.user);
        if duplicate {
            return Err(Error::DuplicateReview);
        }
        inner.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn review(&self, id: Uuid) -> Result<Option<Review>> {
        Ok(self.inner.read().await.reviews.get(&id).cloned())
    }

    async fn reviews_for_product(&self, product: Uuid) -> Result<Vec<Review>> {
        let inner = self.inner.read().await;
        let mut reviews: Vec<Review> = inner
            .reviews
            .values()
            .filter(|r| r.product == product)
            .cloned()
            .collect();
        reviews.sort_by_key(|r| r.created_at);
        Ok(reviews)
    }

    async fn review_by_product_and_user(
        &self,
        product: Uuid,
        user: Uuid,
    ) -> Result<Option<Review>> {
        let inner = self.inner.read().await;
        Ok(inner
            .reviews
            .values()
            .find(|r| r.product == product && r.user == user)
            .cloned())
    }

    async fn save_review(&self, review: Review) -> Result<Review> {
        let mut inner = self.inner.write().await;
        if !inner.reviews.contains_key(&review.id) {
            return Err(Error::not_found("review"));
        }
        inner.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn delete_review(&self, id: Uuid) -> Result<Review> {
        let mut inner = self.inner.write().await;
        inner
            .reviews
            .remove(&id)
            .ok_or_else(|| Error::not_found("review"))
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: Order) -> Result<Order> {
        let mut inner = self.inner.write().await;
        inner.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn order(&self, id: Uuid) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn orders(&self, skip: u64, limit: u64) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn orders_for_user(&self, user: Uuid) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.user == user)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn save_order(&self, order: Order) -> Result<Order> {
        let mut inner = self.inner.write().await;
        if !inner.orders.contains_key(&order.id) {
            return Err(Error::not_found("order"));
        }
        inner.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn delete_order(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .orders
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("order"))
    }

    async fn count_orders(&self) -> Result<u64> {
        Ok(self.inner.read().await.orders.len() as u64)
    }
}

#[async_trait]
impl ViewStore for MemoryStore {
    async fn record_view(
        &self,
        user: Uuid,
        product: Uuid,
        at: DateTime<Utc>,
        cap: usize,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let history = inner.views.entry(user).or_default();
        history.push(ViewedProduct {
            product,
            viewed_at: at,
        });
        if history.len() > cap {
            let excess = history.len() - cap;
            history.drain(..excess);
        }
        Ok(())
    }

    async fn view_history(&self, user: Uuid) -> Result<Vec<ViewedProduct>> {
        Ok(self
            .inner
            .read()
            .await
            .views
            .get(&user)
            .cloned()
            .unwrap_or_default())
    }
}

/// Resolves every condition's field and parses its value up front, so an
/// unknown field or malformed value is rejected even when no row is scanned.
/// Keeps the rejection behavior identical to the Postgres store, which fails
/// while building the query.
fn validate_filter(filter: &ProductFilter) -> Result<()> {
    for condition in &filter.conditions {
        let (_, kind) = catalog_field(&condition.field).ok_or_else(|| {
            Error::invalid(format!("Unknown filter field: {}", condition.field))
        })?;
        check_value(kind, &condition.value)?;
    }
    Ok(())
}

fn check_value(kind: FieldKind, raw: &str) -> Result<()> {
    let malformed = || Error::invalid(format!("Malformed filter value: {raw}"));
    match kind {
        FieldKind::Text => {}
        FieldKind::Integer => {
            raw.parse::<i32>().map_err(|_| malformed())?;
        }
        FieldKind::Number => {
            raw.parse::<Decimal>().map_err(|_| malformed())?;
        }
        FieldKind::Float => {
            raw.parse::<f64>().map_err(|_| malformed())?;
        }
        FieldKind::Boolean => {
            raw.parse::<bool>().map_err(|_| malformed())?;
        }
        FieldKind::Timestamp => {
            DateTime::parse_from_rfc3339(raw).map_err(|_| malformed())?;
        }
    }
    Ok(())
}

fn filter_matches(product: &Product, filter: &ProductFilter) -> Result<bool> {
    if filter.exclude_ids.contains(&product.id) {
        return Ok(false);
    }
    if filter.visible_only && product.stock < 0 {
        return Ok(false);
    }
    for condition in &filter.conditions {
        if !condition_matches(product, condition)? {
            return Ok(false);
        }
    }
    if let Some(q) = &filter.search {
        if !search_matches(product, q) {
            return Ok(false);
        }
    }
    Ok(true)
}

fn condition_matches(product: &Product, condition: &Condition) -> Result<bool> {
    if catalog_field(&condition.field).is_none() {
        return Err(Error::invalid(format!(
            "Unknown filter field: {}",
            condition.field
        )));
    }
    let raw = condition.value.as_str();
    let ord = match condition.field.as_str() {
        "name" => product.name.as_str().cmp(raw),
        "brand" => product.brand.as_str().cmp(raw),
        "category" => product.category.as_str().cmp(raw),
        "price" => decimal_ord(product.price, raw)?,
        "discountPercentage" => decimal_ord(product.discount_percentage, raw)?,
        "stock" => int_ord(product.stock, raw)?,
        "sold" => int_ord(product.sold, raw)?,
        "ratingsQuantity" => int_ord(product.ratings_quantity, raw)?,
        "ratingsAverage" => float_ord(product.ratings_average, raw)?,
        "featured" => bool_ord(product.featured, raw)?,
        "createdAt" => time_ord(product.created_at, raw)?,
        _ => return Err(Error::invalid(format!("Unknown filter field: {}", condition.field))),
    };
    Ok(match condition.op {
        CmpOp::Eq => ord == Ordering::Equal,
        CmpOp::Gte => ord != Ordering::Less,
        CmpOp::Gt => ord == Ordering::Greater,
        CmpOp::Lte => ord != Ordering::Greater,
        CmpOp::Lt => ord == Ordering::Less,
    })
}

fn decimal_ord(lhs: Decimal, raw: &str) -> Result<Ordering> {
    let rhs: Decimal = raw
        .parse()
        .map_err(|_| Error::invalid(format!("Malformed filter value: {raw}")))?;
    Ok(lhs.cmp(&rhs))
}

fn int_ord(lhs: i32, raw: &str) -> Result<Ordering> {
    let rhs: i32 = raw
        .parse()
        .map_err(|_| Error::invalid(format!("Malformed filter value: {raw}")))?;
    Ok(lhs.cmp(&rhs))
}

fn float_ord(lhs: f64, raw: &str) -> Result<Ordering> {
    let rhs: f64 = raw
        .parse()
        .map_err(|_| Error::invalid(format!("Malformed filter value: {raw}")))?;
    Ok(lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal))
}

fn bool_ord(lhs: bool, raw: &str) -> Result<Ordering> {
    let rhs: bool = raw
        .parse()
        .map_err(|_| Error::invalid(format!("Malformed filter value: {raw}")))?;
    Ok(lhs.cmp(&rhs))
}

fn time_ord(lhs: DateTime<Utc>, raw: &str) -> Result<Ordering> {
    let rhs = DateTime::parse_from_rfc3339(raw)
        .map_err(|_| Error::invalid(format!("Malformed filter value: {raw}")))?;
    Ok(lhs.cmp(&rhs.with_timezone(&Utc)))
}

fn search_matches(product: &Product, q: &str) -> bool {
    let needle = q.to_lowercase();
    product.name.to_lowercase().contains(&needle)
        || product.description.to_lowercase().contains(&needle)
        || product.brand.to_lowercase().contains(&needle)
        || product.category.as_str().contains(&needle)
        || product
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(&needle))
}

fn sort_products(products: &mut [Product], keys: &[SortKey]) {
    products.sort_by(|a, b| {
        for key in keys {
            let ord = field_ord(a, b, &key.field);
            let ord = if key.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

fn field_ord(a: &Product, b: &Product, field: &str) -> Ordering {
    match field {
        "name" => a.name.cmp(&b.name),
        "brand" => a.brand.cmp(&b.brand),
        "category" => a.category.as_str().cmp(b.category.as_str()),
        "price" => a.price.cmp(&b.price),
        "discountPercentage" => a.discount_percentage.cmp(&b.discount_percentage),
        "stock" => a.stock.cmp(&b.stock),
        "sold" => a.sold.cmp(&b.sold),
        "ratingsQuantity" => a.ratings_quantity.cmp(&b.ratings_quantity),
        "ratingsAverage" => a
            .ratings_average
            .partial_cmp(&b.ratings_average)
            .unwrap_or(Ordering::Equal),
        "featured" => a.featured.cmp(&b.featured),
        "createdAt" => a.created_at.cmp(&b.created_at),
        // Sort fields are validated against the registry before use.
        _ => Ordering::Equal,
    }
}
