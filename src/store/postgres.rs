//! PostgreSQL catalog store.
//!
//! Dynamic product filters are assembled with `QueryBuilder`; every value is
//! bound, never interpolated. Stock reservation and the rating-summary
//! refresh are single statements so they stay atomic under concurrent
//! requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::Postgres;
use sqlx::types::Json;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::domain::{Order, Product, Review, ViewedProduct};
use crate::error::{Error, Result};
use crate::query::{catalog_field, FieldKind, ProductFilter, ProductQuery, SortKey};
use crate::store::{OrderStore, ProductStore, ReviewStore, ViewStore};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn insert_product(&self, product: Product) -> Result<Product> {
        let inserted = sqlx::query_as::<_, Product>(
            "INSERT INTO products (id, name, description, price, category, brand, images, \
             ratings_average, ratings_quantity, stock, sold, discount_percentage, featured, \
             tags, shipping_cost, tax_percentage, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
             RETURNING *",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.category.as_str())
        .bind(&product.brand)
        .bind(&product.images)
        .bind(product.ratings_average)
        .bind(product.ratings_quantity)
        .bind(product.stock)
        .bind(product.sold)
        .bind(product.discount_percentage)
        .bind(product.featured)
        .bind(&product.tags)
        .bind(product.shipping_cost)
        .bind(product.tax_percentage)
        .bind(product.created_at)
        .bind(product.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn product(&self, id: Uuid) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn save_product(&self, product: Product) -> Result<Product> {
        sqlx::query_as::<_, Product>(
            "UPDATE products SET name = $2, description = $3, price = $4, category = $5, \
             brand = $6, images = $7, ratings_average = $8, ratings_quantity = $9, stock = $10, \
             sold = $11, discount_percentage = $12, featured = $13, tags = $14, \
             shipping_cost = $15, tax_percentage = $16, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.category.as_str())
        .bind(&product.brand)
        .bind(&product.images)
        .bind(product.ratings_average)
        .bind(product.ratings_quantity)
        .bind(product.stock)
        .bind(product.sold)
        .bind(product.discount_percentage)
        .bind(product.featured)
        .bind(&product.tags)
        .bind(product.shipping_cost)
        .bind(product.tax_percentage)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found("product"))
    }

    async fn delete_product(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found("product"));
        }
        Ok(())
    }

    async fn find_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM products");
        push_filter(&mut qb, &query.filter)?;
        push_sort(&mut qb, &query.sort)?;
        qb.push(" LIMIT ");
        qb.push_bind(query.limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind(query.skip as i64);
        let products = qb
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn count_products(&self, filter: &ProductFilter) -> Result<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        push_filter(&mut qb, filter)?;
        let (count,): (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    async fn reserve_stock(&self, id: Uuid, quantity: u32) -> Result<Product> {
        // The decrement is conditioned on sufficient stock in the statement
        // itself, so concurrent checkouts cannot oversell.
        let updated = sqlx::query_as::<_, Product>(
            "UPDATE products SET stock = stock - $2, sold = sold + $2, updated_at = NOW() \
             WHERE id = $1 AND stock >= $2 RETURNING *",
        )
        .bind(id)
        .bind(i32::try_from(quantity).map_err(|_| Error::invalid("Quantity is too large"))?)
        .fetch_optional(&self.pool)
        .await?;
        match updated {
            Some(product) => Ok(product),
            None => match self.product(id).await? {
                Some(product) => Err(Error::InsufficientStock {
                    product: product.name,
                }),
                None => Err(Error::product_missing(id)),
            },
        }
    }

    async fn release_stock(&self, id: Uuid, quantity: u32) -> Result<()> {
        let result = sqlx::query(
            "UPDATE products SET stock = stock + $2, sold = GREATEST(sold - $2, 0), \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(i32::try_from(quantity).map_err(|_| Error::invalid("Quantity is too large"))?)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::product_missing(id));
        }
        Ok(())
    }

    async fn refresh_rating_summary(&self, product_id: Uuid, neutral_default: f64) -> Result<()> {
        // Recompute and write-back in one statement; concurrent review
        // mutations cannot interleave a stale aggregate.
        sqlx::query(
            "UPDATE products SET \
                 ratings_quantity = s.cnt, \
                 ratings_average = COALESCE(ROUND(s.avg, 1)::float8, $2), \
                 updated_at = NOW() \
             FROM (SELECT COUNT(*)::int AS cnt, AVG(rating)::numeric AS avg \
                   FROM reviews WHERE product_id = $1) s \
             WHERE id = $1",
        )
        .bind(product_id)
        .bind(neutral_default)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn insert_review(&self, review: Review) -> Result<Review> {
        sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (id, product_id, user_id, rating, review, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(review.id)
        .bind(review.product)
        .bind(review.user)
        .bind(review.rating)
        .bind(&review.review)
        .bind(review.created_at)
        .bind(review.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => Error::DuplicateReview,
            _ => Error::from(e),
        })
    }

    async fn review(&self, id: Uuid) -> Result<Option<Review>> {
        let review = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    async fn reviews_for_product(&self, product: Uuid) -> Result<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE product_id = $1 ORDER BY created_at",
        )
        .bind(product)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn review_by_product_and_user(
        &self,
        product: Uuid,
        user: Uuid,
    ) -> Result<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE product_id = $1 AND user_id = $2",
        )
        .bind(product)
        .bind(user)
        .fetch_optional(&self.pool)
        .await?;
        Ok(review)
    }

    async fn save_review(&self, review: Review) -> Result<Review> {
        sqlx::query_as::<_, Review>(
            "UPDATE reviews SET rating = $2, review = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(review.id)
        .bind(review.rating)
        .bind(&review.review)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found("review"))
    }

    async fn delete_review(&self, id: Uuid) -> Result<Review> {
        sqlx::query_as::<_, Review>("DELETE FROM reviews WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("review"))
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, order: Order) -> Result<Order> {
        let inserted = sqlx::query_as::<_, Order>(
            "INSERT INTO orders (id, user_id, items, shipping_address, payment_method, status, \
             items_price, tax_price, shipping_price, total_price, is_paid, paid_at, \
             is_delivered, delivered_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING *",
        )
        .bind(order.id)
        .bind(order.user)
        .bind(Json(&order.items))
        .bind(Json(&order.shipping_address))
        .bind(order.payment_method.as_str())
        .bind(order.status.as_str())
        .bind(order.items_price)
        .bind(order.tax_price)
        .bind(order.shipping_price)
        .bind(order.total_price)
        .bind(order.is_paid)
        .bind(order.paid_at)
        .bind(order.is_delivered)
        .bind(order.delivered_at)
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn order(&self, id: Uuid) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    async fn orders(&self, skip: u64, limit: u64) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit as i64)
        .bind(skip as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn orders_for_user(&self, user: Uuid) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn save_order(&self, order: Order) -> Result<Order> {
        sqlx::query_as::<_, Order>(
            "UPDATE orders SET items = $2, shipping_address = $3, payment_method = $4, \
             status = $5, items_price = $6, tax_price = $7, shipping_price = $8, \
             total_price = $9, is_paid = $10, paid_at = $11, is_delivered = $12, \
             delivered_at = $13, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(order.id)
        .bind(Json(&order.items))
        .bind(Json(&order.shipping_address))
        .bind(order.payment_method.as_str())
        .bind(order.status.as_str())
        .bind(order.items_price)
        .bind(order.tax_price)
        .bind(order.shipping_price)
        .bind(order.total_price)
        .bind(order.is_paid)
        .bind(order.paid_at)
        .bind(order.is_delivered)
        .bind(order.delivered_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found("order"))
    }

    async fn delete_order(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found("order"));
        }
        Ok(())
    }

    async fn count_orders(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[async_trait]
impl ViewStore for PgStore {
    async fn record_view(
        &self,
        user: Uuid,
        product: Uuid,
        at: DateTime<Utc>,
        cap: usize,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO user_views (user_id, product_id, viewed_at) VALUES ($1, $2, $3)")
            .bind(user)
            .bind(product)
            .bind(at)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "DELETE FROM user_views WHERE user_id = $1 AND seq NOT IN \
             (SELECT seq FROM user_views WHERE user_id = $1 ORDER BY seq DESC LIMIT $2)",
        )
        .bind(user)
        .bind(cap as i64)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn view_history(&self, user: Uuid) -> Result<Vec<ViewedProduct>> {
        let history = sqlx::query_as::<_, ViewedProduct>(
            "SELECT product_id, viewed_at FROM user_views WHERE user_id = $1 ORDER BY seq",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(history)
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) -> Result<()> {
    qb.push(" WHERE TRUE");
    if filter.visible_only {
        qb.push(" AND stock >= 0");
    }
    for condition in &filter.conditions {
        let (column, kind) = catalog_field(&condition.field).ok_or_else(|| {
            Error::invalid(format!("Unknown filter field: {}", condition.field))
        })?;
        qb.push(format!(" AND {column} {} ", condition.op.sql()));
        bind_value(qb, kind, &condition.value)?;
    }
    if let Some(q) = &filter.search {
        let pattern = format!("%{}%", escape_like(q));
        qb.push(" AND (name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR description ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR brand ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR category ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR array_to_string(tags, ' ') ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
    if !filter.exclude_ids.is_empty() {
        qb.push(" AND id <> ALL(");
        qb.push_bind(filter.exclude_ids.clone());
        qb.push(")");
    }
    Ok(())
}

fn bind_value(qb: &mut QueryBuilder<'_, Postgres>, kind: FieldKind, raw: &str) -> Result<()> {
    let malformed = || Error::invalid(format!("Malformed filter value: {raw}"));
    match kind {
        FieldKind::Text => {
            qb.push_bind(raw.to_string());
        }
        FieldKind::Integer => {
            qb.push_bind(raw.parse::<i32>().map_err(|_| malformed())?);
        }
        FieldKind::Number => {
            qb.push_bind(raw.parse::<Decimal>().map_err(|_| malformed())?);
        }
        FieldKind::Float => {
            qb.push_bind(raw.parse::<f64>().map_err(|_| malformed())?);
        }
        FieldKind::Boolean => {
            qb.push_bind(raw.parse::<bool>().map_err(|_| malformed())?);
        }
        FieldKind::Timestamp => {
            let parsed = DateTime::parse_from_rfc3339(raw).map_err(|_| malformed())?;
            qb.push_bind(parsed.with_timezone(&Utc));
        }
    }
    Ok(())
}

fn push_sort(qb: &mut QueryBuilder<'_, Postgres>, sort: &[SortKey]) -> Result<()> {
    for (i, key) in sort.iter().enumerate() {
        let (column, _) = catalog_field(&key.field)
            .ok_or_else(|| Error::invalid(format!("Unknown sort field: {}", key.field)))?;
        qb.push(if i == 0 { " ORDER BY " } else { ", " });
        qb.push(column);
        if key.descending {
            qb.push(" DESC");
        }
    }
    Ok(())
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
