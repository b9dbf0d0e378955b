//! Environment-driven configuration.
//!
//! Every knob has a default so the service starts with nothing but
//! `DATABASE_URL` set. Values that the engines treat as policy (default sort,
//! page-size clamp, neutral rating) live here rather than being scattered as
//! literals across call sites.

use crate::query::SortKey;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub query: QueryConfig,
    /// Rating assigned to a product whose review set becomes empty.
    /// Business-policy constant carried over from the reference system.
    pub neutral_rating: f64,
    /// Number of view-history entries retained per user.
    pub view_history_cap: usize,
}

#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Page size applied when the caller does not specify one.
    pub default_page_size: u32,
    /// Upper bound on caller-supplied page sizes.
    pub max_page_size: u32,
    /// Sort applied when the caller does not specify one (newest first).
    pub default_sort: Vec<SortKey>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: 12,
            max_page_size: 100,
            default_sort: vec![SortKey::descending("createdAt")],
        }
    }
}

/// Number of products a recommendation response may contain.
pub const RECOMMENDATION_LIMIT: usize = 4;

/// Number of products returned by the trending read.
pub const TRENDING_LIMIT: u32 = 8;

impl Config {
    /// Reads configuration from the environment.
    ///
    /// # Errors
    ///
    /// Fails if `DATABASE_URL` is unset or a numeric variable does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable must be set"))?;
        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT", 8083)?,
            database_url,
            query: QueryConfig {
                default_page_size: env_parse("DEFAULT_PAGE_SIZE", 12)?,
                max_page_size: env_parse("MAX_PAGE_SIZE", 100)?,
                default_sort: vec![SortKey::descending("createdAt")],
            },
            neutral_rating: env_parse("DEFAULT_NEUTRAL_RATING", 4.5)?,
            view_history_cap: env_parse("VIEW_HISTORY_CAP", 50)?,
        })
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{name} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}
