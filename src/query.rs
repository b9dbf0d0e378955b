//! Query engine: turns an arbitrary set of request parameters into a
//! filtered, sorted, paginated, field-limited read against the catalog.
//!
//! This layer only composes the query. Field-name resolution and value
//! parsing are the store's responsibility; unknown fields or malformed
//! values surface as `InvalidInput` from the store, never from here.

use std::collections::HashMap;

use serde_json::Value;
use uuid::Uuid;

use crate::config::QueryConfig;

/// Parameter names that drive query shape rather than filtering.
pub const RESERVED_PARAMS: [&str; 5] = ["page", "sort", "limit", "fields", "search"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Gte,
    Gt,
    Lte,
    Lt,
}

impl CmpOp {
    pub fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gte => ">=",
            Self::Gt => ">",
            Self::Lte => "<=",
            Self::Lt => "<",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "gte" => Some(Self::Gte),
            "gt" => Some(Self::Gt),
            "lte" => Some(Self::Lte),
            "lt" => Some(Self::Lt),
            _ => None,
        }
    }
}

/// A single filter predicate, `field <op> value`, with the value still in
/// its raw string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: String,
    pub op: CmpOp,
    pub value: String,
}

/// Composed filter over the product collection.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub conditions: Vec<Condition>,
    /// Case-insensitive substring match OR'd over the text-ish fields
    /// (name, description, brand, category, tags).
    pub search: Option<String>,
    /// Restrict to catalog-visible rows (`stock >= 0`).
    pub visible_only: bool,
    /// Ids never returned, regardless of other predicates.
    pub exclude_ids: Vec<Uuid>,
}

impl ProductFilter {
    pub fn visible() -> Self {
        Self {
            visible_only: true,
            ..Self::default()
        }
    }

    pub fn condition(mut self, field: &str, op: CmpOp, value: impl Into<String>) -> Self {
        self.conditions.push(Condition {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn excluding(mut self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.exclude_ids.extend(ids);
        self
    }
}

/// One sort criterion; `-field` in a request maps to `descending = true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn ascending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: false,
        }
    }

    pub fn descending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: true,
        }
    }
}

/// A fully composed, executable read against the product collection.
#[derive(Debug, Clone)]
pub struct ProductQuery {
    pub filter: ProductFilter,
    pub sort: Vec<SortKey>,
    pub skip: u64,
    pub limit: u64,
}

/// Pagination inputs after defaulting and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// 1-based page and page size from raw parameters. Missing or malformed
    /// values fall back to defaults; the size is clamped to the configured
    /// maximum.
    pub fn from_params(params: &HashMap<String, String>, cfg: &QueryConfig) -> Self {
        let page = params
            .get("page")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let limit = params
            .get("limit")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|l| *l >= 1)
            .unwrap_or(cfg.default_page_size)
            .min(cfg.max_page_size);
        Self { page, limit }
    }

    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// The composed list read: query plus the response-side projection.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub query: ProductQuery,
    pub pagination: Pagination,
    /// Allow-list of response fields; `None` returns everything.
    pub fields: Option<Vec<String>>,
}

impl ListQuery {
    /// Composes a list read from an arbitrary string-keyed parameter map.
    ///
    /// Reserved parameters (`page`, `sort`, `limit`, `fields`, `search`) are
    /// excluded from filter construction; every other parameter becomes an
    /// equality condition, or a comparison condition in its `field[op]`
    /// suffixed form (`price[gte]=10`).
    pub fn from_params(params: &HashMap<String, String>, cfg: &QueryConfig) -> Self {
        let mut filter = ProductFilter::visible();
        for (key, value) in params {
            if RESERVED_PARAMS.contains(&key.as_str()) {
                continue;
            }
            let (field, op) = parse_condition_key(key);
            filter.conditions.push(Condition {
                field: field.to_string(),
                op,
                value: value.clone(),
            });
        }
        filter.search = params
            .get("search")
            .filter(|s| !s.is_empty())
            .cloned();

        let sort = params
            .get("sort")
            .map(|s| parse_sort(s))
            .filter(|keys| !keys.is_empty())
            .unwrap_or_else(|| cfg.default_sort.clone());

        let fields = params.get("fields").map(|f| {
            f.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect()
        });

        let pagination = Pagination::from_params(params, cfg);
        Self {
            query: ProductQuery {
                filter,
                sort,
                skip: pagination.skip(),
                limit: u64::from(pagination.limit),
            },
            pagination,
            fields,
        }
    }
}

/// Splits `price[gte]` into `("price", Gte)`. Keys without a recognized
/// operator suffix filter by equality.
fn parse_condition_key(key: &str) -> (&str, CmpOp) {
    if let Some(open) = key.find('[') {
        if let Some(suffix) = key[open + 1..].strip_suffix(']') {
            if let Some(op) = CmpOp::from_suffix(suffix) {
                return (&key[..open], op);
            }
        }
    }
    (key, CmpOp::Eq)
}

/// Parses a comma-separated sort list, `-` prefix meaning descending.
pub fn parse_sort(raw: &str) -> Vec<SortKey> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "-")
        .map(|part| match part.strip_prefix('-') {
            Some(field) => SortKey::descending(field),
            None => SortKey::ascending(part),
        })
        .collect()
}

/// Strips a serialized entity down to the requested fields. The id is always
/// retained.
pub fn apply_projection(value: &mut Value, fields: &[String]) {
    if let Value::Object(map) = value {
        map.retain(|key, _| key == "id" || fields.iter().any(|f| f == key));
    }
}

/// Filterable/sortable product fields: API name → (column, kind). Shared by
/// both store implementations so the two reject the same unknown names.
pub fn catalog_field(name: &str) -> Option<(&'static str, FieldKind)> {
    let entry = match name {
        "name" => ("name", FieldKind::Text),
        "brand" => ("brand", FieldKind::Text),
        "category" => ("category", FieldKind::Text),
        "price" => ("price", FieldKind::Number),
        "discountPercentage" => ("discount_percentage", FieldKind::Number),
        "stock" => ("stock", FieldKind::Integer),
        "sold" => ("sold", FieldKind::Integer),
        "featured" => ("featured", FieldKind::Boolean),
        "ratingsAverage" => ("ratings_average", FieldKind::Float),
        "ratingsQuantity" => ("ratings_quantity", FieldKind::Integer),
        "createdAt" => ("created_at", FieldKind::Timestamp),
        _ => return None,
    };
    Some(entry)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Number,
    Float,
    Boolean,
    Timestamp,
}
