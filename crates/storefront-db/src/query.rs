//! Parameterized SQL composition for the product listing.
//!
//! Predicate text is assembled structurally with numbered placeholders while
//! the values travel in a parallel, ordered parameter list. Caller-supplied
//! values never appear in the SQL text.

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::{FromRow, Postgres};
use storefront_core::ListCriteria;

const LIST_SELECT: &str = "SELECT \
         p.id, p.name, p.slug, p.description, p.price, p.discount_price, p.stock, \
         p.category_id, p.is_active, p.is_featured, p.created_at, p.updated_at, \
         c.name AS category_name, \
         (SELECT pi.image_url FROM product_images pi \
          WHERE pi.product_id = p.id AND pi.is_primary \
          ORDER BY pi.id LIMIT 1) AS primary_image \
     FROM products p \
     LEFT JOIN categories c ON c.id = p.category_id";

const COUNT_SELECT: &str = "SELECT COUNT(*) FROM products p";

const ACTIVE_PREDICATE: &str = "p.is_active = TRUE";

/// A value bound to a numbered placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    Int(i64),
    Text(String),
}

/// SQL text plus the values for its placeholders, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedQuery {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

impl ComposedQuery {
    /// Build a typed `query_as` with every parameter bound.
    pub fn query_as<'q, O>(&'q self) -> QueryAs<'q, Postgres, O, PgArguments>
    where
        O: for<'r> FromRow<'r, PgRow>,
    {
        let mut query = sqlx::query_as::<_, O>(&self.sql);
        for param in &self.params {
            query = match param {
                QueryParam::Int(v) => query.bind(*v),
                QueryParam::Text(s) => query.bind(s.as_str()),
            };
        }
        query
    }

    /// Build a `query_scalar` returning a single `BIGINT`, e.g. a count.
    pub fn query_count(&self) -> QueryScalar<'_, Postgres, i64, PgArguments> {
        let mut query = sqlx::query_scalar::<_, i64>(&self.sql);
        for param in &self.params {
            query = match param {
                QueryParam::Int(v) => query.bind(*v),
                QueryParam::Text(s) => query.bind(s.as_str()),
            };
        }
        query
    }
}

/// Accumulates `AND`-joined predicates and their bound values.
#[derive(Debug, Default)]
struct Filters {
    predicates: Vec<String>,
    params: Vec<QueryParam>,
}

impl Filters {
    fn from_criteria(criteria: &ListCriteria) -> Self {
        let mut filters = Self {
            predicates: vec![ACTIVE_PREDICATE.to_string()],
            params: Vec::new(),
        };

        if let Some(category_id) = criteria.category_id {
            let ph = filters.bind(QueryParam::Int(category_id));
            filters.predicates.push(format!("p.category_id = {ph}"));
        }

        if criteria.featured_only == Some(true) {
            filters.predicates.push("p.is_featured = TRUE".to_string());
        }

        if let Some(term) = criteria.search.as_deref() {
            let ph = filters.bind(QueryParam::Text(contains_pattern(term)));
            filters
                .predicates
                .push(format!("(p.name ILIKE {ph} OR p.description ILIKE {ph})"));
        }

        filters
    }

    /// Push a value and return its placeholder (`$1`, `$2`, ...).
    fn bind(&mut self, param: QueryParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    fn where_clause(&self) -> String {
        format!(" WHERE {}", self.predicates.join(" AND "))
    }
}

/// Compose the paginated product listing query.
///
/// Rows are ordered newest first; `id` breaks ties so pages are stable.
#[must_use]
pub fn compose_list(criteria: &ListCriteria) -> ComposedQuery {
    let mut filters = Filters::from_criteria(criteria);
    let where_clause = filters.where_clause();
    let limit = filters.bind(QueryParam::Int(criteria.page_size));
    let offset = filters.bind(QueryParam::Int(criteria.offset()));

    ComposedQuery {
        sql: format!(
            "{LIST_SELECT}{where_clause} ORDER BY p.created_at DESC, p.id DESC LIMIT {limit} OFFSET {offset}"
        ),
        params: filters.params,
    }
}

/// Compose the total-count query for the same criteria.
///
/// The count applies the same filters as [`compose_list`] but ignores
/// pagination, so `total` describes the filtered set.
#[must_use]
pub fn compose_count(criteria: &ListCriteria) -> ComposedQuery {
    let filters = Filters::from_criteria(criteria);
    ComposedQuery {
        sql: format!("{COUNT_SELECT}{}", filters.where_clause()),
        params: filters.params,
    }
}

/// Wrap a search term for a literal substring match with `ILIKE`.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
