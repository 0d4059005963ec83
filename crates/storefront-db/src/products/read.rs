//! Read operations for the catalog.

use sqlx::{PgConnection, PgPool};
use storefront_core::ListCriteria;

use super::types::{
    ProductDetail, ProductImageRow, ProductPage, ProductRow, ProductSummaryRow, ProductVariant,
    VariantRow,
};
use crate::query::{compose_count, compose_list};
use crate::DbError;

/// Returns one page of active products plus the total number of matches.
///
/// An empty page is not an error. Both queries run on the same pooled
/// connection, which is returned to the pool when this function exits.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_products(pool: &PgPool, criteria: &ListCriteria) -> Result<ProductPage, DbError> {
    let list = compose_list(criteria);
    let count = compose_count(criteria);

    let mut conn = pool.acquire().await?;

    let items = list
        .query_as::<ProductSummaryRow>()
        .fetch_all(&mut *conn)
        .await?;
    let total = count.query_count().fetch_one(&mut *conn).await?;

    tracing::debug!(
        page = criteria.page,
        page_size = criteria.page_size,
        returned = items.len(),
        total,
        "listed products"
    );

    Ok(ProductPage { items, total })
}

/// Returns the active product with `slug` together with its images and
/// decoded variants.
///
/// Slugs are unique among active products; should several rows match anyway,
/// the lowest id wins. The product, image, and variant lookups run one after
/// another on a single pooled connection and the first failure aborts the
/// whole read.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no active product has this slug,
/// [`DbError::MalformedAttributes`] if a variant's attribute string cannot be
/// decoded, or [`DbError::Sqlx`] if a query fails.
pub async fn get_product_by_slug(pool: &PgPool, slug: &str) -> Result<ProductDetail, DbError> {
    let mut conn = pool.acquire().await?;

    let product = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, slug, description, price, discount_price, stock, category_id, \
                is_active, is_featured, created_at, updated_at \
         FROM products \
         WHERE slug = $1 AND is_active = TRUE \
         ORDER BY id \
         LIMIT 1",
    )
    .bind(slug)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(DbError::NotFound)?;

    let images = list_images(&mut conn, product.id).await?;
    let variants = list_variants(&mut conn, product.id).await?;

    Ok(ProductDetail {
        product,
        images,
        variants,
    })
}

/// Returns a product by id regardless of `is_active`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has this id, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_product_by_id(pool: &PgPool, product_id: i64) -> Result<ProductRow, DbError> {
    sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, slug, description, price, discount_price, stock, category_id, \
                is_active, is_featured, created_at, updated_at \
         FROM products \
         WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Images for a product, primary image first.
async fn list_images(
    conn: &mut PgConnection,
    product_id: i64,
) -> Result<Vec<ProductImageRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductImageRow>(
        "SELECT id, product_id, image_url, is_primary, created_at \
         FROM product_images \
         WHERE product_id = $1 \
         ORDER BY is_primary DESC, id",
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

/// Variants for a product with their attribute values decoded.
///
/// Attribute values are aggregated per variant into `id:type:value` triples
/// joined by `,`, ordered by attribute value id.
async fn list_variants(
    conn: &mut PgConnection,
    product_id: i64,
) -> Result<Vec<ProductVariant>, DbError> {
    let rows = sqlx::query_as::<_, VariantRow>(
        "SELECT pv.id, pv.product_id, pv.sku, pv.stock, pv.price_adjustment, \
                (SELECT string_agg(av.id::text || ':' || a.type || ':' || av.value, ',' \
                                   ORDER BY av.id) \
                 FROM variant_attribute_values vav \
                 JOIN attribute_values av ON av.id = vav.attribute_value_id \
                 JOIN attributes a ON a.id = av.attribute_id \
                 WHERE vav.variant_id = pv.id) AS attributes \
         FROM product_variants pv \
         WHERE pv.product_id = $1 \
         ORDER BY pv.id",
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(decode_variant).collect()
}

fn decode_variant(row: VariantRow) -> Result<ProductVariant, DbError> {
    let attributes = storefront_core::decode_attributes(row.attributes.as_deref())?;
    Ok(ProductVariant {
        id: row.id,
        product_id: row.product_id,
        sku: row.sku,
        stock: row.stock,
        price_adjustment: row.price_adjustment,
        attributes,
    })
}
