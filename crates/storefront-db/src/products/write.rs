//! Write operations for the catalog.

use sqlx::{PgConnection, PgPool};
use storefront_core::{ProductInput, ProductUpdate, VariantInput};

use crate::DbError;

/// Creates a product with its images, variants, and variant attribute links.
///
/// Everything runs inside one transaction: either every row is committed or,
/// on the first failure, the transaction is rolled back and no product,
/// image, variant, or link row persists. Duplicate attribute value ids within
/// a variant produce a single link row.
///
/// Returns the generated product id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert or the commit fails (including
/// unique and foreign-key violations).
pub async fn create_product(pool: &PgPool, input: &ProductInput) -> Result<i64, DbError> {
    let mut tx = pool.begin().await?;

    match insert_product_graph(&mut tx, input).await {
        Ok(product_id) => {
            tx.commit().await?;
            tracing::info!(
                product_id,
                slug = %input.slug,
                images = input.images.len(),
                variants = input.variants.len(),
                "product created"
            );
            Ok(product_id)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback after failed product create failed");
            }
            tracing::error!(error = %e, slug = %input.slug, "product create rolled back");
            Err(e)
        }
    }
}

async fn insert_product_graph(conn: &mut PgConnection, input: &ProductInput) -> Result<i64, DbError> {
    let product_id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (name, slug, description, price, discount_price, category_id, stock, \
              is_featured, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id",
    )
    .bind(&input.name)
    .bind(&input.slug)
    .bind(&input.description)
    .bind(input.price)
    .bind(input.discount_price)
    .bind(input.category_id)
    .bind(input.stock)
    .bind(input.is_featured)
    .bind(input.is_active)
    .fetch_one(&mut *conn)
    .await?;

    for image in &input.images {
        sqlx::query(
            "INSERT INTO product_images (product_id, image_url, is_primary) \
             VALUES ($1, $2, $3)",
        )
        .bind(product_id)
        .bind(&image.url)
        .bind(image.is_primary)
        .execute(&mut *conn)
        .await?;
    }

    for variant in &input.variants {
        insert_variant(conn, product_id, variant).await?;
    }

    Ok(product_id)
}

async fn insert_variant(
    conn: &mut PgConnection,
    product_id: i64,
    variant: &VariantInput,
) -> Result<i64, DbError> {
    let variant_id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO product_variants (product_id, sku, stock, price_adjustment) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id",
    )
    .bind(product_id)
    .bind(&variant.sku)
    .bind(variant.stock)
    .bind(variant.price_adjustment)
    .fetch_one(&mut *conn)
    .await?;

    for attribute_value_id in variant.distinct_attribute_value_ids() {
        sqlx::query(
            "INSERT INTO variant_attribute_values (variant_id, attribute_value_id) \
             VALUES ($1, $2)",
        )
        .bind(variant_id)
        .bind(attribute_value_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(variant_id)
}

/// Applies a sparse update to a product and bumps `updated_at`.
///
/// Fields left as `None` keep their stored value. For the nullable columns
/// (`description`, `discount_price`, `category_id`) `Some(None)` clears the
/// column. Runs as a single statement.
///
/// Returns the number of rows changed (always 1 on success).
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has this id, or
/// [`DbError::Sqlx`] if the statement fails.
pub async fn update_product(
    pool: &PgPool,
    product_id: i64,
    update: &ProductUpdate,
) -> Result<u64, DbError> {
    let description_supplied = update.description.is_some();
    let description_val = update.description.clone().flatten();
    let discount_supplied = update.discount_price.is_some();
    let discount_val = update.discount_price.flatten();
    let category_supplied = update.category_id.is_some();
    let category_val = update.category_id.flatten();

    let rows_affected = sqlx::query(
        "UPDATE products \
         SET name           = COALESCE($2, name), \
             slug           = COALESCE($3, slug), \
             description    = CASE WHEN $4::BOOL THEN $5 ELSE description END, \
             price          = COALESCE($6, price), \
             discount_price = CASE WHEN $7::BOOL THEN $8 ELSE discount_price END, \
             category_id    = CASE WHEN $9::BOOL THEN $10 ELSE category_id END, \
             stock          = COALESCE($11, stock), \
             is_featured    = COALESCE($12, is_featured), \
             is_active      = COALESCE($13, is_active), \
             updated_at     = NOW() \
         WHERE id = $1",
    )
    .bind(product_id)
    .bind(update.name.as_deref())
    .bind(update.slug.as_deref())
    .bind(description_supplied)
    .bind(description_val)
    .bind(update.price)
    .bind(discount_supplied)
    .bind(discount_val)
    .bind(category_supplied)
    .bind(category_val)
    .bind(update.stock)
    .bind(update.is_featured)
    .bind(update.is_active)
    .execute(pool)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        return Err(DbError::NotFound);
    }

    tracing::info!(product_id, "product updated");
    Ok(rows_affected)
}

/// Deletes a product. Images, variants, and variant attribute links are
/// removed by `ON DELETE CASCADE`.
///
/// Returns the number of product rows deleted (always 1 on success).
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has this id, or
/// [`DbError::Sqlx`] if the statement fails.
pub async fn delete_product(pool: &PgPool, product_id: i64) -> Result<u64, DbError> {
    let rows_affected = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(product_id)
        .execute(pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        return Err(DbError::NotFound);
    }

    tracing::info!(product_id, "product deleted");
    Ok(rows_affected)
}
