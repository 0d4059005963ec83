//! Row types for the catalog tables.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use storefront_core::AttributeGroups;

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// Expected to be `<= price`; not enforced by the schema.
    pub discount_price: Option<Decimal>,
    pub stock: i32,
    pub category_id: Option<i64>,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One listing row: the product, its category name, and its primary image.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductSummaryRow {
    #[sqlx(flatten)]
    pub product: ProductRow,
    pub category_name: Option<String>,
    /// First image flagged `is_primary`, if any.
    pub primary_image: Option<String>,
}

/// One page of listing rows plus the size of the whole filtered set.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub items: Vec<ProductSummaryRow>,
    pub total: i64,
}

/// A row from the `product_images` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductImageRow {
    pub id: i64,
    pub product_id: i64,
    pub image_url: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

/// A row from `product_variants` with its attribute values flattened into a
/// single `id:type:value,...` string.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantRow {
    pub id: i64,
    pub product_id: i64,
    pub sku: String,
    pub stock: i32,
    /// Signed offset applied to the parent product's price.
    pub price_adjustment: Decimal,
    /// `NULL` when the variant has no linked attribute values.
    pub attributes: Option<String>,
}

/// A variant with its attribute values decoded into groups.
#[derive(Debug, Clone)]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: i64,
    pub sku: String,
    pub stock: i32,
    pub price_adjustment: Decimal,
    pub attributes: AttributeGroups,
}

/// A fully hydrated product.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: ProductRow,
    pub images: Vec<ProductImageRow>,
    pub variants: Vec<ProductVariant>,
}
