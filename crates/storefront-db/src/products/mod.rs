//! Catalog reads and writes for `products` and their child tables
//! (`product_images`, `product_variants`, `variant_attribute_values`).

mod read;
mod types;
mod write;

pub use read::{get_product_by_id, get_product_by_slug, list_products};
pub use types::{
    ProductDetail, ProductImageRow, ProductPage, ProductRow, ProductSummaryRow, ProductVariant,
    VariantRow,
};
pub use write::{create_product, delete_product, update_product};
