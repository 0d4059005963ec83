//! Catalog product handlers.
//!
//! - `GET    /api/v1/products`       paginated, filtered listing
//! - `GET    /api/v1/products/:slug` full product with images and variants
//! - `POST   /api/v1/products`       create (admin)
//! - `PUT    /api/v1/products/:id`   sparse update (admin)
//! - `DELETE /api/v1/products/:id`   delete (admin)

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_core::{
    page_count, slug_from_name, AttributeGroups, ImageInput, ListCriteria, ProductInput,
    ProductUpdate, VariantInput,
};

use crate::middleware::{Caller, RequestId};

use super::{
    map_core_error, map_db_error, map_rejection, normalize_page_size, require_admin, ApiError,
    ApiResponse, AppState, ResponseMeta,
};

// ---------------------------------------------------------------------------
// Query and request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub category: Option<i64>,
    /// Only the literal `true` narrows the listing.
    pub featured: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateProductRequest {
    pub name: String,
    /// Derived from `name` when absent.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub is_featured: bool,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub images: Vec<ImageInput>,
    #[serde(default)]
    pub variants: Vec<VariantInput>,
}

impl CreateProductRequest {
    fn into_input(self) -> ProductInput {
        let name = self.name.trim().to_owned();
        let slug = match self.slug {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_owned(),
            _ => slug_from_name(&name),
        };
        ProductInput {
            name,
            slug,
            description: self.description,
            price: self.price,
            discount_price: self.discount_price,
            category_id: self.category_id,
            stock: self.stock,
            is_featured: self.is_featured,
            is_active: self.is_active.unwrap_or(true),
            images: self.images,
            variants: self.variants,
        }
    }
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    id: i64,
    name: String,
    slug: String,
    description: Option<String>,
    price: Decimal,
    discount_price: Option<Decimal>,
    stock: i32,
    category_id: Option<i64>,
    category_name: Option<String>,
    is_featured: bool,
    primary_image: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct Pagination {
    total: i64,
    page: i64,
    limit: i64,
    pages: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductListData {
    items: Vec<ProductItem>,
    pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub(super) struct ImageItem {
    id: i64,
    image_url: String,
    is_primary: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct VariantItem {
    id: i64,
    sku: String,
    stock: i32,
    price_adjustment: Decimal,
    attributes: AttributeGroups,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductDetailData {
    id: i64,
    name: String,
    slug: String,
    description: Option<String>,
    price: Decimal,
    discount_price: Option<Decimal>,
    stock: i32,
    category_id: Option<i64>,
    is_featured: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    images: Vec<ImageItem>,
    variants: Vec<VariantItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateProductResponse {
    product_id: i64,
    slug: String,
}

#[derive(Debug, Serialize)]
pub(super) struct UpdateProductResponse {
    updated: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct DeleteProductResponse {
    deleted: bool,
}

fn parse_product_id(request_id: &str, raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| {
        ApiError::new(
            request_id,
            "validation_error",
            format!("product id must be an integer, got '{raw}'"),
        )
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/products
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ProductListData>>, ApiError> {
    let Query(query) = query.map_err(|e| map_rejection(&req_id.0, &e))?;
    let limit = normalize_page_size(query.limit, state.default_page_size, state.max_page_size);
    let mut criteria = ListCriteria::new(query.page.unwrap_or(1), limit);
    if let Some(category_id) = query.category {
        criteria = criteria.with_category(category_id);
    }
    if query.featured.as_deref() == Some("true") {
        criteria = criteria.featured(true);
    }
    if let Some(search) = query.search {
        criteria = criteria.with_search(search);
    }

    let page = storefront_db::list_products(&state.pool, &criteria)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let items = page
        .items
        .into_iter()
        .map(|row| ProductItem {
            id: row.product.id,
            name: row.product.name,
            slug: row.product.slug,
            description: row.product.description,
            price: row.product.price,
            discount_price: row.product.discount_price,
            stock: row.product.stock,
            category_id: row.product.category_id,
            category_name: row.category_name,
            is_featured: row.product.is_featured,
            primary_image: row.primary_image,
            created_at: row.product.created_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data: ProductListData {
            items,
            pagination: Pagination {
                total: page.total,
                page: criteria.page,
                limit: criteria.page_size,
                pages: page_count(page.total, criteria.page_size),
            },
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/products/:slug
pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<ProductDetailData>>, ApiError> {
    let detail = storefront_db::get_product_by_slug(&state.pool, &slug)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let product = detail.product;
    let data = ProductDetailData {
        id: product.id,
        name: product.name,
        slug: product.slug,
        description: product.description,
        price: product.price,
        discount_price: product.discount_price,
        stock: product.stock,
        category_id: product.category_id,
        is_featured: product.is_featured,
        created_at: product.created_at,
        updated_at: product.updated_at,
        images: detail
            .images
            .into_iter()
            .map(|image| ImageItem {
                id: image.id,
                image_url: image.image_url,
                is_primary: image.is_primary,
            })
            .collect(),
        variants: detail
            .variants
            .into_iter()
            .map(|variant| VariantItem {
                id: variant.id,
                sku: variant.sku,
                stock: variant.stock,
                price_adjustment: variant.price_adjustment,
                attributes: variant.attributes,
            })
            .collect(),
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/products: create a product with images and variants.
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CreateProductResponse>>), ApiError> {
    let rid = &req_id.0;
    let principal = require_admin(rid, &caller)?;
    let Json(body) = body.map_err(|e| map_rejection(rid, &e))?;

    let input = body.into_input();
    input.validate().map_err(|e| map_core_error(rid, &e))?;

    let product_id = storefront_db::create_product(&state.pool, &input)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(
        product_id,
        subject = %principal.subject_id,
        request_id = %rid,
        "catalog product created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: CreateProductResponse {
                product_id,
                slug: input.slug,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PUT /api/v1/products/:id: update supplied fields only.
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
    body: Result<Json<ProductUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<UpdateProductResponse>>, ApiError> {
    let rid = &req_id.0;
    require_admin(rid, &caller)?;
    let product_id = parse_product_id(rid, &raw_id)?;
    let Json(body) = body.map_err(|e| map_rejection(rid, &e))?;
    body.validate().map_err(|e| map_core_error(rid, &e))?;

    storefront_db::update_product(&state.pool, product_id, &body)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: UpdateProductResponse { updated: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/products/:id: remove a product and its child rows.
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<DeleteProductResponse>>, ApiError> {
    let rid = &req_id.0;
    require_admin(rid, &caller)?;
    let product_id = parse_product_id(rid, &raw_id)?;

    storefront_db::delete_product(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: DeleteProductResponse { deleted: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}
