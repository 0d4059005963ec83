//! Catalog domain types shared by the data layer and the HTTP service.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::CoreError;

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Client,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Client => write!(f, "client"),
        }
    }
}

/// The authenticated caller, as established by the identity layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject_id: String,
    pub role: Role,
}

impl Principal {
    /// Single capability check performed before entering a gated operation.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Forbidden`] when the principal's role differs from
    /// `required`.
    pub fn require_role(&self, required: Role) -> Result<(), CoreError> {
        if self.role == required {
            Ok(())
        } else {
            Err(CoreError::Forbidden { required })
        }
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Filter and pagination criteria for product listing.
///
/// `page` and `page_size` are always at least 1; use [`ListCriteria::new`]
/// to get that guarantee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCriteria {
    pub category_id: Option<i64>,
    pub featured_only: Option<bool>,
    pub search: Option<String>,
    pub page: i64,
    pub page_size: i64,
}

impl ListCriteria {
    #[must_use]
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            category_id: None,
            featured_only: None,
            search: None,
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    #[must_use]
    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn featured(mut self, featured_only: bool) -> Self {
        self.featured_only = Some(featured_only);
        self
    }

    /// Blank search terms are treated as absent.
    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.trim().is_empty() {
            None
        } else {
            Some(term)
        };
        self
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// Number of pages needed to show `total` rows at `page_size` per page.
#[must_use]
pub fn page_count(total: i64, page_size: i64) -> i64 {
    if total <= 0 || page_size <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageInput {
    pub url: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VariantInput {
    pub sku: String,
    pub stock: i32,
    #[serde(default)]
    pub price_adjustment: Decimal,
    /// Ids of the attribute values describing this variant.
    #[serde(default, alias = "attributes")]
    pub attribute_value_ids: Vec<i64>,
}

impl VariantInput {
    /// Attribute value ids with duplicates removed, first occurrence wins.
    #[must_use]
    pub fn distinct_attribute_value_ids(&self) -> Vec<i64> {
        let mut seen = Vec::with_capacity(self.attribute_value_ids.len());
        for id in &self.attribute_value_ids {
            if !seen.contains(id) {
                seen.push(*id);
            }
        }
        seen
    }
}

/// A product together with the child rows created alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub images: Vec<ImageInput>,
    #[serde(default)]
    pub variants: Vec<VariantInput>,
}

fn default_true() -> bool {
    true
}

impl ProductInput {
    /// Check the field-level rules that storage does not enforce.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] describing the first rule violated.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_name(&self.name)?;
        validate_slug(&self.slug)?;
        validate_price(self.price)?;
        validate_stock("stock", self.stock)?;
        validate_discount(self.price, self.discount_price)?;

        for image in &self.images {
            if image.url.trim().is_empty() {
                return Err(CoreError::Validation("image url must not be empty".into()));
            }
        }
        for variant in &self.variants {
            if variant.sku.trim().is_empty() {
                return Err(CoreError::Validation("variant sku must not be empty".into()));
            }
            validate_stock("variant stock", variant.stock)?;
        }
        Ok(())
    }
}

/// Sparse set of product fields to change.
///
/// `None` keeps the stored value. For nullable columns the inner option
/// distinguishes "set to value" from "clear" (`Some(None)`).
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub discount_price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    pub stock: Option<i32>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
}

impl ProductUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Check supplied fields against the same rules as [`ProductInput`].
    ///
    /// A supplied discount must not be negative; it is compared against the
    /// price only when both are part of the update.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for an empty update or an invalid field.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.is_empty() {
            return Err(CoreError::Validation(
                "update must change at least one field".into(),
            ));
        }
        if let Some(ref name) = self.name {
            validate_name(name)?;
        }
        if let Some(ref slug) = self.slug {
            validate_slug(slug)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(Some(discount)) = self.discount_price {
            if discount.is_sign_negative() {
                return Err(CoreError::Validation(format!(
                    "discount_price must not be negative, got {discount}"
                )));
            }
            if let Some(price) = self.price {
                validate_discount(price, Some(discount))?;
            }
        }
        if let Some(stock) = self.stock {
            validate_stock("stock", stock)?;
        }
        Ok(())
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_name(name: &str) -> Result<(), CoreError> {
    let len = name.trim().chars().count();
    if len == 0 || len > 255 {
        return Err(CoreError::Validation(
            "name must be 1-255 characters".into(),
        ));
    }
    Ok(())
}

fn validate_slug(slug: &str) -> Result<(), CoreError> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-');
    if valid {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "slug must be lowercase ascii letters, digits, and inner dashes, got '{slug}'"
        )))
    }
}

fn validate_price(price: Decimal) -> Result<(), CoreError> {
    if price.is_sign_negative() {
        return Err(CoreError::Validation(format!(
            "price must not be negative, got {price}"
        )));
    }
    Ok(())
}

fn validate_discount(price: Decimal, discount: Option<Decimal>) -> Result<(), CoreError> {
    match discount {
        Some(d) if d.is_sign_negative() || d > price => Err(CoreError::Validation(format!(
            "discount_price must be between 0 and price ({price}), got {d}"
        ))),
        _ => Ok(()),
    }
}

fn validate_stock(field: &str, stock: i32) -> Result<(), CoreError> {
    if stock < 0 {
        return Err(CoreError::Validation(format!(
            "{field} must not be negative, got {stock}"
        )));
    }
    Ok(())
}

/// Generate a URL-safe slug from a product name.
#[must_use]
pub fn slug_from_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else if c.is_whitespace() {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
