use rust_decimal::Decimal;

use super::*;

fn sample_input() -> ProductInput {
    ProductInput {
        name: "Linen Shirt".to_string(),
        slug: "linen-shirt".to_string(),
        description: Some("Breathable summer shirt".to_string()),
        price: Decimal::new(4999, 2),
        discount_price: Some(Decimal::new(3999, 2)),
        category_id: None,
        stock: 12,
        is_featured: false,
        is_active: true,
        images: vec![],
        variants: vec![],
    }
}

#[test]
fn role_serializes_lowercase() {
    assert_eq!(
        serde_json::to_value(Role::Admin).expect("serialize"),
        serde_json::json!("admin")
    );
    assert_eq!(Role::Client.to_string(), "client");
}

#[test]
fn require_role_rejects_client_for_admin_operation() {
    let principal = Principal {
        subject_id: "user-1".to_string(),
        role: Role::Client,
    };
    assert!(matches!(
        principal.require_role(Role::Admin),
        Err(CoreError::Forbidden {
            required: Role::Admin
        })
    ));
}

#[test]
fn require_role_accepts_matching_role() {
    let principal = Principal {
        subject_id: "admin-1".to_string(),
        role: Role::Admin,
    };
    assert!(principal.require_role(Role::Admin).is_ok());
}

#[test]
fn list_criteria_clamps_page_and_size() {
    let criteria = ListCriteria::new(0, -5);
    assert_eq!(criteria.page, 1);
    assert_eq!(criteria.page_size, 1);
    assert_eq!(criteria.offset(), 0);
}

#[test]
fn list_criteria_offset_is_zero_based() {
    assert_eq!(ListCriteria::new(1, 10).offset(), 0);
    assert_eq!(ListCriteria::new(3, 10).offset(), 20);
}

#[test]
fn list_criteria_ignores_blank_search() {
    let criteria = ListCriteria::new(1, 10).with_search("   ");
    assert!(criteria.search.is_none());
}

#[test]
fn page_count_rounds_up() {
    assert_eq!(page_count(0, 10), 0);
    assert_eq!(page_count(10, 10), 1);
    assert_eq!(page_count(11, 10), 2);
    assert_eq!(page_count(1, 1), 1);
}

#[test]
fn product_input_accepts_valid_product() {
    assert!(sample_input().validate().is_ok());
}

#[test]
fn product_input_rejects_discount_above_price() {
    let mut input = sample_input();
    input.discount_price = Some(Decimal::new(5999, 2));
    assert!(matches!(input.validate(), Err(CoreError::Validation(_))));
}

#[test]
fn product_input_rejects_bad_slug() {
    let mut input = sample_input();
    input.slug = "Linen Shirt".to_string();
    assert!(matches!(input.validate(), Err(CoreError::Validation(_))));
}

#[test]
fn product_input_rejects_blank_variant_sku() {
    let mut input = sample_input();
    input.variants.push(VariantInput {
        sku: " ".to_string(),
        stock: 1,
        price_adjustment: Decimal::ZERO,
        attribute_value_ids: vec![],
    });
    assert!(matches!(input.validate(), Err(CoreError::Validation(_))));
}

#[test]
fn product_input_deserializes_with_defaults() {
    let input: ProductInput = serde_json::from_value(serde_json::json!({
        "name": "Mug",
        "slug": "mug",
        "price": "12.50",
        "images": [{ "url": "https://cdn.example.com/mug.jpg" }],
        "variants": [{ "sku": "MUG-1", "stock": 3, "attributes": [4, 4, 7] }]
    }))
    .expect("deserialize");

    assert!(input.is_active);
    assert!(!input.is_featured);
    assert_eq!(input.stock, 0);
    assert!(!input.images[0].is_primary);
    assert_eq!(input.variants[0].price_adjustment, Decimal::ZERO);
    assert_eq!(input.variants[0].distinct_attribute_value_ids(), vec![4, 7]);
}

#[test]
fn product_update_distinguishes_absent_from_null() {
    let update: ProductUpdate = serde_json::from_value(serde_json::json!({
        "discount_price": null,
        "stock": 4
    }))
    .expect("deserialize");

    assert_eq!(update.discount_price, Some(None));
    assert_eq!(update.description, None);
    assert_eq!(update.stock, Some(4));
}

#[test]
fn product_update_rejects_empty_update() {
    assert!(matches!(
        ProductUpdate::default().validate(),
        Err(CoreError::Validation(_))
    ));
}

#[test]
fn product_update_checks_discount_against_new_price() {
    let update = ProductUpdate {
        price: Some(Decimal::new(1000, 2)),
        discount_price: Some(Some(Decimal::new(2000, 2))),
        ..ProductUpdate::default()
    };
    assert!(matches!(update.validate(), Err(CoreError::Validation(_))));
}

#[test]
fn product_update_rejects_negative_discount_without_price() {
    let update: ProductUpdate = serde_json::from_value(serde_json::json!({
        "discount_price": "-5.00"
    }))
    .expect("deserialize");
    assert!(matches!(update.validate(), Err(CoreError::Validation(_))));

    let clear = ProductUpdate {
        discount_price: Some(None),
        ..ProductUpdate::default()
    };
    assert!(clear.validate().is_ok());

    let lower = ProductUpdate {
        discount_price: Some(Some(Decimal::new(500, 2))),
        ..ProductUpdate::default()
    };
    assert!(lower.validate().is_ok());
}

#[test]
fn slug_from_name_collapses_separators() {
    assert_eq!(slug_from_name("  Linen   Shirt (Blue) "), "linen-shirt-blue");
    assert_eq!(slug_from_name("Mug--XL"), "mug-xl");
}
