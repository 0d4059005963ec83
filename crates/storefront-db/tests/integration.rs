//! Offline unit tests for storefront-db pool configuration, row types, and
//! query composition. These tests do not require a live database connection.

use storefront_core::{AppConfig, Environment, ListCriteria};
use storefront_db::{compose_count, compose_list, PoolConfig, ProductRow, QueryParam};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        default_page_size: 10,
        max_page_size: 100,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`ProductRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn product_row_has_expected_fields() {
    use chrono::Utc;
    use rust_decimal::Decimal;

    let row = ProductRow {
        id: 42_i64,
        name: "Linen Shirt".to_string(),
        slug: "linen-shirt".to_string(),
        description: None,
        price: Decimal::new(4999, 2),
        discount_price: Some(Decimal::new(3999, 2)),
        stock: 12_i32,
        category_id: Some(3_i64),
        is_active: true,
        is_featured: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.id, 42);
    assert_eq!(row.slug, "linen-shirt");
    assert_eq!(row.price.to_string(), "49.99");
    assert_eq!(row.category_id, Some(3));
    assert!(row.description.is_none());
}

#[test]
fn list_and_count_share_filter_parameters() {
    let criteria = ListCriteria::new(2, 25).with_category(9).featured(true);

    let list = compose_list(&criteria);
    let count = compose_count(&criteria);

    // The list query appends LIMIT and OFFSET after the shared filter values.
    assert_eq!(count.params, vec![QueryParam::Int(9)]);
    assert_eq!(
        list.params,
        vec![QueryParam::Int(9), QueryParam::Int(25), QueryParam::Int(25)]
    );
    assert!(count.sql.contains("p.is_featured = TRUE"));
    assert!(!count.sql.contains("LIMIT"));
}
