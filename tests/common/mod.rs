use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};

use rust_tezaur::entities::{product, product_type, setup_schema};
use rust_tezaur::AppState;

/// Fresh state over an in-memory SQLite database. One connection, so every
/// test sees its own isolated store; the upload dir is fresh per state too.
pub async fn test_state() -> Arc<AppState> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("failed to open in-memory sqlite");
    setup_schema(&db).await.expect("failed to create schema");
    let upload_dir = std::env::temp_dir().join(format!("rust-tezaur-test-{}", uuid::Uuid::new_v4()));
    AppState::new(db, upload_dir)
}

#[allow(dead_code)]
pub async fn seed_type(state: &AppState, name: &str) -> product_type::Model {
    product_type::ActiveModel {
        name: Set(name.to_owned()),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(&*state.db)
    .await
    .expect("failed to seed product type")
}

/// Seeds an active product; `age_minutes` pushes `created_at` into the past
/// so ordering assertions have distinct timestamps to work with.
#[allow(dead_code)]
pub async fn seed_product(
    state: &AppState,
    type_id: i32,
    category_id: i32,
    title: &str,
    slug: &str,
    age_minutes: i64,
) -> product::Model {
    let created = Utc::now() - Duration::minutes(age_minutes);
    product::ActiveModel {
        product_type_id: Set(type_id),
        category_id: Set(category_id),
        title: Set(title.to_owned()),
        description: Set(String::new()),
        slug: Set(slug.to_owned()),
        regular_price: Set(Decimal::new(9999, 2)),
        discount_price: Set(Decimal::new(8999, 2)),
        is_active: Set(true),
        created_at: Set(created),
        updated_at: Set(created),
        ..Default::default()
    }
    .insert(&*state.db)
    .await
    .expect("failed to seed product")
}
