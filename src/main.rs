use sea_orm::{ConnectOptions, Database};

use rust_tezaur::api::create_api_router;
use rust_tezaur::entities::setup_schema;
use rust_tezaur::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://store.db?mode=rwc".to_owned());
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned());
    let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_owned());

    let mut options = ConnectOptions::new(&database_url);
    options.sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("failed to connect to the database");
    setup_schema(&db).await.expect("failed to create the schema");

    let state = AppState::new(db, &upload_dir);
    let app = create_api_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind");
    tracing::info!(%bind_addr, %database_url, "store is up");
    axum::serve(listener, app).await.expect("server error");
}
