pub mod api;
pub mod basket;
pub mod catalog;
pub mod entities;
pub mod error;
pub mod middleware;
pub mod tree;

use std::path::PathBuf;
use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::basket::BasketStore;
use crate::catalog::Catalog;
use crate::tree::CategoryTree;

/// Everything a handler needs, injected as one `Extension(Arc<AppState>)`.
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub tree: CategoryTree,
    pub catalog: Catalog,
    pub baskets: BasketStore,
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(db: DatabaseConnection, upload_dir: impl Into<PathBuf>) -> Arc<Self> {
        let db = Arc::new(db);
        Arc::new(AppState {
            tree: CategoryTree::new(db.clone()),
            catalog: Catalog::new(db.clone()),
            baskets: BasketStore::new(),
            upload_dir: upload_dir.into(),
            db,
        })
    }
}
