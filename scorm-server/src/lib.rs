//! scorm-server library interface
//!
//! Package ingestion (extract, decode, map, validate, store), course and
//! progress endpoints, and the in-memory runtime tracking API. Exposed as a
//! library for integration testing.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod runtime;
pub mod services;
pub mod validators;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use scorm_common::config::RootFolderInitializer;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::runtime::RuntimeStore;
use crate::services::PackageImporter;

/// Module name used for config files and the health endpoint
pub const MODULE_NAME: &str = "scorm-server";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5780;

/// Default upload size limit (256 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Folders for uploaded archives and extracted packages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageDirs {
    pub uploads_dir: PathBuf,
    pub packages_dir: PathBuf,
}

impl StorageDirs {
    pub fn from_root(initializer: &RootFolderInitializer) -> Self {
        Self {
            uploads_dir: initializer.uploads_dir(),
            packages_dir: initializer.packages_dir(),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Runtime session store, one per process
    pub runtime: Arc<RuntimeStore>,
    pub storage: StorageDirs,
    /// Largest accepted upload body in bytes
    pub max_upload_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, storage: StorageDirs) -> Self {
        Self {
            db,
            runtime: Arc::new(RuntimeStore::new()),
            storage,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            startup_time: Utc::now(),
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Ingestion pipeline bound to this state's database and package folder
    pub fn importer(&self) -> PackageImporter {
        PackageImporter::new(self.db.clone(), self.storage.packages_dir.clone())
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::upload_routes().layer(DefaultBodyLimit::max(state.max_upload_bytes)))
        .merge(api::course_routes())
        .merge(api::tracking_routes())
        .merge(api::runtime_routes())
        .layer(TraceLayer::new_for_http())
        // SCOs call the runtime API from the browser
        .layer(CorsLayer::permissive())
        .with_state(state)
}
