//! Database access for the SCORM server
//!
//! Schema creation lives in `scorm_common::db::init`; these modules hold the
//! queries.

pub mod courses;
pub mod progress;

use scorm_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Open (or create) the database and bring the schema up to date
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::debug!("Connecting to database: {}", db_path.display());
    let pool = scorm_common::db::init_database(db_path).await?;
    tracing::info!("Database tables initialized (courses, progress)");
    Ok(pool)
}
