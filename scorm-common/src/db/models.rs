//! Database models

use serde::{Deserialize, Serialize};

/// Stored SCORM package (one row per ingested package)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CourseRecord {
    pub id: i64,
    pub identifier: String,
    pub version: String,
    pub path: String,
}

/// Course row plus the serialized manifest used for replay
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StoredManifest {
    pub id: i64,
    pub identifier: String,
    pub manifest_json: String,
    pub path: String,
}

/// Tracking event joined with its course identifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProgressRecord {
    pub id: i64,
    pub course_id: i64,
    /// Identifier of the owning course (the package's manifest identifier)
    pub scorm_id: String,
    pub sco_id: String,
    pub status: String,
    pub score: i64,
    pub updated_at: String,
}
