//! Tracking event database operations

use scorm_common::db::ProgressRecord;
use scorm_common::Result;
use sqlx::SqlitePool;

/// Tracking event reported by a SCO
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProgress<'a> {
    pub user_id: i64,
    pub course_id: i64,
    pub sco_id: &'a str,
    pub status: &'a str,
    pub score: i64,
}

/// Insert a tracking event and return its id
pub async fn insert_progress(pool: &SqlitePool, progress: &NewProgress<'_>) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO progress (user_id, course_id, sco_id, status, score)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(progress.user_id)
    .bind(progress.course_id)
    .bind(progress.sco_id)
    .bind(progress.status)
    .bind(progress.score)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Tracking events of one learner, oldest first, with the course identifier
pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<ProgressRecord>> {
    let records = sqlx::query_as::<_, ProgressRecord>(
        r#"
        SELECT p.id, p.course_id, c.identifier AS scorm_id, p.sco_id, p.status, p.score,
               CAST(p.updated_at AS TEXT) AS updated_at
        FROM progress p
        JOIN courses c ON p.course_id = c.id
        WHERE p.user_id = ?
        ORDER BY p.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(records)
}
