//! Course record database operations

use scorm_common::db::{CourseRecord, StoredManifest};
use scorm_common::Result;
use sqlx::SqlitePool;

/// Fields written when a package is ingested
#[derive(Debug, Clone)]
pub struct NewCourse<'a> {
    pub identifier: &'a str,
    pub version: &'a str,
    pub manifest_json: &'a str,
    pub path: &'a str,
}

/// Insert a course record and return its id
pub async fn insert_course(pool: &SqlitePool, course: &NewCourse<'_>) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO courses (identifier, version, manifest_json, path)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(course.identifier)
    .bind(course.version)
    .bind(course.manifest_json)
    .bind(course.path)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// All courses in insertion order
pub async fn list_courses(pool: &SqlitePool) -> Result<Vec<CourseRecord>> {
    let courses = sqlx::query_as::<_, CourseRecord>(
        "SELECT id, identifier, version, path FROM courses ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(courses)
}

/// Stored manifest JSON of a course, for replay
pub async fn load_manifest(pool: &SqlitePool, course_id: i64) -> Result<Option<StoredManifest>> {
    let stored = sqlx::query_as::<_, StoredManifest>(
        "SELECT id, identifier, manifest_json, path FROM courses WHERE id = ?",
    )
    .bind(course_id)
    .fetch_optional(pool)
    .await?;

    Ok(stored)
}

/// Id of the most recently ingested course with this manifest identifier
pub async fn find_course_id(pool: &SqlitePool, identifier: &str) -> Result<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM courses WHERE identifier = ? ORDER BY id DESC LIMIT 1",
    )
    .bind(identifier)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Delete a course and its tracking events
///
/// Returns the extracted package path of the deleted course, or `None` when
/// no course has this id. Removing the files is left to the caller.
pub async fn delete_course(pool: &SqlitePool, course_id: i64) -> Result<Option<String>> {
    let mut tx = pool.begin().await?;

    let path = sqlx::query_scalar::<_, String>("SELECT path FROM courses WHERE id = ?")
        .bind(course_id)
        .fetch_optional(&mut *tx)
        .await?;

    let Some(path) = path else {
        return Ok(None);
    };

    let progress = sqlx::query("DELETE FROM progress WHERE course_id = ?")
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::debug!(
        course_id,
        progress_rows = progress.rows_affected(),
        "Course record deleted"
    );

    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        scorm_common::db::create_schema(&pool).await.unwrap();
        pool
    }

    fn course<'a>(identifier: &'a str, path: &'a str) -> NewCourse<'a> {
        NewCourse {
            identifier,
            version: "1.2",
            manifest_json: "{}",
            path,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let pool = test_pool().await;
        let first = insert_course(&pool, &course("A", "/p/a")).await.unwrap();
        let second = insert_course(&pool, &course("B", "/p/b")).await.unwrap();
        assert!(second > first);

        let courses = list_courses(&pool).await.unwrap();
        assert_eq!(
            courses,
            vec![
                CourseRecord {
                    id: first,
                    identifier: "A".into(),
                    version: "1.2".into(),
                    path: "/p/a".into(),
                },
                CourseRecord {
                    id: second,
                    identifier: "B".into(),
                    version: "1.2".into(),
                    path: "/p/b".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_load_manifest() {
        let pool = test_pool().await;
        let id = insert_course(
            &pool,
            &NewCourse {
                identifier: "A",
                version: "",
                manifest_json: r#"{"identifier":"A"}"#,
                path: "/p/a",
            },
        )
        .await
        .unwrap();

        let stored = load_manifest(&pool, id).await.unwrap().unwrap();
        assert_eq!(stored.identifier, "A");
        assert_eq!(stored.manifest_json, r#"{"identifier":"A"}"#);
        assert!(load_manifest(&pool, id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_course_id_prefers_latest() {
        let pool = test_pool().await;
        insert_course(&pool, &course("DUP", "/p/1")).await.unwrap();
        let latest = insert_course(&pool, &course("DUP", "/p/2")).await.unwrap();

        assert_eq!(find_course_id(&pool, "DUP").await.unwrap(), Some(latest));
        assert_eq!(find_course_id(&pool, "none").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_course_removes_progress_first() {
        let pool = test_pool().await;
        let id = insert_course(&pool, &course("A", "/p/a")).await.unwrap();
        sqlx::query(
            "INSERT INTO progress (user_id, course_id, sco_id, status, score) VALUES (1, ?, 'sco', 'completed', 90)",
        )
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

        assert_eq!(delete_course(&pool, id).await.unwrap(), Some("/p/a".to_string()));

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM progress")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
        assert!(list_courses(&pool).await.unwrap().is_empty());

        assert_eq!(delete_course(&pool, id).await.unwrap(), None);
    }
}
