//! Package ingestion pipeline
//!
//! extract → locate manifest → decode → map → validate → store
//!
//! Validation violations abort the import; nothing is stored for a package
//! whose course fails validation. Stored courses keep their manifest JSON so
//! they can be replayed (re-mapped and re-validated) later.

use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::db::courses::{self, NewCourse};
use crate::models::{DigitalCourse, Manifest};
use crate::services::course_mapper::map_manifest;
use crate::services::manifest_decoder::{decode_manifest, ManifestError};
use crate::services::manifest_locator::read_manifest;
use crate::services::package_extractor::{extract_package, ExtractError};
use crate::validators::{validate, ValidationErrors};

/// Ingestion and replay errors
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Package extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Course validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Course not found: {0}")]
    CourseNotFound(i64),

    /// Extraction folder already holds another package
    #[error("Package folder already exists: {0}")]
    DestinationExists(PathBuf),

    #[error(transparent)]
    Database(#[from] scorm_common::Error),

    /// Blocking extraction task panicked or was cancelled
    #[error("Import task failed: {0}")]
    Task(String),
}

impl ImportError {
    /// True when the uploaded package (not the server) is at fault
    pub fn is_input_error(&self) -> bool {
        match self {
            ImportError::Extract(e) => e.is_invalid_archive(),
            ImportError::Manifest(ManifestError::NotFound(_) | ManifestError::Decode(_)) => true,
            ImportError::Validation(_) => true,
            _ => false,
        }
    }
}

/// Course stored by an import
#[derive(Debug, Clone)]
pub struct ImportedCourse {
    pub course_id: i64,
    pub identifier: String,
    pub path: PathBuf,
    pub course: DigitalCourse,
}

/// Course rebuilt from its stored manifest
#[derive(Debug, Clone)]
pub struct ReplayedCourse {
    pub course_id: i64,
    pub identifier: String,
    pub course: DigitalCourse,
}

/// Map and validate a manifest
pub fn build_course(manifest: &Manifest) -> Result<DigitalCourse, ValidationErrors> {
    let course = map_manifest(manifest);
    validate(&course)?;
    Ok(course)
}

/// Create the extraction folder, failing if another import already owns it
async fn reserve_destination(dest: &Path) -> Result<(), ImportError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ExtractError::Write(parent.to_path_buf(), e))?;
    }
    match tokio::fs::create_dir(dest).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            Err(ImportError::DestinationExists(dest.to_path_buf()))
        }
        Err(e) => Err(ExtractError::Write(dest.to_path_buf(), e).into()),
    }
}

/// Runs the ingestion pipeline against one database and package folder
#[derive(Debug, Clone)]
pub struct PackageImporter {
    db: SqlitePool,
    packages_dir: PathBuf,
}

impl PackageImporter {
    pub fn new(db: SqlitePool, packages_dir: PathBuf) -> Self {
        Self { db, packages_dir }
    }

    /// Extraction folder for an archive: `<packages>/<archive file stem>`
    pub fn destination_for(&self, archive_path: &Path) -> PathBuf {
        let stem = archive_path
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| "package".into());
        self.packages_dir.join(stem)
    }

    /// Ingest an uploaded package archive into [`Self::destination_for`]
    pub async fn import_archive(&self, archive_path: &Path) -> Result<ImportedCourse, ImportError> {
        let dest = self.destination_for(archive_path);
        self.import_archive_to(archive_path, &dest).await
    }

    /// Ingest a package archive into an explicit extraction folder
    ///
    /// The folder is reserved by creating it; when it already exists the
    /// import fails with [`ImportError::DestinationExists`] and the folder is
    /// left untouched, so one package never overwrites another's files. On
    /// any later failure the reserved folder is removed.
    pub async fn import_archive_to(
        &self,
        archive_path: &Path,
        dest: &Path,
    ) -> Result<ImportedCourse, ImportError> {
        info!(
            archive = %archive_path.display(),
            dest = %dest.display(),
            "Importing package"
        );

        reserve_destination(dest).await?;

        let result = self.ingest(archive_path, dest).await;
        if let Err(e) = &result {
            warn!(archive = %archive_path.display(), "Import failed: {}", e);
            if let Err(cleanup) = tokio::fs::remove_dir_all(dest).await {
                warn!("Failed to remove {}: {}", dest.display(), cleanup);
            }
        }
        result
    }

    async fn ingest(&self, archive_path: &Path, dest: &Path) -> Result<ImportedCourse, ImportError> {
        let archive = archive_path.to_path_buf();
        let target = dest.to_path_buf();

        // Extraction and the manifest walk are blocking filesystem work
        let (manifest_path, bytes) = tokio::task::spawn_blocking(move || {
            let summary = extract_package(&archive, &target)?;
            tracing::debug!(files = summary.files, "Extraction complete");
            let located = read_manifest(&target)?;
            Ok::<_, ImportError>(located)
        })
        .await
        .map_err(|e| ImportError::Task(e.to_string()))??;

        let manifest = decode_manifest(&bytes)?;
        info!(
            manifest = %manifest_path.display(),
            identifier = %manifest.identifier,
            organizations = manifest.organizations.len(),
            resources = manifest.resources.len(),
            "Manifest decoded"
        );

        let course = build_course(&manifest)?;
        info!(
            modules = course.modules.len(),
            topics = course.topic_count(),
            "Course mapped and validated"
        );

        let manifest_json = serde_json::to_string(&manifest)?;
        let path = dest.to_string_lossy();
        let course_id = courses::insert_course(
            &self.db,
            &NewCourse {
                identifier: &manifest.identifier,
                version: &manifest.version,
                manifest_json: &manifest_json,
                path: &path,
            },
        )
        .await?;
        info!(course_id, identifier = %manifest.identifier, "Course stored");

        Ok(ImportedCourse {
            course_id,
            identifier: manifest.identifier,
            path: dest.to_path_buf(),
            course,
        })
    }

    /// Rebuild and re-validate a stored course from its manifest JSON
    pub async fn replay(&self, course_id: i64) -> Result<ReplayedCourse, ImportError> {
        let stored = courses::load_manifest(&self.db, course_id)
            .await?
            .ok_or(ImportError::CourseNotFound(course_id))?;

        let manifest: Manifest = serde_json::from_str(&stored.manifest_json)?;
        let course = build_course(&manifest)?;

        Ok(ReplayedCourse {
            course_id: stored.id,
            identifier: stored.identifier,
            course,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const MANIFEST: &str = r#"<?xml version="1.0"?>
<manifest identifier="PKG-1" version="1.0">
  <metadata><lom><general><title><langstring>Packaged</langstring></title></general></lom></metadata>
  <organizations>
    <organization identifier="O1"><title>Org</title>
      <item identifier="I1" identifierref="R1"><title>Lesson</title></item>
      <item identifier="I2" identifierref="R2"><title>Exam</title></item>
    </organization>
  </organizations>
  <resources>
    <resource identifier="R1" type="webcontent" href="lesson.html"/>
    <resource identifier="R2" type="webcontent" href="final_test.html"/>
  </resources>
</manifest>"#;

    async fn importer(temp: &TempDir) -> PackageImporter {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        scorm_common::db::create_schema(&pool).await.unwrap();
        PackageImporter::new(pool, temp.path().join("packages"))
    }

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        for (name, contents) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[tokio::test]
    async fn test_import_then_replay() {
        let temp = TempDir::new().unwrap();
        let importer = importer(&temp).await;
        let archive = temp.path().join("safety.zip");
        write_zip(
            &archive,
            &[("safety/imsmanifest.xml", MANIFEST), ("safety/lesson.html", "<html/>")],
        );

        let imported = importer.import_archive(&archive).await.unwrap();
        assert_eq!(imported.identifier, "PKG-1");
        assert_eq!(imported.path, temp.path().join("packages").join("safety"));
        assert!(imported.path.join("imsmanifest.xml").is_file());
        assert_eq!(imported.course.name, "Packaged");
        assert_eq!(imported.course.topic_count(), 2);

        let replayed = importer.replay(imported.course_id).await.unwrap();
        assert_eq!(replayed.identifier, "PKG-1");
        assert_eq!(replayed.course.name, imported.course.name);
        let types: Vec<_> = replayed.course.modules[0]
            .topics
            .iter()
            .map(|t| t.topic_type)
            .collect();
        assert_eq!(
            types,
            vec![crate::models::TopicType::Lecture, crate::models::TopicType::Assessment]
        );
        // Fresh identifiers on every replay
        assert_ne!(replayed.course.uuid, imported.course.uuid);
    }

    #[tokio::test]
    async fn test_missing_manifest_is_input_error_and_cleaned_up() {
        let temp = TempDir::new().unwrap();
        let importer = importer(&temp).await;
        let archive = temp.path().join("empty.zip");
        write_zip(&archive, &[("content/index.html", "<html/>")]);

        let err = importer.import_archive(&archive).await.unwrap_err();
        assert!(matches!(err, ImportError::Manifest(ManifestError::NotFound(_))));
        assert!(err.is_input_error());
        assert!(!importer.destination_for(&archive).exists());
    }

    #[tokio::test]
    async fn test_invalid_course_is_not_stored() {
        let temp = TempDir::new().unwrap();
        let importer = importer(&temp).await;
        let archive = temp.path().join("untitled.zip");
        // Organization without a title yields a module without a name
        write_zip(
            &archive,
            &[(
                "imsmanifest.xml",
                r#"<manifest identifier="X"><organizations><organization identifier="O"/></organizations></manifest>"#,
            )],
        );

        let err = importer.import_archive(&archive).await.unwrap_err();
        match &err {
            ImportError::Validation(errors) => {
                assert_eq!(errors.violations()[0].field, "modules[0].name");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(err.is_input_error());
        assert!(courses::list_courses(&importer.db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_existing_destination_is_left_alone() {
        let temp = TempDir::new().unwrap();
        let importer = importer(&temp).await;
        let archive = temp.path().join("safety.zip");
        write_zip(&archive, &[("imsmanifest.xml", MANIFEST)]);

        importer.import_archive(&archive).await.unwrap();
        let err = importer.import_archive(&archive).await.unwrap_err();

        assert!(matches!(err, ImportError::DestinationExists(_)));
        assert!(importer
            .destination_for(&archive)
            .join("imsmanifest.xml")
            .is_file());
        assert_eq!(courses::list_courses(&importer.db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deepest_accepted_nesting_imports_and_replays() {
        use crate::services::manifest_decoder::MAX_ITEM_DEPTH;

        let temp = TempDir::new().unwrap();
        let importer = importer(&temp).await;

        let mut manifest = String::from(
            r#"<manifest identifier="DEEP"><organizations><organization identifier="O"><title>Org</title>"#,
        );
        for level in 0..MAX_ITEM_DEPTH {
            manifest.push_str(&format!(r#"<item identifier="I{level}"><title>Level {level}</title>"#));
        }
        manifest.push_str(&"</item>".repeat(MAX_ITEM_DEPTH));
        manifest.push_str("</organization></organizations></manifest>");

        let archive = temp.path().join("deep.zip");
        write_zip(&archive, &[("imsmanifest.xml", manifest.as_str())]);

        let imported = importer.import_archive(&archive).await.unwrap();
        // The outermost item only groups its children
        assert_eq!(imported.course.topic_count(), MAX_ITEM_DEPTH - 1);

        let replayed = importer.replay(imported.course_id).await.unwrap();
        assert_eq!(replayed.course.topic_count(), imported.course.topic_count());
        let names = |course: &DigitalCourse| -> Vec<String> {
            course.modules[0].topics.iter().map(|t| t.name.clone()).collect()
        };
        assert_eq!(names(&replayed.course), names(&imported.course));
    }

    #[tokio::test]
    async fn test_import_into_reserved_destination_fails() {
        let temp = TempDir::new().unwrap();
        let importer = importer(&temp).await;
        let archive = temp.path().join("upload.partial");
        write_zip(&archive, &[("imsmanifest.xml", MANIFEST)]);

        let dest = temp.path().join("packages").join("taken");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("keep.txt"), "mine").unwrap();

        let err = importer.import_archive_to(&archive, &dest).await.unwrap_err();
        assert!(matches!(err, ImportError::DestinationExists(_)));
        assert_eq!(std::fs::read_to_string(dest.join("keep.txt")).unwrap(), "mine");
        assert!(!dest.join("imsmanifest.xml").exists());
    }

    #[tokio::test]
    async fn test_replay_unknown_course() {
        let temp = TempDir::new().unwrap();
        let importer = importer(&temp).await;

        let err = importer.replay(42).await.unwrap_err();
        assert!(matches!(err, ImportError::CourseNotFound(42)));
        assert!(!err.is_input_error());
    }

    #[tokio::test]
    async fn test_destination_uses_archive_stem() {
        let temp = TempDir::new().unwrap();
        let importer = importer(&temp).await;

        assert_eq!(
            importer.destination_for(Path::new("/data/uploads/intro.course.zip")),
            temp.path().join("packages").join("intro.course")
        );
    }
}
