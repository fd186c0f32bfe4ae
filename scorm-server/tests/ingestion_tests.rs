//! End-to-end ingestion against an on-disk root folder

use std::fs::File;
use std::io::Write;

use scorm_common::config::RootFolderInitializer;
use scorm_server::models::TopicType;
use scorm_server::services::{ImportError, PackageImporter};
use scorm_server::StorageDirs;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const NESTED_MANIFEST: &str = r#"<?xml version="1.0"?>
<manifest identifier="NESTED-1" version="2004"
          xmlns="http://www.imsglobal.org/xsd/imscp_v1p1">
  <metadata>
    <lom xmlns="http://ltsc.ieee.org/xsd/LOM">
      <general>
        <title><string language="en">Chemistry Basics</string></title>
        <description><string language="en">Atoms and bonds</string></description>
      </general>
    </lom>
  </metadata>
  <organizations default="ORG">
    <organization identifier="ORG">
      <title>Unit 1</title>
      <item identifier="A" identifierref="R-A"><title>Atoms</title></item>
      <item identifier="B">
        <title>Bonds</title>
        <item identifier="B1" identifierref="R-QUIZ"><title>Bond quiz</title></item>
        <item identifier="B2" identifierref="R-A"><title>Covalent</title></item>
      </item>
      <item identifier="C" identifierref="R-TEST"><title>Unit test</title></item>
    </organization>
    <organization identifier="ORG-2">
      <title>Unit 2</title>
      <item identifier="D" identifierref="R-MISSING"><title>Orphan</title></item>
    </organization>
  </organizations>
  <resources>
    <resource identifier="R-A" type="webcontent" href="content/atoms.html"/>
    <resource identifier="R-QUIZ" type="webcontent" href="content/Quiz.html"/>
    <resource identifier="R-TEST" type="webcontent" href="content/Final_TEST.html"/>
  </resources>
</manifest>"#;

fn write_zip(path: &std::path::Path, entries: &[(&str, &str)]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, contents) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

#[tokio::test]
async fn test_import_nested_package_into_root_folder() {
    let temp = tempfile::tempdir().unwrap();
    let initializer = RootFolderInitializer::new(temp.path().join("scorm"));
    initializer.ensure_directory_exists().unwrap();
    let storage = StorageDirs::from_root(&initializer);

    let pool = scorm_server::db::init_database_pool(&initializer.database_path())
        .await
        .unwrap();
    assert!(initializer.database_exists());

    let archive = storage.uploads_dir.join("chemistry.zip");
    write_zip(
        &archive,
        &[
            ("chem/imsmanifest.xml", NESTED_MANIFEST),
            ("chem/content/atoms.html", "<html/>"),
        ],
    );

    let importer = PackageImporter::new(pool.clone(), storage.packages_dir.clone());
    let imported = importer.import_archive(&archive).await.unwrap();

    assert_eq!(imported.path, storage.packages_dir.join("chemistry"));
    assert!(imported.path.join("content/atoms.html").is_file());

    let course = &imported.course;
    assert_eq!(course.name, "Chemistry Basics");
    assert_eq!(course.description, "Atoms and bonds");
    assert_eq!(course.modules.len(), 2);
    assert!(course.modules.iter().all(|m| m.order == 0));

    let unit1: Vec<_> = course.modules[0]
        .topics
        .iter()
        .map(|t| (t.name.as_str(), t.topic_type, t.order))
        .collect();
    assert_eq!(
        unit1,
        vec![
            ("Atoms", TopicType::Lecture, 0),
            ("Bond quiz", TopicType::Lecture, 1),
            ("Covalent", TopicType::Lecture, 2),
            ("Unit test", TopicType::Assessment, 2),
        ]
    );

    let orphan = &course.modules[1].topics[0];
    assert_eq!(orphan.topic_type, TopicType::Lecture);
    assert_eq!(orphan.digital_course_module_id, course.modules[1].uuid);

    // Survives a reconnect
    drop(importer);
    pool.close().await;
    let reopened = scorm_server::db::init_database_pool(&initializer.database_path())
        .await
        .unwrap();
    let replayed = PackageImporter::new(reopened, storage.packages_dir.clone())
        .replay(imported.course_id)
        .await
        .unwrap();
    assert_eq!(replayed.identifier, "NESTED-1");
    assert_eq!(replayed.course.topic_count(), 5);
}

#[tokio::test]
async fn test_unsafe_archive_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let initializer = RootFolderInitializer::new(temp.path().to_path_buf());
    initializer.ensure_directory_exists().unwrap();
    let storage = StorageDirs::from_root(&initializer);
    let pool = scorm_server::db::init_database_pool(&initializer.database_path())
        .await
        .unwrap();

    let archive = storage.uploads_dir.join("evil.zip");
    write_zip(
        &archive,
        &[("imsmanifest.xml", NESTED_MANIFEST), ("../escape.txt", "x")],
    );

    let err = PackageImporter::new(pool, storage.packages_dir.clone())
        .import_archive(&archive)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::Extract(_)));
    assert!(err.is_input_error());
    assert!(!storage.packages_dir.join("escape.txt").exists());
    assert!(!storage.packages_dir.join("evil").exists());
}
