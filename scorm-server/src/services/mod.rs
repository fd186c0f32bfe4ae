//! Package ingestion services
//!
//! Leaves first: decoder and locator (manifest), extractor (zip), mapper
//! (manifest → course), importer (the whole pipeline plus replay).

pub mod course_mapper;
pub mod manifest_decoder;
pub mod manifest_locator;
pub mod package_extractor;
pub mod package_importer;

pub use course_mapper::{infer_topic_type, map_manifest};
pub use manifest_decoder::{decode_manifest, ManifestError, MAX_ITEM_DEPTH};
pub use manifest_locator::{locate_manifest, read_manifest};
pub use package_extractor::{extract_package, ExtractError, ExtractSummary};
pub use package_importer::{
    build_course, ImportError, ImportedCourse, PackageImporter, ReplayedCourse,
};
