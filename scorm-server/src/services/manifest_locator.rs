//! Manifest discovery inside an extracted package
//!
//! Walks the package tree in file-name order and returns the first file named
//! exactly `imsmanifest.xml`. The match is case-sensitive and there is no
//! fallback to other names.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::models::MANIFEST_FILE_NAME;
use crate::services::manifest_decoder::ManifestError;

/// Find the package manifest under `root`
pub fn locate_manifest(root: &Path) -> Result<PathBuf, ManifestError> {
    let target = OsStr::new(MANIFEST_FILE_NAME);

    let found = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Error accessing entry: {}", e);
                None
            }
        })
        .find(|entry| entry.file_type().is_file() && entry.file_name() == target);

    match found {
        Some(entry) => {
            tracing::debug!(manifest = %entry.path().display(), "Manifest located");
            Ok(entry.into_path())
        }
        None => Err(ManifestError::NotFound(root.to_path_buf())),
    }
}

/// Locate and read the manifest, returning its path and bytes
pub fn read_manifest(root: &Path) -> Result<(PathBuf, Vec<u8>), ManifestError> {
    let path = locate_manifest(root)?;
    let bytes = std::fs::read(&path).map_err(|e| ManifestError::Io(path.clone(), e))?;
    Ok((path, bytes))
}
