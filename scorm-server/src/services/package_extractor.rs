//! Package archive extraction
//!
//! Packages are often zipped with a single wrapping folder. The first path
//! component of the archive's first entry is treated as a common prefix and
//! stripped from every entry that starts with it, so the manifest usually
//! lands directly in the destination.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use zip::ZipArchive;

/// Archive extraction errors
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Archive file could not be opened
    #[error("Cannot open archive {0}: {1}")]
    Open(PathBuf, #[source] io::Error),

    /// File is not a readable zip archive
    #[error("Invalid zip archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Entry name is absolute or climbs out of the destination
    #[error("Archive entry escapes the destination folder: {0}")]
    UnsafeEntry(String),

    /// Writing an extracted file or folder failed
    #[error("Cannot write {0}: {1}")]
    Write(PathBuf, #[source] io::Error),
}

impl ExtractError {
    /// True when the archive itself is at fault rather than the server
    pub fn is_invalid_archive(&self) -> bool {
        matches!(self, ExtractError::Archive(_) | ExtractError::UnsafeEntry(_))
    }
}

/// Outcome of a successful extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Number of regular files written
    pub files: usize,
    /// Wrapping folder removed from entry paths, if any
    pub stripped_prefix: Option<PathBuf>,
}

/// Unpack `archive_path` into `dest`, creating folders as needed
///
/// Existing files in `dest` are overwritten.
pub fn extract_package(archive_path: &Path, dest: &Path) -> Result<ExtractSummary, ExtractError> {
    let file = File::open(archive_path)
        .map_err(|e| ExtractError::Open(archive_path.to_path_buf(), e))?;
    let mut archive = ZipArchive::new(file)?;

    let prefix = common_prefix(&mut archive)?;
    fs::create_dir_all(dest).map_err(|e| ExtractError::Write(dest.to_path_buf(), e))?;

    let mut files = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let enclosed = entry
            .enclosed_name()
            .map(PathBuf::from)
            .ok_or_else(|| ExtractError::UnsafeEntry(entry.name().to_string()))?;

        let relative = match &prefix {
            Some(prefix) => enclosed
                .strip_prefix(prefix)
                .map(Path::to_path_buf)
                .unwrap_or(enclosed),
            None => enclosed,
        };
        if relative.as_os_str().is_empty() {
            // The wrapping folder itself
            continue;
        }

        let target = dest.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| ExtractError::Write(target.clone(), e))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| ExtractError::Write(parent.to_path_buf(), e))?;
        }
        let mut out = File::create(&target).map_err(|e| ExtractError::Write(target.clone(), e))?;
        io::copy(&mut entry, &mut out).map_err(|e| ExtractError::Write(target.clone(), e))?;
        files += 1;
    }

    tracing::debug!(
        archive = %archive_path.display(),
        dest = %dest.display(),
        files,
        "Package extracted"
    );

    Ok(ExtractSummary {
        files,
        stripped_prefix: prefix,
    })
}

/// Wrapping folder named by the first entry, if the first entry is inside one
fn common_prefix<R: io::Read + io::Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<Option<PathBuf>, ExtractError> {
    if archive.is_empty() {
        return Ok(None);
    }

    let first = archive.by_index(0)?;
    let Some(path) = first.enclosed_name().map(PathBuf::from) else {
        return Ok(None);
    };

    let mut components = path.components();
    let prefix = match components.next() {
        Some(Component::Normal(name)) => PathBuf::from(name),
        _ => return Ok(None),
    };

    // A file at the archive root is not a wrapping folder
    if components.next().is_none() && !first.is_dir() {
        return Ok(None);
    }

    Ok(Some(prefix))
}
