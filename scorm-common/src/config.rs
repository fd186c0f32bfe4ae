//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`SCORM_ROOT_FOLDER`, then `SCORM_ROOT`)
//! 3. TOML config file (`~/.config/scorm/<module>.toml`)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never aborts startup; it is logged and
//! the compiled defaults are used instead.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable checked first for the root folder
pub const ROOT_FOLDER_ENV: &str = "SCORM_ROOT_FOLDER";

/// Alternative environment variable for the root folder
pub const ROOT_ENV: &str = "SCORM_ROOT";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "scorm.db";

/// Subfolder holding uploaded package archives
pub const UPLOADS_DIR: &str = "uploads";

/// Subfolder holding extracted package trees
pub const PACKAGES_DIR: &str = "packages";

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional so that a partial file still loads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Root folder holding the database, uploads and extracted packages
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Maximum accepted upload size in bytes
    #[serde(default)]
    pub max_upload_bytes: Option<usize>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Compiled-in defaults used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
}

impl CompiledDefaults {
    /// Defaults for the platform the binary was compiled for
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
        }
    }
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/scorm (or /var/lib/scorm for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("scorm"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/scorm"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("scorm"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/scorm"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("scorm"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\scorm"))
    } else {
        PathBuf::from("./scorm_data")
    }
}

/// Candidate TOML locations for a module, most specific first
fn config_file_candidates(module_name: &str) -> Vec<PathBuf> {
    let file_name = format!("{}.toml", module_name);
    let mut candidates = Vec::new();

    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("scorm").join(&file_name));
    }
    if cfg!(target_os = "linux") {
        candidates.push(PathBuf::from("/etc/scorm").join(&file_name));
    }

    candidates
}

/// Read and parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the module's TOML config, falling back to defaults
///
/// Never fails: a missing file is normal, a broken one is logged.
pub fn load_toml_config(module_name: &str) -> TomlConfig {
    for path in config_file_candidates(module_name) {
        if !path.exists() {
            continue;
        }
        match read_toml_config(&path) {
            Ok(config) => {
                debug!("Loaded config file: {}", path.display());
                return config;
            }
            Err(e) => {
                warn!("Ignoring config file: {}", e);
                return TomlConfig::default();
            }
        }
    }

    debug!("No config file found for module '{}', using defaults", module_name);
    TomlConfig::default()
}

/// Resolves the root folder for a module
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            cli_arg: None,
        }
    }

    /// Command-line override (highest priority)
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Resolve the root folder; always yields a path
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        for var in [ROOT_FOLDER_ENV, ROOT_ENV] {
            if let Ok(path) = std::env::var(var) {
                if !path.trim().is_empty() {
                    return PathBuf::from(path);
                }
            }
        }

        if let Some(path) = load_toml_config(&self.module_name).root_folder {
            return path;
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder layout and hands out well-known paths in it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create root, uploads and packages folders (idempotent)
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(self.uploads_dir())?;
        std::fs::create_dir_all(self.packages_dir())?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root_folder.join(UPLOADS_DIR)
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.root_folder.join(PACKAGES_DIR)
    }
}
