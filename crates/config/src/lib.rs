//! # Config - Container Configuration
//!
//! Describes where a paged container keeps its files and how much of it may
//! live in memory at once.
//!
//! ```text
//! location/                     default: ~/.spillway
//!   <base_name>Len              index record (page capacity + length)
//!   <base_name>0                page 0 (only while not resident)
//!   <base_name>17               page 17
//! ```
//!
//! ## Environment overrides
//!
//! ```text
//! SPILLWAY_DIR            storage location       (default: ~/.spillway)
//! SPILLWAY_PAGE_CAPACITY  entries per page       (default: 1024)
//! SPILLWAY_MAX_PAGES      pages resident in RAM  (default: 16)
//! SPILLWAY_SYNC           fsync every page write (default: false)
//! ```
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default number of entries per page.
pub const DEFAULT_PAGE_CAPACITY: usize = 1024;

/// Default number of pages allowed in memory at the same time.
pub const DEFAULT_MAX_RESIDENT_PAGES: usize = 16;

/// Name of the default storage directory under the user's home.
pub const DEFAULT_DIR_NAME: &str = ".spillway";

/// Suffix of the index file next to the page files.
pub const INDEX_SUFFIX: &str = "Len";

/// Invalid container configuration. Always raised before any file I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("There must be allowed at least one item per page.")]
    PageCapacity,

    #[error("There must be allowed at least one page in RAM.")]
    ResidentPages,

    #[error("base name must not be empty")]
    EmptyBaseName,

    #[error("base name {name:?} must end in a file name")]
    BaseName { name: String },

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: String, value: String },
}

/// Settings for one paged container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// File-name prefix shared by the index and every page file.
    pub base_name: String,
    /// Maximum entries per page (hash bucket width or list run length).
    pub page_capacity: usize,
    /// Maximum pages held in memory at once.
    pub max_resident_pages: usize,
    /// Directory holding the files. Empty means the current directory.
    pub location: PathBuf,
    /// If `true`, every page and index write is fsynced.
    pub sync_writes: bool,
}

/// `~/.spillway`, or `.spillway` relative to the working directory when no
/// home directory can be determined.
#[must_use]
pub fn default_location() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DIR_NAME))
}

impl StoreConfig {
    /// A configuration with the default capacity, page bound and location.
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            page_capacity: DEFAULT_PAGE_CAPACITY,
            max_resident_pages: DEFAULT_MAX_RESIDENT_PAGES,
            location: default_location(),
            sync_writes: false,
        }
    }

    #[must_use]
    pub fn page_capacity(mut self, page_capacity: usize) -> Self {
        self.page_capacity = page_capacity;
        self
    }

    #[must_use]
    pub fn max_resident_pages(mut self, max_resident_pages: usize) -> Self {
        self.max_resident_pages = max_resident_pages;
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl AsRef<Path>) -> Self {
        self.location = location.as_ref().to_path_buf();
        self
    }

    #[must_use]
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Builds a configuration from `SPILLWAY_*` environment variables,
    /// falling back to the defaults for anything unset.
    pub fn from_env(base_name: impl Into<String>) -> Result<Self, ConfigError> {
        Self::from_lookup(base_name, |var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(base_name: impl Into<String>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::new(base_name);
        if let Some(dir) = lookup("SPILLWAY_DIR") {
            cfg.location = PathBuf::from(dir);
        }
        if let Some(v) = lookup("SPILLWAY_PAGE_CAPACITY") {
            cfg.page_capacity = parse_var("SPILLWAY_PAGE_CAPACITY", &v)?;
        }
        if let Some(v) = lookup("SPILLWAY_MAX_PAGES") {
            cfg.max_resident_pages = parse_var("SPILLWAY_MAX_PAGES", &v)?;
        }
        if let Some(v) = lookup("SPILLWAY_SYNC") {
            cfg.sync_writes = parse_var("SPILLWAY_SYNC", &v)?;
        }
        Ok(cfg)
    }

    /// Checks the bounds. The page bound is checked first.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_resident_pages < 1 {
            return Err(ConfigError::ResidentPages);
        }
        if self.page_capacity < 1 {
            return Err(ConfigError::PageCapacity);
        }
        if self.base_name.is_empty() {
            return Err(ConfigError::EmptyBaseName);
        }
        let trailing_separator = self.base_name.ends_with(std::path::is_separator);
        if trailing_separator || Path::new(&self.base_name).file_name().is_none() {
            return Err(ConfigError::BaseName {
                name: self.base_name.clone(),
            });
        }
        Ok(())
    }

    /// `location/base_name`, the prefix of every file the container owns.
    #[must_use]
    pub fn base_path(&self) -> PathBuf {
        self.location.join(&self.base_name)
    }

    /// Path of the index file.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        with_suffix(&self.base_path(), INDEX_SUFFIX)
    }

    /// Path of the page file for `address`.
    #[must_use]
    pub fn page_path(&self, address: u64) -> PathBuf {
        with_suffix(&self.base_path(), &address.to_string())
    }
}

/// Appends `suffix` to the final path component without a separator.
#[must_use]
pub fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = base.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

fn parse_var<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
    })
}
