/// # Page Files - On-Disk Layout
///
/// Every container owns a family of files sharing one prefix, the *base path*
/// (`location/base_name`):
///
/// ```text
/// usersLen    IndexRecord { page_capacity, length }
/// users0      page 0
/// users17     page 17
/// ```
///
/// A page file exists exactly while its page is *not* resident: loading a
/// page reads the file and then deletes it, evicting a non-empty page writes
/// it back. Disk presence and memory residency are therefore mutually
/// exclusive and together say where every page lives.
///
/// All writes go through [`codec::write_file`] (temp file + rename), so a page
/// or index file is never observed half-written.
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use config::{with_suffix, StoreConfig, INDEX_SUFFIX};
use page::Page;

use crate::error::{Result, StoreError};

/// Persisted container metadata.
///
/// `page_capacity` is the addressing extra-state: pages written with one
/// capacity cannot be located with another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub page_capacity: u64,
    pub length: u64,
}

/// Path derivation and raw page/index I/O for one base path.
#[derive(Debug, Clone)]
pub struct PageFiles {
    /// `location/base_name`.
    base: PathBuf,
    /// Directory holding every file, the parent of `base`.
    dir: PathBuf,
    /// File-name prefix inside `dir`, the last component of `base`.
    base_name: String,
    /// If `true`, every write is fsynced.
    sync: bool,
}

impl PageFiles {
    /// The files live next to the base path: a base name such as `sub/d`
    /// puts them in `location/sub` with the prefix `d`.
    pub fn new(config: &StoreConfig) -> Self {
        let base = config.base_path();
        let dir = match base.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let base_name = base
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            base,
            dir,
            base_name,
            sync: config.sync_writes,
        }
    }

    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn base_name(&self) -> &str {
        &self.base_name
    }

    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        with_suffix(&self.base, INDEX_SUFFIX)
    }

    #[must_use]
    pub fn page_path(&self, address: u64) -> PathBuf {
        with_suffix(&self.base, &address.to_string())
    }

    #[must_use]
    pub fn page_exists(&self, address: u64) -> bool {
        self.page_path(address).is_file()
    }

    /// Loads the index record, or `None` for a container never written.
    pub fn load_index(&self) -> Result<Option<IndexRecord>> {
        match codec::read_file(self.index_path()) {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn store_index(&self, record: &IndexRecord) -> Result<()> {
        codec::write_file(self.index_path(), record, self.sync)?;
        Ok(())
    }

    /// Reads page `address` into memory and deletes its file.
    ///
    /// # Errors
    ///
    /// [`StoreError::MissingPage`] if there is no file for the page; the
    /// caller only asks for pages it believes are on disk.
    pub fn load_page<P: Page>(&self, address: u64) -> Result<P> {
        let path = self.page_path(address);
        let page: P = match codec::read_file(&path) {
            Ok(page) => page,
            Err(e) if e.is_not_found() => {
                return Err(StoreError::MissingPage { address, path })
            }
            Err(e) => return Err(e.into()),
        };
        fs::remove_file(&path)?;
        debug!(address, entries = page.entry_count(), "page loaded");
        Ok(page)
    }

    /// Writes page `address` to its file.
    pub fn store_page<P: Page>(&self, address: u64, page: &P) -> Result<()> {
        codec::write_file(self.page_path(address), page, self.sync)?;
        debug!(address, entries = page.entry_count(), "page persisted");
        Ok(())
    }

    /// Deletes the file of page `address` if there is one.
    pub fn remove_page(&self, address: u64) -> Result<()> {
        match fs::remove_file(self.page_path(address)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes the index file if there is one.
    pub fn remove_index(&self) -> Result<()> {
        match fs::remove_file(self.index_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
