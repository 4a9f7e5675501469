//! # Engine - Spillway Paged Storage
//!
//! Dictionary-like and list-like containers whose contents may be far larger
//! than memory. Each container splits its entries into pages; at most
//! `max_resident_pages` pages live in memory, the rest sit in individual
//! files and are reloaded on demand.
//!
//! ## Architecture
//!
//! ```text
//! Caller
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │ Dict / OrderedDict / List        (facades)    │
//! │   get / set / remove / push / iter ...        │
//! │              |                                │
//! │              v                                │
//! │ Addressing::locate(key) -> (address, slot)    │
//! │              |                                │
//! │              v                                │
//! │ PageStore::guarantee(address)                 │
//! │   resident?  yes -> use it                    │
//! │              no  -> Addressing::open_page     │
//! │                     (load file or new page)   │
//! │   too many resident? evict queue head         │
//! │              |                                │
//! │              v                                │
//! │ persist_and_evict(head)                       │
//! │   write index, write page (or prune if empty) │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module         | Purpose                                              |
//! |----------------|------------------------------------------------------|
//! | [`lib.rs`]     | `PageStore` struct, constructor, accessors, `Debug`, `Drop` |
//! | [`addressing`] | `Addressing` trait, hash-bucket and positional strategies |
//! | [`residency`]  | `guarantee`, `persist_and_evict`, `flush`, `close`    |
//! | [`files`]      | page/index file naming and raw I/O                   |
//! | [`recovery`]   | directory scan, temp file cleanup                    |
//! | [`map`]        | `PagedMap` facade (`Dict`, `OrderedDict`)            |
//! | [`list`]       | `List` facade                                        |
//! | [`iter`]       | page-walking iterators                               |
//!
//! ## Concurrency
//!
//! None. A container exclusively owns the files under its base path and must
//! be used from one thread of one process. Every operation, including any
//! disk I/O it triggers, completes before returning.
//!
//! ## Lifecycle
//!
//! `close()` writes every resident page and the index, and is a no-op when
//! called again. Dropping an open container closes it best-effort, so
//! leaving scope (normally, by `?`, or by unwinding) never loses resident
//! pages. `scope()` runs a closure and closes afterwards.
pub mod addressing;
mod error;
mod files;
mod iter;
mod list;
mod map;
mod recovery;
mod residency;

use std::collections::{HashMap, VecDeque};
use std::fs;
use tracing::info;

pub use addressing::{Addressing, HashAddressing, PositionalAddressing};
pub use config::{ConfigError, StoreConfig};
pub use error::{Result, StoreError};
pub use files::{IndexRecord, PageFiles};
pub use iter::{ListIter, MapIter};
pub use keyhash::{FixedHash, HashError, Value};
pub use list::List;
pub use map::{Dict, OrderedDict, PagedMap};

/// Generic page store: residency bookkeeping shared by every container.
///
/// # Invariants
///
/// - `queue` holds each resident address exactly once, oldest first, and has
///   the same length as `pages`.
/// - After [`guarantee`](PageStore::guarantee) returns, at most
///   `max_resident_pages` pages are resident.
/// - `length` equals the sum of entries over all pages, resident or not.
pub struct PageStore<A: Addressing> {
    pub(crate) config: StoreConfig,
    pub(crate) files: PageFiles,
    pub(crate) addressing: A,
    /// Resident pages by address.
    pub(crate) pages: HashMap<u64, A::Page>,
    /// Residency order, oldest at the front.
    pub(crate) queue: VecDeque<u64>,
    /// Total logical entries.
    pub(crate) length: u64,
    /// Highest resident page count observed after a `guarantee` call.
    pub(crate) peak_resident: usize,
    pub(crate) closed: bool,
}

impl<A: Addressing> std::fmt::Debug for PageStore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageStore")
            .field("base_path", &self.files.base_path())
            .field("page_capacity", &self.config.page_capacity)
            .field("max_resident_pages", &self.config.max_resident_pages)
            .field("length", &self.length)
            .field("resident_pages", &self.pages.len())
            .field("known_pages", &self.addressing.addresses().len())
            .field("peak_resident", &self.peak_resident)
            .field("closed", &self.closed)
            .finish()
    }
}

impl<A: Addressing> PageStore<A> {
    /// Opens (or creates) the store described by `config`.
    ///
    /// # Steps
    ///
    /// 1. Validate the configuration (no I/O happens on failure).
    /// 2. Create the directory holding the files if it does not exist.
    /// 3. Remove leftover temp files from interrupted writes.
    /// 4. Load the index record; reject a mismatched page capacity.
    /// 5. Let `build` reconstruct the addressing state and the length from
    ///    the files and the persisted length, `None` when no index exists.
    pub fn open<F>(config: StoreConfig, build: F) -> Result<Self>
    where
        F: FnOnce(&PageFiles, Option<u64>) -> Result<(A, u64)>,
    {
        config.validate()?;

        let files = PageFiles::new(&config);
        fs::create_dir_all(files.dir())?;
        files.cleanup_tmp_files();

        let capacity = config.page_capacity as u64;
        let persisted = match files.load_index()? {
            Some(record) if record.page_capacity != capacity => {
                return Err(StoreError::CapacityMismatch {
                    path: files.index_path(),
                    stored: record.page_capacity,
                    requested: capacity,
                })
            }
            Some(record) => Some(record.length),
            None => None,
        };

        let (addressing, length) = build(&files, persisted)?;

        info!(
            base = %files.base_path().display(),
            length,
            page_capacity = config.page_capacity,
            max_resident_pages = config.max_resident_pages,
            "store opened"
        );

        Ok(Self {
            config,
            files,
            addressing,
            pages: HashMap::new(),
            queue: VecDeque::new(),
            length,
            peak_resident: 0,
            closed: false,
        })
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[must_use]
    pub fn files(&self) -> &PageFiles {
        &self.files
    }

    /// Total logical entries, resident or not.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.length
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of pages currently in memory.
    #[must_use]
    pub fn resident_pages(&self) -> usize {
        self.pages.len()
    }

    /// Addresses currently in memory, oldest first.
    #[must_use]
    pub fn residency_queue(&self) -> Vec<u64> {
        self.queue.iter().copied().collect()
    }

    /// Highest number of resident pages seen at the end of any page request.
    #[must_use]
    pub fn peak_resident(&self) -> usize {
        self.peak_resident
    }

    /// Snapshot of every page address holding data.
    #[must_use]
    pub fn known_addresses(&self) -> Vec<u64> {
        self.addressing.addresses()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

/// Best-effort close on drop.
///
/// Errors cannot propagate out of `Drop`, so they are logged. Call
/// [`PageStore::close`] (or the facade's `close`) to observe them.
impl<A: Addressing> Drop for PageStore<A> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close() {
                tracing::warn!(
                    base = %self.files.base_path().display(),
                    error = %e,
                    "failed to flush pages on drop"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests;
