/// Hash-paged dictionaries.
///
/// [`PagedMap`] is generic over the page's map type:
///
/// - [`Dict`] uses `HashMap` pages; iteration order inside a page is
///   unspecified.
/// - [`OrderedDict`] uses `BTreeMap` pages; iteration is deterministic,
///   pages in ascending address order and keys sorted within each page.
///
/// Keys are located by [`FixedHash`], so they must hash identically across
/// processes. Every key type in `keyhash` (integers, strings, tuples, sets,
/// maps, [`Value`](keyhash::Value)) qualifies.
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use keyhash::{FixedHash, HashError};
use page::{MapPage, Page};

use crate::addressing::{Addressing, HashAddressing};
use crate::error::{Result, StoreError};
use crate::iter::MapIter;
use crate::PageStore;
use config::StoreConfig;

/// Unordered paged dictionary.
pub type Dict<K, V> = PagedMap<HashMap<K, V>>;

/// Paged dictionary with deterministic, per-page sorted iteration.
pub type OrderedDict<K, V> = PagedMap<BTreeMap<K, V>>;

/// A dictionary whose entries are spread over hash-addressed pages.
pub struct PagedMap<P>
where
    P: MapPage,
    P::Key: FixedHash,
{
    pub(crate) store: PageStore<HashAddressing<P>>,
}

impl<P> PagedMap<P>
where
    P: MapPage,
    P::Key: FixedHash,
{
    /// Opens the dictionary, reconstructing its page set from the files
    /// found under the base path. Without an index file the length is
    /// recounted from the pages.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let capacity = config.page_capacity as u64;
        let store = PageStore::open(config, |files, persisted| {
            let known = files.scan_addresses()?;
            let length = match persisted {
                Some(length) => length,
                None => files.count_entries::<P>(&known)?,
            };
            Ok((HashAddressing::new(capacity, known), length))
        })?;
        Ok(Self { store })
    }

    /// Looks up `key`, returning `None` when absent.
    pub fn try_get(&mut self, key: &P::Key) -> Result<Option<P::Value>> {
        let (address, ()) = self.store.addressing.locate(key)?;
        let page = self.store.guarantee(address)?;
        Ok(page.lookup(key).cloned())
    }

    /// Looks up `key`.
    ///
    /// # Errors
    ///
    /// [`StoreError::KeyNotFound`] when the key is absent.
    pub fn get(&mut self, key: &P::Key) -> Result<P::Value> {
        self.try_get(key)?.ok_or(StoreError::KeyNotFound)
    }

    /// Looks up `key`, falling back to `default` when absent.
    pub fn get_or(&mut self, key: &P::Key, default: P::Value) -> Result<P::Value> {
        Ok(self.try_get(key)?.unwrap_or(default))
    }

    /// Inserts or replaces, returning the previous value. The length only
    /// grows on first insertion.
    pub fn set(&mut self, key: P::Key, value: P::Value) -> Result<Option<P::Value>> {
        let (address, ()) = self.store.addressing.locate(&key)?;
        let page = self.store.guarantee(address)?;
        let previous = page.insert(key, value);
        if previous.is_none() {
            self.store.length += 1;
        }
        Ok(previous)
    }

    /// Applies `f` to the value stored under `key` in place.
    pub fn update<F>(&mut self, key: &P::Key, f: F) -> Result<()>
    where
        F: FnOnce(&mut P::Value),
    {
        let (address, ()) = self.store.addressing.locate(key)?;
        let page = self.store.guarantee(address)?;
        let value = page.lookup_mut(key).ok_or(StoreError::KeyNotFound)?;
        f(value);
        Ok(())
    }

    /// Removes `key`, returning its value. An emptied page is dropped (and
    /// never written to disk) the next time it is evicted.
    ///
    /// # Errors
    ///
    /// [`StoreError::KeyNotFound`] when the key is absent.
    pub fn remove(&mut self, key: &P::Key) -> Result<P::Value> {
        let (address, ()) = self.store.addressing.locate(key)?;
        let page = self.store.guarantee(address)?;
        let value = page.remove(key).ok_or(StoreError::KeyNotFound)?;
        debug_assert!(self.store.length > 0, "removed an entry from an empty map");
        self.store.length -= 1;
        Ok(value)
    }

    /// `true` if `key` is present. A key without a deterministic hash cannot
    /// be stored, so it is reported absent rather than as an error.
    pub fn contains(&mut self, key: &P::Key) -> Result<bool> {
        let address = match self.store.addressing.locate(key) {
            Ok((address, ())) => address,
            Err(StoreError::Hash(HashError::Unhashable { .. })) => return Ok(false),
            Err(e) => return Err(e),
        };
        let page = self.store.guarantee(address)?;
        Ok(page.contains(key))
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Walks every page, yielding `(key, value)` pairs.
    ///
    /// The set of pages is snapshotted when the walk starts. Pages are loaded
    /// one at a time, so memory stays bounded; each yielded pair is a clone.
    pub fn iter(&mut self) -> MapIter<'_, P> {
        MapIter::new(&mut self.store)
    }

    pub fn keys(&mut self) -> impl Iterator<Item = Result<P::Key>> + '_ {
        self.iter().map(|r| r.map(|(k, _)| k))
    }

    pub fn values(&mut self) -> impl Iterator<Item = Result<P::Value>> + '_ {
        self.iter().map(|r| r.map(|(_, v)| v))
    }

    /// Removes every entry and page file.
    pub fn clear(&mut self) -> Result<()> {
        self.store.clear()
    }

    /// Writes every resident page out without closing.
    pub fn flush(&mut self) -> Result<()> {
        self.store.flush()
    }

    /// Writes everything out. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        self.store.close()
    }

    /// Runs `f` on the open dictionary, then closes it, even if `f` failed.
    /// The closure's error takes precedence over a close error.
    pub fn scope<R, F>(mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Self) -> Result<R>,
    {
        let out = f(&mut self);
        let closed = self.close();
        let out = out?;
        closed?;
        Ok(out)
    }

    #[must_use]
    pub fn store(&self) -> &PageStore<HashAddressing<P>> {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        self.store.config()
    }

    /// Entries per page of the resident page at `address`, if resident.
    #[must_use]
    pub fn resident_page_len(&self, address: u64) -> Option<usize> {
        self.store.pages.get(&address).map(Page::entry_count)
    }
}

impl<P> fmt::Debug for PagedMap<P>
where
    P: MapPage,
    P::Key: FixedHash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedMap").field("store", &self.store).finish()
    }
}

impl<P> fmt::Display for PagedMap<P>
where
    P: MapPage,
    P::Key: FixedHash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cfg = self.store.config();
        write!(
            f,
            "Dictionary with values stored to {} ({} per page, {} in RAM)",
            self.store.files().base_path().display(),
            cfg.page_capacity,
            cfg.max_resident_pages
        )
    }
}
