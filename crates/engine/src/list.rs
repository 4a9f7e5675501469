/// Index-paged list.
///
/// Element `i` lives in page `i / page_capacity` at slot `i % page_capacity`.
/// Only the tail moves: `push` appends, `pop` removes the last element, and
/// `set` replaces in place. Inserting or removing in the middle would shift
/// every later page and is not supported.
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::addressing::{Addressing, PositionalAddressing};
use crate::error::{Result, StoreError};
use crate::iter::ListIter;
use crate::PageStore;
use config::StoreConfig;

/// A list whose elements are spread over position-addressed pages.
pub struct List<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    pub(crate) store: PageStore<PositionalAddressing<V>>,
}

impl<V> List<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    /// Opens the list; its pages are derived from the persisted length.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let capacity = config.page_capacity as u64;
        let store = PageStore::open(config, |_files, persisted| {
            let length = persisted.unwrap_or(0);
            Ok((PositionalAddressing::new(capacity, length), length))
        })?;
        Ok(Self { store })
    }

    fn check_index(&self, index: u64) -> Result<()> {
        if index >= self.store.length {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: self.store.length,
            });
        }
        Ok(())
    }

    /// Appends `value` at the end.
    pub fn push(&mut self, value: V) -> Result<()> {
        let position = self.store.length;
        let (address, slot) = self.store.addressing.locate(&position)?;
        let page = self.store.guarantee(address)?;
        debug_assert_eq!(page.len(), slot, "positional page out of step with length");
        page.push(value);
        self.store.length += 1;
        Ok(())
    }

    /// Appends every value of `values`, in order.
    pub fn extend<I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
    {
        for v in values {
            self.push(v)?;
        }
        Ok(())
    }

    /// Returns a clone of element `index`.
    ///
    /// # Errors
    ///
    /// [`StoreError::IndexOutOfRange`] when `index >= len()`.
    pub fn get(&mut self, index: u64) -> Result<V> {
        self.check_index(index)?;
        let len = self.store.length;
        let (address, slot) = self.store.addressing.locate(&index)?;
        let page = self.store.guarantee(address)?;
        page.get(slot)
            .cloned()
            .ok_or(StoreError::IndexOutOfRange { index, len })
    }

    /// Replaces element `index`, returning the old value.
    pub fn set(&mut self, index: u64, value: V) -> Result<V> {
        self.check_index(index)?;
        let len = self.store.length;
        let (address, slot) = self.store.addressing.locate(&index)?;
        let page = self.store.guarantee(address)?;
        page.replace(slot, value)
            .ok_or(StoreError::IndexOutOfRange { index, len })
    }

    /// Removes and returns the last element, or `None` if the list is empty.
    pub fn pop(&mut self) -> Result<Option<V>> {
        if self.store.length == 0 {
            return Ok(None);
        }
        let position = self.store.length - 1;
        let (address, _slot) = self.store.addressing.locate(&position)?;
        let page = self.store.guarantee(address)?;
        let value = page.pop();
        if value.is_some() {
            self.store.length -= 1;
        }
        Ok(value)
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Walks the list front to back, one page at a time.
    pub fn iter(&mut self) -> ListIter<'_, V> {
        ListIter::new(&mut self.store)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.clear()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.store.flush()
    }

    /// Writes everything out. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        self.store.close()
    }

    /// Runs `f` on the open list, then closes it, even if `f` failed.
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
    pub fn store(&self) -> &PageStore<PositionalAddressing<V>> {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        self.store.config()
    }
}

impl<V> fmt::Debug for List<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List").field("store", &self.store).finish()
    }
}

impl<V> fmt::Display for List<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cfg = self.store.config();
        write!(
            f,
            "List with values stored to {} ({} per page, {} in RAM)",
            self.store.files().base_path().display(),
            cfg.page_capacity,
            cfg.max_resident_pages
        )
    }
}
