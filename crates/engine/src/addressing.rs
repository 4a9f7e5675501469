/// Page addressing strategies.
///
/// The [`PageStore`](crate::PageStore) is generic over *how* a logical key
/// maps onto a page. A strategy answers four questions:
///
/// | Method          | Question                                               |
/// |-----------------|--------------------------------------------------------|
/// | `locate`        | which page, and which slot inside it, holds this key?  |
/// | `open_page`     | a non-resident page is needed: load it or start empty? |
/// | `addresses`     | which pages currently exist (for iteration)?           |
/// | `page_removed`  | a page was emptied and dropped: forget it              |
///
/// Two strategies exist: [`HashAddressing`] for the dictionaries and
/// [`PositionalAddressing`] for the list.
use std::collections::BTreeSet;
use std::marker::PhantomData;

use keyhash::FixedHash;
use page::{MapPage, Page, SeqPage};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::files::PageFiles;

/// Strategy mapping logical keys to page addresses.
pub trait Addressing {
    /// Logical key type accepted by [`locate`](Self::locate).
    type Key: ?Sized;
    /// Position inside the page.
    type Slot;
    /// Page kind held by the store.
    type Page: Page;

    fn locate(&self, key: &Self::Key) -> Result<(u64, Self::Slot)>;

    /// Produces page `address`, which is not resident. Known pages are loaded
    /// from disk (the file is consumed); unknown ones start empty and become
    /// known.
    fn open_page(&mut self, address: u64, files: &PageFiles) -> Result<Self::Page>;

    /// `true` if the page has data somewhere (resident or on disk).
    fn is_known(&self, address: u64) -> bool;

    /// Snapshot of all known addresses in ascending order.
    fn addresses(&self) -> Vec<u64>;

    /// Called when an empty page is evicted instead of persisted.
    fn page_removed(&mut self, address: u64);

    /// Forgets every page.
    fn reset(&mut self);
}

// -------------------- Hash-bucket addressing --------------------

/// `address = fixed_hash(key) / capacity`; the slot is the key itself, so
/// distinct keys sharing a page are told apart by ordinary equality.
///
/// Per-page lookups cost whatever the page's map costs. There is no
/// rebalancing: a skewed hash distribution can pile many keys onto a single
/// page.
#[derive(Debug)]
pub struct HashAddressing<P> {
    capacity: u64,
    known: BTreeSet<u64>,
    _page: PhantomData<fn() -> P>,
}

impl<P> HashAddressing<P> {
    /// Builds the strategy from the addresses discovered on disk.
    pub fn new(capacity: u64, known: BTreeSet<u64>) -> Self {
        Self {
            capacity,
            known,
            _page: PhantomData,
        }
    }
}

impl<P> Addressing for HashAddressing<P>
where
    P: MapPage,
    P::Key: FixedHash,
{
    type Key = P::Key;
    type Slot = ();
    type Page = P;

    fn locate(&self, key: &P::Key) -> Result<(u64, ())> {
        Ok((key.fixed_hash()? / self.capacity, ()))
    }

    fn open_page(&mut self, address: u64, files: &PageFiles) -> Result<P> {
        if self.known.contains(&address) {
            files.load_page(address)
        } else {
            self.known.insert(address);
            Ok(P::default())
        }
    }

    fn is_known(&self, address: u64) -> bool {
        self.known.contains(&address)
    }

    fn addresses(&self) -> Vec<u64> {
        self.known.iter().copied().collect()
    }

    fn page_removed(&mut self, address: u64) {
        self.known.remove(&address);
    }

    fn reset(&mut self) {
        self.known.clear();
    }
}

// -------------------- Positional addressing --------------------

/// `address = position / capacity`, `slot = position % capacity`.
///
/// Every page except the last holds exactly `capacity` elements, so the set
/// of known pages is fully determined by the list length.
#[derive(Debug)]
pub struct PositionalAddressing<V> {
    capacity: u64,
    known: BTreeSet<u64>,
    _value: PhantomData<fn() -> V>,
}

impl<V> PositionalAddressing<V> {
    /// Rebuilds the known pages of a list holding `length` elements.
    pub fn new(capacity: u64, length: u64) -> Self {
        let pages = length.div_ceil(capacity);
        Self {
            capacity,
            known: (0..pages).collect(),
            _value: PhantomData,
        }
    }
}

impl<V> Addressing for PositionalAddressing<V>
where
    V: Serialize + DeserializeOwned,
{
    type Key = u64;
    type Slot = usize;
    type Page = SeqPage<V>;

    fn locate(&self, position: &u64) -> Result<(u64, usize)> {
        Ok((
            position / self.capacity,
            (position % self.capacity) as usize,
        ))
    }

    fn open_page(&mut self, address: u64, files: &PageFiles) -> Result<SeqPage<V>> {
        if self.known.contains(&address) {
            files.load_page(address)
        } else {
            self.known.insert(address);
            Ok(SeqPage::default())
        }
    }

    fn is_known(&self, address: u64) -> bool {
        self.known.contains(&address)
    }

    fn addresses(&self) -> Vec<u64> {
        self.known.iter().copied().collect()
    }

    fn page_removed(&mut self, address: u64) {
        self.known.remove(&address);
    }

    fn reset(&mut self) {
        self.known.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn hash_address_is_hash_div_capacity() {
        let a: HashAddressing<HashMap<u64, u64>> = HashAddressing::new(10, BTreeSet::new());
        assert_eq!(a.locate(&0).unwrap().0, 0);
        assert_eq!(a.locate(&9).unwrap().0, 0);
        assert_eq!(a.locate(&10).unwrap().0, 1);
        assert_eq!(a.locate(&12345).unwrap().0, 1234);
    }

    #[test]
    fn positional_address_and_slot() {
        let a: PositionalAddressing<i64> = PositionalAddressing::new(4, 0);
        assert_eq!(a.locate(&0).unwrap(), (0, 0));
        assert_eq!(a.locate(&3).unwrap(), (0, 3));
        assert_eq!(a.locate(&4).unwrap(), (1, 0));
        assert_eq!(a.locate(&10).unwrap(), (2, 2));
    }

    #[test]
    fn positional_known_pages_follow_length() {
        let empty: PositionalAddressing<i64> = PositionalAddressing::new(4, 0);
        assert!(empty.addresses().is_empty());

        let exact: PositionalAddressing<i64> = PositionalAddressing::new(4, 8);
        assert_eq!(exact.addresses(), vec![0, 1]);

        let partial: PositionalAddressing<i64> = PositionalAddressing::new(4, 9);
        assert_eq!(partial.addresses(), vec![0, 1, 2]);
    }

    #[test]
    fn page_removed_forgets_address() {
        let mut a: HashAddressing<HashMap<u64, u64>> =
            HashAddressing::new(1, [1, 2, 3].into_iter().collect());
        a.page_removed(2);
        assert!(!a.is_known(2));
        assert_eq!(a.addresses(), vec![1, 3]);
        a.reset();
        assert!(a.addresses().is_empty());
    }
}
