/// Page-walking iterators.
///
/// Both iterators take a snapshot of the known page addresses up front and
/// then bring one page in at a time, copying its entries out before moving
/// on. Guaranteeing a page may evict others; an evicted *empty* page is
/// forgotten by the addressing strategy. Such an address is skipped when the
/// walk reaches it instead of being recreated as a fresh empty page.
///
/// An I/O error ends the walk after being yielded once.
use std::vec;

use keyhash::FixedHash;
use page::MapPage;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::addressing::{Addressing, HashAddressing, PositionalAddressing};
use crate::error::Result;
use crate::PageStore;

/// Shared walk over a snapshot of addresses.
struct Walk {
    addresses: vec::IntoIter<u64>,
    failed: bool,
}

impl Walk {
    fn new<A: Addressing>(store: &PageStore<A>) -> Self {
        Self {
            addresses: store.addressing.addresses().into_iter(),
            failed: false,
        }
    }

    /// Next address still worth visiting.
    fn next_address<A: Addressing>(&mut self, store: &PageStore<A>) -> Option<u64> {
        if self.failed {
            return None;
        }
        self.addresses
            .by_ref()
            .find(|a| store.pages.contains_key(a) || store.addressing.is_known(*a))
    }
}

/// Iterator over `(key, value)` pairs of a [`PagedMap`](crate::PagedMap).
pub struct MapIter<'a, P>
where
    P: MapPage,
    P::Key: FixedHash,
{
    store: &'a mut PageStore<HashAddressing<P>>,
    walk: Walk,
    buffer: vec::IntoIter<(P::Key, P::Value)>,
}

impl<'a, P> MapIter<'a, P>
where
    P: MapPage,
    P::Key: FixedHash,
{
    pub(crate) fn new(store: &'a mut PageStore<HashAddressing<P>>) -> Self {
        let walk = Walk::new(store);
        Self {
            store,
            walk,
            buffer: Vec::new().into_iter(),
        }
    }
}

impl<P> Iterator for MapIter<'_, P>
where
    P: MapPage,
    P::Key: FixedHash,
{
    type Item = Result<(P::Key, P::Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.buffer.next() {
                return Some(Ok(entry));
            }
            let address = self.walk.next_address(self.store)?;
            match self.store.guarantee(address) {
                Ok(page) => self.buffer = page.snapshot().into_iter(),
                Err(e) => {
                    self.walk.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Iterator over the elements of a [`List`](crate::List), in order.
pub struct ListIter<'a, V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    store: &'a mut PageStore<PositionalAddressing<V>>,
    walk: Walk,
    buffer: vec::IntoIter<V>,
}

impl<'a, V> ListIter<'a, V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    pub(crate) fn new(store: &'a mut PageStore<PositionalAddressing<V>>) -> Self {
        let walk = Walk::new(store);
        Self {
            store,
            walk,
            buffer: Vec::new().into_iter(),
        }
    }
}

impl<V> Iterator for ListIter<'_, V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    type Item = Result<V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(v) = self.buffer.next() {
                return Some(Ok(v));
            }
            let address = self.walk.next_address(self.store)?;
            match self.store.guarantee(address) {
                Ok(page) => {
                    self.buffer = page.iter().cloned().collect::<Vec<_>>().into_iter()
                }
                Err(e) => {
                    self.walk.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
