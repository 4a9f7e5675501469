//! # Page - In-Memory Page Kinds
//!
//! A page is the unit of residency and persistence: the engine loads whole
//! pages from disk, mutates them in memory and writes them back whole.
//!
//! Two families exist:
//!
//! - **hash-bucket pages** ([`MapPage`]): an unordered (`HashMap`) or
//!   key-ordered (`BTreeMap`) mapping from the caller's key to its value. All
//!   keys whose fixed hash falls into the same address share one page;
//!   collisions are resolved by ordinary key equality.
//! - **positional pages** ([`SeqPage`]): a contiguous run of list elements.
//!
//! Pages carry no capacity limit of their own. The engine bounds the number
//! of *resident pages*, not the entries inside one.
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Anything the page store can hold, persist and reload.
pub trait Page: Default + Serialize + DeserializeOwned {
    /// Number of logical entries held by the page.
    fn entry_count(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }
}

/// A hash-bucket page: a mapping from key to value.
pub trait MapPage: Page {
    type Key: Clone;
    type Value: Clone;

    fn lookup(&self, key: &Self::Key) -> Option<&Self::Value>;

    fn lookup_mut(&mut self, key: &Self::Key) -> Option<&mut Self::Value>;

    /// Inserts or replaces, returning the previous value.
    fn insert(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;

    fn remove(&mut self, key: &Self::Key) -> Option<Self::Value>;

    fn contains(&self, key: &Self::Key) -> bool {
        self.lookup(key).is_some()
    }

    /// Clones every entry, in the page's natural iteration order.
    fn snapshot(&self) -> Vec<(Self::Key, Self::Value)>;
}

impl<K, V> Page for HashMap<K, V>
where
    K: Eq + Hash + Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    fn entry_count(&self) -> usize {
        self.len()
    }
}

impl<K, V> MapPage for HashMap<K, V>
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    type Key = K;
    type Value = V;

    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn lookup_mut(&mut self, key: &K) -> Option<&mut V> {
        self.get_mut(key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        HashMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        HashMap::remove(self, key)
    }

    fn snapshot(&self) -> Vec<(K, V)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<K, V> Page for BTreeMap<K, V>
where
    K: Ord + Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    fn entry_count(&self) -> usize {
        self.len()
    }
}

impl<K, V> MapPage for BTreeMap<K, V>
where
    K: Ord + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    type Key = K;
    type Value = V;

    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn lookup_mut(&mut self, key: &K) -> Option<&mut V> {
        self.get_mut(key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        BTreeMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        BTreeMap::remove(self, key)
    }

    fn snapshot(&self) -> Vec<(K, V)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// A positional page covering `[address * capacity, address * capacity + len)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "V: Serialize", deserialize = "V: DeserializeOwned"))]
pub struct SeqPage<V> {
    items: Vec<V>,
}

impl<V> Default for SeqPage<V> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<V> SeqPage<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: usize) -> Option<&V> {
        self.items.get(slot)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut V> {
        self.items.get_mut(slot)
    }

    /// Replaces the value at `slot`, returning the old one. `None` if the slot
    /// is past the end.
    pub fn replace(&mut self, slot: usize, value: V) -> Option<V> {
        self.items
            .get_mut(slot)
            .map(|cur| std::mem::replace(cur, value))
    }

    pub fn push(&mut self, value: V) {
        self.items.push(value);
    }

    pub fn pop(&mut self) -> Option<V> {
        self.items.pop()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.items.iter()
    }
}

impl<V> Page for SeqPage<V>
where
    V: Serialize + DeserializeOwned,
{
    fn entry_count(&self) -> usize {
        self.items.len()
    }
}
