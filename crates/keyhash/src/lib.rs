//! # KeyHash - Deterministic Key Hashing
//!
//! Turns any key into a stable `u64` that is identical across processes and
//! restarts. The paged dictionaries use it to pick a page address, so the same
//! key must always land on the same page file, even after the process that
//! wrote it is long gone. `std::hash` is randomly seeded and cannot be used.
//!
//! ## Rules
//!
//! Every value is classified into a [`Kind`] and hashed by exactly one rule:
//!
//! | Kind        | Rule                                                        |
//! |-------------|-------------------------------------------------------------|
//! | Integral    | the integer itself (two's complement for negatives)         |
//! | ByteLike    | SHA-256 of the raw bytes                                    |
//! | SetLike     | SHA-256 of type name + **sorted** element hashes            |
//! | MappingLike | SHA-256 of type name + **sorted** `(key, value)` hash pairs |
//! | Iterable    | SHA-256 of type name + element hashes in order              |
//! | Opaque      | SHA-256 of type name + textual representation               |
//!
//! Digests are truncated to their first eight bytes (big-endian). Sorting the
//! member hashes makes sets and mappings order-insensitive: two structurally
//! equal collections hash the same regardless of how they were built.
//!
//! ## Example
//!
//! ```rust
//! use keyhash::{frozen_hash, FixedHash, Value};
//!
//! assert_eq!(12u64.fixed_hash().unwrap(), 12);
//! let a = Value::set(vec![Value::from(1), Value::from(2)]);
//! let b = Value::set(vec![Value::from(2), Value::from(1)]);
//! assert_eq!(frozen_hash(&a), frozen_hash(&b));
//! ```
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Errors raised by the strict [`hash`] entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    /// The value is a mutable composite and has no stable identity as a key.
    #[error("unhashable type: '{kind}'")]
    Unhashable {
        /// Type name of the rejected value.
        kind: &'static str,
    },
}

/// Hashing rule selected for a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Integral,
    ByteLike,
    SetLike,
    MappingLike,
    Iterable,
    Opaque,
}

/// A dynamically typed value usable as a key or payload.
///
/// Floats are stored as their IEEE-754 bit pattern so that `Value` can be
/// `Eq` and `Hash` and live inside hash-bucket pages.
///
/// Sets and mappings are held in sorted, deduplicated form. Equality, `Hash`
/// and `Ord` therefore ignore insertion order and repeats, matching
/// [`frozen_hash`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
    Null,
    Int(i64),
    Float(u64),
    Str(String),
    Bytes(Vec<u8>),
    /// Immutable ordered sequence.
    Tuple(Vec<Value>),
    /// Mutable ordered sequence (unhashable under the strict rule).
    List(Vec<Value>),
    /// Immutable set.
    FrozenSet(BTreeSet<Value>),
    /// Mutable set (unhashable under the strict rule).
    Set(BTreeSet<Value>),
    /// Mutable mapping (unhashable under the strict rule). A repeated key
    /// keeps its last value.
    Map(BTreeMap<Value, Value>),
    /// Anything else, identified by its type name and textual form.
    Opaque { type_name: String, repr: String },
}

impl Value {
    pub fn float(f: f64) -> Self {
        Value::Float(f.to_bits())
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(items)
    }

    pub fn frozenset<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::FrozenSet(items.into_iter().collect())
    }

    pub fn set<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::Set(items.into_iter().collect())
    }

    pub fn map<I: IntoIterator<Item = (Value, Value)>>(entries: I) -> Self {
        Value::Map(entries.into_iter().collect())
    }

    /// Python-style type name; it is mixed into composite digests.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "NoneType",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::FrozenSet(_) => "frozenset",
            Value::Set(_) => "set",
            Value::Map(_) => "dict",
            Value::Opaque { type_name, .. } => type_name,
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Value::Int(_) => Kind::Integral,
            Value::Str(_) | Value::Bytes(_) => Kind::ByteLike,
            Value::FrozenSet(_) | Value::Set(_) => Kind::SetLike,
            Value::Map(_) => Kind::MappingLike,
            Value::Tuple(_) | Value::List(_) => Kind::Iterable,
            Value::Null | Value::Float(_) | Value::Opaque { .. } => Kind::Opaque,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The textual form used by the opaque rule.
    fn repr(&self) -> String {
        match self {
            Value::Opaque { repr, .. } => repr.clone(),
            other => other.to_string(),
        }
    }
}

fn write_seq<'a, I>(f: &mut fmt::Formatter<'_>, open: &str, items: I, close: &str) -> fmt::Result
where
    I: IntoIterator<Item = &'a Value>,
{
    f.write_str(open)?;
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str(close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("None"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(bits) => write!(f, "{:?}", f64::from_bits(*bits)),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "b{:?}", String::from_utf8_lossy(b)),
            Value::Tuple(items) => write_seq(f, "(", items, ")"),
            Value::List(items) => write_seq(f, "[", items, "]"),
            Value::FrozenSet(items) => write_seq(f, "frozenset({", items, "})"),
            Value::Set(items) => write_seq(f, "{", items, "}"),
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Opaque { repr, .. } => f.write_str(repr),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Int(i64::from(b))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

// -------------------- Digest helpers --------------------

fn truncate(digest: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(buf)
}

/// ByteLike rule.
#[must_use]
pub fn digest_bytes(bytes: &[u8]) -> u64 {
    truncate(&Sha256::digest(bytes))
}

/// Iterable / SetLike / MappingLike rule over already-hashed members.
pub fn digest_parts<I>(type_name: &str, parts: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    let mut hasher = Sha256::new();
    hasher.update(type_name.as_bytes());
    hasher.update([0u8]);
    for part in parts {
        hasher.update(part.to_be_bytes());
    }
    truncate(&hasher.finalize())
}

/// Opaque rule.
#[must_use]
pub fn digest_repr(type_name: &str, repr: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(type_name.as_bytes());
    hasher.update([0u8]);
    hasher.update(repr.as_bytes());
    truncate(&hasher.finalize())
}

fn digest_set<I>(type_name: &str, members: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    let mut hashes: Vec<u64> = members.into_iter().collect();
    hashes.sort_unstable();
    digest_parts(type_name, hashes)
}

fn digest_mapping<I>(type_name: &str, pairs: I) -> u64
where
    I: IntoIterator<Item = (u64, u64)>,
{
    let mut pairs: Vec<(u64, u64)> = pairs.into_iter().collect();
    pairs.sort_unstable();
    digest_parts(type_name, pairs.into_iter().flat_map(|(k, v)| [k, v]))
}

// -------------------- Entry points --------------------

/// Hashes any value, including mutable composites. Never fails.
#[must_use]
pub fn frozen_hash(value: &Value) -> u64 {
    match (value.kind(), value) {
        (Kind::Integral, Value::Int(i)) => *i as u64,
        (Kind::ByteLike, Value::Str(s)) => digest_bytes(s.as_bytes()),
        (Kind::ByteLike, Value::Bytes(b)) => digest_bytes(b),
        (Kind::SetLike, Value::FrozenSet(items) | Value::Set(items)) => {
            digest_set(value.type_name(), items.iter().map(frozen_hash))
        }
        (Kind::MappingLike, Value::Map(entries)) => digest_mapping(
            value.type_name(),
            entries.iter().map(|(k, v)| (frozen_hash(k), frozen_hash(v))),
        ),
        (Kind::Iterable, Value::Tuple(items) | Value::List(items)) => {
            digest_parts(value.type_name(), items.iter().map(frozen_hash))
        }
        _ => digest_repr(value.type_name(), &value.repr()),
    }
}

/// Hashes a value that is allowed to act as a key.
///
/// Mutable composites (`List`, `Set`, `Map`) are rejected with
/// [`HashError::Unhashable`]; everything else hashes exactly like
/// [`frozen_hash`].
pub fn hash(value: &Value) -> Result<u64, HashError> {
    match value {
        Value::List(_) => Err(HashError::Unhashable { kind: "list" }),
        Value::Set(_) => Err(HashError::Unhashable { kind: "set" }),
        Value::Map(_) => Err(HashError::Unhashable { kind: "dict" }),
        other => Ok(frozen_hash(other)),
    }
}

/// Types that map to a stable, process-independent `u64`.
///
/// Implementations must agree with [`frozen_hash`] on the equivalent
/// [`Value`]: `7i32`, `7u64` and `Value::Int(7)` all hash to `7`, and a
/// `Vec` hashes like a `Value::Tuple` of the same elements.
pub trait FixedHash {
    fn fixed_hash(&self) -> Result<u64, HashError>;
}

macro_rules! integral_fixed_hash {
    ($($t:ty),*) => {
        $(
            impl FixedHash for $t {
                fn fixed_hash(&self) -> Result<u64, HashError> {
                    Ok(*self as u64)
                }
            }
        )*
    };
}

integral_fixed_hash!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl FixedHash for bool {
    fn fixed_hash(&self) -> Result<u64, HashError> {
        Ok(u64::from(*self))
    }
}

impl FixedHash for f64 {
    fn fixed_hash(&self) -> Result<u64, HashError> {
        Ok(digest_repr("float", &format!("{:?}", self)))
    }
}

impl FixedHash for str {
    fn fixed_hash(&self) -> Result<u64, HashError> {
        Ok(digest_bytes(self.as_bytes()))
    }
}

impl FixedHash for String {
    fn fixed_hash(&self) -> Result<u64, HashError> {
        self.as_str().fixed_hash()
    }
}

impl FixedHash for char {
    fn fixed_hash(&self) -> Result<u64, HashError> {
        let mut buf = [0u8; 4];
        Ok(digest_bytes(self.encode_utf8(&mut buf).as_bytes()))
    }
}

impl FixedHash for Value {
    fn fixed_hash(&self) -> Result<u64, HashError> {
        hash(self)
    }
}

impl<T: FixedHash + ?Sized> FixedHash for &T {
    fn fixed_hash(&self) -> Result<u64, HashError> {
        (**self).fixed_hash()
    }
}

impl<T: FixedHash + ?Sized> FixedHash for Box<T> {
    fn fixed_hash(&self) -> Result<u64, HashError> {
        (**self).fixed_hash()
    }
}

impl<T: FixedHash> FixedHash for [T] {
    fn fixed_hash(&self) -> Result<u64, HashError> {
        let parts = self
            .iter()
            .map(FixedHash::fixed_hash)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(digest_parts("tuple", parts))
    }
}

impl<T: FixedHash> FixedHash for Vec<T> {
    fn fixed_hash(&self) -> Result<u64, HashError> {
        self.as_slice().fixed_hash()
    }
}

impl<T: FixedHash> FixedHash for Option<T> {
    fn fixed_hash(&self) -> Result<u64, HashError> {
        match self {
            Some(v) => v.fixed_hash(),
            None => Ok(digest_repr("NoneType", "None")),
        }
    }
}

macro_rules! tuple_fixed_hash {
    ($($name:ident)+) => {
        impl<$($name: FixedHash),+> FixedHash for ($($name,)+) {
            #[allow(non_snake_case)]
            fn fixed_hash(&self) -> Result<u64, HashError> {
                let ($($name,)+) = self;
                Ok(digest_parts("tuple", [$($name.fixed_hash()?),+]))
            }
        }
    };
}

tuple_fixed_hash!(A);
tuple_fixed_hash!(A B);
tuple_fixed_hash!(A B C);
tuple_fixed_hash!(A B C D);

impl<T: FixedHash> FixedHash for BTreeSet<T> {
    fn fixed_hash(&self) -> Result<u64, HashError> {
        let parts = self
            .iter()
            .map(FixedHash::fixed_hash)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(digest_set("frozenset", parts))
    }
}

impl<T: FixedHash, S> FixedHash for HashSet<T, S> {
    fn fixed_hash(&self) -> Result<u64, HashError> {
        let parts = self
            .iter()
            .map(FixedHash::fixed_hash)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(digest_set("frozenset", parts))
    }
}

impl<K: FixedHash, V: FixedHash> FixedHash for BTreeMap<K, V> {
    fn fixed_hash(&self) -> Result<u64, HashError> {
        let pairs = self
            .iter()
            .map(|(k, v)| Ok((k.fixed_hash()?, v.fixed_hash()?)))
            .collect::<Result<Vec<_>, HashError>>()?;
        Ok(digest_mapping("dict", pairs))
    }
}

impl<K: FixedHash, V: FixedHash, S> FixedHash for HashMap<K, V, S> {
    fn fixed_hash(&self) -> Result<u64, HashError> {
        let pairs = self
            .iter()
            .map(|(k, v)| Ok((k.fixed_hash()?, v.fixed_hash()?)))
            .collect::<Result<Vec<_>, HashError>>()?;
        Ok(digest_mapping("dict", pairs))
    }
}

#[cfg(test)]
mod tests;
