//! One value for a whole range, or one value per index.
//!
//! Mutation payloads that vary "by column" or "by row" use [`IndexedValue`]
//! so that forward handlers and inverse factories share a single walk:
//! every lookup goes through [`IndexedValue::resolve`] regardless of which
//! shape the caller picked.
//!
//! Wire shape (serde, untagged): a scalar is the bare value, a per-index
//! value is an object keyed by the decimal index.

use std::collections::BTreeMap;

use crate::range::{IndexRange, walk_ranges};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Clone, Debug, PartialEq)]
pub enum IndexedValue<T> {
    /// Constant over every index in scope.
    Scalar(T),
    /// Defined only at the present indices.
    Indexed(BTreeMap<u32, T>),
}

impl<T> IndexedValue<T> {
    pub fn scalar(value: T) -> Self {
        Self::Scalar(value)
    }

    pub fn indexed() -> Self {
        Self::Indexed(BTreeMap::new())
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// Value defined at `index`, if any. A scalar is defined everywhere.
    pub fn get(&self, index: u32) -> Option<&T> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Indexed(map) => map.get(&index),
        }
    }

    /// Define `index`.
    ///
    /// A scalar has no finite list of indices to carry over, so setting an
    /// index on a scalar replaces it with a map holding only that entry.
    pub fn set(&mut self, index: u32, value: T) {
        match self {
            Self::Indexed(map) => {
                map.insert(index, value);
            }
            Self::Scalar(_) => {
                let mut map = BTreeMap::new();
                map.insert(index, value);
                *self = Self::Indexed(map);
            }
        }
    }

    /// Number of explicit entries; `None` for a scalar.
    pub fn explicit_len(&self) -> Option<usize> {
        match self {
            Self::Scalar(_) => None,
            Self::Indexed(map) => Some(map.len()),
        }
    }
}

impl<T: Clone> IndexedValue<T> {
    /// Value at `index`, falling back to `default` on a miss.
    pub fn resolve(&self, index: u32, default: T) -> T {
        self.get(index).cloned().unwrap_or(default)
    }

    /// Fully expanded per-index form over `ranges`.
    pub fn expand(&self, ranges: &[IndexRange], default: T) -> BTreeMap<u32, T> {
        walk_ranges(ranges)
            .map(|index| (index, self.resolve(index, default.clone())))
            .collect()
    }
}

impl<T: Default> Default for IndexedValue<T> {
    fn default() -> Self {
        Self::Scalar(T::default())
    }
}

impl<T> From<BTreeMap<u32, T>> for IndexedValue<T> {
    fn from(map: BTreeMap<u32, T>) -> Self {
        Self::Indexed(map)
    }
}

impl<T> FromIterator<(u32, T)> for IndexedValue<T> {
    fn from_iter<I: IntoIterator<Item = (u32, T)>>(iter: I) -> Self {
        Self::Indexed(iter.into_iter().collect())
    }
}

// Untagged enums buffer their input, which turns JSON object keys into
// strings before `u32` ever sees them. Keys are parsed explicitly here.
// A `null` entry reads as a lookup miss.
#[cfg(feature = "serde")]
mod wire {
    use std::collections::BTreeMap;
    use std::fmt;

    use serde::Deserialize;
    use serde::de::{self, Deserializer, Visitor};

    #[derive(Deserialize)]
    #[serde(untagged)]
    pub(super) enum Repr<T> {
        Scalar(T),
        Indexed(BTreeMap<IndexKey, Option<T>>),
    }

    #[derive(PartialEq, Eq, PartialOrd, Ord)]
    pub(super) struct IndexKey(pub(super) u32);

    impl<'de> Deserialize<'de> for IndexKey {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            struct KeyVisitor;

            impl Visitor<'_> for KeyVisitor {
                type Value = IndexKey;

                fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    f.write_str("a non-negative index")
                }

                fn visit_u64<E: de::Error>(self, v: u64) -> Result<IndexKey, E> {
                    u32::try_from(v)
                        .map(IndexKey)
                        .map_err(|_| E::custom(format!("index {v} out of range")))
                }

                fn visit_str<E: de::Error>(self, v: &str) -> Result<IndexKey, E> {
                    v.parse()
                        .map(IndexKey)
                        .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }

            deserializer.deserialize_any(KeyVisitor)
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, T: Deserialize<'de>> Deserialize<'de> for IndexedValue<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match wire::Repr::<T>::deserialize(deserializer)? {
            wire::Repr::Scalar(value) => Self::Scalar(value),
            wire::Repr::Indexed(map) => Self::Indexed(
                map.into_iter()
                    .filter_map(|(k, v)| v.map(|v| (k.0, v)))
                    .collect(),
            ),
        })
    }
}
