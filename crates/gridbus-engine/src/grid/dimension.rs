use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Column,
    Row,
}

impl Axis {
    pub fn label(self) -> &'static str {
        match self {
            Axis::Column => "column",
            Axis::Row => "row",
        }
    }
}

/// Attributes of one column (or row).
///
/// `size` is the width of a column or the height of a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionAttributes {
    pub size: f64,
    pub is_auto: Option<bool>,
    pub computed_auto: Option<f64>,
}

impl DimensionAttributes {
    fn with_size(size: f64) -> Self {
        Self {
            size,
            is_auto: None,
            computed_auto: None,
        }
    }
}

/// Sparse per-index attribute table for one axis of a sub-unit.
///
/// Entries are allocated on first write through [`get_or_create`] and live
/// as long as the manager; reads of unallocated indices report the default
/// without allocating.
///
/// [`get_or_create`]: DimensionManager::get_or_create
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionManager {
    default_size: f64,
    entries: FxHashMap<u32, DimensionAttributes>,
}

impl DimensionManager {
    pub fn new(default_size: f64) -> Self {
        Self {
            default_size,
            entries: FxHashMap::default(),
        }
    }

    pub fn default_size(&self) -> f64 {
        self.default_size
    }

    pub fn get(&self, index: u32) -> Option<&DimensionAttributes> {
        self.entries.get(&index)
    }

    pub fn get_or_create(&mut self, index: u32) -> &mut DimensionAttributes {
        let default_size = self.default_size;
        self.entries
            .entry(index)
            .or_insert_with(|| DimensionAttributes::with_size(default_size))
    }

    pub fn size_at(&self, index: u32) -> f64 {
        self.get(index).map_or(self.default_size, |a| a.size)
    }

    pub fn is_auto_at(&self, index: u32) -> Option<bool> {
        self.get(index).and_then(|a| a.is_auto)
    }

    pub fn computed_auto_at(&self, index: u32) -> Option<f64> {
        self.get(index).and_then(|a| a.computed_auto)
    }

    /// Number of allocated entries.
    pub fn allocated(&self) -> usize {
        self.entries.len()
    }

    /// Allocated entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &DimensionAttributes)> {
        let mut indices: Vec<u32> = self.entries.keys().copied().collect();
        indices.sort_unstable();
        indices.into_iter().map(move |i| (i, &self.entries[&i]))
    }
}
