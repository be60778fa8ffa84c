use std::sync::Arc;

use gridbus_common::GridError;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::dimension::{Axis, DimensionManager};

/// Grid state shared between the session and the mutation handlers.
pub type SharedGrid = Arc<RwLock<GridStore>>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubUnitConfig {
    pub default_column_width: f64,
    pub default_row_height: f64,
}

impl Default for SubUnitConfig {
    fn default() -> Self {
        Self {
            default_column_width: 88.0,
            default_row_height: 24.0,
        }
    }
}

/// Row and column attributes of one sub-unit (sheet).
#[derive(Debug, Clone, PartialEq)]
pub struct SubUnitGrid {
    columns: DimensionManager,
    rows: DimensionManager,
}

impl SubUnitGrid {
    pub fn new(config: SubUnitConfig) -> Self {
        Self {
            columns: DimensionManager::new(config.default_column_width),
            rows: DimensionManager::new(config.default_row_height),
        }
    }

    pub fn dimension(&self, axis: Axis) -> &DimensionManager {
        match axis {
            Axis::Column => &self.columns,
            Axis::Row => &self.rows,
        }
    }

    pub(crate) fn dimension_mut(&mut self, axis: Axis) -> &mut DimensionManager {
        match axis {
            Axis::Column => &mut self.columns,
            Axis::Row => &mut self.rows,
        }
    }

    pub fn columns(&self) -> &DimensionManager {
        &self.columns
    }

    pub fn rows(&self) -> &DimensionManager {
        &self.rows
    }
}

/// All grid state of a document session, keyed by `(unit_id, sub_unit_id)`.
///
/// Writes go through the mutation handlers registered on the command bus.
/// Every successful write advances [`revision`](GridStore::revision), which
/// the undo path uses to check that an inverse was read from the state the
/// forward mutation was applied to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridStore {
    units: FxHashMap<String, FxHashMap<String, SubUnitGrid>>,
    revision: u64,
}

impl GridStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedGrid {
        Arc::new(RwLock::new(self))
    }

    /// Create a sub-unit (and its unit if needed). Returns false if it
    /// already existed; the existing sub-unit is left untouched.
    pub fn add_sub_unit(&mut self, unit_id: &str, sub_unit_id: &str, config: SubUnitConfig) -> bool {
        let unit = self.units.entry(unit_id.to_string()).or_default();
        if unit.contains_key(sub_unit_id) {
            return false;
        }
        unit.insert(sub_unit_id.to_string(), SubUnitGrid::new(config));
        true
    }

    /// Drop a sub-unit and every attribute it owns.
    pub fn remove_sub_unit(&mut self, unit_id: &str, sub_unit_id: &str) -> Result<(), GridError> {
        self.units
            .get_mut(unit_id)
            .and_then(|unit| unit.remove(sub_unit_id))
            .map(|_| ())
            .ok_or_else(|| GridError::target_not_found(unit_id, sub_unit_id))
    }

    pub fn remove_unit(&mut self, unit_id: &str) -> bool {
        self.units.remove(unit_id).is_some()
    }

    pub fn has_sub_unit(&self, unit_id: &str, sub_unit_id: &str) -> bool {
        self.resolve(unit_id, sub_unit_id).is_ok()
    }

    pub fn resolve(&self, unit_id: &str, sub_unit_id: &str) -> Result<&SubUnitGrid, GridError> {
        self.units
            .get(unit_id)
            .and_then(|unit| unit.get(sub_unit_id))
            .ok_or_else(|| GridError::target_not_found(unit_id, sub_unit_id))
    }

    pub(crate) fn resolve_mut(
        &mut self,
        unit_id: &str,
        sub_unit_id: &str,
    ) -> Result<&mut SubUnitGrid, GridError> {
        self.units
            .get_mut(unit_id)
            .and_then(|unit| unit.get_mut(sub_unit_id))
            .ok_or_else(|| GridError::target_not_found(unit_id, sub_unit_id))
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn bump_revision(&mut self) {
        self.revision = self.revision.saturating_add(1);
    }
}
