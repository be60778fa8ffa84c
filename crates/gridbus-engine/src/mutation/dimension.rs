//! Size, auto-size flag and computed auto size of columns and rows.
//!
//! Each mutation is instantiated once per axis. Forward handlers hold the
//! grid write lock for their whole walk, so readers never observe a
//! partially applied range. Inverse factories only read.

use gridbus_common::{IndexRange, IndexedValue, validate_ranges, walk_ranges};
use serde::{Deserialize, Serialize};

use super::{
    SET_COL_AUTO_WIDTH_FLAG, SET_COL_COMPUTED_AUTO_WIDTH, SET_COL_WIDTH, SET_ROW_AUTO_HEIGHT_FLAG,
    SET_ROW_COMPUTED_AUTO_HEIGHT, SET_ROW_HEIGHT,
};
use crate::command::{CommandBus, CommandHandler, InverseFactory};
use crate::error::BusError;
use crate::grid::{Axis, SharedGrid};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDimensionSizeParams {
    pub unit_id: String,
    pub sub_unit_id: String,
    pub ranges: Vec<IndexRange>,
    /// Indices missing from a per-index value get the sub-unit default.
    pub size: IndexedValue<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDimensionAutoFlagParams {
    pub unit_id: String,
    pub sub_unit_id: String,
    pub ranges: Vec<IndexRange>,
    /// Set-or-clear: a lookup miss clears the flag.
    pub flag: IndexedValue<Option<bool>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComputedAutoSize {
    pub index: u32,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetComputedAutoSizeParams {
    pub unit_id: String,
    pub sub_unit_id: String,
    pub entries: Vec<ComputedAutoSize>,
}

fn missing_target(_id: &str, _unit_id: &str, _sub_unit_id: &str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(
        mutation = _id,
        unit_id = _unit_id,
        sub_unit_id = _sub_unit_id,
        "target sub-unit not found"
    );
}

pub struct SetDimensionSizeMutation {
    id: &'static str,
    axis: Axis,
    grid: SharedGrid,
}

impl SetDimensionSizeMutation {
    pub fn columns(grid: SharedGrid) -> Self {
        Self {
            id: SET_COL_WIDTH,
            axis: Axis::Column,
            grid,
        }
    }

    pub fn rows(grid: SharedGrid) -> Self {
        Self {
            id: SET_ROW_HEIGHT,
            axis: Axis::Row,
            grid,
        }
    }
}

impl CommandHandler for SetDimensionSizeMutation {
    type Params = SetDimensionSizeParams;

    fn id(&self) -> &str {
        self.id
    }

    fn handle(&self, _: &CommandBus, params: &Self::Params) -> Result<bool, BusError> {
        validate_ranges(&params.ranges)?;
        let mut store = self.grid.write();
        let Ok(sub_unit) = store.resolve_mut(&params.unit_id, &params.sub_unit_id) else {
            missing_target(self.id, &params.unit_id, &params.sub_unit_id);
            return Ok(false);
        };
        let dim = sub_unit.dimension_mut(self.axis);
        let default = dim.default_size();
        for index in walk_ranges(&params.ranges) {
            dim.get_or_create(index).size = params.size.resolve(index, default);
        }
        store.bump_revision();
        Ok(true)
    }
}

impl InverseFactory for SetDimensionSizeMutation {
    fn state_revision(&self) -> u64 {
        self.grid.read().revision()
    }

    /// Always fully expanded: a scalar forward edit over columns of
    /// differing widths is not its own inverse.
    fn capture_inverse(&self, params: &Self::Params) -> Result<Option<Self::Params>, BusError> {
        validate_ranges(&params.ranges)?;
        let store = self.grid.read();
        let Ok(sub_unit) = store.resolve(&params.unit_id, &params.sub_unit_id) else {
            return Ok(None);
        };
        let dim = sub_unit.dimension(self.axis);
        Ok(Some(SetDimensionSizeParams {
            size: walk_ranges(&params.ranges)
                .map(|index| (index, dim.size_at(index)))
                .collect(),
            ..params.clone()
        }))
    }
}

pub struct SetDimensionAutoFlagMutation {
    id: &'static str,
    axis: Axis,
    grid: SharedGrid,
}

impl SetDimensionAutoFlagMutation {
    pub fn columns(grid: SharedGrid) -> Self {
        Self {
            id: SET_COL_AUTO_WIDTH_FLAG,
            axis: Axis::Column,
            grid,
        }
    }

    pub fn rows(grid: SharedGrid) -> Self {
        Self {
            id: SET_ROW_AUTO_HEIGHT_FLAG,
            axis: Axis::Row,
            grid,
        }
    }
}

impl CommandHandler for SetDimensionAutoFlagMutation {
    type Params = SetDimensionAutoFlagParams;

    fn id(&self) -> &str {
        self.id
    }

    fn handle(&self, _: &CommandBus, params: &Self::Params) -> Result<bool, BusError> {
        validate_ranges(&params.ranges)?;
        let mut store = self.grid.write();
        let Ok(sub_unit) = store.resolve_mut(&params.unit_id, &params.sub_unit_id) else {
            missing_target(self.id, &params.unit_id, &params.sub_unit_id);
            return Ok(false);
        };
        let dim = sub_unit.dimension_mut(self.axis);
        for index in walk_ranges(&params.ranges) {
            dim.get_or_create(index).is_auto = params.flag.resolve(index, None);
        }
        store.bump_revision();
        Ok(true)
    }
}

impl InverseFactory for SetDimensionAutoFlagMutation {
    fn state_revision(&self) -> u64 {
        self.grid.read().revision()
    }

    /// Unset flags are recorded as explicit `None` entries so replaying the
    /// inverse clears them again.
    fn capture_inverse(&self, params: &Self::Params) -> Result<Option<Self::Params>, BusError> {
        validate_ranges(&params.ranges)?;
        let store = self.grid.read();
        let Ok(sub_unit) = store.resolve(&params.unit_id, &params.sub_unit_id) else {
            return Ok(None);
        };
        let dim = sub_unit.dimension(self.axis);
        Ok(Some(SetDimensionAutoFlagParams {
            flag: walk_ranges(&params.ranges)
                .map(|index| (index, dim.is_auto_at(index)))
                .collect(),
            ..params.clone()
        }))
    }
}

pub struct SetComputedAutoSizeMutation {
    id: &'static str,
    axis: Axis,
    grid: SharedGrid,
}

impl SetComputedAutoSizeMutation {
    pub fn columns(grid: SharedGrid) -> Self {
        Self {
            id: SET_COL_COMPUTED_AUTO_WIDTH,
            axis: Axis::Column,
            grid,
        }
    }

    pub fn rows(grid: SharedGrid) -> Self {
        Self {
            id: SET_ROW_COMPUTED_AUTO_HEIGHT,
            axis: Axis::Row,
            grid,
        }
    }
}

impl CommandHandler for SetComputedAutoSizeMutation {
    type Params = SetComputedAutoSizeParams;

    fn id(&self) -> &str {
        self.id
    }

    fn handle(&self, _: &CommandBus, params: &Self::Params) -> Result<bool, BusError> {
        let mut store = self.grid.write();
        let Ok(sub_unit) = store.resolve_mut(&params.unit_id, &params.sub_unit_id) else {
            missing_target(self.id, &params.unit_id, &params.sub_unit_id);
            return Ok(false);
        };
        let dim = sub_unit.dimension_mut(self.axis);
        for entry in &params.entries {
            dim.get_or_create(entry.index).computed_auto = entry.value;
        }
        store.bump_revision();
        Ok(true)
    }
}

impl InverseFactory for SetComputedAutoSizeMutation {
    fn state_revision(&self) -> u64 {
        self.grid.read().revision()
    }

    fn capture_inverse(&self, params: &Self::Params) -> Result<Option<Self::Params>, BusError> {
        let store = self.grid.read();
        let Ok(sub_unit) = store.resolve(&params.unit_id, &params.sub_unit_id) else {
            return Ok(None);
        };
        let dim = sub_unit.dimension(self.axis);
        Ok(Some(SetComputedAutoSizeParams {
            entries: params
                .entries
                .iter()
                .map(|entry| ComputedAutoSize {
                    index: entry.index,
                    value: dim.computed_auto_at(entry.index),
                })
                .collect(),
            ..params.clone()
        }))
    }
}
