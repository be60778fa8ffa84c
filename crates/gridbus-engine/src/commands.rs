//! Composite column commands built from the grid mutations.
//!
//! Each command runs as one undo step: the bus groups the mutations it
//! executes and rolls them back if the command fails part-way.

use gridbus_common::{IndexRange, IndexedValue, validate_ranges, walk_ranges};
use serde::{Deserialize, Serialize};

use crate::command::{CommandBus, CommandHandler, CommandType, ExecutionOptions};
use crate::error::BusError;
use crate::grid::{Axis, SharedGrid};
use crate::mutation::{
    SET_COL_AUTO_WIDTH_FLAG, SET_COL_WIDTH, SetDimensionAutoFlagParams, SetDimensionSizeParams,
};

pub const SET_COL_WIDTH_COMMAND: &str = "grid.command.set-col-width";
pub const DELTA_COL_WIDTH_COMMAND: &str = "grid.command.delta-col-width";
pub const SET_COL_AUTO_WIDTH_COMMAND: &str = "grid.command.set-col-auto-width";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetColWidthCommandParams {
    pub unit_id: String,
    pub sub_unit_id: String,
    pub ranges: Vec<IndexRange>,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaColWidthCommandParams {
    pub unit_id: String,
    pub sub_unit_id: String,
    pub ranges: Vec<IndexRange>,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetColAutoWidthCommandParams {
    pub unit_id: String,
    pub sub_unit_id: String,
    pub ranges: Vec<IndexRange>,
}

/// Manual width disables auto width on the same columns.
fn apply_manual_widths(
    bus: &CommandBus,
    unit_id: &str,
    sub_unit_id: &str,
    ranges: &[IndexRange],
    size: IndexedValue<f64>,
) -> Result<bool, BusError> {
    let width = SetDimensionSizeParams {
        unit_id: unit_id.to_string(),
        sub_unit_id: sub_unit_id.to_string(),
        ranges: ranges.to_vec(),
        size,
    };
    if !bus.execute(SET_COL_WIDTH, &width, ExecutionOptions::default())? {
        return Ok(false);
    }
    let flag = SetDimensionAutoFlagParams {
        unit_id: unit_id.to_string(),
        sub_unit_id: sub_unit_id.to_string(),
        ranges: ranges.to_vec(),
        flag: IndexedValue::scalar(Some(false)),
    };
    bus.execute(SET_COL_AUTO_WIDTH_FLAG, &flag, ExecutionOptions::default())
}

pub struct SetColWidthCommand;

impl CommandHandler for SetColWidthCommand {
    type Params = SetColWidthCommandParams;

    fn id(&self) -> &str {
        SET_COL_WIDTH_COMMAND
    }

    fn command_type(&self) -> CommandType {
        CommandType::Command
    }

    fn handle(&self, bus: &CommandBus, params: &Self::Params) -> Result<bool, BusError> {
        validate_ranges(&params.ranges)?;
        if !params.width.is_finite() || params.width < 0.0 {
            return Ok(false);
        }
        apply_manual_widths(
            bus,
            &params.unit_id,
            &params.sub_unit_id,
            &params.ranges,
            IndexedValue::scalar(params.width),
        )
    }
}

/// Grow or shrink every column in range by the same amount. Widths never go
/// below zero.
pub struct DeltaColWidthCommand {
    grid: SharedGrid,
}

impl DeltaColWidthCommand {
    pub fn new(grid: SharedGrid) -> Self {
        Self { grid }
    }
}

impl CommandHandler for DeltaColWidthCommand {
    type Params = DeltaColWidthCommandParams;

    fn id(&self) -> &str {
        DELTA_COL_WIDTH_COMMAND
    }

    fn command_type(&self) -> CommandType {
        CommandType::Command
    }

    fn handle(&self, bus: &CommandBus, params: &Self::Params) -> Result<bool, BusError> {
        validate_ranges(&params.ranges)?;
        let widths: IndexedValue<f64> = {
            let store = self.grid.read();
            let Ok(sub_unit) = store.resolve(&params.unit_id, &params.sub_unit_id) else {
                return Ok(false);
            };
            let cols = sub_unit.dimension(Axis::Column);
            walk_ranges(&params.ranges)
                .map(|index| (index, (cols.size_at(index) + params.delta).max(0.0)))
                .collect()
        };
        apply_manual_widths(
            bus,
            &params.unit_id,
            &params.sub_unit_id,
            &params.ranges,
            widths,
        )
    }
}

/// Turn auto width on and size each column to its computed auto width.
/// Columns without a computed width keep their current width.
pub struct SetColAutoWidthCommand {
    grid: SharedGrid,
}

impl SetColAutoWidthCommand {
    pub fn new(grid: SharedGrid) -> Self {
        Self { grid }
    }
}

impl CommandHandler for SetColAutoWidthCommand {
    type Params = SetColAutoWidthCommandParams;

    fn id(&self) -> &str {
        SET_COL_AUTO_WIDTH_COMMAND
    }

    fn command_type(&self) -> CommandType {
        CommandType::Command
    }

    fn handle(&self, bus: &CommandBus, params: &Self::Params) -> Result<bool, BusError> {
        validate_ranges(&params.ranges)?;
        let widths: IndexedValue<f64> = {
            let store = self.grid.read();
            let Ok(sub_unit) = store.resolve(&params.unit_id, &params.sub_unit_id) else {
                return Ok(false);
            };
            let cols = sub_unit.dimension(Axis::Column);
            walk_ranges(&params.ranges)
                .map(|index| {
                    let width = cols.computed_auto_at(index).unwrap_or(cols.size_at(index));
                    (index, width)
                })
                .collect()
        };

        let flag = SetDimensionAutoFlagParams {
            unit_id: params.unit_id.clone(),
            sub_unit_id: params.sub_unit_id.clone(),
            ranges: params.ranges.clone(),
            flag: IndexedValue::scalar(Some(true)),
        };
        if !bus.execute(SET_COL_AUTO_WIDTH_FLAG, &flag, ExecutionOptions::default())? {
            return Ok(false);
        }
        let width = SetDimensionSizeParams {
            unit_id: params.unit_id.clone(),
            sub_unit_id: params.sub_unit_id.clone(),
            ranges: params.ranges.clone(),
            size: widths,
        };
        bus.execute(SET_COL_WIDTH, &width, ExecutionOptions::default())
    }
}

pub fn register_grid_commands(bus: &CommandBus, grid: &SharedGrid) -> Result<(), BusError> {
    bus.register(SetColWidthCommand)?;
    bus.register(DeltaColWidthCommand::new(grid.clone()))?;
    bus.register(SetColAutoWidthCommand::new(grid.clone()))?;
    Ok(())
}
