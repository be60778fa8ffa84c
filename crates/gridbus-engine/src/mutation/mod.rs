//! Structural grid mutations and their inverse factories.

mod dimension;

pub use dimension::{
    ComputedAutoSize, SetComputedAutoSizeMutation, SetComputedAutoSizeParams,
    SetDimensionAutoFlagMutation, SetDimensionAutoFlagParams, SetDimensionSizeMutation,
    SetDimensionSizeParams,
};

use crate::command::CommandBus;
use crate::error::BusError;
use crate::grid::SharedGrid;

pub const SET_COL_WIDTH: &str = "grid.mutation.set-col-width";
pub const SET_COL_AUTO_WIDTH_FLAG: &str = "grid.mutation.set-col-auto-width-flag";
pub const SET_COL_COMPUTED_AUTO_WIDTH: &str = "grid.mutation.set-col-computed-auto-width";

pub const SET_ROW_HEIGHT: &str = "grid.mutation.set-row-height";
pub const SET_ROW_AUTO_HEIGHT_FLAG: &str = "grid.mutation.set-row-auto-height-flag";
pub const SET_ROW_COMPUTED_AUTO_HEIGHT: &str = "grid.mutation.set-row-computed-auto-height";

/// Register the column and row mutations against `grid`.
pub fn register_grid_mutations(bus: &CommandBus, grid: &SharedGrid) -> Result<(), BusError> {
    bus.register_undoable(SetDimensionSizeMutation::columns(grid.clone()))?;
    bus.register_undoable(SetDimensionAutoFlagMutation::columns(grid.clone()))?;
    bus.register_undoable(SetComputedAutoSizeMutation::columns(grid.clone()))?;
    bus.register_undoable(SetDimensionSizeMutation::rows(grid.clone()))?;
    bus.register_undoable(SetDimensionAutoFlagMutation::rows(grid.clone()))?;
    bus.register_undoable(SetComputedAutoSizeMutation::rows(grid.clone()))?;
    Ok(())
}
