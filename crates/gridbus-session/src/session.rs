use std::sync::Arc;

use gridbus_common::{IndexRange, IndexedValue};
use gridbus_engine::commands::{
    DELTA_COL_WIDTH_COMMAND, DeltaColWidthCommandParams, SET_COL_AUTO_WIDTH_COMMAND,
    SET_COL_WIDTH_COMMAND, SetColAutoWidthCommandParams, SetColWidthCommandParams,
};
use gridbus_engine::mutation::{SET_ROW_HEIGHT, SetDimensionSizeParams};
use gridbus_engine::{
    Axis, CalculationLifecycle, CollaborationSink, CommandBus, CommandInfo, ExecutionOptions,
    GridStore, NoParams, NullCollaborationSink, SharedGrid, Subscription,
    register_calculation_mutations, register_grid_commands, register_grid_mutations,
};
use serde::Serialize;

use crate::config::{SessionConfig, SessionMode};
use crate::crosshair::{
    CrosshairHighlight, CrosshairHighlightState, DISABLE_CROSSHAIR_HIGHLIGHT,
    ENABLE_CROSSHAIR_HIGHLIGHT, SET_CROSSHAIR_HIGHLIGHT_COLOR,
    SetCrosshairHighlightColorParams, register_crosshair_operations,
};
use crate::error::SessionError;
use crate::formula::FormulaFacade;

/// One open document: grid state, calculation lifecycle and the command bus
/// every change goes through.
///
/// Construction registers every handler the session knows about; there is
/// no other registration path.
pub struct DocumentSession {
    config: SessionConfig,
    grid: SharedGrid,
    lifecycle: Arc<CalculationLifecycle>,
    crosshair: Arc<CrosshairHighlightState>,
    bus: Arc<CommandBus>,
}

impl DocumentSession {
    pub fn new() -> Result<Self, SessionError> {
        Self::new_with_mode(SessionMode::Interactive)
    }

    pub fn new_with_mode(mode: SessionMode) -> Result<Self, SessionError> {
        Self::new_with_config(SessionConfig::for_mode(mode))
    }

    pub fn new_with_config(config: SessionConfig) -> Result<Self, SessionError> {
        Self::with_sink(config, Arc::new(NullCollaborationSink))
    }

    /// Session whose globally scoped mutations are handed to `sink`.
    pub fn with_sink(
        config: SessionConfig,
        sink: Arc<dyn CollaborationSink>,
    ) -> Result<Self, SessionError> {
        config.validate()?;

        let grid = GridStore::new().into_shared();
        let lifecycle = Arc::new(CalculationLifecycle::new());
        let crosshair = Arc::new(CrosshairHighlightState::new(
            config.crosshair_highlight_color.clone(),
        ));
        let bus = Arc::new(CommandBus::new(config.bus_config(), sink));

        register_grid_mutations(&bus, &grid)?;
        register_grid_commands(&bus, &grid)?;
        register_calculation_mutations(&bus, &lifecycle)?;
        register_crosshair_operations(&bus, &crosshair)?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            record_history = config.record_history,
            max_undo_steps = ?config.max_undo_steps,
            "document session ready"
        );

        Ok(Self {
            config,
            grid,
            lifecycle,
            crosshair,
            bus,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<CommandBus> {
        &self.bus
    }

    pub fn grid(&self) -> &SharedGrid {
        &self.grid
    }

    pub fn lifecycle(&self) -> &Arc<CalculationLifecycle> {
        &self.lifecycle
    }

    pub fn formula(&self) -> FormulaFacade {
        FormulaFacade::new(self.bus.clone(), self.lifecycle.clone())
    }

    // Sheets

    /// Add a sheet sized with the session defaults. Returns false if it
    /// already exists.
    pub fn add_sheet(&self, unit_id: &str, sub_unit_id: &str) -> bool {
        let added =
            self.grid
                .write()
                .add_sub_unit(unit_id, sub_unit_id, self.config.sub_unit_config());
        #[cfg(feature = "tracing")]
        if added {
            tracing::debug!(unit_id, sub_unit_id, "sheet added");
        }
        added
    }

    pub fn remove_sheet(&self, unit_id: &str, sub_unit_id: &str) -> Result<(), SessionError> {
        self.grid.write().remove_sub_unit(unit_id, sub_unit_id)?;
        Ok(())
    }

    pub fn has_sheet(&self, unit_id: &str, sub_unit_id: &str) -> bool {
        self.grid.read().has_sub_unit(unit_id, sub_unit_id)
    }

    // Reads

    pub fn column_width(
        &self,
        unit_id: &str,
        sub_unit_id: &str,
        col: u32,
    ) -> Result<f64, SessionError> {
        self.read_dimension(unit_id, sub_unit_id, Axis::Column, |d| d.size_at(col))
    }

    pub fn row_height(&self, unit_id: &str, sub_unit_id: &str, row: u32) -> Result<f64, SessionError> {
        self.read_dimension(unit_id, sub_unit_id, Axis::Row, |d| d.size_at(row))
    }

    pub fn column_auto_width(
        &self,
        unit_id: &str,
        sub_unit_id: &str,
        col: u32,
    ) -> Result<Option<bool>, SessionError> {
        self.read_dimension(unit_id, sub_unit_id, Axis::Column, |d| d.is_auto_at(col))
    }

    pub fn computed_auto_width(
        &self,
        unit_id: &str,
        sub_unit_id: &str,
        col: u32,
    ) -> Result<Option<f64>, SessionError> {
        self.read_dimension(unit_id, sub_unit_id, Axis::Column, |d| {
            d.computed_auto_at(col)
        })
    }

    fn read_dimension<R>(
        &self,
        unit_id: &str,
        sub_unit_id: &str,
        axis: Axis,
        read: impl FnOnce(&gridbus_engine::DimensionManager) -> R,
    ) -> Result<R, SessionError> {
        let store = self.grid.read();
        let sub_unit = store.resolve(unit_id, sub_unit_id)?;
        Ok(read(sub_unit.dimension(axis)))
    }

    // Edits

    pub fn execute<P: Serialize>(
        &self,
        id: &str,
        params: &P,
        options: ExecutionOptions,
    ) -> Result<bool, SessionError> {
        Ok(self.bus.execute(id, params, options)?)
    }

    /// Apply a mutation received from a collaborator.
    pub fn apply_remote(&self, mutation: CommandInfo) -> Result<bool, SessionError> {
        Ok(self.bus.apply_remote(mutation)?)
    }

    pub fn set_column_width(
        &self,
        unit_id: &str,
        sub_unit_id: &str,
        ranges: Vec<IndexRange>,
        width: f64,
    ) -> Result<bool, SessionError> {
        let params = SetColWidthCommandParams {
            unit_id: unit_id.to_string(),
            sub_unit_id: sub_unit_id.to_string(),
            ranges,
            width,
        };
        self.execute(SET_COL_WIDTH_COMMAND, &params, ExecutionOptions::default())
    }

    pub fn adjust_column_width(
        &self,
        unit_id: &str,
        sub_unit_id: &str,
        ranges: Vec<IndexRange>,
        delta: f64,
    ) -> Result<bool, SessionError> {
        let params = DeltaColWidthCommandParams {
            unit_id: unit_id.to_string(),
            sub_unit_id: sub_unit_id.to_string(),
            ranges,
            delta,
        };
        self.execute(DELTA_COL_WIDTH_COMMAND, &params, ExecutionOptions::default())
    }

    pub fn set_column_auto_width(
        &self,
        unit_id: &str,
        sub_unit_id: &str,
        ranges: Vec<IndexRange>,
    ) -> Result<bool, SessionError> {
        let params = SetColAutoWidthCommandParams {
            unit_id: unit_id.to_string(),
            sub_unit_id: sub_unit_id.to_string(),
            ranges,
        };
        self.execute(
            SET_COL_AUTO_WIDTH_COMMAND,
            &params,
            ExecutionOptions::default(),
        )
    }

    pub fn set_row_height(
        &self,
        unit_id: &str,
        sub_unit_id: &str,
        ranges: Vec<IndexRange>,
        height: IndexedValue<f64>,
    ) -> Result<bool, SessionError> {
        let params = SetDimensionSizeParams {
            unit_id: unit_id.to_string(),
            sub_unit_id: sub_unit_id.to_string(),
            ranges,
            size: height,
        };
        self.execute(SET_ROW_HEIGHT, &params, ExecutionOptions::default())
    }

    // History

    pub fn undo(&self) -> Result<bool, SessionError> {
        Ok(self.bus.undo()?)
    }

    pub fn redo(&self) -> Result<bool, SessionError> {
        Ok(self.bus.redo()?)
    }

    pub fn can_undo(&self) -> bool {
        self.bus.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.bus.can_redo()
    }

    pub fn on_command_executed<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CommandInfo) + Send + Sync + 'static,
    {
        self.bus.on_command_executed(listener)
    }

    // Crosshair highlight

    pub fn set_crosshair_highlight_enabled(&self, enabled: bool) -> Result<bool, SessionError> {
        let id = if enabled {
            ENABLE_CROSSHAIR_HIGHLIGHT
        } else {
            DISABLE_CROSSHAIR_HIGHLIGHT
        };
        self.execute(id, &NoParams {}, ExecutionOptions::default())
    }

    /// Returns false for a blank color.
    pub fn set_crosshair_highlight_color(&self, color: &str) -> Result<bool, SessionError> {
        let params = SetCrosshairHighlightColorParams {
            value: color.to_string(),
        };
        self.execute(
            SET_CROSSHAIR_HIGHLIGHT_COLOR,
            &params,
            ExecutionOptions::default(),
        )
    }

    pub fn crosshair_highlight(&self) -> CrosshairHighlight {
        self.crosshair.snapshot()
    }
}

impl std::fmt::Debug for DocumentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSession")
            .field("config", &self.config)
            .field("bus", &self.bus)
            .finish()
    }
}
