//! gridbus state-mutation engine
//!
//! Structural grid edits travel as invertible mutations through a single
//! [`CommandBus`]. The bus captures inverses before forward handlers run,
//! groups them into undo steps, hands globally scoped mutations to the
//! collaboration sink and notifies listeners. The calculation lifecycle is
//! driven by the same bus traffic.

pub mod calc;
pub mod command;
pub mod commands;
pub mod error;
pub mod grid;
pub mod mutation;
pub mod sync;
pub mod undo;

#[cfg(test)]
mod tests;

pub use calc::{
    CalculationEvent, CalculationLifecycle, CalculationReporter, CalculationState,
    FormulaExecuteStage, FormulaExecutedState, RunId, StageInfo, register_calculation_mutations,
};
pub use command::{
    BusConfig, CommandBus, CommandHandler, CommandInfo, CommandType, ExecutionOptions,
    ExecutionSource, InverseFactory, NoParams, Subscription,
};
pub use commands::register_grid_commands;
pub use error::BusError;
pub use grid::{Axis, DimensionAttributes, DimensionManager, GridStore, SharedGrid, SubUnitConfig};
pub use mutation::register_grid_mutations;
pub use sync::{CollaborationSink, NullCollaborationSink, OutboxSink};
pub use undo::{InverseCapture, UndoEntry, UndoGroup, UndoStack};

pub use gridbus_common::{GridError, IndexRange, IndexedValue};
