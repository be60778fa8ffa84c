//! Observable lifecycle of an out-of-band formula calculation.
//!
//! `Idle → Running → Progressing* → Completed | Stopped`, driven only by the
//! three calculation mutations executed on the bus. Progress and completion
//! share the notification mutation id; which optional field is present tells
//! them apart.

mod lifecycle;
mod mutations;
mod reporter;

pub use lifecycle::{CalculationLifecycle, CalculationState, RunId};
pub use mutations::{
    CalculationNotificationMutation, StartCalculationMutation, StopCalculationMutation,
};
pub use reporter::CalculationReporter;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::{CommandBus, NoParams};
use crate::error::BusError;
use std::sync::Arc;

pub const CALC_START: &str = "calc.mutation.start";
pub const CALC_STOP: &str = "calc.mutation.stop";
pub const CALC_NOTIFY: &str = "calc.mutation.notify";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaExecuteStage {
    Idle,
    Start,
    StartDependency,
    StartCalculation,
    CurrentlyCalculating,
    StartDependencyArrayFormula,
    StartCalculationArrayFormula,
    CurrentlyCalculatingArrayFormula,
    CalculationCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaExecutedState {
    Initial,
    StopExecution,
    NotExecuted,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageInfo {
    pub total_formulas_to_calculate: u64,
    pub completed_formulas_count: u64,
    pub total_array_formulas_to_calculate: u64,
    pub completed_array_formulas_count: u64,
    pub stage: FormulaExecuteStage,
}

impl StageInfo {
    pub fn new(stage: FormulaExecuteStage) -> Self {
        Self {
            total_formulas_to_calculate: 0,
            completed_formulas_count: 0,
            total_array_formulas_to_calculate: 0,
            completed_array_formulas_count: 0,
            stage,
        }
    }

    pub fn with_formula_counts(mut self, completed: u64, total: u64) -> Self {
        self.completed_formulas_count = completed;
        self.total_formulas_to_calculate = total;
        self
    }

    pub fn with_array_formula_counts(mut self, completed: u64, total: u64) -> Self {
        self.completed_array_formulas_count = completed;
        self.total_array_formulas_to_calculate = total;
        self
    }
}

/// A command the calculation should account for as dirty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirtyCommand {
    pub id: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCalculationParams {
    #[serde(default)]
    pub commands: Vec<DirtyCommand>,
    #[serde(default)]
    pub force_calculation: bool,
}

pub type StopCalculationParams = NoParams;

/// Wire payload of [`CALC_NOTIFY`]. Exactly one of `stage_info` and
/// `functions_executed_state` is set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationNotificationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_info: Option<StageInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions_executed_state: Option<FormulaExecutedState>,
    /// Run the report belongs to. Reports for a superseded run are dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
}

impl CalculationNotificationParams {
    pub fn progress(stage_info: StageInfo) -> Self {
        Self {
            stage_info: Some(stage_info),
            ..Self::default()
        }
    }

    pub fn complete(state: FormulaExecutedState) -> Self {
        Self {
            functions_executed_state: Some(state),
            ..Self::default()
        }
    }

    pub fn for_run(mut self, run: RunId) -> Self {
        self.run_id = Some(run);
        self
    }

    /// Which logical event the payload carries.
    pub fn event(&self) -> Result<CalculationEvent, BusError> {
        match (&self.stage_info, self.functions_executed_state) {
            (Some(stage), None) => Ok(CalculationEvent::Progress(stage.clone())),
            (None, Some(state)) => Ok(CalculationEvent::Complete(state)),
            _ => Err(BusError::MalformedNotification),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalculationEvent {
    Progress(StageInfo),
    Complete(FormulaExecutedState),
}

/// Register the start/stop/notify mutations against `lifecycle`.
pub fn register_calculation_mutations(
    bus: &CommandBus,
    lifecycle: &Arc<CalculationLifecycle>,
) -> Result<(), BusError> {
    bus.register(StartCalculationMutation::new(lifecycle.clone()))?;
    bus.register(StopCalculationMutation::new(lifecycle.clone()))?;
    bus.register(CalculationNotificationMutation::new(lifecycle.clone()))?;
    Ok(())
}
