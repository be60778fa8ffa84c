use std::sync::Arc;

use super::{
    CALC_NOTIFY, CalculationNotificationParams, FormulaExecutedState, RunId, StageInfo,
};
use crate::command::{CommandBus, ExecutionOptions};
use crate::error::BusError;

/// Handle through which an out-of-band calculation reports back.
///
/// Bound to one run: once that run is stopped, completed or superseded,
/// every further report is dropped by the notification mutation and the
/// reporter returns `Ok(false)`.
#[derive(Clone)]
pub struct CalculationReporter {
    bus: Arc<CommandBus>,
    run: RunId,
}

impl CalculationReporter {
    pub fn new(bus: Arc<CommandBus>, run: RunId) -> Self {
        Self { bus, run }
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    pub fn progress(&self, stage_info: StageInfo) -> Result<bool, BusError> {
        self.send(CalculationNotificationParams::progress(stage_info))
    }

    pub fn complete(&self, state: FormulaExecutedState) -> Result<bool, BusError> {
        self.send(CalculationNotificationParams::complete(state))
    }

    fn send(&self, params: CalculationNotificationParams) -> Result<bool, BusError> {
        self.bus.execute(
            CALC_NOTIFY,
            &params.for_run(self.run),
            ExecutionOptions::local(),
        )
    }
}

impl std::fmt::Debug for CalculationReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalculationReporter")
            .field("run", &self.run)
            .finish()
    }
}
