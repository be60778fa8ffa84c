use std::sync::Arc;

use gridbus_engine::calc::{
    CALC_NOTIFY, CALC_START, CALC_STOP, CalculationNotificationParams, StartCalculationParams,
    StopCalculationParams,
};
use gridbus_engine::{
    CalculationLifecycle, CalculationReporter, CalculationState, CommandBus, CommandInfo,
    ExecutionOptions, FormulaExecutedState, RunId, StageInfo, Subscription,
};

use crate::error::SessionError;

/// Calculation controls and lifecycle listeners of one session.
///
/// All calculation mutations are issued `only_local`: calculation is a
/// per-peer activity and never enters undo history or the sync stream.
#[derive(Clone)]
pub struct FormulaFacade {
    bus: Arc<CommandBus>,
    lifecycle: Arc<CalculationLifecycle>,
}

impl FormulaFacade {
    pub(crate) fn new(bus: Arc<CommandBus>, lifecycle: Arc<CalculationLifecycle>) -> Self {
        Self { bus, lifecycle }
    }

    /// Start a forced calculation and return its run id. A run already in
    /// flight is superseded.
    pub fn execute_calculation(&self) -> Result<RunId, SessionError> {
        let params = StartCalculationParams {
            commands: Vec::new(),
            force_calculation: true,
        };
        self.bus
            .execute(CALC_START, &params, ExecutionOptions::local())?;
        Ok(self.lifecycle.last_run())
    }

    /// Returns false when no calculation was in flight.
    pub fn stop_calculation(&self) -> Result<bool, SessionError> {
        Ok(self
            .bus
            .execute(CALC_STOP, &StopCalculationParams {}, ExecutionOptions::local())?)
    }

    /// Reporter for the run in flight, to hand to the calculation worker.
    pub fn reporter(&self) -> Option<CalculationReporter> {
        self.lifecycle
            .active_run()
            .map(|run| CalculationReporter::new(self.bus.clone(), run))
    }

    pub fn state(&self) -> CalculationState {
        self.lifecycle.state()
    }

    pub fn on_calculation_start<F>(&self, callback: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.bus.on_command_executed(move |info| {
            if info.id != CALC_START {
                return;
            }
            if let Ok(params) = info.params_as::<StartCalculationParams>() {
                callback(params.force_calculation);
            }
        })
    }

    pub fn on_calculation_end<F>(&self, callback: F) -> Subscription
    where
        F: Fn(FormulaExecutedState) + Send + Sync + 'static,
    {
        self.bus.on_command_executed(move |info| {
            if let Some(state) = notification(info).and_then(|p| p.functions_executed_state) {
                callback(state);
            }
        })
    }

    pub fn on_calculation_processing<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StageInfo) + Send + Sync + 'static,
    {
        self.bus.on_command_executed(move |info| {
            if let Some(stage_info) = notification(info).and_then(|p| p.stage_info) {
                callback(&stage_info);
            }
        })
    }
}

fn notification(info: &CommandInfo) -> Option<CalculationNotificationParams> {
    if info.id != CALC_NOTIFY {
        return None;
    }
    info.params_as().ok()
}

impl std::fmt::Debug for FormulaFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormulaFacade")
            .field("state", &self.lifecycle.state())
            .finish()
    }
}
