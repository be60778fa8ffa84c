use std::sync::Arc;

use super::{
    CALC_NOTIFY, CALC_START, CALC_STOP, CalculationEvent, CalculationLifecycle,
    CalculationNotificationParams, StartCalculationParams, StopCalculationParams,
};
use crate::command::{CommandBus, CommandHandler};
use crate::error::BusError;

pub struct StartCalculationMutation {
    lifecycle: Arc<CalculationLifecycle>,
}

impl StartCalculationMutation {
    pub fn new(lifecycle: Arc<CalculationLifecycle>) -> Self {
        Self { lifecycle }
    }
}

impl CommandHandler for StartCalculationMutation {
    type Params = StartCalculationParams;

    fn id(&self) -> &str {
        CALC_START
    }

    fn handle(&self, _: &CommandBus, params: &Self::Params) -> Result<bool, BusError> {
        let _run = self.lifecycle.start(params.force_calculation);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            run = _run,
            force = params.force_calculation,
            dirty = params.commands.len(),
            "calculation started"
        );
        Ok(true)
    }
}

pub struct StopCalculationMutation {
    lifecycle: Arc<CalculationLifecycle>,
}

impl StopCalculationMutation {
    pub fn new(lifecycle: Arc<CalculationLifecycle>) -> Self {
        Self { lifecycle }
    }
}

impl CommandHandler for StopCalculationMutation {
    type Params = StopCalculationParams;

    fn id(&self) -> &str {
        CALC_STOP
    }

    fn handle(&self, _: &CommandBus, _: &Self::Params) -> Result<bool, BusError> {
        let stopped = self.lifecycle.stop();
        if !stopped {
            #[cfg(feature = "tracing")]
            tracing::debug!("stop ignored: no calculation in flight");
        }
        Ok(stopped)
    }
}

pub struct CalculationNotificationMutation {
    lifecycle: Arc<CalculationLifecycle>,
}

impl CalculationNotificationMutation {
    pub fn new(lifecycle: Arc<CalculationLifecycle>) -> Self {
        Self { lifecycle }
    }
}

impl CommandHandler for CalculationNotificationMutation {
    type Params = CalculationNotificationParams;

    fn id(&self) -> &str {
        CALC_NOTIFY
    }

    /// Reports outside an active run, or for a superseded run, are dropped
    /// with `Ok(false)` and never reach listeners.
    fn handle(&self, _: &CommandBus, params: &Self::Params) -> Result<bool, BusError> {
        let accepted = match params.event()? {
            CalculationEvent::Progress(stage_info) => {
                self.lifecycle.progress(stage_info, params.run_id)
            }
            CalculationEvent::Complete(state) => self.lifecycle.complete(state, params.run_id),
        };
        if !accepted {
            #[cfg(feature = "tracing")]
            tracing::debug!(run = ?params.run_id, "stale calculation notification dropped");
        }
        Ok(accepted)
    }
}
