use parking_lot::RwLock;

use super::{FormulaExecutedState, StageInfo};

/// Identity of one calculation run. Allocated by every start.
pub type RunId = u64;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CalculationState {
    #[default]
    Idle,
    Running {
        force_calculation: bool,
    },
    Progressing {
        stage_info: StageInfo,
    },
    Completed {
        executed_state: FormulaExecutedState,
    },
    Stopped,
}

impl CalculationState {
    /// Running or progressing.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running { .. } | Self::Progressing { .. })
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: CalculationState,
    run: RunId,
}

/// Calculation lifecycle of one document session.
///
/// Owned by the session and shared with the calculation mutations; the
/// transition methods are crate-private so bus traffic is the only writer.
#[derive(Debug, Default)]
pub struct CalculationLifecycle {
    inner: RwLock<Inner>,
}

impl CalculationLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CalculationState {
        self.inner.read().state.clone()
    }

    /// Run currently in flight.
    pub fn active_run(&self) -> Option<RunId> {
        let inner = self.inner.read();
        inner.state.is_active().then_some(inner.run)
    }

    /// Most recently started run, whatever its outcome. Zero before the
    /// first start.
    pub fn last_run(&self) -> RunId {
        self.inner.read().run
    }

    /// Begins a new run, superseding any run in flight.
    pub(crate) fn start(&self, force_calculation: bool) -> RunId {
        let mut inner = self.inner.write();
        inner.run += 1;
        inner.state = CalculationState::Running { force_calculation };
        inner.run
    }

    pub(crate) fn progress(&self, stage_info: StageInfo, run: Option<RunId>) -> bool {
        self.transition(run, CalculationState::Progressing { stage_info })
    }

    pub(crate) fn complete(&self, executed_state: FormulaExecutedState, run: Option<RunId>) -> bool {
        self.transition(run, CalculationState::Completed { executed_state })
    }

    pub(crate) fn stop(&self) -> bool {
        self.transition(None, CalculationState::Stopped)
    }

    fn transition(&self, run: Option<RunId>, next: CalculationState) -> bool {
        let mut inner = self.inner.write();
        if !inner.state.is_active() || run.is_some_and(|r| r != inner.run) {
            return false;
        }
        inner.state = next;
        true
    }
}
