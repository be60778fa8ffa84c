use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use super::common::*;
use crate::calc::{
    CALC_NOTIFY, CALC_START, CALC_STOP, CalculationNotificationParams, CalculationReporter,
    CalculationState, FormulaExecuteStage, FormulaExecutedState, StageInfo,
    StartCalculationParams, StopCalculationParams,
};
use crate::command::ExecutionOptions;
use crate::error::BusError;

fn start(fx: &Fixture, force: bool) -> bool {
    let params = StartCalculationParams {
        commands: Vec::new(),
        force_calculation: force,
    };
    fx.bus
        .execute(CALC_START, &params, ExecutionOptions::local())
        .unwrap()
}

fn notify(fx: &Fixture, params: CalculationNotificationParams) -> Result<bool, BusError> {
    fx.bus.execute(CALC_NOTIFY, &params, ExecutionOptions::local())
}

fn stage(stage: FormulaExecuteStage, done: u64, total: u64) -> StageInfo {
    StageInfo::new(stage).with_formula_counts(done, total)
}

/// Lifecycle state observed by a listener after every calc mutation.
fn watch(fx: &Fixture) -> (Arc<Mutex<Vec<CalculationState>>>, crate::Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let lifecycle = fx.lifecycle.clone();
    let sub = fx.bus.on_command_executed(move |info| {
        if info.id.starts_with("calc.") {
            sink.lock().push(lifecycle.state());
        }
    });
    (seen, sub)
}

#[test]
fn listener_sees_start_progress_and_completion_in_order() {
    let fx = fixture();
    let (seen, _sub) = watch(&fx);

    assert!(start(&fx, true));
    let first = stage(FormulaExecuteStage::StartCalculation, 0, 10);
    let second = stage(FormulaExecuteStage::CurrentlyCalculating, 4, 10);
    assert!(notify(&fx, CalculationNotificationParams::progress(first.clone())).unwrap());
    assert!(notify(&fx, CalculationNotificationParams::progress(second.clone())).unwrap());
    assert!(
        notify(
            &fx,
            CalculationNotificationParams::complete(FormulaExecutedState::Success)
        )
        .unwrap()
    );

    assert_eq!(
        *seen.lock(),
        vec![
            CalculationState::Running {
                force_calculation: true
            },
            CalculationState::Progressing { stage_info: first },
            CalculationState::Progressing { stage_info: second },
            CalculationState::Completed {
                executed_state: FormulaExecutedState::Success
            },
        ]
    );
    assert!(!fx.bus.can_undo());
    assert!(fx.outbox.is_empty());
}

#[test]
fn notifications_outside_a_run_are_not_observed() {
    let fx = fixture();
    let (seen, _sub) = watch(&fx);

    let late = CalculationNotificationParams::complete(FormulaExecutedState::Success);
    assert!(!notify(&fx, late).unwrap());
    assert!(
        !fx.bus
            .execute(CALC_STOP, &StopCalculationParams {}, ExecutionOptions::local())
            .unwrap()
    );

    assert!(seen.lock().is_empty());
    assert_eq!(fx.lifecycle.state(), CalculationState::Idle);
}

#[test]
fn stop_accepts_a_null_payload() {
    let fx = fixture();
    assert!(start(&fx, false));
    assert!(
        fx.bus
            .execute_command(CALC_STOP, serde_json::Value::Null, ExecutionOptions::local())
            .unwrap()
    );
    assert_eq!(fx.lifecycle.state(), CalculationState::Stopped);
}

#[test]
fn stop_ends_the_run_and_drops_later_reports() {
    let fx = fixture();
    assert!(start(&fx, false));
    assert!(
        fx.bus
            .execute(CALC_STOP, &StopCalculationParams {}, ExecutionOptions::local())
            .unwrap()
    );
    assert_eq!(fx.lifecycle.state(), CalculationState::Stopped);

    let progress =
        CalculationNotificationParams::progress(stage(FormulaExecuteStage::Start, 0, 1));
    assert!(!notify(&fx, progress).unwrap());
    assert_eq!(fx.lifecycle.state(), CalculationState::Stopped);
}

#[test]
fn malformed_notification_is_an_error() {
    let fx = fixture();
    assert!(start(&fx, false));
    let err = notify(&fx, CalculationNotificationParams::default()).unwrap_err();
    assert!(matches!(err, BusError::MalformedNotification));
    assert!(fx.lifecycle.state().is_active());
}

#[test]
fn superseded_reporter_is_dropped_from_another_thread() {
    let fx = fixture();
    assert!(start(&fx, false));
    let stale = CalculationReporter::new(fx.bus.clone(), fx.lifecycle.last_run());

    assert!(start(&fx, true));
    let current = CalculationReporter::new(fx.bus.clone(), fx.lifecycle.last_run());
    assert_ne!(stale.run(), current.run());

    let worker = thread::spawn(move || {
        let progress = stale.progress(StageInfo::new(FormulaExecuteStage::Start));
        let complete = stale.complete(FormulaExecutedState::Success);
        (progress.unwrap(), complete.unwrap())
    });
    assert_eq!(worker.join().unwrap(), (false, false));
    assert_eq!(
        fx.lifecycle.state(),
        CalculationState::Running {
            force_calculation: true
        }
    );

    assert!(current.complete(FormulaExecutedState::Success).unwrap());
    assert_eq!(fx.lifecycle.active_run(), None);
}
