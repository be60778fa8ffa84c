use gridbus_common::IndexedValue;
use serde_json::{Value, json};

use super::common::*;
use crate::command::{CommandBus, CommandHandler, CommandType, ExecutionOptions};
use crate::commands::{
    DELTA_COL_WIDTH_COMMAND, DeltaColWidthCommandParams, SET_COL_AUTO_WIDTH_COMMAND,
    SET_COL_WIDTH_COMMAND, SetColAutoWidthCommandParams, SetColWidthCommandParams,
};
use crate::error::BusError;
use crate::grid::Axis;
use crate::mutation::{
    ComputedAutoSize, SET_COL_AUTO_WIDTH_FLAG, SET_COL_COMPUTED_AUTO_WIDTH, SET_COL_WIDTH,
    SetComputedAutoSizeParams,
};

#[test]
fn set_col_width_is_one_undo_step() {
    let fx = fixture();
    let flag = flag_params(vec![r(0, 1)], IndexedValue::scalar(Some(true)));
    fx.bus
        .execute(SET_COL_AUTO_WIDTH_FLAG, &flag, ExecutionOptions::default())
        .unwrap();

    let params = SetColWidthCommandParams {
        unit_id: UNIT.to_string(),
        sub_unit_id: SHEET.to_string(),
        ranges: vec![r(0, 1)],
        width: 140.0,
    };
    assert!(
        fx.bus
            .execute(SET_COL_WIDTH_COMMAND, &params, ExecutionOptions::default())
            .unwrap()
    );
    assert_eq!(width_at(&fx.grid, 1), 140.0);
    assert_eq!(flag_at(&fx.grid, 1), Some(false));

    let group = fx.bus.with_history(|h| h.peek_undo().cloned()).unwrap();
    assert_eq!(group.label, SET_COL_WIDTH_COMMAND);
    assert_eq!(group.entries.len(), 2);

    assert!(fx.bus.undo().unwrap());
    assert_eq!(width_at(&fx.grid, 1), 88.0);
    assert_eq!(flag_at(&fx.grid, 1), Some(true));

    // the command itself is never propagated, only its mutations
    assert!(
        fx.outbox
            .ids()
            .iter()
            .all(|id| id != SET_COL_WIDTH_COMMAND)
    );
}

#[test]
fn delta_col_width_clamps_at_zero() {
    let fx = fixture();
    seed_widths(&fx.grid, [(0, 30.0), (1, 100.0)]);

    let params = DeltaColWidthCommandParams {
        unit_id: UNIT.to_string(),
        sub_unit_id: SHEET.to_string(),
        ranges: vec![r(0, 1)],
        delta: -50.0,
    };
    assert!(
        fx.bus
            .execute(DELTA_COL_WIDTH_COMMAND, &params, ExecutionOptions::default())
            .unwrap()
    );
    assert_eq!(width_at(&fx.grid, 0), 0.0);
    assert_eq!(width_at(&fx.grid, 1), 50.0);

    assert!(fx.bus.undo().unwrap());
    assert_eq!(width_at(&fx.grid, 0), 30.0);
    assert_eq!(width_at(&fx.grid, 1), 100.0);
}

#[test]
fn set_col_auto_width_uses_computed_widths_where_known() {
    let fx = fixture();
    seed_widths(&fx.grid, [(4, 45.0)]);
    let computed = SetComputedAutoSizeParams {
        unit_id: UNIT.to_string(),
        sub_unit_id: SHEET.to_string(),
        entries: vec![ComputedAutoSize {
            index: 3,
            value: Some(132.5),
        }],
    };
    fx.bus
        .execute(SET_COL_COMPUTED_AUTO_WIDTH, &computed, ExecutionOptions::local())
        .unwrap();

    let before = observe(&fx.grid, Axis::Column);
    let params = SetColAutoWidthCommandParams {
        unit_id: UNIT.to_string(),
        sub_unit_id: SHEET.to_string(),
        ranges: vec![r(3, 4)],
    };
    assert!(
        fx.bus
            .execute(SET_COL_AUTO_WIDTH_COMMAND, &params, ExecutionOptions::default())
            .unwrap()
    );
    assert_eq!(width_at(&fx.grid, 3), 132.5);
    assert_eq!(width_at(&fx.grid, 4), 45.0);
    assert_eq!(flag_at(&fx.grid, 3), Some(true));
    assert_eq!(flag_at(&fx.grid, 4), Some(true));

    assert_eq!(fx.bus.with_history(|h| h.undo_len()), 1);
    assert!(fx.bus.undo().unwrap());
    assert_eq!(observe(&fx.grid, Axis::Column), before);
}

#[test]
fn command_on_missing_target_records_nothing() {
    let fx = fixture();
    let params = SetColWidthCommandParams {
        unit_id: UNIT.to_string(),
        sub_unit_id: "gone".to_string(),
        ranges: vec![r(0, 0)],
        width: 10.0,
    };
    assert!(
        !fx.bus
            .execute(SET_COL_WIDTH_COMMAND, &params, ExecutionOptions::default())
            .unwrap()
    );
    assert!(!fx.bus.can_undo());
    assert!(fx.outbox.is_empty());
}

/// Applies a width, then fails the way its params say.
struct FailingCommand;

impl CommandHandler for FailingCommand {
    type Params = Value;

    fn id(&self) -> &str {
        "test.command.failing"
    }

    fn command_type(&self) -> CommandType {
        CommandType::Command
    }

    fn handle(&self, bus: &CommandBus, params: &Value) -> Result<bool, BusError> {
        let width = width_params(vec![r(0, 2)], IndexedValue::scalar(250.0));
        bus.execute(SET_COL_WIDTH, &width, ExecutionOptions::default())?;
        if params["error"].as_bool() == Some(true) {
            return Err(BusError::HistoryReplay {
                id: self.id().to_string(),
                reason: "forced".to_string(),
            });
        }
        Ok(false)
    }
}

#[test]
fn failed_command_rolls_back_nested_mutations() {
    let fx = fixture();
    fx.bus.register(FailingCommand).unwrap();
    seed_widths(&fx.grid, [(1, 61.0)]);
    let before = observe(&fx.grid, Axis::Column);

    assert!(
        !fx.bus
            .execute("test.command.failing", &json!({}), ExecutionOptions::default())
            .unwrap()
    );
    assert_eq!(observe(&fx.grid, Axis::Column), before);
    assert!(!fx.bus.can_undo());

    assert!(
        fx.bus
            .execute(
                "test.command.failing",
                &json!({ "error": true }),
                ExecutionOptions::default()
            )
            .is_err()
    );
    assert_eq!(observe(&fx.grid, Axis::Column), before);
    assert!(!fx.bus.can_undo());
}
