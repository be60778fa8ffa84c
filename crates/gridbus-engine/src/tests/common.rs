//! Common test helpers
use std::sync::Arc;

use gridbus_common::{IndexRange, IndexedValue};

use crate::calc::{CalculationLifecycle, register_calculation_mutations};
use crate::command::{BusConfig, CommandBus};
use crate::commands::register_grid_commands;
use crate::grid::{Axis, GridStore, SharedGrid, SubUnitConfig};
use crate::mutation::{SetDimensionAutoFlagParams, SetDimensionSizeParams, register_grid_mutations};
use crate::sync::OutboxSink;

pub const UNIT: &str = "book-1";
pub const SHEET: &str = "sheet-1";

/// Highest index `observe` looks at.
pub const OBSERVED: u32 = 40;

pub struct Fixture {
    pub grid: SharedGrid,
    pub bus: Arc<CommandBus>,
    pub outbox: Arc<OutboxSink>,
    pub lifecycle: Arc<CalculationLifecycle>,
}

pub fn fixture() -> Fixture {
    fixture_with(BusConfig::default())
}

/// Route engine logs to the test harness. `RUST_LOG=gridbus_engine=debug`
/// shows them for a failing test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn fixture_with(config: BusConfig) -> Fixture {
    init_tracing();
    let mut store = GridStore::new();
    store.add_sub_unit(UNIT, SHEET, SubUnitConfig::default());
    let grid = store.into_shared();
    let outbox = Arc::new(OutboxSink::new());
    let bus = Arc::new(CommandBus::new(config, outbox.clone()));
    let lifecycle = Arc::new(CalculationLifecycle::new());

    register_grid_mutations(&bus, &grid).unwrap();
    register_grid_commands(&bus, &grid).unwrap();
    register_calculation_mutations(&bus, &lifecycle).unwrap();

    Fixture {
        grid,
        bus,
        outbox,
        lifecycle,
    }
}

pub fn r(start: u32, end: u32) -> IndexRange {
    IndexRange::new(start, end).unwrap()
}

pub fn width_params(ranges: Vec<IndexRange>, size: IndexedValue<f64>) -> SetDimensionSizeParams {
    SetDimensionSizeParams {
        unit_id: UNIT.to_string(),
        sub_unit_id: SHEET.to_string(),
        ranges,
        size,
    }
}

pub fn flag_params(
    ranges: Vec<IndexRange>,
    flag: IndexedValue<Option<bool>>,
) -> SetDimensionAutoFlagParams {
    SetDimensionAutoFlagParams {
        unit_id: UNIT.to_string(),
        sub_unit_id: SHEET.to_string(),
        ranges,
        flag,
    }
}

/// Write widths directly, bypassing the bus.
pub fn seed_widths(grid: &SharedGrid, widths: impl IntoIterator<Item = (u32, f64)>) {
    let mut store = grid.write();
    let cols = store
        .resolve_mut(UNIT, SHEET)
        .unwrap()
        .dimension_mut(Axis::Column);
    for (index, width) in widths {
        cols.get_or_create(index).size = width;
    }
}

pub fn width_at(grid: &SharedGrid, index: u32) -> f64 {
    grid.read().resolve(UNIT, SHEET).unwrap().columns().size_at(index)
}

pub fn flag_at(grid: &SharedGrid, index: u32) -> Option<bool> {
    grid.read()
        .resolve(UNIT, SHEET)
        .unwrap()
        .columns()
        .is_auto_at(index)
}

/// Observable attributes of `0..=OBSERVED` on one axis. Unlike comparing
/// stores, this ignores records allocated with default values.
pub fn observe(grid: &SharedGrid, axis: Axis) -> Vec<(f64, Option<bool>, Option<f64>)> {
    let store = grid.read();
    let dim = store.resolve(UNIT, SHEET).unwrap().dimension(axis);
    (0..=OBSERVED)
        .map(|i| (dim.size_at(i), dim.is_auto_at(i), dim.computed_auto_at(i)))
        .collect()
}
