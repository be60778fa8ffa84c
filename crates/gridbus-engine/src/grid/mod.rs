//! Per-index attributes of the rows and columns of every sub-unit.

pub mod dimension;
pub mod store;

pub use dimension::{Axis, DimensionAttributes, DimensionManager};
pub use store::{GridStore, SharedGrid, SubUnitConfig, SubUnitGrid};
