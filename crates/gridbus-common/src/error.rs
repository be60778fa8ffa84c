//! Failure conditions raised while resolving or walking grid state.
//!
//! Both variants are detected before any write happens, so a caller that
//! receives one can rely on the grid being unchanged.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum GridError {
    /// `(unit_id, sub_unit_id)` did not resolve to a live sub-unit.
    #[error("target not found: unit `{unit_id}`, sub-unit `{sub_unit_id}`")]
    TargetNotFound {
        unit_id: String,
        sub_unit_id: String,
    },

    /// A range whose start lies after its end.
    #[error("malformed range: start {start} > end {end}")]
    MalformedRange { start: u32, end: u32 },
}

impl GridError {
    pub fn target_not_found(unit_id: impl Into<String>, sub_unit_id: impl Into<String>) -> Self {
        Self::TargetNotFound {
            unit_id: unit_id.into(),
            sub_unit_id: sub_unit_id.into(),
        }
    }

    pub fn is_target_not_found(&self) -> bool {
        matches!(self, Self::TargetNotFound { .. })
    }
}
