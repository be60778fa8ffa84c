use gridbus_common::GridError;
use gridbus_engine::BusError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("invalid session config: {reason}")]
    InvalidConfig { reason: String },
}

impl SessionError {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
