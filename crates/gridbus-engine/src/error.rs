use gridbus_common::GridError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("no handler registered for `{0}`")]
    UnknownCommand(String),

    #[error("a handler for `{0}` is already registered")]
    DuplicateCommand(String),

    #[error("invalid params for `{id}`: {source}")]
    InvalidParams {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Grid(#[from] GridError),

    /// The inverse was read from a grid revision other than the one the
    /// forward mutation was applied to. Recording it would corrupt undo.
    #[error(
        "inverse for `{id}` captured at revision {captured_at}, forward applied at revision {applied_at}"
    )]
    InverseCaptureSkipped {
        id: String,
        captured_at: u64,
        applied_at: u64,
    },

    #[error("calculation notification must carry exactly one of stageInfo or functionsExecutedState")]
    MalformedNotification,

    #[error("replaying `{id}` from history failed: {reason}")]
    HistoryReplay { id: String, reason: String },
}

impl BusError {
    pub(crate) fn invalid_params(id: &str, source: serde_json::Error) -> Self {
        Self::InvalidParams {
            id: id.to_string(),
            source,
        }
    }
}
