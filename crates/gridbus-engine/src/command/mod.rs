//! Command bus: the single entry point for commands, operations and
//! mutations.
//!
//! - [`CommandHandler`]: typed handler registered under a stable id
//! - [`InverseFactory`]: read-only inverse capture for undoable mutations
//! - [`CommandInfo`]: the immutable execution record seen by listeners,
//!   the undo stack and the collaboration sink

mod bus;
mod listeners;

pub use bus::{BusConfig, CommandBus};
pub use listeners::Subscription;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BusError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    /// Composite action; may execute further commands and mutations.
    Command,
    /// Local view-state change. Never recorded or propagated.
    Operation,
    /// Atomic state transition. The only kind recorded and propagated.
    Mutation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionOptions {
    /// Observed on this peer only: kept out of undo and out of sync.
    pub only_local: bool,
}

impl ExecutionOptions {
    pub fn local() -> Self {
        Self { only_local: true }
    }
}

/// Why an execution is happening. Decides recording and propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionSource {
    #[default]
    Local,
    Undo,
    Redo,
    /// Compensation for a failed composite command.
    Rollback,
    /// Received from a collaborator.
    Remote,
}

impl ExecutionSource {
    pub fn is_replay(self) -> bool {
        matches!(self, Self::Undo | Self::Redo | Self::Rollback)
    }
}

/// One execution on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandInfo {
    pub id: String,
    pub command_type: CommandType,
    pub params: Value,
    #[serde(default)]
    pub options: ExecutionOptions,
    #[serde(skip)]
    pub source: ExecutionSource,
}

impl CommandInfo {
    pub fn mutation(id: impl Into<String>, params: Value) -> Self {
        Self {
            id: id.into(),
            command_type: CommandType::Mutation,
            params,
            options: ExecutionOptions::default(),
            source: ExecutionSource::Local,
        }
    }

    pub fn params_as<P: DeserializeOwned>(&self) -> Result<P, BusError> {
        P::deserialize(&self.params).map_err(|e| BusError::invalid_params(&self.id, e))
    }

    pub(crate) fn with_source(mut self, source: ExecutionSource) -> Self {
        self.source = source;
        self
    }
}

/// Params of a handler that takes none. Any payload is accepted, `null`
/// included; `{}` is sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NoParams {}

impl<'de> Deserialize<'de> for NoParams {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde::de::IgnoredAny::deserialize(deserializer)?;
        Ok(Self {})
    }
}

/// A typed handler registered on the bus under [`id`](CommandHandler::id).
pub trait CommandHandler: Send + Sync + 'static {
    type Params: Serialize + DeserializeOwned;

    fn id(&self) -> &str;

    fn command_type(&self) -> CommandType {
        CommandType::Mutation
    }

    /// `Ok(false)` reports a failure that left state untouched (for
    /// instance a target that does not resolve). Errors are for requests
    /// that could never succeed.
    fn handle(&self, bus: &CommandBus, params: &Self::Params) -> Result<bool, BusError>;
}

/// Inverse capture for a mutation.
///
/// [`capture_inverse`](InverseFactory::capture_inverse) reads the state the
/// forward mutation is about to overwrite and must run before it; calling it
/// afterwards yields a no-op undo.
pub trait InverseFactory: CommandHandler {
    /// Revision of the state the factory reads.
    fn state_revision(&self) -> u64;

    /// Params that restore the pre-change state, or `None` when the target
    /// does not resolve.
    fn capture_inverse(&self, params: &Self::Params) -> Result<Option<Self::Params>, BusError>;
}

pub(crate) trait ErasedHandler: Send + Sync {
    fn id(&self) -> &str;
    fn command_type(&self) -> CommandType;
    fn invoke(&self, bus: &CommandBus, params: &Value) -> Result<bool, BusError>;
    fn inverse(&self) -> Option<&dyn ErasedInverse>;
}

pub(crate) trait ErasedInverse {
    fn state_revision(&self) -> u64;
    fn capture(&self, params: &Value) -> Result<Option<Value>, BusError>;
}

fn decode<P: DeserializeOwned>(id: &str, params: &Value) -> Result<P, BusError> {
    P::deserialize(params).map_err(|e| BusError::invalid_params(id, e))
}

fn encode<P: Serialize>(id: &str, params: &P) -> Result<Value, BusError> {
    serde_json::to_value(params).map_err(|e| BusError::invalid_params(id, e))
}

pub(crate) struct PlainHandler<H>(pub H);

impl<H: CommandHandler> ErasedHandler for PlainHandler<H> {
    fn id(&self) -> &str {
        self.0.id()
    }

    fn command_type(&self) -> CommandType {
        self.0.command_type()
    }

    fn invoke(&self, bus: &CommandBus, params: &Value) -> Result<bool, BusError> {
        let typed: H::Params = decode(self.0.id(), params)?;
        self.0.handle(bus, &typed)
    }

    fn inverse(&self) -> Option<&dyn ErasedInverse> {
        None
    }
}

pub(crate) struct UndoableHandler<H>(pub H);

impl<H: InverseFactory> ErasedHandler for UndoableHandler<H> {
    fn id(&self) -> &str {
        self.0.id()
    }

    fn command_type(&self) -> CommandType {
        self.0.command_type()
    }

    fn invoke(&self, bus: &CommandBus, params: &Value) -> Result<bool, BusError> {
        let typed: H::Params = decode(self.0.id(), params)?;
        self.0.handle(bus, &typed)
    }

    fn inverse(&self) -> Option<&dyn ErasedInverse> {
        Some(self)
    }
}

impl<H: InverseFactory> ErasedInverse for UndoableHandler<H> {
    fn state_revision(&self) -> u64 {
        self.0.state_revision()
    }

    fn capture(&self, params: &Value) -> Result<Option<Value>, BusError> {
        let typed: H::Params = decode(self.0.id(), params)?;
        self.0
            .capture_inverse(&typed)?
            .map(|inverse| encode(self.0.id(), &inverse))
            .transpose()
    }
}
