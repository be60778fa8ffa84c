//! Meta crate that re-exports the gridbus building blocks. Depend on this
//! crate and opt into layers via feature flags; the underlying crates stay
//! reachable for deeper integration.

#[cfg(feature = "common")]
pub use gridbus_common as common;

#[cfg(feature = "engine")]
pub use gridbus_engine as engine;

#[cfg(feature = "session")]
pub use gridbus_session as session;

#[cfg(feature = "common")]
pub use gridbus_common::{GridError, IndexRange, IndexedValue};

#[cfg(feature = "engine")]
pub use gridbus_engine::{
    BusError, CalculationState, CollaborationSink, CommandBus, CommandInfo, CommandType,
    ExecutionOptions, FormulaExecutedState, OutboxSink, StageInfo, Subscription,
};

#[cfg(feature = "session")]
pub use gridbus_session::{DocumentSession, FormulaFacade, SessionConfig, SessionError, SessionMode};
