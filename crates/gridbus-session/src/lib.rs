//! Document session over the gridbus engine.
//!
//! [`DocumentSession`] builds the grid store, calculation lifecycle and
//! command bus of one open document and registers every handler against
//! them. Facades for formula calculation and the crosshair highlight sit on
//! top of the bus.

pub mod config;
pub mod crosshair;
pub mod error;
pub mod formula;
pub mod session;

pub use config::{DEFAULT_CROSSHAIR_COLOR, SessionConfig, SessionMode};
pub use crosshair::{CrosshairHighlight, CrosshairHighlightState};
pub use error::SessionError;
pub use formula::FormulaFacade;
pub use session::DocumentSession;
