//! Crosshair highlight: local view state toggled through operations.
//!
//! The operations are never recorded for undo nor sent to collaborators;
//! each peer keeps its own highlight.

use std::sync::Arc;

use gridbus_engine::{BusError, CommandBus, CommandHandler, CommandType, NoParams};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

pub const ENABLE_CROSSHAIR_HIGHLIGHT: &str = "sheet.operation.enable-crosshair-highlight";
pub const DISABLE_CROSSHAIR_HIGHLIGHT: &str = "sheet.operation.disable-crosshair-highlight";
pub const SET_CROSSHAIR_HIGHLIGHT_COLOR: &str = "sheet.operation.set-crosshair-highlight-color";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrosshairHighlight {
    pub enabled: bool,
    pub color: String,
}

/// Highlight state shared between the session and the three operations.
#[derive(Debug)]
pub struct CrosshairHighlightState {
    inner: RwLock<CrosshairHighlight>,
}

impl CrosshairHighlightState {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(CrosshairHighlight {
                enabled: false,
                color: color.into(),
            }),
        }
    }

    pub fn snapshot(&self) -> CrosshairHighlight {
        self.inner.read().clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.read().enabled
    }

    pub fn color(&self) -> String {
        self.inner.read().color.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCrosshairHighlightColorParams {
    pub value: String,
}

pub struct SetCrosshairHighlightEnabledOperation {
    enabled: bool,
    state: Arc<CrosshairHighlightState>,
}

impl SetCrosshairHighlightEnabledOperation {
    pub fn enable(state: Arc<CrosshairHighlightState>) -> Self {
        Self {
            enabled: true,
            state,
        }
    }

    pub fn disable(state: Arc<CrosshairHighlightState>) -> Self {
        Self {
            enabled: false,
            state,
        }
    }
}

impl CommandHandler for SetCrosshairHighlightEnabledOperation {
    type Params = NoParams;

    fn id(&self) -> &str {
        if self.enabled {
            ENABLE_CROSSHAIR_HIGHLIGHT
        } else {
            DISABLE_CROSSHAIR_HIGHLIGHT
        }
    }

    fn command_type(&self) -> CommandType {
        CommandType::Operation
    }

    fn handle(&self, _: &CommandBus, _: &NoParams) -> Result<bool, BusError> {
        self.state.inner.write().enabled = self.enabled;
        Ok(true)
    }
}

pub struct SetCrosshairHighlightColorOperation {
    state: Arc<CrosshairHighlightState>,
}

impl SetCrosshairHighlightColorOperation {
    pub fn new(state: Arc<CrosshairHighlightState>) -> Self {
        Self { state }
    }
}

impl CommandHandler for SetCrosshairHighlightColorOperation {
    type Params = SetCrosshairHighlightColorParams;

    fn id(&self) -> &str {
        SET_CROSSHAIR_HIGHLIGHT_COLOR
    }

    fn command_type(&self) -> CommandType {
        CommandType::Operation
    }

    /// Blank colors are refused.
    fn handle(&self, _: &CommandBus, params: &Self::Params) -> Result<bool, BusError> {
        let color = params.value.trim();
        if color.is_empty() {
            return Ok(false);
        }
        self.state.inner.write().color = color.to_string();
        Ok(true)
    }
}

pub fn register_crosshair_operations(
    bus: &CommandBus,
    state: &Arc<CrosshairHighlightState>,
) -> Result<(), BusError> {
    bus.register(SetCrosshairHighlightEnabledOperation::enable(state.clone()))?;
    bus.register(SetCrosshairHighlightEnabledOperation::disable(state.clone()))?;
    bus.register(SetCrosshairHighlightColorOperation::new(state.clone()))?;
    Ok(())
}
