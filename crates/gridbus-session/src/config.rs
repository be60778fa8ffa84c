use gridbus_engine::{BusConfig, SubUnitConfig};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

pub const DEFAULT_CROSSHAIR_COLOR: &str = "rgba(58, 96, 247, 0.16)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionMode {
    /// No undo history; every edit is final.
    Ephemeral,
    /// Default session behavior (undo history capped at 100 steps).
    Interactive,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Width of a column with no explicit width, for new sheets.
    pub default_column_width: f64,
    pub default_row_height: f64,
    pub record_history: bool,
    pub max_undo_steps: Option<usize>,
    pub crosshair_highlight_color: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::interactive()
    }
}

impl SessionConfig {
    pub fn ephemeral() -> Self {
        Self {
            record_history: false,
            max_undo_steps: None,
            ..Self::interactive()
        }
    }

    pub fn interactive() -> Self {
        let sheet = SubUnitConfig::default();
        Self {
            default_column_width: sheet.default_column_width,
            default_row_height: sheet.default_row_height,
            record_history: true,
            max_undo_steps: Some(100),
            crosshair_highlight_color: DEFAULT_CROSSHAIR_COLOR.to_string(),
        }
    }

    pub fn for_mode(mode: SessionMode) -> Self {
        match mode {
            SessionMode::Ephemeral => Self::ephemeral(),
            SessionMode::Interactive => Self::interactive(),
        }
    }

    /// Parse a camelCase JSON config. Missing fields take their interactive
    /// defaults.
    #[cfg(feature = "json")]
    pub fn from_json_str(json: &str) -> Result<Self, SessionError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SessionError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        for (name, size) in [
            ("defaultColumnWidth", self.default_column_width),
            ("defaultRowHeight", self.default_row_height),
        ] {
            if !size.is_finite() || size < 0.0 {
                return Err(SessionError::invalid_config(format!(
                    "{name} must be a finite, non-negative size (got {size})"
                )));
            }
        }
        if self.max_undo_steps == Some(0) && self.record_history {
            return Err(SessionError::invalid_config(
                "maxUndoSteps of 0 with recordHistory; use recordHistory = false",
            ));
        }
        Ok(())
    }

    pub fn bus_config(&self) -> BusConfig {
        BusConfig {
            record_history: self.record_history,
            max_undo_steps: self.max_undo_steps,
        }
    }

    pub fn sub_unit_config(&self) -> SubUnitConfig {
        SubUnitConfig {
            default_column_width: self.default_column_width,
            default_row_height: self.default_row_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_differ_only_in_history() {
        let interactive = SessionConfig::interactive();
        let ephemeral = SessionConfig::ephemeral();
        assert!(interactive.record_history);
        assert_eq!(interactive.max_undo_steps, Some(100));
        assert!(!ephemeral.record_history);
        assert_eq!(ephemeral.default_column_width, 88.0);
        assert_eq!(ephemeral.default_row_height, 24.0);
        assert_eq!(SessionConfig::default(), interactive);
    }

    #[test]
    fn negative_width_is_rejected() {
        let config = SessionConfig {
            default_column_width: -1.0,
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SessionError::InvalidConfig { .. })
        ));
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config =
            SessionConfig::from_json_str(r#"{ "defaultColumnWidth": 72, "maxUndoSteps": null }"#)
                .unwrap();
        assert_eq!(config.default_column_width, 72.0);
        assert_eq!(config.default_row_height, 24.0);
        assert_eq!(config.max_undo_steps, None);
        assert!(config.record_history);
    }

    #[cfg(feature = "json")]
    #[test]
    fn malformed_json_is_invalid_config() {
        assert!(matches!(
            SessionConfig::from_json_str("{ \"recordHistory\": 3 }"),
            Err(SessionError::InvalidConfig { .. })
        ));
    }
}
