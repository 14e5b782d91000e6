//! Engine configuration
//!
//! Tunables for the render engine's timing and painting behavior. Hosts
//! usually embed the defaults; a YAML file works too.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::record::DEFAULT_HIGHLIGHT_COLOR;

const DEFAULT_SETTLE_DELAY_MS: u64 = 500;
const DEFAULT_DEBOUNCE_MS: u64 = 150;
const DEFAULT_SCALE_EPSILON: f32 = 1e-3;

/// Failure loading options from a file
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("reading options file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing options file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Render engine tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Settling delay before the surface is assumed mounted.
    ///
    /// An accommodation for renderers without a mount signal; hosts that
    /// have one should call `mark_ready` instead and leave this alone.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Quiet period for coalescing bursts of selection-change signals
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Scale changes below this are layout jitter, not zooms
    #[serde(default = "default_scale_epsilon")]
    pub scale_epsilon: f32,

    /// Color painted for records that carry none
    #[serde(default = "default_color")]
    pub default_color: String,
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_scale_epsilon() -> f32 {
    DEFAULT_SCALE_EPSILON
}

fn default_color() -> String {
    DEFAULT_HIGHLIGHT_COLOR.to_string()
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            debounce_ms: default_debounce_ms(),
            scale_epsilon: default_scale_epsilon(),
            default_color: default_color(),
        }
    }
}

impl EngineOptions {
    pub fn from_file(path: &Path) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[must_use]
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let options = EngineOptions::default();
        assert_eq!(options.settle_delay(), Duration::from_millis(500));
        assert_eq!(options.debounce_window(), Duration::from_millis(150));
        assert!(options.scale_epsilon > 0.0);
        assert_eq!(options.default_color, DEFAULT_HIGHLIGHT_COLOR);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let options: EngineOptions = serde_yaml::from_str("settle_delay_ms: 50\n").unwrap();
        assert_eq!(options.settle_delay_ms, 50);
        assert_eq!(options.debounce_ms, DEFAULT_DEBOUNCE_MS);
        assert_eq!(options.default_color, DEFAULT_HIGHLIGHT_COLOR);
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = EngineOptions::from_file(Path::new("/no/such/options.yaml")).unwrap_err();
        assert!(matches!(err, OptionsError::Io(_)));
    }
}
