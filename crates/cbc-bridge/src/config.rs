//! Bridge configuration types.

use crate::error::BridgeError;
use cbc_bridge_sys::CBC_INFINITY;
use serde::{Deserialize, Serialize};
use std::env;

const ENV_INFINITY: &str = "CBC_BRIDGE_INFINITY";
const ENV_CAPTURE_MEMORY: &str = "CBC_BRIDGE_CAPTURE_MEMORY";

/// Configuration for binding-side behavior.
///
/// The native ABI exposes no engine options, so everything here governs how
/// data is marshaled and what gets recorded around native calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Magnitude standing in for infinity on the native side. Bounds at or
    /// beyond it (including `f64::INFINITY`) are clamped to it.
    pub infinity: f64,
    /// Record process RSS around the native solve.
    pub capture_memory: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            infinity: CBC_INFINITY,
            capture_memory: false,
        }
    }
}

impl BridgeConfig {
    /// Create a new configuration with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the infinity sentinel.
    pub fn with_infinity(mut self, infinity: f64) -> Self {
        self.infinity = infinity;
        self
    }

    /// Enable or disable RSS capture around solves.
    pub fn with_capture_memory(mut self, enabled: bool) -> Self {
        self.capture_memory = enabled;
        self
    }

    /// Build a configuration from `CBC_BRIDGE_*` environment variables,
    /// falling back to defaults for unset ones.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, BridgeError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse a configuration from JSON. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` on malformed JSON or an invalid sentinel.
    pub fn from_json(json: &str) -> Result<Self, BridgeError> {
        let config: BridgeConfig = serde_json::from_str(json)
            .map_err(|err| BridgeError::invalid_input("config", err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, BridgeError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_INFINITY) {
            config.infinity = raw.trim().parse::<f64>().map_err(|err| {
                BridgeError::invalid_input("config", format!("{ENV_INFINITY}={raw:?}: {err}"))
            })?;
        }
        if let Some(raw) = lookup(ENV_CAPTURE_MEMORY) {
            config.capture_memory = parse_flag(&raw).ok_or_else(|| {
                BridgeError::invalid_input(
                    "config",
                    format!("{ENV_CAPTURE_MEMORY}={raw:?}: expected true/false/1/0"),
                )
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// The sentinel must be a positive finite number.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if !(self.infinity.is_finite() && self.infinity > 0.0) {
            return Err(BridgeError::invalid_input(
                "config",
                format!("infinity must be positive and finite, got {}", self.infinity),
            ));
        }
        Ok(())
    }

    /// Clamp a bound into `[-infinity, infinity]`.
    pub(crate) fn native_bound(&self, value: f64) -> f64 {
        value.clamp(-self.infinity, self.infinity)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
