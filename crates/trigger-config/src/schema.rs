//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use trigger_api::{TriggerSpec, VariableMapping};

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Engine-level settings
    #[serde(default)]
    pub engine: RawEngineConfig,

    /// Logical variable names usable in conditions
    #[serde(default)]
    pub variables: Vec<VariableMapping>,

    /// Trigger definitions; per-trigger fields are checked by the engine
    #[serde(default)]
    pub triggers: Vec<TriggerSpec>,
}

/// Engine-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawEngineConfig {
    /// Quiet period after (re)configuration, in seconds (default 0)
    pub startup_silence_seconds: Option<f64>,

    /// Minimum spacing of identical notifications, in seconds (default 0)
    pub debounce_seconds: Option<f64>,

    /// Real id of the `self` vessel, e.g. `urn:mrn:imo:mmsi:230000000`
    pub self_id: Option<String>,
}
