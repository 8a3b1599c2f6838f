//! Validated settings ready for use by the trigger engine

use crate::schema::RawConfig;
use std::time::Duration;
use trigger_api::{TriggerSpec, VariableMapping};
use trigger_util::{EntityId, duration_from_secs};

/// Everything the engine needs to (re)configure itself
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerSettings {
    /// Ordered variable mappings, shared by all triggers
    pub variables: Vec<VariableMapping>,

    /// Trigger definitions in config order
    pub triggers: Vec<TriggerSpec>,

    /// Notifications are computed but not emitted for this long after configure
    pub startup_silence: Duration,

    /// Minimum spacing of notifications with the same event and transition
    pub debounce: Duration,

    /// Real id of the `self` vessel, if known
    pub self_id: Option<EntityId>,
}

impl TriggerSettings {
    pub fn new(variables: Vec<VariableMapping>, triggers: Vec<TriggerSpec>) -> Self {
        Self {
            variables,
            triggers,
            ..Default::default()
        }
    }

    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let seconds = |value: Option<f64>| {
            value
                .and_then(duration_from_secs)
                .unwrap_or(Duration::ZERO)
        };

        Self {
            startup_silence: seconds(raw.engine.startup_silence_seconds),
            debounce: seconds(raw.engine.debounce_seconds),
            self_id: raw
                .engine
                .self_id
                .as_deref()
                .and_then(EntityId::from_context),
            variables: raw.variables,
            triggers: raw.triggers,
        }
    }

    pub fn with_startup_silence(mut self, silence: Duration) -> Self {
        self.startup_silence = silence;
        self
    }

    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    pub fn with_self_id(mut self, self_id: EntityId) -> Self {
        self.self_id = Some(self_id);
        self
    }
}
