//! Trigger engine

use std::collections::HashMap;

use tracing::{debug, info, warn};
use trigger_api::{Notification, ProviderStatus, TriggerMode, TriggerSpec, UpdateBatch};
use trigger_config::TriggerSettings;
use trigger_expr::{Evaluator, Value};
use trigger_host::SnapshotReader;
use trigger_util::{EntityId, MonotonicInstant, TriggerError, TriggerId};

use crate::{
    ContextResolver, CoreEvent, StartupRelease, SuppressionGate, TouchedPaths, Trigger,
    extract_identifiers,
};

/// Result of `configure`
#[derive(Debug)]
pub struct ConfigureReport {
    /// Number of triggers that loaded
    pub loaded: usize,
    /// Triggers that were skipped, with the reason
    pub errors: Vec<(TriggerId, TriggerError)>,
    pub status: ProviderStatus,
}

/// Owns the evaluator, the compiled triggers, and suppression state.
///
/// Batches must be handed over one at a time, in arrival order.
pub struct TriggerEngine {
    evaluator: Evaluator,
    resolver: ContextResolver,
    triggers: Vec<Trigger>,
    gate: SuppressionGate,
    self_id: Option<EntityId>,
    status: ProviderStatus,
}

impl TriggerEngine {
    pub fn new() -> Self {
        Self::with_evaluator(Evaluator::default())
    }

    /// Engine using a custom evaluator (extra transforms or functions)
    pub fn with_evaluator(evaluator: Evaluator) -> Self {
        Self {
            evaluator,
            resolver: ContextResolver::default(),
            triggers: Vec::new(),
            gate: SuppressionGate::open(MonotonicInstant::now()),
            self_id: None,
            status: ProviderStatus::Stopped,
        }
    }

    /// Replace all triggers and suppression state.
    ///
    /// Triggers that fail to compile are reported and skipped; the rest load.
    pub fn configure(
        &mut self,
        settings: &TriggerSettings,
        now: MonotonicInstant,
    ) -> ConfigureReport {
        self.resolver = ContextResolver::new(settings.variables.clone());
        self.self_id = settings.self_id.clone();
        self.gate = SuppressionGate::new(settings.startup_silence, settings.debounce, now);
        self.triggers.clear();

        let mut errors = Vec::new();
        for (index, spec) in settings.triggers.iter().enumerate() {
            let id = spec
                .name
                .as_deref()
                .map(TriggerId::new)
                .unwrap_or_else(|| TriggerId::from_index(index));

            match self.compile_trigger(id.clone(), spec) {
                Ok(trigger) => {
                    debug!(
                        trigger_id = %trigger.id,
                        mode = %trigger.mode(),
                        entity = %trigger.entity,
                        dependencies = ?trigger.dependencies(),
                        "Trigger loaded"
                    );
                    self.triggers.push(trigger);
                }
                Err(err) => {
                    warn!(trigger_id = %id, error = %err, "Skipping trigger");
                    errors.push((id, err));
                }
            }
        }

        self.status = if self.triggers.is_empty() {
            ProviderStatus::NoTriggersSet
        } else {
            ProviderStatus::Running
        };

        info!(
            loaded = self.triggers.len(),
            skipped = errors.len(),
            variables = self.resolver.mappings().len(),
            startup_silence_ms = settings.startup_silence.as_millis() as u64,
            debounce_ms = settings.debounce.as_millis() as u64,
            status = %self.status,
            "Trigger engine configured"
        );

        ConfigureReport {
            loaded: self.triggers.len(),
            errors,
            status: self.status,
        }
    }

    fn compile_trigger(
        &self,
        id: TriggerId,
        spec: &TriggerSpec,
    ) -> Result<Trigger, TriggerError> {
        let condition = spec
            .condition
            .as_deref()
            .ok_or_else(|| TriggerError::invalid_spec(&id, "missing condition"))?;
        let event = spec
            .event
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| TriggerError::invalid_spec(&id, "missing event"))?;
        let mode = match spec.trigger_type.as_deref() {
            Some(text) => text
                .parse::<TriggerMode>()
                .map_err(|e| TriggerError::invalid_spec(&id, e.to_string()))?,
            None => TriggerMode::default(),
        };
        let default_entity = match spec.context.as_deref() {
            Some(context) => EntityId::from_context(context).ok_or_else(|| {
                TriggerError::invalid_spec(&id, format!("invalid context '{}'", context))
            })?,
            None => EntityId::self_entity(),
        };

        let expression = self
            .evaluator
            .compile(condition)
            .map_err(|e| TriggerError::compile(&id, condition, e.to_string()))?;

        let names = match extract_identifiers(&expression) {
            Ok(names) => names,
            Err(TriggerError::UnsupportedExpressionNode { kind }) if mode != TriggerMode::Always => {
                warn!(
                    trigger_id = %id,
                    kind = %kind,
                    "Condition inputs cannot be determined; trigger has no dependencies"
                );
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        let mut entity: Option<EntityId> = None;
        let mut dependencies: Vec<String> = Vec::new();
        for name in &names {
            let resolved = self.resolver.resolve_path(name);
            let dep_entity = resolved.entity.unwrap_or_else(|| default_entity.clone());
            match &entity {
                Some(current) if !current.same_entity(&dep_entity, self.self_id.as_ref()) => {
                    return Err(TriggerError::invalid_spec(
                        &id,
                        format!(
                            "condition reads from more than one entity ('{}' and '{}')",
                            current, dep_entity
                        ),
                    ));
                }
                Some(_) => {}
                None => entity = Some(dep_entity),
            }
            if !dependencies.contains(&resolved.path) {
                dependencies.push(resolved.path);
            }
        }

        let entity = entity.unwrap_or_else(|| default_entity.clone());
        if spec.context.is_some() && !entity.same_entity(&default_entity, self.self_id.as_ref()) {
            return Err(TriggerError::invalid_spec(
                &id,
                format!(
                    "condition reads from '{}' but the trigger context is '{}'",
                    entity, default_entity
                ),
            ));
        }

        Ok(Trigger::new(id, event, entity, expression, mode, dependencies))
    }

    /// Evaluate every trigger for `batch`'s entity against the current data model
    pub fn handle_update(
        &mut self,
        batch: &UpdateBatch,
        snapshots: &dyn SnapshotReader,
        now: MonotonicInstant,
    ) -> Vec<CoreEvent> {
        if let Err(err) = batch.validate() {
            warn!(error = %err, "Skipping malformed update batch");
            return vec![CoreEvent::BatchSkipped {
                reason: err.to_string(),
            }];
        }
        let Some(touched) = TouchedPaths::from_batch(batch) else {
            return vec![CoreEvent::BatchSkipped {
                reason: "update batch names no entity".into(),
            }];
        };

        let mut events = Vec::new();
        let mut contexts: HashMap<EntityId, Value> = HashMap::new();

        for trigger in &mut self.triggers {
            if !touched.applies_to(&trigger.entity, self.self_id.as_ref()) {
                continue;
            }

            let context = contexts
                .entry(trigger.entity.clone())
                .or_insert_with(|| self.resolver.build_context(&trigger.entity, snapshots));

            let result = match self.evaluator.eval_bool(trigger.expression(), context) {
                Ok(result) => result,
                Err(err) => {
                    let err = TriggerError::evaluation(&trigger.id, err.to_string());
                    warn!(trigger_id = %trigger.id, error = %err, "Evaluation failed");
                    events.push(CoreEvent::EvaluationFailed {
                        trigger_id: trigger.id.clone(),
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            let dependency_touched =
                trigger.mode() == TriggerMode::Always && touched.touches(trigger.dependencies());
            let Some(transition) = trigger.observe(result, dependency_touched) else {
                continue;
            };

            match self.gate.check(&trigger.event, transition, now) {
                Ok(()) => {
                    debug!(
                        trigger_id = %trigger.id,
                        event = %trigger.event,
                        transition = %transition,
                        "Trigger fired"
                    );
                    events.push(CoreEvent::Fired {
                        trigger_id: trigger.id.clone(),
                        notification: Notification {
                            event: trigger.event.clone(),
                            transition,
                            value: batch.clone(),
                        },
                    });
                }
                Err(reason) => {
                    debug!(
                        trigger_id = %trigger.id,
                        event = %trigger.event,
                        transition = %transition,
                        reason = %reason,
                        "Notification suppressed"
                    );
                    events.push(CoreEvent::Suppressed {
                        trigger_id: trigger.id.clone(),
                        event: trigger.event.clone(),
                        transition,
                        reason,
                    });
                }
            }
        }

        events
    }

    /// Drop all triggers and suppression state. Safe to call repeatedly.
    pub fn reset(&mut self) {
        if !self.triggers.is_empty() {
            info!(count = self.triggers.len(), "Trigger engine reset");
        }
        self.triggers.clear();
        self.resolver = ContextResolver::default();
        self.gate = SuppressionGate::open(MonotonicInstant::now());
        self.self_id = None;
        self.status = ProviderStatus::Stopped;
    }

    pub fn status(&self) -> ProviderStatus {
        self.status
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    pub fn trigger(&self, id: &TriggerId) -> Option<&Trigger> {
        self.triggers.iter().find(|t| &t.id == id)
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Whether notifications are still held back by the startup quiet period
    pub fn is_silenced(&self, now: MonotonicInstant) -> bool {
        self.gate.startup().is_silenced(now)
    }

    /// Handle for a timer task that ends the startup quiet period
    pub fn startup_release(&self) -> StartupRelease {
        self.gate.startup().release_handle()
    }

    /// Drop expired debounce records
    pub fn cleanup(&mut self, now: MonotonicInstant) {
        self.gate.cleanup(now);
    }
}

impl Default for TriggerEngine {
    fn default() -> Self {
        Self::new()
    }
}
