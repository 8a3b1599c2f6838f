//! Compiled triggers

use trigger_api::{TriggerMode, TransitionType};
use trigger_expr::Expression;
use trigger_util::{EntityId, TriggerId};

use crate::EdgeDetector;

/// A trigger ready for evaluation
#[derive(Debug, Clone)]
pub struct Trigger {
    pub id: TriggerId,
    pub event: String,
    /// Entity whose updates this trigger evaluates against
    pub entity: EntityId,
    expression: Expression,
    dependencies: Vec<String>,
    edge: EdgeDetector,
}

impl Trigger {
    pub fn new(
        id: TriggerId,
        event: impl Into<String>,
        entity: EntityId,
        expression: Expression,
        mode: TriggerMode,
        dependencies: Vec<String>,
    ) -> Self {
        Self {
            id,
            event: event.into(),
            entity,
            expression,
            dependencies,
            edge: EdgeDetector::new(mode),
        }
    }

    pub fn mode(&self) -> TriggerMode {
        self.edge.mode()
    }

    pub fn condition(&self) -> &str {
        self.expression.source()
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Concrete paths the condition reads, relative to `entity`
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn previous_result(&self) -> bool {
        self.edge.previous()
    }

    pub(crate) fn observe(&mut self, result: bool, dependency_touched: bool) -> Option<TransitionType> {
        self.edge.observe(result, dependency_touched)
    }
}
