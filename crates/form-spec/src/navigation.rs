use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::EvaluationError;
use crate::expr::Predicate;
use crate::spec::step::Step;

/// Outcome of leaving a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "stepId", rename_all = "snake_case")]
pub enum NextStep {
    /// Continue with the step carrying this id.
    Step(String),
    /// Nothing follows; the form is finished.
    Complete,
}

impl NextStep {
    pub fn step_id(&self) -> Option<&str> {
        match self {
            NextStep::Step(id) => Some(id),
            NextStep::Complete => None,
        }
    }
}

/// Picks the step that follows `step`: the first matching rule in authored
/// order, then `defaultNextStep`, then [`NextStep::Complete`].
pub fn resolve_next_step(step: &Step, answers: &Value) -> Result<NextStep, EvaluationError> {
    for (index, rule) in step.rules().iter().enumerate() {
        if rule.holds(answers)? {
            debug!(
                step = %step.id,
                rule = index,
                target = %rule.go_to_step,
                "navigation rule matched"
            );
            return Ok(NextStep::Step(rule.go_to_step.clone()));
        }
    }

    match &step.default_next_step {
        Some(target) => {
            debug!(step = %step.id, target = %target, "falling back to default next step");
            Ok(NextStep::Step(target.clone()))
        }
        None => Ok(NextStep::Complete),
    }
}
