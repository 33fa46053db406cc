use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::error::EvaluationError;
use crate::expr::{Predicate, VisibilityCondition};
use crate::spec::form::FormSchema;

/// Visibility of every step and field of a form for one answer snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisibilityMap {
    pub steps: BTreeMap<String, bool>,
    pub fields: BTreeMap<String, bool>,
}

impl VisibilityMap {
    pub fn step_visible(&self, id: &str) -> bool {
        self.steps.get(id).copied().unwrap_or(true)
    }

    pub fn field_visible(&self, id: &str) -> bool {
        self.fields.get(id).copied().unwrap_or(true)
    }
}

/// Decides whether a step or field guarded by `condition` is shown.
pub fn is_visible(
    condition: Option<&VisibilityCondition>,
    answers: &Value,
) -> Result<bool, EvaluationError> {
    match condition {
        Some(condition) => condition.holds(answers),
        None => Ok(true),
    }
}

/// Resolves visibility for the whole form. A field inside a hidden step is
/// hidden regardless of its own condition.
pub fn resolve_visibility(
    form: &FormSchema,
    answers: &Value,
) -> Result<VisibilityMap, EvaluationError> {
    let mut map = VisibilityMap::default();

    for step in &form.steps {
        let step_visible = is_visible(step.visibility_condition.as_ref(), answers)?;
        trace!(step = %step.id, visible = step_visible, "step visibility");
        map.steps.insert(step.id.clone(), step_visible);

        for field in step.fields() {
            let own = is_visible(field.visibility_condition.as_ref(), answers)?;
            let visible = step_visible && own;
            // Field ids share one answer namespace; a field repeated across
            // steps counts as visible if any copy is.
            map.fields
                .entry(field.id.clone())
                .and_modify(|current| *current |= visible)
                .or_insert(visible);
        }
    }

    Ok(map)
}
