use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

use crate::error::EvaluationError;
use crate::navigation::{NextStep, resolve_next_step};
use crate::spec::form::FormSchema;
use crate::spec::step::Step;
use crate::visibility::is_visible;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressError {
    #[error("form has no steps")]
    EmptyForm,
    #[error("navigation points at unknown step '{0}'")]
    UnknownStep(String),
    #[error("navigation revisits step '{0}'")]
    Cycle(String),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Ordered ids of the steps a respondent sees for `answers`, starting at the
/// first step. Hidden steps are passed through: their own rules still decide
/// where navigation goes, but they are not part of the path.
pub fn walk_path(form: &FormSchema, answers: &Value) -> Result<Vec<String>, ProgressError> {
    let first = form.first_step().ok_or(ProgressError::EmptyForm)?;
    let mut seen = HashSet::from([first.id.as_str()]);
    let mut path = Vec::new();

    if is_visible(first.visibility_condition.as_ref(), answers)? {
        path.push(first.id.clone());
    }

    let mut current = first;
    while let Some(next) = next_visible(form, current, answers, &mut seen)? {
        path.push(next.id.clone());
        current = next;
    }

    Ok(path)
}

/// The next visible step after `step_id`, or [`NextStep::Complete`].
pub fn step_after(
    form: &FormSchema,
    step_id: &str,
    answers: &Value,
) -> Result<NextStep, ProgressError> {
    let from = form
        .step(step_id)
        .ok_or_else(|| ProgressError::UnknownStep(step_id.to_string()))?;
    let mut seen = HashSet::from([from.id.as_str()]);
    Ok(match next_visible(form, from, answers, &mut seen)? {
        Some(step) => NextStep::Step(step.id.clone()),
        None => NextStep::Complete,
    })
}

fn next_visible<'a>(
    form: &'a FormSchema,
    from: &'a Step,
    answers: &Value,
    seen: &mut HashSet<&'a str>,
) -> Result<Option<&'a Step>, ProgressError> {
    let mut current = from;
    loop {
        let target_id = match resolve_next_step(current, answers)? {
            NextStep::Complete => return Ok(None),
            NextStep::Step(id) => id,
        };
        let Some(target) = form.step(&target_id) else {
            return Err(ProgressError::UnknownStep(target_id));
        };
        if !seen.insert(target.id.as_str()) {
            return Err(ProgressError::Cycle(target_id));
        }
        if is_visible(target.visibility_condition.as_ref(), answers)? {
            return Ok(Some(target));
        }
        current = target;
    }
}
