use std::collections::BTreeSet;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::compare::{as_number, scalar_text};
use crate::error::EvaluationError;
use crate::spec::element::{Field, FieldType};
use crate::spec::form::FormSchema;
use crate::spec::step::Step;
use crate::spec::validation::Validation;
use crate::visibility::{VisibilityMap, is_visible, resolve_visibility};

/// Which rule a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ValidationRule {
    Required,
    MinLength,
    MaxLength,
    Min,
    Max,
    Pattern,
    #[serde(rename = "option")]
    AllowedOption,
    Custom,
}

/// One failing rule for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub field_id: String,
    pub rule: ValidationRule,
    pub message: String,
}

/// Verdict returned by a host-supplied custom validator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CustomOutcome {
    pub valid: bool,
    pub message: Option<String>,
}

impl CustomOutcome {
    pub fn pass() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// Evaluates `custom` rule expressions. The expression language and any
/// sandboxing belong to the host.
///
/// `value` is the answer of the field carrying the rule; `answers` is the
/// whole answer map, for rules that look at other fields.
pub trait CustomValidator {
    fn evaluate(&self, expression: &str, value: Option<&Value>, answers: &Value) -> CustomOutcome;
}

impl<F> CustomValidator for F
where
    F: Fn(&str, Option<&Value>, &Value) -> CustomOutcome,
{
    fn evaluate(&self, expression: &str, value: Option<&Value>, answers: &Value) -> CustomOutcome {
        self(expression, value, answers)
    }
}

/// A field with its pattern compiled once.
#[derive(Debug, Clone)]
pub struct FieldValidator<'a> {
    field: &'a Field,
    pattern: Option<Regex>,
}

impl<'a> FieldValidator<'a> {
    pub fn compile(field: &'a Field) -> Result<Self, EvaluationError> {
        let pattern = field
            .validation
            .as_ref()
            .and_then(|rules| rules.pattern.as_deref())
            .map(|source| {
                Regex::new(source).map_err(|err| EvaluationError::InvalidPattern {
                    field_id: field.id.clone(),
                    pattern: source.to_string(),
                    message: err.to_string(),
                })
            })
            .transpose()?;
        Ok(Self { field, pattern })
    }

    pub fn field(&self) -> &'a Field {
        self.field
    }

    /// Runs every rule against `value` and returns all failures, in rule
    /// order. `answers` is only consulted by custom rules.
    pub fn check(
        &self,
        value: Option<&Value>,
        answers: &Value,
        custom: Option<&dyn CustomValidator>,
    ) -> Result<Vec<ValidationError>, EvaluationError> {
        let no_rules = Validation::default();
        let rules = self.field.validation.as_ref().unwrap_or(&no_rules);
        let mut errors = Vec::new();

        if rules.is_required() && is_blank(self.field.field_type, value) {
            errors.push(self.error(ValidationRule::Required, "value is required"));
        }

        if let Some(Value::String(text)) = value {
            let length = text.chars().count();
            if let Some(min_len) = rules.min_chars()
                && length < min_len
            {
                errors.push(self.error(
                    ValidationRule::MinLength,
                    format!("must be at least {} characters", min_len),
                ));
            }
            if let Some(max_len) = rules.max_chars()
                && length > max_len
            {
                errors.push(self.error(
                    ValidationRule::MaxLength,
                    format!("must be at most {} characters", max_len),
                ));
            }
        }

        if self.field.field_type.is_numeric()
            && let Some(value) = present(value)
        {
            let number = as_number(value);
            if let Some(min) = &rules.min {
                self.check_bound(&mut errors, ValidationRule::Min, number, min);
            }
            if let Some(max) = &rules.max {
                self.check_bound(&mut errors, ValidationRule::Max, number, max);
            }
        }

        if let Some(regex) = &self.pattern
            && let Some(text) = present(value).and_then(scalar_text)
            && !regex.is_match(&text)
        {
            errors.push(self.error(ValidationRule::Pattern, "value does not match pattern"));
        }

        if self.field.field_type.has_options()
            && let Some(options) = self.field.options.as_deref()
            && !options.is_empty()
            && let Some(text) = present(value).and_then(scalar_text)
            && !options.iter().any(|option| option.value == text)
        {
            errors.push(self.error(
                ValidationRule::AllowedOption,
                "value is not one of the allowed options",
            ));
        }

        if let Some(expression) = rules.custom_expression() {
            let validator = custom.ok_or_else(|| EvaluationError::MissingCustomValidator {
                field_id: self.field.id.clone(),
            })?;
            let outcome = validator.evaluate(expression, value, answers);
            if !outcome.valid {
                let message = outcome
                    .message
                    .unwrap_or_else(|| format!("custom rule '{}' failed", expression));
                errors.push(self.error(ValidationRule::Custom, message));
            }
        }

        Ok(errors)
    }

    fn check_bound(
        &self,
        errors: &mut Vec<ValidationError>,
        rule: ValidationRule,
        number: Option<f64>,
        bound: &Number,
    ) {
        let Some(number) = number else {
            errors.push(self.error(rule, "value is not a number"));
            return;
        };
        let Some(limit) = bound.as_f64() else {
            return;
        };
        match rule {
            ValidationRule::Min if number < limit => {
                errors.push(self.error(rule, format!("value below minimum {}", bound)));
            }
            ValidationRule::Max if number > limit => {
                errors.push(self.error(rule, format!("value above maximum {}", bound)));
            }
            _ => {}
        }
    }

    fn error(&self, rule: ValidationRule, message: impl Into<String>) -> ValidationError {
        ValidationError {
            field_id: self.field.id.clone(),
            rule,
            message: message.into(),
        }
    }
}

/// Checks one field's value against its rules. Custom rules see an answer
/// map holding only this field.
///
/// Compiles the field's pattern on every call; hold a [`FieldValidator`] or
/// [`FormValidator`] to compile once.
pub fn validate(
    field: &Field,
    value: Option<&Value>,
    custom: Option<&dyn CustomValidator>,
) -> Result<Vec<ValidationError>, EvaluationError> {
    let mut answers = Map::new();
    if let Some(value) = value {
        answers.insert(field.id.clone(), value.clone());
    }
    FieldValidator::compile(field)?.check(value, &Value::Object(answers), custom)
}

fn is_blank(field_type: FieldType, value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(Value::Bool(false)) => field_type == FieldType::Checkbox,
        Some(_) => false,
    }
}

/// Value worth checking against content rules: answered and not empty.
fn present(value: Option<&Value>) -> Option<&Value> {
    match value? {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        other => Some(other),
    }
}

/// Result of validating a step or a whole form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub unknown_fields: Vec<String>,
}

/// Every field of a form compiled up front. A malformed pattern anywhere in
/// the form is reported by [`FormValidator::compile`] and nowhere else.
#[derive(Debug, Clone)]
pub struct FormValidator<'a> {
    form: &'a FormSchema,
    fields: Vec<(&'a str, FieldValidator<'a>)>,
}

impl<'a> FormValidator<'a> {
    pub fn compile(form: &'a FormSchema) -> Result<Self, EvaluationError> {
        let fields = form
            .fields()
            .map(|(step, field)| Ok((step.id.as_str(), FieldValidator::compile(field)?)))
            .collect::<Result<Vec<_>, EvaluationError>>()?;
        Ok(Self { form, fields })
    }

    /// Validates the visible fields of one step.
    pub fn validate_step(
        &self,
        step_id: &str,
        answers: &Value,
        custom: Option<&dyn CustomValidator>,
    ) -> Result<ValidationReport, EvaluationError> {
        let step = self
            .form
            .step(step_id)
            .ok_or_else(|| EvaluationError::UnknownStep(step_id.to_string()))?;
        self.run(Some(step), answers, custom)
    }

    /// Validates the visible fields of every visible step.
    pub fn validate_form(
        &self,
        answers: &Value,
        custom: Option<&dyn CustomValidator>,
    ) -> Result<ValidationReport, EvaluationError> {
        self.run(None, answers, custom)
    }

    fn run(
        &self,
        only: Option<&Step>,
        answers: &Value,
        custom: Option<&dyn CustomValidator>,
    ) -> Result<ValidationReport, EvaluationError> {
        let visibility = resolve_visibility(self.form, answers)?;
        let mut errors = Vec::new();

        for (step_id, validator) in &self.fields {
            if only.is_some_and(|step| step.id != *step_id) {
                continue;
            }
            if !is_shown(&visibility, step_id, validator.field(), answers)? {
                debug!(field = %validator.field().id, step = %step_id, "skipping hidden field");
                continue;
            }
            let value = answers.get(&validator.field().id);
            errors.extend(validator.check(value, answers, custom)?);
        }

        let known: BTreeSet<&str> = self
            .fields
            .iter()
            .map(|(_, validator)| validator.field().id.as_str())
            .collect();
        let unknown_fields: Vec<String> = answers
            .as_object()
            .map(|map| {
                map.keys()
                    .filter(|key| !known.contains(key.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(ValidationReport {
            valid: errors.is_empty() && unknown_fields.is_empty(),
            errors,
            unknown_fields,
        })
    }
}

/// Decided per occurrence: the map's field entries merge fields that share
/// an id across steps, so only its step entries are used here.
fn is_shown(
    visibility: &VisibilityMap,
    step_id: &str,
    field: &Field,
    answers: &Value,
) -> Result<bool, EvaluationError> {
    let own = is_visible(field.visibility_condition.as_ref(), answers)?;
    Ok(visibility.step_visible(step_id) && own)
}
