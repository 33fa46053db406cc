use std::collections::{HashMap, HashSet};
use std::fmt;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::expr::{Comparison, VisibilityCondition};
use crate::spec::element::{Element, Field};
use crate::spec::form::FormSchema;
use crate::spec::step::Step;

/// Where a field reference or comparison operator was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ConditionSite {
    StepVisibility,
    FieldVisibility { element_id: String },
    NavigationRule { index: usize },
}

impl fmt::Display for ConditionSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionSite::StepVisibility => write!(f, "step visibility condition"),
            ConditionSite::FieldVisibility { element_id } => {
                write!(f, "visibility condition of field '{}'", element_id)
            }
            ConditionSite::NavigationRule { index } => write!(f, "navigation rule #{}", index),
        }
    }
}

/// Where a step reference was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepReference {
    NavigationRule { index: usize },
    DefaultNextStep,
}

impl fmt::Display for StepReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepReference::NavigationRule { index } => write!(f, "navigation rule #{}", index),
            StepReference::DefaultNextStep => write!(f, "defaultNextStep"),
        }
    }
}

/// Structural problem in a form document. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "code", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum SchemaError {
    #[error("form has no steps")]
    EmptyForm,
    #[error("step id '{step_id}' is used more than once")]
    DuplicateStepId { step_id: String },
    #[error("element id '{element_id}' is used more than once in step '{step_id}'")]
    DuplicateElementId { step_id: String, element_id: String },
    #[error("{via} of step '{step_id}' points at missing step '{target}'")]
    DanglingStep {
        step_id: String,
        target: String,
        via: StepReference,
    },
    #[error("{site} of step '{step_id}' references unknown field '{field_id}'")]
    UnknownField {
        step_id: String,
        field_id: String,
        site: ConditionSite,
    },
    #[error("{site} of step '{step_id}' references '{field_id}', which is not a field")]
    NotAField {
        step_id: String,
        field_id: String,
        site: ConditionSite,
    },
    #[error("{site} of step '{step_id}' uses unknown comparison '{comparison}'")]
    UnknownComparison {
        step_id: String,
        comparison: String,
        site: ConditionSite,
    },
    #[error("step '{step_id}' has {columns} columns; at least 1 is required")]
    ColumnsOutOfRange { step_id: String, columns: i64 },
    #[error("field '{element_id}' in step '{step_id}' has colSpan {col_span}; expected 1..=12")]
    ColSpanOutOfRange {
        step_id: String,
        element_id: String,
        col_span: i64,
    },
    #[error("field '{element_id}' in step '{step_id}' has an invalid pattern: {message}")]
    InvalidPattern {
        step_id: String,
        element_id: String,
        message: String,
    },
    #[error(
        "field '{element_id}' in step '{step_id}' has {rule} {value}; expected a non-negative integer"
    )]
    BoundOutOfRange {
        step_id: String,
        element_id: String,
        rule: String,
        value: String,
    },
    #[error("field '{element_id}' in step '{step_id}' has {lower} greater than {upper}")]
    InvertedBounds {
        step_id: String,
        element_id: String,
        lower: String,
        upper: String,
    },
}

/// Structural checks over a whole document.
///
/// Field references are resolved against every step of the form, not only
/// the steps before the one holding the condition.
pub fn validate_schema(form: &FormSchema) -> Vec<SchemaError> {
    let mut errors = Vec::new();

    if form.steps.is_empty() {
        errors.push(SchemaError::EmptyForm);
    }

    let mut step_ids = HashSet::new();
    for step in &form.steps {
        if !step_ids.insert(step.id.as_str()) {
            errors.push(SchemaError::DuplicateStepId {
                step_id: step.id.clone(),
            });
        }
    }

    let elements = element_index(form);
    let checker = Checker {
        step_ids: &step_ids,
        elements: &elements,
    };
    for step in &form.steps {
        checker.check_step(step, &mut errors);
    }

    errors
}

/// Element id to "is it a field". A field wins over a block sharing its id.
fn element_index(form: &FormSchema) -> HashMap<&str, bool> {
    let mut index = HashMap::new();
    for element in form.steps.iter().flat_map(|step| &step.elements) {
        let is_field = matches!(element, Element::Field(_));
        index
            .entry(element.id())
            .and_modify(|known: &mut bool| *known |= is_field)
            .or_insert(is_field);
    }
    index
}

struct Checker<'a> {
    step_ids: &'a HashSet<&'a str>,
    elements: &'a HashMap<&'a str, bool>,
}

impl Checker<'_> {
    fn check_step(&self, step: &Step, errors: &mut Vec<SchemaError>) {
        if step.layout.columns < 1 {
            errors.push(SchemaError::ColumnsOutOfRange {
                step_id: step.id.clone(),
                columns: step.layout.columns,
            });
        }

        let mut element_ids = HashSet::new();
        for element in &step.elements {
            if !element_ids.insert(element.id()) {
                errors.push(SchemaError::DuplicateElementId {
                    step_id: step.id.clone(),
                    element_id: element.id().to_string(),
                });
            }
            if let Element::Field(field) = element {
                self.check_field(step, field, errors);
            }
        }

        if let Some(condition) = &step.visibility_condition {
            self.check_condition(step, condition, ConditionSite::StepVisibility, errors);
        }

        for (index, rule) in step.rules().iter().enumerate() {
            let site = ConditionSite::NavigationRule { index };
            self.check_field_ref(step, &rule.field_id, &site, errors);
            self.check_comparison(step, &rule.comparison, &site, errors);
            self.check_step_ref(
                step,
                &rule.go_to_step,
                StepReference::NavigationRule { index },
                errors,
            );
        }

        if let Some(target) = &step.default_next_step {
            self.check_step_ref(step, target, StepReference::DefaultNextStep, errors);
        }
    }

    fn check_field(&self, step: &Step, field: &Field, errors: &mut Vec<SchemaError>) {
        if let Some(layout) = &field.layout
            && !(1..=12).contains(&layout.col_span)
        {
            errors.push(SchemaError::ColSpanOutOfRange {
                step_id: step.id.clone(),
                element_id: field.id.clone(),
                col_span: layout.col_span,
            });
        }

        if let Some(rules) = &field.validation {
            if let Some(pattern) = &rules.pattern
                && let Err(err) = Regex::new(pattern)
            {
                errors.push(SchemaError::InvalidPattern {
                    step_id: step.id.clone(),
                    element_id: field.id.clone(),
                    message: err.to_string(),
                });
            }
            let lengths = [("minLength", &rules.min_length), ("maxLength", &rules.max_length)];
            for (rule, bound) in lengths {
                if let Some(bound) = bound
                    && bound.as_u64().is_none()
                {
                    errors.push(SchemaError::BoundOutOfRange {
                        step_id: step.id.clone(),
                        element_id: field.id.clone(),
                        rule: rule.into(),
                        value: bound.to_string(),
                    });
                }
            }
            if let (Some(min), Some(max)) = (rules.min_chars(), rules.max_chars())
                && min > max
            {
                errors.push(inverted(step, field, "minLength", "maxLength"));
            }
            if let (Some(min), Some(max)) = (
                rules.min.as_ref().and_then(|n| n.as_f64()),
                rules.max.as_ref().and_then(|n| n.as_f64()),
            ) && min > max
            {
                errors.push(inverted(step, field, "min", "max"));
            }
        }

        if let Some(condition) = &field.visibility_condition {
            let site = ConditionSite::FieldVisibility {
                element_id: field.id.clone(),
            };
            self.check_condition(step, condition, site, errors);
        }
    }

    fn check_condition(
        &self,
        step: &Step,
        condition: &VisibilityCondition,
        site: ConditionSite,
        errors: &mut Vec<SchemaError>,
    ) {
        for entry in &condition.conditions {
            self.check_field_ref(step, &entry.field_id, &site, errors);
            self.check_comparison(step, &entry.comparison, &site, errors);
        }
    }

    fn check_field_ref(
        &self,
        step: &Step,
        field_id: &str,
        site: &ConditionSite,
        errors: &mut Vec<SchemaError>,
    ) {
        match self.elements.get(field_id) {
            Some(true) => {}
            Some(false) => errors.push(SchemaError::NotAField {
                step_id: step.id.clone(),
                field_id: field_id.to_string(),
                site: site.clone(),
            }),
            None => errors.push(SchemaError::UnknownField {
                step_id: step.id.clone(),
                field_id: field_id.to_string(),
                site: site.clone(),
            }),
        }
    }

    fn check_comparison(
        &self,
        step: &Step,
        comparison: &Comparison,
        site: &ConditionSite,
        errors: &mut Vec<SchemaError>,
    ) {
        if !comparison.is_known() {
            errors.push(SchemaError::UnknownComparison {
                step_id: step.id.clone(),
                comparison: comparison.to_string(),
                site: site.clone(),
            });
        }
    }

    fn check_step_ref(
        &self,
        step: &Step,
        target: &str,
        via: StepReference,
        errors: &mut Vec<SchemaError>,
    ) {
        if !self.step_ids.contains(target) {
            errors.push(SchemaError::DanglingStep {
                step_id: step.id.clone(),
                target: target.to_string(),
                via,
            });
        }
    }
}

fn inverted(step: &Step, field: &Field, lower: &str, upper: &str) -> SchemaError {
    SchemaError::InvertedBounds {
        step_id: step.id.clone(),
        element_id: field.id.clone(),
        lower: lower.into(),
        upper: upper.into(),
    }
}
