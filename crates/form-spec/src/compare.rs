//! Comparison engine shared by visibility conditions and navigation rules.
//!
//! Answers arrive from different widgets: a number input may hand over `"42"`
//! while the condition was authored as `42`, and a checkbox answer `true` may
//! be compared against a condition value typed as `"true"`. A single scalar
//! coercion rule covers both, independent of the field's declared type: when
//! a string meets a number it is parsed as a number, and when a string meets a
//! boolean it is read as `"true"`/`"false"`. Everything else compares as given.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::Value;

use crate::error::EvaluationError;
use crate::expr::Comparison;

/// Evaluates `actual <comparison> expected`. `actual` is `None` when the
/// respondent has not answered.
pub fn compare(
    actual: Option<&Value>,
    comparison: &Comparison,
    expected: &Value,
) -> Result<bool, EvaluationError> {
    match comparison {
        Comparison::Equals => Ok(actual.is_some_and(|actual| loose_eq(actual, expected))),
        Comparison::NotEquals => Ok(!actual.is_some_and(|actual| loose_eq(actual, expected))),
        Comparison::GreaterThan => Ok(numeric_order(actual, expected) == Some(Ordering::Greater)),
        Comparison::LessThan => Ok(numeric_order(actual, expected) == Some(Ordering::Less)),
        Comparison::Includes => Ok(actual.is_some_and(|actual| includes(actual, expected))),
        Comparison::Unknown(name) => Err(EvaluationError::UnknownComparison(name.clone())),
    }
}

/// Equality under the scalar coercion rule.
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => left.as_f64() == right.as_f64(),
        (Value::Number(number), Value::String(text)) | (Value::String(text), Value::Number(number)) => {
            parse_number(text).is_some_and(|parsed| Some(parsed) == number.as_f64())
        }
        (Value::Bool(flag), Value::String(text)) | (Value::String(text), Value::Bool(flag)) => {
            parse_bool(text) == Some(*flag)
        }
        _ => left == right,
    }
}

/// Numbers as is, numeric strings parsed; anything else is not a number.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_number(text),
        _ => None,
    }
}

/// Text form of a scalar, used for substring and pattern checks.
pub fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(text) => Some(Cow::Borrowed(text.as_str())),
        Value::Number(number) => Some(Cow::Owned(number.to_string())),
        Value::Bool(flag) => Some(Cow::Owned(flag.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn parse_bool(text: &str) -> Option<bool> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn numeric_order(actual: Option<&Value>, expected: &Value) -> Option<Ordering> {
    let actual = as_number(actual?)?;
    let expected = as_number(expected)?;
    actual.partial_cmp(&expected)
}

fn includes(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::String(text) => {
            scalar_text(expected).is_some_and(|needle| text.contains(needle.as_ref()))
        }
        Value::Array(items) => items.iter().any(|item| loose_eq(item, expected)),
        _ => false,
    }
}
