use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Per-field validation rules. A missing entry means no constraint of that kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Character bounds. Held as authored; only non-negative integers
    /// constrain anything, other values are reported by `validate_schema`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Number>,
    /// Regular expression source, matched anywhere in the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Opaque expression handed to the host's custom validator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
}

impl Validation {
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }

    pub fn min_chars(&self) -> Option<usize> {
        length_bound(self.min_length.as_ref())
    }

    pub fn max_chars(&self) -> Option<usize> {
        length_bound(self.max_length.as_ref())
    }

    /// The `custom` expression, ignoring blank strings left behind by the editor.
    pub fn custom_expression(&self) -> Option<&str> {
        self.custom
            .as_deref()
            .map(str::trim)
            .filter(|expression| !expression.is_empty())
    }
}

/// A length bound usable as a constraint: a non-negative integer.
fn length_bound(bound: Option<&Number>) -> Option<usize> {
    bound
        .and_then(Number::as_u64)
        .and_then(|value| usize::try_from(value).ok())
}
