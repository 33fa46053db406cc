use std::borrow::Cow;
use std::fmt;

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::compare::compare;
use crate::error::EvaluationError;
use crate::spec::step::NavigationRule;

/// Comparison between an answer and a condition value.
///
/// Operators outside the known set are kept verbatim so a half-edited
/// document still loads; evaluating one is an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Comparison {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Includes,
    Unknown(String),
}

impl Comparison {
    pub const KNOWN: [&'static str; 5] = [
        "equals",
        "notEquals",
        "greaterThan",
        "lessThan",
        "includes",
    ];

    pub fn parse(name: &str) -> Self {
        match name {
            "equals" => Comparison::Equals,
            "notEquals" => Comparison::NotEquals,
            "greaterThan" => Comparison::GreaterThan,
            "lessThan" => Comparison::LessThan,
            "includes" => Comparison::Includes,
            other => Comparison::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Comparison::Equals => "equals",
            Comparison::NotEquals => "notEquals",
            Comparison::GreaterThan => "greaterThan",
            Comparison::LessThan => "lessThan",
            Comparison::Includes => "includes",
            Comparison::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Comparison::Unknown(_))
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Comparison {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Comparison {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Comparison::parse(&name))
    }
}

impl JsonSchema for Comparison {
    fn schema_name() -> Cow<'static, str> {
        "Comparison".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "enum": Comparison::KNOWN,
        })
    }
}

/// How the results of a condition list are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConditionOperator {
    And,
    Or,
    /// Negation of the `And` reduction, not of each condition.
    Not,
}

impl ConditionOperator {
    /// Evaluates every result before reducing; an error anywhere in the list wins.
    pub fn reduce<I, E>(self, results: I) -> Result<bool, E>
    where
        I: IntoIterator<Item = Result<bool, E>>,
    {
        let results = results.into_iter().collect::<Result<Vec<bool>, E>>()?;
        let all = results.iter().all(|result| *result);
        Ok(match self {
            ConditionOperator::And => all,
            ConditionOperator::Or => results.iter().any(|result| *result),
            ConditionOperator::Not => !all,
        })
    }
}

/// Single comparison against the answer stored under `field_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldCondition {
    pub field_id: String,
    pub comparison: Comparison,
    pub value: Value,
}

/// Boolean expression over answers controlling whether a step or field is shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VisibilityCondition {
    pub operator: ConditionOperator,
    #[serde(default)]
    pub conditions: Vec<FieldCondition>,
}

/// Anything that can be decided from an answer map.
pub trait Predicate {
    fn holds(&self, answers: &Value) -> Result<bool, EvaluationError>;
}

impl Predicate for FieldCondition {
    fn holds(&self, answers: &Value) -> Result<bool, EvaluationError> {
        compare(answers.get(&self.field_id), &self.comparison, &self.value)
    }
}

impl Predicate for NavigationRule {
    fn holds(&self, answers: &Value) -> Result<bool, EvaluationError> {
        compare(answers.get(&self.field_id), &self.comparison, &self.value)
    }
}

impl Predicate for VisibilityCondition {
    fn holds(&self, answers: &Value) -> Result<bool, EvaluationError> {
        self.operator.reduce(
            self.conditions
                .iter()
                .map(|condition| condition.holds(answers)),
        )
    }
}
