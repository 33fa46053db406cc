use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::expr::{Comparison, VisibilityCondition};
use crate::spec::element::{Element, Field};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepLayout {
    pub columns: i64,
}

impl Default for StepLayout {
    fn default() -> Self {
        Self { columns: 1 }
    }
}

/// Conditional jump to another step, tried in authored order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NavigationRule {
    pub field_id: String,
    pub comparison: Comparison,
    pub value: Value,
    pub go_to_step: String,
}

/// One page of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub layout: StepLayout,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step_condition: Option<Vec<NavigationRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_next_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_condition: Option<VisibilityCondition>,
}

impl Step {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            layout: StepLayout::default(),
            elements: Vec::new(),
            next_step_condition: None,
            default_next_step: None,
            visibility_condition: None,
        }
    }

    pub fn rules(&self) -> &[NavigationRule] {
        self.next_step_condition.as_deref().unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.elements.iter().filter_map(Element::as_field)
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|element| element.id() == id)
    }
}
