use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EvaluationError;
use crate::expr::VisibilityCondition;
use crate::spec::validation::Validation;

/// Input widget a field collects its answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Email,
    Date,
    Checkbox,
    Radio,
    Select,
    Textarea,
    File,
    Image,
    Signature,
    Richtext,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Email => "email",
            FieldType::Date => "date",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::Select => "select",
            FieldType::Textarea => "textarea",
            FieldType::File => "file",
            FieldType::Image => "image",
            FieldType::Signature => "signature",
            FieldType::Richtext => "richtext",
        }
    }

    /// Whether `min`/`max` bounds apply to answers of this type.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Number)
    }

    /// Whether answers are picked from `options`.
    pub fn has_options(&self) -> bool {
        matches!(self, FieldType::Radio | FieldType::Select)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldLayout {
    pub col_span: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptionMapping {
    pub label_field: String,
    pub value_field: String,
}

/// Remote endpoint `select`/`radio` options are fetched from by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DataSource {
    pub url: String,
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    pub mapping: OptionMapping,
}

impl DataSource {
    /// Turns an already fetched response (a JSON array of records) into field
    /// options using `mapping`.
    pub fn map_options(&self, records: &Value) -> Result<Vec<FieldOption>, EvaluationError> {
        let records = records.as_array().ok_or(EvaluationError::DataSourceShape)?;
        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let label = record_text(record, &self.mapping.label_field, index)?;
                let value = record_text(record, &self.mapping.value_field, index)?;
                Ok(FieldOption { label, value })
            })
            .collect()
    }
}

fn record_text(record: &Value, key: &str, index: usize) -> Result<String, EvaluationError> {
    match record.get(key) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(value @ (Value::Number(_) | Value::Bool(_))) => Ok(value.to_string()),
        Some(_) => Err(EvaluationError::DataSourceRecord {
            index,
            message: format!("'{}' is not a scalar", key),
        }),
        None => Err(EvaluationError::DataSourceRecord {
            index,
            message: format!("missing '{}'", key),
        }),
    }
}

/// An element that collects an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_condition: Option<VisibilityCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<FieldLayout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
}

/// Static content shared by headers, paragraphs and quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContentBlock {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Header,
    Text,
    Quote,
}

/// One renderable unit inside a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Field(Field),
    Header(ContentBlock),
    Text(ContentBlock),
    Quote(ContentBlock),
}

impl Element {
    /// Field with the editor's defaults: a text input that is not required.
    pub fn new_field(id: impl Into<String>) -> Self {
        Element::Field(Field {
            id: id.into(),
            label: "New Field".into(),
            tooltip: None,
            field_type: FieldType::Text,
            validation: Some(Validation {
                required: Some(false),
                ..Validation::default()
            }),
            visibility_condition: None,
            data_source: None,
            layout: None,
            options: None,
        })
    }

    pub fn new_block(kind: BlockKind, id: impl Into<String>) -> Self {
        let block = ContentBlock {
            id: id.into(),
            text: "New Text".into(),
        };
        match kind {
            BlockKind::Header => Element::Header(block),
            BlockKind::Text => Element::Text(block),
            BlockKind::Quote => Element::Quote(block),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Element::Field(field) => &field.id,
            Element::Header(block) | Element::Text(block) | Element::Quote(block) => &block.id,
        }
    }

    pub fn as_field(&self) -> Option<&Field> {
        match self {
            Element::Field(field) => Some(field),
            Element::Header(_) | Element::Text(_) | Element::Quote(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Element::Field(_) => "field",
            Element::Header(_) => "header",
            Element::Text(_) => "text",
            Element::Quote(_) => "quote",
        }
    }
}
