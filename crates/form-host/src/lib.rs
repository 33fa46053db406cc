use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::warn;

use form_spec::{
    CustomOutcome, CustomValidator, EvaluationError, FormSchema, FormValidator, NextStep,
    ProgressError, ValidationReport, resolve_next_step, resolve_visibility, step_after,
    validate_schema, walk_path,
};

const DEFAULT_FORM: &str = include_str!("../forms/onboarding_form.json");

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to parse form document: {0}")]
    FormParse(#[source] serde_json::Error),
    #[error("failed to parse answers: {0}")]
    AnswersParse(#[source] serde_json::Error),
    #[error("answers must be a JSON object keyed by field id")]
    AnswersShape,
    #[error("step '{0}' is not part of the form")]
    UnknownStep(String),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Custom validator used by the plain string API: the host has no expression
/// engine, so every custom rule fails with a message naming it.
pub struct UnevaluatedCustom;

impl CustomValidator for UnevaluatedCustom {
    fn evaluate(&self, expression: &str, _value: Option<&Value>, _answers: &Value) -> CustomOutcome {
        CustomOutcome::fail(format!(
            "custom rule '{}' cannot be evaluated by this host",
            expression
        ))
    }
}

/// Parses a form document; a blank document selects the bundled sample form.
pub fn load_form(form_json: &str) -> Result<FormSchema, HostError> {
    let text = if form_json.trim().is_empty() {
        DEFAULT_FORM
    } else {
        form_json
    };
    serde_json::from_str(text).map_err(HostError::FormParse)
}

/// Parses an answer map; a blank string is an empty map.
pub fn parse_answers(answers_json: &str) -> Result<Value, HostError> {
    if answers_json.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    let answers: Value = serde_json::from_str(answers_json).map_err(HostError::AnswersParse)?;
    if answers.is_object() {
        Ok(answers)
    } else {
        Err(HostError::AnswersShape)
    }
}

fn respond(result: Result<Value, HostError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => {
            warn!(error = %err, "host call failed");
            json!({ "error": err.to_string() }).to_string()
        }
    }
}

fn ensure_step(form: &FormSchema, step_id: &str) -> Result<(), HostError> {
    match form.step(step_id) {
        Some(_) => Ok(()),
        None => Err(HostError::UnknownStep(step_id.to_string())),
    }
}

/// Returns the document re-serialized in normal form.
pub fn describe(form_json: &str) -> String {
    respond(
        load_form(form_json)
            .and_then(|form| serde_json::to_value(form).map_err(HostError::JsonEncode)),
    )
}

pub fn check_schema(form_json: &str) -> String {
    respond(load_form(form_json).and_then(|form| {
        let errors = validate_schema(&form);
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        let errors = serde_json::to_value(&errors).map_err(HostError::JsonEncode)?;
        Ok(json!({
            "valid": messages.is_empty(),
            "errors": errors,
            "messages": messages,
        }))
    }))
}

pub fn visibility(form_json: &str, answers_json: &str) -> String {
    respond(load_form(form_json).and_then(|form| {
        let answers = parse_answers(answers_json)?;
        let map = resolve_visibility(&form, &answers)?;
        serde_json::to_value(map).map_err(HostError::JsonEncode)
    }))
}

fn next_payload(form: &FormSchema, step_id: &str, answers: &Value) -> Result<Value, HostError> {
    let step = form
        .step(step_id)
        .ok_or_else(|| HostError::UnknownStep(step_id.to_string()))?;
    let resolved = resolve_next_step(step, answers)?;
    let next = step_after(form, step_id, answers)?;
    Ok(json!({
        "status": status_label(&next),
        "nextStepId": next.step_id(),
        "resolvedStepId": resolved.step_id(),
    }))
}

fn status_label(next: &NextStep) -> &'static str {
    match next {
        NextStep::Step(_) => "need_input",
        NextStep::Complete => "complete",
    }
}

/// Where to go after `step_id`. `nextStepId` skips hidden steps;
/// `resolvedStepId` is the raw outcome of the step's own rules.
pub fn next_step(form_json: &str, step_id: &str, answers_json: &str) -> String {
    respond(load_form(form_json).and_then(|form| {
        let answers = parse_answers(answers_json)?;
        next_payload(&form, step_id, &answers)
    }))
}

pub fn walk(form_json: &str, answers_json: &str) -> String {
    respond(load_form(form_json).and_then(|form| {
        let answers = parse_answers(answers_json)?;
        let path = walk_path(&form, &answers)?;
        Ok(json!({ "path": path }))
    }))
}

fn run_validation(
    form: &FormSchema,
    answers: &Value,
    step_id: Option<&str>,
    custom: &dyn CustomValidator,
) -> Result<ValidationReport, HostError> {
    let validator = FormValidator::compile(form)?;
    let report = match step_id {
        Some(step_id) => {
            ensure_step(form, step_id)?;
            validator.validate_step(step_id, answers, Some(custom))?
        }
        None => validator.validate_form(answers, Some(custom))?,
    };
    Ok(report)
}

pub fn validate_answers(form_json: &str, answers_json: &str, step_id: Option<&str>) -> String {
    validate_answers_with(form_json, answers_json, step_id, &UnevaluatedCustom)
}

pub fn validate_answers_with(
    form_json: &str,
    answers_json: &str,
    step_id: Option<&str>,
    custom: &dyn CustomValidator,
) -> String {
    respond(load_form(form_json).and_then(|form| {
        let answers = parse_answers(answers_json)?;
        let report = run_validation(&form, &answers, step_id, custom)?;
        serde_json::to_value(report).map_err(HostError::JsonEncode)
    }))
}

pub fn submit_step(form_json: &str, step_id: &str, answers_json: &str) -> String {
    submit_step_with(form_json, step_id, answers_json, &UnevaluatedCustom)
}

/// Validates one step and, only when it passes, resolves where to go next.
pub fn submit_step_with(
    form_json: &str,
    step_id: &str,
    answers_json: &str,
    custom: &dyn CustomValidator,
) -> String {
    respond(load_form(form_json).and_then(|form| {
        let answers = parse_answers(answers_json)?;
        let report = run_validation(&form, &answers, Some(step_id), custom)?;
        let validation = serde_json::to_value(&report).map_err(HostError::JsonEncode)?;

        if !report.valid {
            return Ok(json!({
                "status": "error",
                "stepId": step_id,
                "validation": validation,
            }));
        }

        let mut payload = next_payload(&form, step_id, &answers)?;
        payload["stepId"] = Value::String(step_id.to_string());
        payload["validation"] = validation;
        Ok(payload)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(response: &str) -> Value {
        serde_json::from_str(response).expect("json")
    }

    #[test]
    fn describe_returns_normalised_document() {
        let parsed = parse(&describe(""));
        assert_eq!(parsed["id"], "onboarding");
        assert_eq!(parsed["steps"][0]["elements"][0]["type"], "header");
    }

    #[test]
    fn describe_reports_parse_errors() {
        let parsed = parse(&describe("{ not json"));
        let error = parsed["error"].as_str().expect("error");
        assert!(error.starts_with("failed to parse form document"));
    }

    #[test]
    fn check_schema_lists_dangling_steps() {
        let form = json!({
            "id": "broken",
            "title": "Broken",
            "steps": [{
                "id": "a",
                "title": "A",
                "layout": { "columns": 1 },
                "elements": [],
                "defaultNextStep": "z"
            }]
        });
        let parsed = parse(&check_schema(&form.to_string()));
        assert_eq!(parsed["valid"], false);
        assert_eq!(parsed["errors"][0]["code"], "dangling_step");
        assert_eq!(
            parsed["messages"][0],
            "defaultNextStep of step 'a' points at missing step 'z'"
        );

        let parsed = parse(&check_schema(""));
        assert_eq!(parsed["valid"], true);
    }

    #[test]
    fn visibility_returns_step_and_field_maps() {
        let parsed = parse(&visibility("", r#"{"age": 12}"#));
        assert_eq!(parsed["steps"]["billing"], false);
        assert_eq!(parsed["fields"]["card"], false);
        assert_eq!(parsed["fields"]["name"], true);
    }

    #[test]
    fn answers_must_be_an_object() {
        let parsed = parse(&visibility("", "[1, 2]"));
        assert_eq!(parsed["error"], "answers must be a JSON object keyed by field id");
    }

    #[test]
    fn next_step_skips_hidden_targets() {
        let parsed = parse(&next_step("", "plan", r#"{"age": 12, "plan_choice": "pro"}"#));
        assert_eq!(parsed["status"], "complete");
        assert!(parsed["nextStepId"].is_null());
        assert_eq!(parsed["resolvedStepId"], "billing");

        let parsed = parse(&next_step("", "about", r#"{"age": 40}"#));
        assert_eq!(parsed["status"], "need_input");
        assert_eq!(parsed["nextStepId"], "plan");
    }

    #[test]
    fn next_step_rejects_unknown_step() {
        let parsed = parse(&next_step("", "nope", "{}"));
        assert_eq!(parsed["error"], "step 'nope' is not part of the form");
    }

    #[test]
    fn walk_lists_visible_path() {
        let parsed = parse(&walk("", r#"{"age": 30, "plan_choice": "pro"}"#));
        assert_eq!(parsed["path"], json!(["about", "plan", "billing"]));
    }

    #[test]
    fn validate_answers_reports_step_errors() {
        let parsed = parse(&validate_answers("", r#"{"name": "A", "age": 200}"#, Some("about")));
        assert_eq!(parsed["valid"], false);
        let rules: Vec<&str> = parsed["errors"]
            .as_array()
            .expect("errors")
            .iter()
            .filter_map(|error| error["rule"].as_str())
            .collect();
        assert_eq!(rules, vec!["minLength", "max"]);
    }

    #[test]
    fn custom_rules_fail_closed_without_an_engine() {
        let form = json!({
            "id": "custom",
            "title": "Custom",
            "steps": [{
                "id": "s",
                "title": "S",
                "layout": { "columns": 1 },
                "elements": [{
                    "type": "field",
                    "id": "code",
                    "label": "Code",
                    "fieldType": "text",
                    "validation": { "custom": "isValidCode(value)" }
                }]
            }]
        })
        .to_string();

        let parsed = parse(&validate_answers(&form, r#"{"code": "x"}"#, None));
        assert_eq!(parsed["errors"][0]["rule"], "custom");

        let accept = |_: &str, _: Option<&Value>, _: &Value| CustomOutcome::pass();
        let parsed = parse(&validate_answers_with(&form, r#"{"code": "x"}"#, None, &accept));
        assert_eq!(parsed["valid"], true);
    }

    #[test]
    fn validation_payload_uses_camel_case_keys() {
        let parsed = parse(&validate_answers("", r#"{"name": "Ada", "age": 40, "shoe": 43}"#, Some("about")));
        assert_eq!(parsed["valid"], false);
        assert_eq!(parsed["unknownFields"], json!(["shoe"]));
        assert!(parsed.get("unknown_fields").is_none());
    }

    #[test]
    fn submit_step_blocks_on_invalid_answers() {
        let parsed = parse(&submit_step("", "about", r#"{"age": 30}"#));
        assert_eq!(parsed["status"], "error");
        assert_eq!(parsed["validation"]["errors"][0]["fieldId"], "name");
        assert_eq!(parsed["validation"]["errors"][0]["rule"], "required");
    }

    #[test]
    fn submit_step_advances_when_valid() {
        let parsed = parse(&submit_step("", "about", r#"{"name": "Ada", "age": "16"}"#));
        assert_eq!(parsed["status"], "need_input");
        assert_eq!(parsed["nextStepId"], "guardian");
        assert_eq!(parsed["stepId"], "about");
        assert_eq!(parsed["validation"]["valid"], true);
    }
}
