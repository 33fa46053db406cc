use serde_json::{Value, json};

use form_spec::{ConditionOperator, Element, FieldType, FormSchema};

fn fixture(name: &str) -> &'static str {
    match name {
        "onboarding_form" => include_str!("../tests/fixtures/onboarding_form.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn two_step_document() -> Value {
    json!({
        "id": "survey",
        "title": "Survey",
        "description": "Two steps",
        "steps": [
            {
                "id": "s1",
                "title": "Contact",
                "layout": { "columns": 2 },
                "elements": [
                    { "type": "field", "id": "first", "label": "First", "fieldType": "text",
                      "validation": { "required": true, "min": 1, "max": 2.5 } },
                    { "type": "field", "id": "second", "label": "Second", "fieldType": "radio",
                      "options": [ { "label": "B", "value": "b" }, { "label": "A", "value": "a" } ] }
                ],
                "nextStepCondition": [
                    { "fieldId": "second", "comparison": "equals", "value": "a", "goToStep": "s2" },
                    { "fieldId": "second", "comparison": "notEquals", "value": "a", "goToStep": "s2" }
                ]
            },
            {
                "id": "s2",
                "title": "Details",
                "layout": { "columns": 1 },
                "elements": [
                    { "type": "field", "id": "third", "label": "Third", "fieldType": "textarea",
                      "visibilityCondition": {
                        "operator": "OR",
                        "conditions": [
                            { "fieldId": "first", "comparison": "includes", "value": "x" },
                            { "fieldId": "second", "comparison": "equals", "value": "b" }
                        ]
                      } },
                    { "type": "quote", "id": "q", "text": "Thanks" }
                ]
            }
        ]
    })
}

#[test]
fn two_step_form_survives_a_round_trip() {
    let original = two_step_document();
    let form: FormSchema = serde_json::from_value(original.clone()).expect("deserialize");
    let text = serde_json::to_string(&form).expect("serialize");
    let again: FormSchema = serde_json::from_str(&text).expect("deserialize again");

    assert_eq!(form, again);
    assert_eq!(serde_json::to_value(&again).expect("value"), original);

    let third = again.steps[1].elements[0].as_field().expect("field");
    let condition = third.visibility_condition.as_ref().expect("condition");
    assert_eq!(condition.operator, ConditionOperator::Or);
    assert_eq!(condition.conditions[0].field_id, "first");
    assert_eq!(condition.conditions[1].field_id, "second");
    assert_eq!(again.steps[0].rules()[1].go_to_step, "s2");
}

#[test]
fn fixture_round_trips_semantically() {
    let original: Value = serde_json::from_str(fixture("onboarding_form")).expect("value");
    let form = FormSchema::from_json(fixture("onboarding_form")).expect("deserialize");
    let pretty = form.to_json_pretty().expect("serialize");
    let reparsed: Value = serde_json::from_str(&pretty).expect("value");
    assert_eq!(reparsed, original);
}

#[test]
fn unknown_comparison_is_kept_verbatim() {
    let mut document = two_step_document();
    document["steps"][0]["nextStepCondition"][0]["comparison"] = json!("startsWith");
    let form: FormSchema = serde_json::from_value(document.clone()).expect("deserialize");
    assert_eq!(serde_json::to_value(&form).expect("value"), document);
}

#[test]
fn elements_are_a_closed_tagged_union() {
    let form = FormSchema::from_json(fixture("onboarding_form")).expect("deserialize");
    let kinds: Vec<&str> = form.steps[0]
        .elements
        .iter()
        .map(Element::type_name)
        .collect();
    assert_eq!(kinds, vec!["header", "field", "field", "field", "field"]);
    assert_eq!(
        form.field("age").map(|field| field.field_type),
        Some(FieldType::Number)
    );

    let bad = json!({ "type": "video", "id": "v", "text": "x" });
    assert!(serde_json::from_value::<Element>(bad).is_err());
}
