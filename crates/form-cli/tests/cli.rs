use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use serde_json::{Value, json};

const ONBOARDING: &str = include_str!("fixtures/onboarding_form.json");

fn formflow() -> Command {
    Command::cargo_bin("formflow").expect("binary")
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn check_accepts_a_sound_form() {
    let temp = TempDir::new().expect("temp dir");
    let form = temp.child("form.json");
    form.write_str(ONBOARDING).expect("write form");

    let output = formflow()
        .args(["check", "--form"])
        .arg(form.path())
        .assert()
        .success()
        .get_output()
        .clone();
    assert!(stdout_of(&output).contains("Schema check: valid"));
}

#[test]
fn check_lists_dangling_references() {
    let temp = TempDir::new().expect("temp dir");
    let form = temp.child("broken.json");
    let document = json!({
        "id": "broken",
        "title": "Broken",
        "steps": [{
            "id": "a",
            "title": "A",
            "layout": { "columns": 1 },
            "elements": [],
            "defaultNextStep": "missing"
        }]
    });
    form.write_str(&document.to_string()).expect("write form");

    let output = formflow()
        .args(["check", "--form"])
        .arg(form.path())
        .assert()
        .failure()
        .get_output()
        .clone();
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Schema check: invalid"));
    assert!(stdout.contains("defaultNextStep of step 'a' points at missing step 'missing'"));
}

#[test]
fn validate_reports_failing_rules() {
    let temp = TempDir::new().expect("temp dir");
    let form = temp.child("form.json");
    form.write_str(ONBOARDING).expect("write form");
    let answers = temp.child("answers.json");
    answers
        .write_str(r#"{"name": "A", "age": "old"}"#)
        .expect("write answers");

    let output = formflow()
        .args(["validate", "--step", "about", "--form"])
        .arg(form.path())
        .arg("--answers")
        .arg(answers.path())
        .assert()
        .failure()
        .get_output()
        .clone();
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Validation result: invalid"));
    assert!(stdout.contains("name [minLength] - must be at least 2 characters"));
    assert!(stdout.contains("age [min] - value is not a number"));
}

#[test]
fn validate_passes_complete_answers() {
    let temp = TempDir::new().expect("temp dir");
    let form = temp.child("form.json");
    form.write_str(ONBOARDING).expect("write form");
    let answers = temp.child("answers.json");
    answers
        .write_str(
            r#"{"name": "Ada", "age": 36, "guardian_name": "n/a", "plan_choice": "free", "card": "4111111111111111"}"#,
        )
        .expect("write answers");

    formflow()
        .args(["validate", "--form"])
        .arg(form.path())
        .arg("--answers")
        .arg(answers.path())
        .assert()
        .success();
}

#[test]
fn next_and_path_follow_navigation_rules() {
    let temp = TempDir::new().expect("temp dir");
    let form = temp.child("form.json");
    form.write_str(ONBOARDING).expect("write form");
    let answers = temp.child("answers.json");
    answers
        .write_str(r#"{"age": 15, "plan_choice": "pro"}"#)
        .expect("write answers");

    let output = formflow()
        .args(["next", "--step", "about", "--form"])
        .arg(form.path())
        .arg("--answers")
        .arg(answers.path())
        .assert()
        .success()
        .get_output()
        .clone();
    assert!(stdout_of(&output).contains("Next step: guardian"));

    let output = formflow()
        .args(["next", "--step", "plan", "--form"])
        .arg(form.path())
        .arg("--answers")
        .arg(answers.path())
        .assert()
        .success()
        .get_output()
        .clone();
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Form complete"));
    assert!(stdout.contains("skipped hidden step 'billing'"));

    let output = formflow()
        .args(["path", "--form"])
        .arg(form.path())
        .arg("--answers")
        .arg(answers.path())
        .assert()
        .success()
        .get_output()
        .clone();
    let lines: Vec<String> = stdout_of(&output).lines().map(str::to_string).collect();
    assert_eq!(lines, vec!["about", "guardian", "plan"]);
}

#[test]
fn visible_prints_visibility_map() {
    let temp = TempDir::new().expect("temp dir");
    let form = temp.child("form.json");
    form.write_str(ONBOARDING).expect("write form");
    let answers = temp.child("answers.json");
    answers.write_str(r#"{"newsletter": true}"#).expect("write answers");

    let output = formflow()
        .args(["visible", "--form"])
        .arg(form.path())
        .arg("--answers")
        .arg(answers.path())
        .assert()
        .success()
        .get_output()
        .clone();
    let map: Value = serde_json::from_str(&stdout_of(&output)).expect("json");
    assert_eq!(map["fields"]["email"], true);
    assert_eq!(map["steps"]["billing"], true);
}

#[test]
fn unknown_step_is_an_error() {
    let temp = TempDir::new().expect("temp dir");
    let form = temp.child("form.json");
    form.write_str(ONBOARDING).expect("write form");

    let output = formflow()
        .args(["next", "--step", "nowhere", "--form"])
        .arg(form.path())
        .assert()
        .failure()
        .get_output()
        .clone();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("step 'nowhere' is not part of the form"));
}

#[test]
fn empty_form_file_is_rejected() {
    let temp = TempDir::new().expect("temp dir");
    let form = temp.child("empty.json");
    form.write_str("  \n").expect("write form");

    formflow()
        .args(["check", "--form"])
        .arg(form.path())
        .assert()
        .failure();
}

#[test]
fn fmt_writes_normal_form() {
    let temp = TempDir::new().expect("temp dir");
    let form = temp.child("form.json");
    form.write_str(ONBOARDING).expect("write form");
    let out = temp.child("normal.json");

    formflow()
        .args(["fmt", "--form"])
        .arg(form.path())
        .arg("--out")
        .arg(out.path())
        .assert()
        .success();

    let written = std::fs::read_to_string(out.path()).expect("read output");
    let written: Value = serde_json::from_str(&written).expect("json");
    let original: Value = serde_json::from_str(ONBOARDING).expect("json");
    assert_eq!(written, original);
}

#[test]
fn schema_describes_the_document_format() {
    let output = formflow()
        .arg("schema")
        .assert()
        .success()
        .get_output()
        .clone();
    let schema: Value = serde_json::from_str(&stdout_of(&output)).expect("json");
    assert_eq!(schema["title"], "FormSchema");
    assert!(schema["properties"]["steps"].is_object());
}
