use clap::{Parser, Subcommand};
use form_host::{check_schema, next_step, validate_answers, visibility, walk};
use form_spec::FormSchema;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const LOG_ENV: &str = "FORMFLOW_LOG";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Form document helper",
    long_about = "Checks form documents and evaluates visibility, navigation and validation against answer files"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report structural problems in a form document.
    Check {
        /// Path to the form JSON.
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
    },
    /// Print which steps and fields are visible for a set of answers.
    Visible {
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        /// JSON object of answers keyed by field id.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
    },
    /// Resolve the step that follows STEP.
    Next {
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        #[arg(long, value_name = "STEP")]
        step: String,
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
    },
    /// Print the ordered steps a respondent walks through.
    Path {
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
    },
    /// Validate answers for one step or for the whole form.
    Validate {
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        /// Only validate the fields of this step.
        #[arg(long, value_name = "STEP")]
        step: Option<String>,
    },
    /// Rewrite a form document in normal form.
    Fmt {
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        /// Write to this file instead of stdout.
        #[arg(long, value_name = "OUT")]
        out: Option<PathBuf>,
    },
    /// Print the JSON Schema of the form document format.
    Schema,
}

fn main() -> CliResult<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Command::Check { form } => run_check(&form),
        Command::Visible { form, answers } => run_visible(&form, answers.as_deref()),
        Command::Next {
            form,
            step,
            answers,
        } => run_next(&form, &step, answers.as_deref()),
        Command::Path { form, answers } => run_path(&form, answers.as_deref()),
        Command::Validate {
            form,
            answers,
            step,
        } => run_validate(&form, &answers, step.as_deref()),
        Command::Fmt { form, out } => run_fmt(&form, out.as_deref()),
        Command::Schema => run_schema(),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_form(path: &Path) -> CliResult<String> {
    let text = fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Err(format!("form document {} is empty", path.display()).into());
    }
    debug!(path = %path.display(), "loaded form document");
    Ok(text)
}

fn read_answers(path: Option<&Path>) -> CliResult<String> {
    match path {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => Ok(String::new()),
    }
}

fn parse_host_response(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}

fn run_check(form_path: &Path) -> CliResult<()> {
    let form_json = read_form(form_path)?;
    let result = parse_host_response(&check_schema(&form_json))?;
    let valid = result["valid"].as_bool().unwrap_or(false);
    println!("Schema check: {}", if valid { "valid" } else { "invalid" });

    if let Some(messages) = result["messages"].as_array()
        && !messages.is_empty()
    {
        println!("Errors:");
        for message in messages.iter().filter_map(Value::as_str) {
            println!("  - {}", message);
        }
    }

    if valid {
        Ok(())
    } else {
        Err("schema check failed".into())
    }
}

fn run_visible(form_path: &Path, answers_path: Option<&Path>) -> CliResult<()> {
    let form_json = read_form(form_path)?;
    let answers_json = read_answers(answers_path)?;
    let result = parse_host_response(&visibility(&form_json, &answers_json))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run_next(form_path: &Path, step_id: &str, answers_path: Option<&Path>) -> CliResult<()> {
    let form_json = read_form(form_path)?;
    let answers_json = read_answers(answers_path)?;
    let result = parse_host_response(&next_step(&form_json, step_id, &answers_json))?;

    let next = result["nextStepId"].as_str();
    match next {
        Some(next) => println!("Next step: {}", next),
        None => println!("Form complete"),
    }
    if let Some(resolved) = result["resolvedStepId"].as_str()
        && Some(resolved) != next
    {
        println!("  (skipped hidden step '{}')", resolved);
    }
    Ok(())
}

fn run_path(form_path: &Path, answers_path: Option<&Path>) -> CliResult<()> {
    let form_json = read_form(form_path)?;
    let answers_json = read_answers(answers_path)?;
    let result = parse_host_response(&walk(&form_json, &answers_json))?;
    for step in result["path"].as_array().into_iter().flatten() {
        if let Some(step) = step.as_str() {
            println!("{}", step);
        }
    }
    Ok(())
}

fn run_validate(form_path: &Path, answers_path: &Path, step: Option<&str>) -> CliResult<()> {
    let form_json = read_form(form_path)?;
    let answers_json = fs::read_to_string(answers_path)?;
    let report = parse_host_response(&validate_answers(&form_json, &answers_json, step))?;

    let valid = report["valid"].as_bool().unwrap_or(false);
    println!(
        "Validation result: {}",
        if valid { "valid" } else { "invalid" }
    );
    describe_validation(&report);

    if valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(report: &Value) {
    if let Some(errors) = report["errors"].as_array()
        && !errors.is_empty()
    {
        println!("Errors:");
        for error in errors {
            println!(
                "  {} [{}] - {}",
                error["fieldId"].as_str().unwrap_or("<unknown>"),
                error["rule"].as_str().unwrap_or("?"),
                error["message"].as_str().unwrap_or_default()
            );
        }
    }
    let unknown: Vec<&str> = report["unknownFields"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .collect();
    if !unknown.is_empty() {
        println!("Unknown answer fields: {}", unknown.join(", "));
    }
}

fn run_fmt(form_path: &Path, out: Option<&Path>) -> CliResult<()> {
    let form = FormSchema::from_json(&read_form(form_path)?)?;
    let pretty = form.to_json_pretty()?;
    match out {
        Some(out) => {
            fs::write(out, format!("{}\n", pretty))?;
            debug!(path = %out.display(), "wrote normalised form");
        }
        None => println!("{}", pretty),
    }
    Ok(())
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(FormSchema);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
