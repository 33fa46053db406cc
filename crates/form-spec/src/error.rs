use thiserror::Error;

/// Configuration problems met while evaluating conditions or rules.
///
/// These are never folded into a "visible"/"hidden" or "valid"/"invalid"
/// default; callers always see them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("unknown comparison operator '{0}'")]
    UnknownComparison(String),
    #[error("field '{field_id}' has an invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        field_id: String,
        pattern: String,
        message: String,
    },
    #[error("field '{field_id}' declares a custom rule but no custom validator was supplied")]
    MissingCustomValidator { field_id: String },
    #[error("step '{0}' is not part of the form")]
    UnknownStep(String),
    #[error("data source response must be a JSON array of records")]
    DataSourceShape,
    #[error("data source record {index} is unusable: {message}")]
    DataSourceRecord { index: usize, message: String },
}
