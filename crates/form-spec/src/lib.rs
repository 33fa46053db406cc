#![allow(missing_docs)]

pub mod check;
pub mod compare;
pub mod edit;
pub mod error;
pub mod expr;
pub mod library;
pub mod navigation;
pub mod progress;
pub mod spec;
pub mod validate;
pub mod visibility;

pub use check::{ConditionSite, SchemaError, StepReference, validate_schema};
pub use compare::compare;
pub use edit::EditError;
pub use error::EvaluationError;
pub use expr::{Comparison, ConditionOperator, FieldCondition, Predicate, VisibilityCondition};
pub use library::{FormLibrary, LibraryError};
pub use navigation::{NextStep, resolve_next_step};
pub use progress::{ProgressError, step_after, walk_path};
pub use spec::{
    BlockKind, ContentBlock, DataSource, Element, Field, FieldLayout, FieldOption, FieldType,
    FormSchema, HttpMethod, NavigationRule, OptionMapping, Step, StepLayout, Validation,
};
pub use validate::{
    CustomOutcome, CustomValidator, FieldValidator, FormValidator, ValidationError,
    ValidationReport, ValidationRule, validate,
};
pub use visibility::{VisibilityMap, is_visible, resolve_visibility};
