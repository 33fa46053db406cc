pub mod element;
pub mod form;
pub mod step;
pub mod validation;

pub use element::{
    BlockKind, ContentBlock, DataSource, Element, Field, FieldLayout, FieldOption, FieldType,
    HttpMethod, OptionMapping,
};
pub use form::FormSchema;
pub use step::{NavigationRule, Step, StepLayout};
pub use validation::Validation;
