//! Structured field extraction
//!
//! Turns document text or page images into per-person identity fields
//! through a language-model capability, then validates them.

mod capability;
mod parser;
mod prompt;
mod sanitize;
mod service;
mod types;
mod validation;

pub use capability::{jpeg_data_uri, ExtractionCapability, OpenAiCapability, OpenAiConfig};
pub use parser::{parse_people, PERSON_LIST_KEYS};
pub use sanitize::sanitize_for_model;
pub use service::StructuredFieldExtractor;
pub use types::{
    ExtractionError, FieldWarning, PersonFields, PublicFields, WarningField, WarningKind,
};
pub use validation::{is_expected_date_format, is_valid_cpf, validate};
