//! Extraction Types
//!
//! Person records produced by the field extractor and their display form.

use serde::{Deserialize, Serialize};

/// Which field a validation warning refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningField {
    CpfNumber,
    BirthDate,
}

/// Validation failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// CPF does not reduce to exactly 11 digits
    InvalidCpf,
    /// Date is not `DD/MM/YYYY`
    SuspiciousDateFormat,
}

/// Advisory validation outcome attached to a person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWarning {
    pub field: WarningField,
    pub kind: WarningKind,
    pub message: String,
}

impl FieldWarning {
    /// Suffix appended to the field value in the display projection
    pub fn alert_suffix(&self) -> String {
        format!(" (ALERTA: {})", self.message)
    }
}

/// Fields extracted for one person
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonFields {
    pub document_type: Option<String>,
    pub full_name: Option<String>,
    pub birth_date: Option<String>,
    pub rg_number: Option<String>,
    pub cpf_number: Option<String>,
    pub gender: Option<String>,
    pub issuing_authority: Option<String>,
    pub document_number: Option<String>,
    pub filiation: Vec<String>,
    pub warnings: Vec<FieldWarning>,
    /// The model's object for this person, kept for debugging only
    pub raw_model_output: serde_json::Map<String, serde_json::Value>,
}

impl PersonFields {
    pub fn warning_for(&self, field: WarningField) -> Option<&FieldWarning> {
        self.warnings.iter().find(|w| w.field == field)
    }

    /// Display projection: drops the raw model output and embeds alerts
    pub fn to_public(&self) -> PublicFields {
        let annotate = |value: &Option<String>, field: WarningField| {
            value.as_ref().map(|v| match self.warning_for(field) {
                Some(warning) => format!("{}{}", v, warning.alert_suffix()),
                None => v.clone(),
            })
        };

        PublicFields {
            document_type: self.document_type.clone(),
            full_name: self.full_name.clone(),
            birth_date: annotate(&self.birth_date, WarningField::BirthDate),
            rg_number: self.rg_number.clone(),
            cpf_number: annotate(&self.cpf_number, WarningField::CpfNumber),
            gender: self.gender.clone(),
            issuing_authority: self.issuing_authority.clone(),
            document_number: self.document_number.clone(),
            filiation: self.filiation.clone(),
            warnings: self.warnings.clone(),
        }
    }
}

/// Person fields as persisted and displayed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicFields {
    pub document_type: Option<String>,
    pub full_name: Option<String>,
    pub birth_date: Option<String>,
    pub rg_number: Option<String>,
    pub cpf_number: Option<String>,
    pub gender: Option<String>,
    pub issuing_authority: Option<String>,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub filiation: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<FieldWarning>,
}

/// Structured field extraction errors
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("No API key was provided for the extraction service")]
    MissingCredential,

    #[error("Nothing to extract: {0}")]
    EmptyInput(&'static str),

    #[error("Extraction service call failed: {0}")]
    Capability(String),

    #[error("Could not parse the extraction response as JSON: {0}")]
    InvalidJson(String),

    #[error("Malformed extraction response: {0}")]
    MalformedResponse(String),

    #[error("No person was identified in the document")]
    NoPeople,

    #[error("Failed to prepare page images: {0}")]
    Image(String),
}
