//! Advisory field validation
//!
//! Checks never reject a person; they only attach warnings.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{FieldWarning, PersonFields, WarningField, WarningKind};

static BIRTH_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap());

/// Number of digits in a Brazilian CPF
pub const CPF_DIGITS: usize = 11;

pub const INVALID_CPF_MESSAGE: &str = "CPF inválido - esperado 11 dígitos";
pub const SUSPICIOUS_DATE_MESSAGE: &str = "formato de data suspeito";

/// True when the value reduces to exactly 11 digits
pub fn is_valid_cpf(value: &str) -> bool {
    value.chars().filter(|c| c.is_ascii_digit()).count() == CPF_DIGITS
}

/// True for `DD/MM/YYYY`; day and month ranges are not checked
pub fn is_expected_date_format(value: &str) -> bool {
    BIRTH_DATE_RE.is_match(value)
}

/// Recompute the warnings of `person` from its current field values
pub fn validate(person: &mut PersonFields) {
    person.warnings.clear();

    if let Some(cpf) = &person.cpf_number {
        if !is_valid_cpf(cpf) {
            person.warnings.push(FieldWarning {
                field: WarningField::CpfNumber,
                kind: WarningKind::InvalidCpf,
                message: INVALID_CPF_MESSAGE.to_string(),
            });
        }
    }

    if let Some(date) = &person.birth_date {
        if !is_expected_date_format(date.trim()) {
            person.warnings.push(FieldWarning {
                field: WarningField::BirthDate,
                kind: WarningKind::SuspiciousDateFormat,
                message: SUSPICIOUS_DATE_MESSAGE.to_string(),
            });
        }
    }

    if !person.warnings.is_empty() {
        tracing::debug!(
            warnings = person.warnings.len(),
            "Extracted person has suspicious fields"
        );
    }
}
