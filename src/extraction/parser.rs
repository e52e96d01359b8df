//! Response parsing
//!
//! Normalizes the model's JSON reply into person records. The reply may
//! be an object wrapping the person list or the bare list itself.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::types::{ExtractionError, PersonFields};
use super::validation::validate;

/// Keys that may hold the person list, in lookup order
pub const PERSON_LIST_KEYS: [&str; 3] = ["pessoas", "people", "documentos"];

const DOCUMENT_TYPE: &[&str] = &["document_type", "tipo_documento"];
const FULL_NAME: &[&str] = &["full_name", "nome", "nome_completo"];
const BIRTH_DATE: &[&str] = &["birth_date", "data_nascimento"];
const RG_NUMBER: &[&str] = &["rg_number", "rg", "numero_rg"];
const CPF_NUMBER: &[&str] = &["cpf_number", "cpf", "numero_cpf"];
const GENDER: &[&str] = &["gender", "genero", "sexo"];
const ISSUING_AUTHORITY: &[&str] = &["issuing_authority", "orgao_emissor"];
const DOCUMENT_NUMBER: &[&str] = &["document_number", "numero_documento"];
const FILIATION: &[&str] = &["filiation", "filiacao"];

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponseEnvelope {
    Object(Map<String, Value>),
    List(Vec<Value>),
}

/// Parse the raw reply into validated people, preserving order
pub fn parse_people(content: &str) -> Result<Vec<PersonFields>, ExtractionError> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| ExtractionError::InvalidJson(e.to_string()))?;

    let entries = match serde_json::from_value::<ResponseEnvelope>(value) {
        Ok(ResponseEnvelope::List(items)) => items,
        Ok(ResponseEnvelope::Object(mut object)) => {
            match PERSON_LIST_KEYS.iter().find_map(|key| object.remove(*key)) {
                Some(Value::Array(items)) => items,
                Some(other) => {
                    return Err(ExtractionError::MalformedResponse(format!(
                        "person list is a {}, not an array",
                        json_kind(&other)
                    )))
                }
                None => Vec::new(),
            }
        }
        Err(_) => {
            return Err(ExtractionError::MalformedResponse(
                "response is neither an object nor an array".to_string(),
            ))
        }
    };

    let total = entries.len();
    let people: Vec<PersonFields> = entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::Object(object) => Some(person_from_object(object)),
            _ => None,
        })
        .collect();

    if people.len() < total {
        tracing::debug!(skipped = total - people.len(), "Skipped non-object person entries");
    }

    Ok(people)
}

/// Build a validated person from one model object
pub fn person_from_object(object: Map<String, Value>) -> PersonFields {
    let mut person = PersonFields {
        document_type: read_string(&object, DOCUMENT_TYPE),
        full_name: read_string(&object, FULL_NAME),
        birth_date: read_string(&object, BIRTH_DATE),
        rg_number: read_string(&object, RG_NUMBER),
        cpf_number: read_string(&object, CPF_NUMBER),
        gender: read_string(&object, GENDER),
        issuing_authority: read_string(&object, ISSUING_AUTHORITY),
        document_number: read_string(&object, DOCUMENT_NUMBER),
        filiation: read_list(&object, FILIATION),
        warnings: Vec::new(),
        raw_model_output: Map::new(),
    };
    validate(&mut person);
    person.raw_model_output = object;
    person
}

fn lookup<'a>(object: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn read_string(object: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    lookup(object, aliases).and_then(scalar_to_string)
}

fn read_list(object: &Map<String, Value>, aliases: &[&str]) -> Vec<String> {
    match lookup(object, aliases) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::types::WarningKind;

    const TWO_PEOPLE: &str = r#"[
        {"nome": "ANA LIMA", "cpf": "111.222.333-44", "data_nascimento": "02/03/1980"},
        {"nome": "RUI LIMA", "cpf": "999", "data_nascimento": null}
    ]"#;

    #[test]
    fn test_wrapped_and_bare_lists_match() {
        let wrapped = format!(r#"{{"pessoas": {}}}"#, TWO_PEOPLE);

        let from_list = parse_people(TWO_PEOPLE).unwrap();
        let from_object = parse_people(&wrapped).unwrap();

        assert_eq!(from_list, from_object);
        let names: Vec<_> = from_list.iter().map(|p| p.full_name.as_deref()).collect();
        assert_eq!(names, vec![Some("ANA LIMA"), Some("RUI LIMA")]);
    }

    #[test]
    fn test_alternate_wrapper_keys() {
        let people = parse_people(r#"{"people": [{"full_name": "A"}]}"#).unwrap();
        assert_eq!(people[0].full_name.as_deref(), Some("A"));

        let docs = parse_people(r#"{"documentos": [{"nome_completo": "B"}]}"#).unwrap();
        assert_eq!(docs[0].full_name.as_deref(), Some("B"));
    }

    #[test]
    fn test_missing_key_yields_empty() {
        assert!(parse_people(r#"{"outra_coisa": 1}"#).unwrap().is_empty());
        assert!(parse_people("[]").unwrap().is_empty());
    }

    #[test]
    fn test_non_list_value_is_malformed() {
        let err = parse_people(r#"{"pessoas": {"nome": "X"}}"#).unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedResponse(_)));
    }

    #[test]
    fn test_scalar_response_is_malformed() {
        let err = parse_people("42").unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedResponse(_)));
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_people("not json {").unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidJson(_)));
    }

    #[test]
    fn test_non_object_entries_skipped() {
        let people = parse_people(r#"{"pessoas": ["junk", 3, {"nome": "C"}, null]}"#).unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].full_name.as_deref(), Some("C"));
    }

    #[test]
    fn test_invalid_cpf_is_flagged_not_dropped() {
        let people = parse_people(TWO_PEOPLE).unwrap();
        assert!(people[0].warnings.is_empty());
        assert_eq!(people[1].warnings.len(), 1);
        assert_eq!(people[1].warnings[0].kind, WarningKind::InvalidCpf);
        assert_eq!(people[1].birth_date, None);
    }

    #[test]
    fn test_value_shapes() {
        let people = parse_people(
            r#"[{"rg": 123456, "genero": ["M"], "filiacao": "JOAO E MARIA", "tipo_documento": "RG"}]"#,
        )
        .unwrap();
        let person = &people[0];

        assert_eq!(person.rg_number.as_deref(), Some("123456"));
        assert_eq!(person.gender, None);
        assert_eq!(person.filiation, vec!["JOAO E MARIA"]);
        assert_eq!(person.document_type.as_deref(), Some("RG"));
        assert_eq!(person.raw_model_output["rg"], 123456);
    }

    #[test]
    fn test_filiation_list() {
        let people = parse_people(r#"[{"filiacao": ["PAI", null, "MAE"]}]"#).unwrap();
        assert_eq!(people[0].filiation, vec!["PAI", "MAE"]);
    }
}
