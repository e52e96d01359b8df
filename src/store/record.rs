//! Stored records
//!
//! One record per extracted person, stamped with its source file and
//! position in the reply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extraction::{PersonFields, PublicFields};

/// One extracted person, as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub file_name: String,
    /// 1-based position of the person within the source file
    pub person_index: u32,
    pub is_probably_scanned: bool,
    pub created_at: DateTime<Utc>,
    pub fields: PublicFields,
}

/// Stamp extracted people as persistable records.
///
/// All records share one timestamp; each gets a fresh id.
pub fn build_records(
    people: &[PersonFields],
    file_name: &str,
    is_probably_scanned: bool,
) -> Vec<DocumentRecord> {
    let now = Utc::now();

    people
        .iter()
        .zip(1u32..)
        .map(|(person, person_index)| DocumentRecord {
            id: Uuid::new_v4(),
            file_name: file_name.to_string(),
            person_index,
            is_probably_scanned,
            created_at: now,
            fields: person.to_public(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str) -> PersonFields {
        PersonFields {
            full_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_records_stamps_people() {
        let records = build_records(&[person("A"), person("B")], "rg.pdf", true);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].person_index, 1);
        assert_eq!(records[1].person_index, 2);
        assert_eq!(records[0].created_at, records[1].created_at);
        assert_ne!(records[0].id, records[1].id);
        assert!(records.iter().all(|r| r.file_name == "rg.pdf" && r.is_probably_scanned));
        assert_eq!(records[1].fields.full_name.as_deref(), Some("B"));
    }

    #[test]
    fn test_build_records_empty() {
        assert!(build_records(&[], "x.pdf", false).is_empty());
    }

    #[test]
    fn test_record_json_layout() {
        let records = build_records(&[person("A")], "a.pdf", false);
        let json = serde_json::to_value(&records[0]).unwrap();

        for key in ["id", "file_name", "person_index", "is_probably_scanned", "created_at", "fields"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert!(json["fields"].get("raw_model_output").is_none());
    }
}
