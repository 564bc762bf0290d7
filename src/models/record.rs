//! Candidate record model
//!
//! Records are produced only by the response parsers and are never modified
//! after they have been emitted.

use serde::{Deserialize, Serialize};

// == Type Label ==
/// A type applicable to a record, e.g. `/people/person` / `Person`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeLabel {
    pub id: String,
    pub name: String,
}

impl TypeLabel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// == Record ==
/// One normalized candidate match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier in the backend's identifier space
    pub id: String,
    /// Display label
    pub name: String,
    /// Applicable types
    #[serde(rename = "type")]
    pub types: Vec<TypeLabel>,
    /// Similarity between query and label, 0.0 to 1.0
    pub score: f64,
    /// Whether the candidate can be accepted without review
    #[serde(rename = "match")]
    pub matched: bool,
}

impl Record {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            types: Vec::new(),
            score: 0.0,
            matched: false,
        }
    }

    pub fn with_type(mut self, type_label: TypeLabel) -> Self {
        self.types.push(type_label);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    pub fn with_match(mut self, matched: bool) -> Self {
        self.matched = matched;
        self
    }
}

/// Case-insensitive normalized Levenshtein similarity between query and label.
pub fn similarity(query: &str, label: &str) -> f64 {
    strsim::normalized_levenshtein(
        &query.trim().to_lowercase(),
        &label.trim().to_lowercase(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_protocol_names() {
        let record = Record::new("0000-0001-5839-7854", "Igor OZEROV")
            .with_type(TypeLabel::new("/people/person", "Person"));
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["id"], "0000-0001-5839-7854");
        assert_eq!(json["type"][0]["name"], "Person");
        assert_eq!(json["match"], false);
    }

    #[test]
    fn test_similarity_ignores_case() {
        assert_eq!(similarity("Igor Ozerov", "Igor OZEROV"), 1.0);
        assert!(similarity("Igor Ozerov", "Ivan Petrov") < 0.7);
    }
}
