//! ORCID sources
//!
//! Queries ORCID's expanded-search API. In smart-names mode a two-part name
//! is split into given and family names and searched field by field.

use tracing::debug;

use crate::error::Result;
use crate::models::{similarity, Record, SearchQuery, ServiceMetadata, TypeLabel, ViewTemplate};
use crate::parser::StreamingRecordParser;
use crate::sources::{dialect, Backend, Source};

const RESULT: &str = "expanded-search/expanded-result";

// == Name Splitting ==
/// Splits "given family" or "family, given" into `[given, family]`.
///
/// Anything else (more or fewer parts, or an abbreviation such as "dr.")
/// is ambiguous and yields None.
pub fn parse_name(name: &str) -> Option<[String; 2]> {
    let (given, family) = match name.split_once(',') {
        Some((family, given)) => (given.trim(), family.trim()),
        None => {
            let parts: Vec<&str> = name.split_whitespace().collect();
            match parts.as_slice() {
                [given, family] => (*given, *family),
                _ => return None,
            }
        }
    };

    (is_name_part(given) && is_name_part(family))
        .then(|| [given.to_string(), family.to_string()])
}

fn is_name_part(part: &str) -> bool {
    !part.is_empty() && !part.ends_with('.') && !part.contains(|c: char| c.is_whitespace() || c == ',')
}

// == Parser ==
#[derive(Debug, Default)]
struct Candidate {
    orcid_id: String,
    given_names: String,
    family_names: String,
    credit_name: String,
}

impl Candidate {
    fn label(&self) -> String {
        let credit = self.credit_name.trim();
        if !credit.is_empty() {
            return credit.to_string();
        }
        format!("{} {}", self.given_names.trim(), self.family_names.trim())
            .trim()
            .to_string()
    }
}

/// Per-pass state of the ORCID parser.
#[derive(Debug, Default)]
pub struct OrcidScratch {
    query_text: String,
    person: Option<TypeLabel>,
    current: Candidate,
}

impl OrcidScratch {
    pub fn new(query_text: &str) -> Self {
        Self {
            query_text: query_text.to_string(),
            person: Some(dialect::person().type_label()),
            current: Candidate::default(),
        }
    }

    fn finish_candidate(&mut self) -> Option<Record> {
        let candidate = std::mem::take(&mut self.current);
        let id = candidate.orcid_id.trim().to_string();
        if id.is_empty() {
            return None;
        }

        let label = candidate.label();
        let mut record = Record::new(id, label.clone())
            .with_score(similarity(&self.query_text, &label))
            .with_match(false);
        if let Some(person) = &self.person {
            record = record.with_type(person.clone());
        }
        Some(record)
    }
}

/// Builds the expanded-search parser.
pub fn orcid_parser() -> StreamingRecordParser<OrcidScratch> {
    StreamingRecordParser::new(OrcidScratch::default)
        .on_enter(RESULT, |state, _| state.scratch.current = Candidate::default())
        .on_text(&format!("{}/orcid-id", RESULT), |state, text| {
            state.scratch.current.orcid_id = text;
        })
        .on_text(&format!("{}/given-names", RESULT), |state, text| {
            state.scratch.current.given_names = text;
        })
        .on_text(&format!("{}/family-names", RESULT), |state, text| {
            state.scratch.current.family_names = text;
        })
        .on_text(&format!("{}/credit-name", RESULT), |state, text| {
            state.scratch.current.credit_name = text;
        })
        .on_exit(RESULT, |state, _| {
            if let Some(record) = state.scratch.finish_candidate() {
                state.emit(record);
            }
        })
}

// == ORCID Source ==
pub struct OrcidSource {
    base_url: String,
    smart_names: bool,
    parser: StreamingRecordParser<OrcidScratch>,
}

impl OrcidSource {
    pub fn new(base_url: impl Into<String>, smart_names: bool) -> Self {
        Self {
            base_url: base_url.into(),
            smart_names,
            parser: orcid_parser(),
        }
    }
}

impl Source for OrcidSource {
    fn endpoint_id(&self) -> String {
        if self.smart_names {
            "orcid/smartnames".to_string()
        } else {
            "orcid".to_string()
        }
    }

    fn backend(&self) -> Backend {
        Backend::Orcid
    }

    fn build_query(&self, query: &SearchQuery) -> String {
        let text = query.normalized_query();
        if self.smart_names {
            if let Some([given, family]) = parse_name(&text) {
                return format!("given-names:{} AND family-names:{}", given, family);
            }
        }
        text
    }

    fn resolve_endpoint(&self, query: &SearchQuery) -> String {
        format!(
            "{}?q={}&start=0&rows={}",
            self.base_url,
            urlencoding::encode(&self.build_query(query)),
            query.limit()
        )
    }

    fn describe_metadata(&self, _source_from_path: Option<&str>) -> ServiceMetadata {
        let name = if self.smart_names {
            "ORCID - Smart Names Mode"
        } else {
            "ORCID"
        };

        ServiceMetadata {
            name: name.to_string(),
            identifier_space: "http://orcid.org/".to_string(),
            schema_space: "http://orcid.org/".to_string(),
            view: ViewTemplate {
                url: "https://orcid.org/{{id}}".to_string(),
            },
            default_types: vec![dialect::person().type_label()],
        }
    }

    fn parse(&self, query: &SearchQuery, body: &[u8]) -> Result<Vec<Record>> {
        let records = self
            .parser
            .parse_with(body, OrcidScratch::new(&query.normalized_query()))?;
        debug!(
            "ORCID query {:?} parsed {} records",
            query.query(),
            records.len()
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<expanded-search:expanded-search num-found="2" xmlns:expanded-search="http://www.orcid.org/ns/expanded-search">
  <expanded-search:expanded-result>
    <expanded-search:orcid-id>0000-0001-5839-7854</expanded-search:orcid-id>
    <expanded-search:given-names>Igor</expanded-search:given-names>
    <expanded-search:family-names>OZEROV</expanded-search:family-names>
    <expanded-search:institution-name>Lomonosov Moscow State University</expanded-search:institution-name>
  </expanded-search:expanded-result>
  <expanded-search:expanded-result>
    <expanded-search:orcid-id>0000-0002-1825-0097</expanded-search:orcid-id>
    <expanded-search:given-names>Josiah</expanded-search:given-names>
    <expanded-search:family-names>Carberry</expanded-search:family-names>
    <expanded-search:credit-name>J. S. Carberry</expanded-search:credit-name>
  </expanded-search:expanded-result>
</expanded-search:expanded-search>"#;

    #[test]
    fn test_parse_name() {
        assert_eq!(
            parse_name("joe schmoe"),
            Some(["joe".to_string(), "schmoe".to_string()])
        );
        assert_eq!(
            parse_name("schmoe, joe"),
            Some(["joe".to_string(), "schmoe".to_string()])
        );
        assert_eq!(parse_name("dr. joe schmoe"), None);
    }

    #[test]
    fn test_parse_name_rejects_other_shapes() {
        assert_eq!(parse_name("cher"), None);
        assert_eq!(parse_name("schmoe, dr."), None);
        assert_eq!(parse_name("van gogh, vincent"), None);
        assert_eq!(parse_name(""), None);
    }

    #[test]
    fn test_smart_query() {
        let source = OrcidSource::new("https://pub.orcid.org/v3.0/expanded-search/", true);
        let query = SearchQuery::new("Igor Ozerov", 3).unwrap();
        assert_eq!(
            source.build_query(&query),
            "given-names:Igor AND family-names:Ozerov"
        );
        assert_eq!(
            source.resolve_endpoint(&query),
            "https://pub.orcid.org/v3.0/expanded-search/?q=given-names%3AIgor%20AND%20family-names%3AOzerov&start=0&rows=3"
        );
    }

    #[test]
    fn test_smart_query_falls_back_to_text() {
        let source = OrcidSource::new("https://pub.orcid.org/v3.0/expanded-search/", true);
        let query = SearchQuery::new("dr. joe schmoe", 3).unwrap();
        assert_eq!(source.build_query(&query), "dr. joe schmoe");
    }

    #[test]
    fn test_parse_results() {
        let source = OrcidSource::new("https://pub.orcid.org/v3.0/expanded-search/", false);
        let query = SearchQuery::new("Igor Ozerov", 3).unwrap();
        let records = source.parse(&query, RESPONSE.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "0000-0001-5839-7854");
        assert_eq!(records[0].name, "Igor OZEROV");
        assert_eq!(records[0].types[0].name, "Person");
        assert!(!records[0].matched);
        assert_eq!(records[1].name, "J. S. Carberry");
    }

    #[test]
    fn test_metadata_names() {
        let smart = OrcidSource::new("https://pub.orcid.org/v3.0/expanded-search/", true);
        let plain = OrcidSource::new("https://pub.orcid.org/v3.0/expanded-search/", false);
        assert_eq!(smart.describe_metadata(None).name, "ORCID - Smart Names Mode");
        assert_eq!(plain.describe_metadata(None).name, "ORCID");
    }

    proptest! {
        #[test]
        fn prop_both_name_orders_agree(given in "[A-Za-z]{1,12}", family in "[A-Za-z]{1,12}") {
            let forward = parse_name(&format!("{} {}", given, family));
            let reversed = parse_name(&format!("{}, {}", family, given));
            prop_assert_eq!(forward.clone(), Some([given, family]));
            prop_assert_eq!(forward, reversed);
        }
    }
}
