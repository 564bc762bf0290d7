//! Solr source
//!
//! Reconciles against a Solr core's standard XML response writer. The id
//! and label fields are configurable, so the source is located by the
//! `name` attribute on each `<doc>` child rather than by element name.

use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::models::{similarity, Record, SearchQuery, ServiceMetadata, ViewTemplate};
use crate::parser::{Element, ParseState, StreamingRecordParser};
use crate::sources::{Backend, Source};

const DOC: &str = "response/result/doc";

/// Solr's XML value elements that can carry an id or a label.
const VALUE_TAGS: [&str; 3] = ["str", "int", "long"];

/// Characters with meaning in the Lucene query syntax.
const QUERY_SPECIAL: &str = r#"+-&|!(){}[]^"~*?:\/"#;

/// Escapes Lucene syntax so the query text is searched literally.
pub fn escape_query_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if QUERY_SPECIAL.contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// == Parser ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Name,
}

/// Per-pass state of the Solr parser.
#[derive(Debug, Default)]
pub struct SolrScratch {
    query_text: String,
    id_field: String,
    name_field: String,
    /// Field named by the enclosing `<arr>`, if it is one we extract
    array_field: Option<Field>,
    /// Field whose value is being captured
    capturing: Option<Field>,
    id: Option<String>,
    name: Option<String>,
}

impl SolrScratch {
    pub fn new(query_text: &str, id_field: &str, name_field: &str) -> Self {
        Self {
            query_text: query_text.to_string(),
            id_field: id_field.to_string(),
            name_field: name_field.to_string(),
            ..Self::default()
        }
    }

    fn field_for(&self, attribute: Option<&str>) -> Option<Field> {
        match attribute {
            Some(name) if name == self.id_field => Some(Field::Id),
            Some(name) if name == self.name_field => Some(Field::Name),
            _ => None,
        }
    }

    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Id => &mut self.id,
            Field::Name => &mut self.name,
        }
    }

    fn finish_doc(&mut self) -> Option<Record> {
        let id = self.id.take().map(|id| id.trim().to_string())?;
        if id.is_empty() {
            return None;
        }
        let label = self
            .name
            .take()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| id.clone());

        Some(
            Record::new(id, label.clone())
                .with_score(similarity(&self.query_text, &label))
                .with_match(label.eq_ignore_ascii_case(self.query_text.trim())),
        )
    }
}

fn enter_value(state: &mut ParseState<SolrScratch>, element: &Element<'_>) {
    let field = state.scratch.field_for(element.attribute("name"));
    begin_value(state, field);
}

/// Only the first value of a multi-valued field is used.
fn enter_array_value(state: &mut ParseState<SolrScratch>, _element: &Element<'_>) {
    let field = state.scratch.array_field;
    begin_value(state, field);
}

fn begin_value(state: &mut ParseState<SolrScratch>, field: Option<Field>) {
    if let Some(field) = field {
        if state.scratch.slot(field).is_none() {
            state.scratch.capturing = Some(field);
            state.start_capture();
        }
    }
}

fn exit_value(state: &mut ParseState<SolrScratch>, _path: &str) {
    if let Some(field) = state.scratch.capturing.take() {
        let text = state.take_buffer();
        *state.scratch.slot(field) = Some(text);
    }
}

/// Builds the parser for `response/result/doc` documents.
pub fn solr_parser() -> StreamingRecordParser<SolrScratch> {
    let mut parser = StreamingRecordParser::new(SolrScratch::default)
        .on_enter(DOC, |state, _| {
            state.scratch.id = None;
            state.scratch.name = None;
        })
        .on_exit(DOC, |state, _| {
            if let Some(record) = state.scratch.finish_doc() {
                state.emit(record);
            }
        })
        .on_enter(&format!("{}/arr", DOC), |state, element| {
            state.scratch.array_field = state.scratch.field_for(element.attribute("name"));
        })
        .on_exit(&format!("{}/arr", DOC), |state, _| {
            state.scratch.array_field = None;
        });

    for tag in VALUE_TAGS {
        parser = parser
            .on_enter(&format!("{}/{}", DOC, tag), enter_value)
            .on_exit(&format!("{}/{}", DOC, tag), exit_value)
            .on_enter(&format!("{}/arr/{}", DOC, tag), enter_array_value)
            .on_exit(&format!("{}/arr/{}", DOC, tag), exit_value);
    }
    parser
}

// == Solr Source ==
pub struct SolrSource {
    url: String,
    name: String,
    id_field: String,
    name_field: String,
    view_url: String,
    parser: StreamingRecordParser<SolrScratch>,
}

impl SolrSource {
    pub fn from_config(config: &Config) -> Self {
        Self {
            url: config.solr_url.clone(),
            name: config.solr_name.clone(),
            id_field: config.solr_id_field.clone(),
            name_field: config.solr_name_field.clone(),
            view_url: config.solr_view_url.clone(),
            parser: solr_parser(),
        }
    }
}

impl Source for SolrSource {
    fn endpoint_id(&self) -> String {
        "solr".to_string()
    }

    fn backend(&self) -> Backend {
        Backend::Solr
    }

    fn build_query(&self, query: &SearchQuery) -> String {
        format!(
            "{}:({})",
            self.name_field,
            escape_query_text(&query.normalized_query())
        )
    }

    fn resolve_endpoint(&self, query: &SearchQuery) -> String {
        let fields = format!("{},{}", self.id_field, self.name_field);
        format!(
            "{}?q={}&rows={}&fl={}&wt=xml",
            self.url,
            urlencoding::encode(&self.build_query(query)),
            query.limit(),
            urlencoding::encode(&fields)
        )
    }

    fn describe_metadata(&self, _source_from_path: Option<&str>) -> ServiceMetadata {
        ServiceMetadata {
            name: self.name.clone(),
            identifier_space: self.url.clone(),
            schema_space: self.url.clone(),
            view: ViewTemplate {
                url: self.view_url.clone(),
            },
            default_types: Vec::new(),
        }
    }

    fn parse(&self, query: &SearchQuery, body: &[u8]) -> Result<Vec<Record>> {
        let scratch = SolrScratch::new(&query.normalized_query(), &self.id_field, &self.name_field);
        let records = self.parser.parse_with(body, scratch)?;
        debug!(
            "Solr query {:?} parsed {} records",
            query.query(),
            records.len()
        );
        Ok(records)
    }
}
