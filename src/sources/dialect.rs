//! Query Dialect Module
//!
//! Static name-type table pairing reconciliation type identifiers with VIAF
//! type codes and CQL query templates.

use crate::error::{ReconcileError, Result};
use crate::models::{SearchQuery, TypeLabel};

/// Placeholder replaced by the literal query text in a template.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Template used when the query carries no (known) name type.
pub const DEFAULT_QUERY_TEMPLATE: &str = "local.mainHeadingEl all \"{query}\"";

// == Name Type Entry ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameTypeEntry {
    /// Reconciliation type identifier
    pub id: &'static str,
    pub display_name: &'static str,
    /// Type code used by the backend (VIAF `nameType`)
    pub backend_code: &'static str,
    /// CQL template with one `{query}` placeholder
    pub query_template: &'static str,
}

impl NameTypeEntry {
    pub fn type_label(&self) -> TypeLabel {
        TypeLabel::new(self.id, self.display_name)
    }
}

/// All known name types. Identifiers and backend codes are unique.
pub static NAME_TYPES: [NameTypeEntry; 5] = [
    NameTypeEntry {
        id: "/people/person",
        display_name: "Person",
        backend_code: "Personal",
        query_template: "local.personalNames all \"{query}\"",
    },
    NameTypeEntry {
        id: "/organization/organization",
        display_name: "Corporate Name",
        backend_code: "Corporate",
        query_template: "local.corporateNames all \"{query}\"",
    },
    NameTypeEntry {
        id: "/location/location",
        display_name: "Geographic Name",
        backend_code: "Geographic",
        query_template: "local.geographicNames all \"{query}\"",
    },
    NameTypeEntry {
        id: "/book/book",
        display_name: "Work",
        backend_code: "UniformTitleWork",
        query_template: "local.uniformTitleWorks all \"{query}\"",
    },
    NameTypeEntry {
        id: "/book/book edition",
        display_name: "Expression",
        backend_code: "UniformTitleExpression",
        query_template: "local.uniformTitleExpressions all \"{query}\"",
    },
];

/// The person entry, used by sources that only hold people.
pub fn person() -> &'static NameTypeEntry {
    &NAME_TYPES[0]
}

// == Lookups ==
pub fn by_id(id: &str) -> Result<&'static NameTypeEntry> {
    NAME_TYPES
        .iter()
        .find(|entry| entry.id == id)
        .ok_or_else(|| ReconcileError::Lookup(format!("name type {}", id)))
}

pub fn by_backend_code(code: &str) -> Result<&'static NameTypeEntry> {
    NAME_TYPES
        .iter()
        .find(|entry| entry.backend_code == code)
        .ok_or_else(|| ReconcileError::Lookup(format!("backend type code {}", code)))
}

/// Type labels for every known name type.
pub fn default_types() -> Vec<TypeLabel> {
    NAME_TYPES.iter().map(NameTypeEntry::type_label).collect()
}

// == Query Construction ==
/// Replaces the placeholder with `text`. The text is inserted once and never
/// scanned for placeholders itself.
pub fn fill_template(template: &str, text: &str) -> String {
    template.replacen(QUERY_PLACEHOLDER, text, 1)
}

/// Builds the CQL clause for a query.
///
/// Unknown name types fall back to the default template. A source code from
/// the request path appends a lower-cased `local.sources` restriction.
pub fn build_cql(query: &SearchQuery) -> String {
    let template = query
        .name_type()
        .and_then(|id| by_id(id).ok())
        .map(|entry| entry.query_template)
        .unwrap_or(DEFAULT_QUERY_TEMPLATE);

    let mut cql = fill_template(template, &query.normalized_query());
    if let Some(source) = query.source_from_path() {
        cql.push_str(&format!(" and local.sources = \"{}\"", source.to_lowercase()));
    }
    cql
}
