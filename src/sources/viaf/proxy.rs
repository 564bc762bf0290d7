//! Proxied VIAF contributor sources
//!
//! In proxy mode a query still goes to VIAF, but results are reported in the
//! identifier space of one contributing authority file (LC, DNB, ...).

use std::sync::Arc;

use crate::error::{ReconcileError, Result};
use crate::models::{Record, SearchQuery, ServiceMetadata, ViewTemplate, EXTRA_PARAM_SOURCE_FROM_PATH};
use crate::sources::viaf::ViafSearch;
use crate::sources::{dialect, Backend, Source};

// == Contributor ==
/// A VIAF contributing authority file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contributor {
    pub code: &'static str,
    pub name: &'static str,
    /// Entity view URL; None means view through VIAF's source-id redirect
    pub view_url: Option<&'static str>,
}

/// Contributors accepted as proxy sources.
pub static CONTRIBUTORS: &[Contributor] = &[
    Contributor { code: "BNE", name: "National Library of Spain", view_url: None },
    Contributor { code: "BNF", name: "National Library of France", view_url: None },
    Contributor { code: "DNB", name: "German National Library", view_url: Some("https://d-nb.info/gnd/{{id}}") },
    Contributor { code: "ICCU", name: "Central Institute for the Union Catalogue of Italian Libraries", view_url: None },
    Contributor { code: "ISNI", name: "ISNI", view_url: Some("https://isni.org/isni/{{id}}") },
    Contributor { code: "JPG", name: "Getty Union List of Artist Names", view_url: None },
    Contributor { code: "LC", name: "Library of Congress", view_url: Some("https://id.loc.gov/authorities/names/{{id}}") },
    Contributor { code: "NDL", name: "National Diet Library, Japan", view_url: Some("https://id.ndl.go.jp/auth/ndlna/{{id}}") },
    Contributor { code: "NKC", name: "National Library of the Czech Republic", view_url: None },
    Contributor { code: "NLA", name: "National Library of Australia", view_url: None },
    Contributor { code: "NTA", name: "National Library of the Netherlands", view_url: None },
    Contributor { code: "SELIBR", name: "National Library of Sweden", view_url: None },
    Contributor { code: "SUDOC", name: "Sudoc [ABES], France", view_url: Some("https://www.idref.fr/{{id}}") },
    Contributor { code: "WKP", name: "Wikidata", view_url: Some("https://www.wikidata.org/entity/{{id}}") },
];

/// Looks up a contributor by code, ignoring case.
pub fn contributor(code: &str) -> Option<&'static Contributor> {
    CONTRIBUTORS
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code))
}

// == Proxied Source ==
/// Reports VIAF results in one contributor's identifier space.
pub struct ProxiedSource {
    contributor: &'static Contributor,
    search: Arc<ViafSearch>,
}

impl ProxiedSource {
    /// Creates the source for `code`; unknown codes are a lookup error.
    pub fn new(code: &str, search: Arc<ViafSearch>) -> Result<Self> {
        let contributor = contributor(code)
            .ok_or_else(|| ReconcileError::Lookup(format!("VIAF source {}", code)))?;
        Ok(Self {
            contributor,
            search,
        })
    }

    pub fn code(&self) -> &'static str {
        self.contributor.code
    }

    fn view_url(&self) -> String {
        match self.contributor.view_url {
            Some(url) => url.to_string(),
            None => format!("https://viaf.org/viaf/sourceID/{}%7C{{{{id}}}}", self.code()),
        }
    }
}

impl Source for ProxiedSource {
    fn endpoint_id(&self) -> String {
        format!("viafproxy/{}", self.code())
    }

    fn backend(&self) -> Backend {
        Backend::Viaf
    }

    /// Always restricted to clusters this contributor takes part in.
    fn build_query(&self, query: &SearchQuery) -> String {
        let restricted = query
            .clone()
            .with_extra_param(EXTRA_PARAM_SOURCE_FROM_PATH, self.code());
        dialect::build_cql(&restricted)
    }

    fn resolve_endpoint(&self, query: &SearchQuery) -> String {
        self.search.search_url(&self.build_query(query), query.limit())
    }

    fn describe_metadata(&self, _source_from_path: Option<&str>) -> ServiceMetadata {
        ServiceMetadata {
            name: format!("{} (by way of VIAF)", self.contributor.name),
            identifier_space: format!("http://viaf.org/viaf/sourceID/{}", self.code()),
            schema_space: "http://viaf.org/viaf/terms".to_string(),
            view: ViewTemplate {
                url: self.view_url(),
            },
            default_types: dialect::default_types(),
        }
    }

    fn parse(&self, query: &SearchQuery, body: &[u8]) -> Result<Vec<Record>> {
        self.search.parse(query, body, Some(self.code()), true)
    }
}
