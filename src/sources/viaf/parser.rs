//! VIAF response parser
//!
//! Extracts one record per `VIAFCluster` from an SRU searchRetrieveResponse.

use tracing::debug;

use crate::models::{similarity, Record};
use crate::parser::StreamingRecordParser;
use crate::sources::dialect;

const CLUSTER: &str = "searchRetrieveResponse/records/record/recordData/VIAFCluster";

/// One main heading of a cluster and the sources that contributed it.
#[derive(Debug, Default)]
struct Heading {
    text: String,
    sources: Vec<String>,
    sids: Vec<String>,
}

#[derive(Debug, Default)]
struct Cluster {
    viaf_id: String,
    name_type: Option<String>,
    headings: Vec<Heading>,
}

impl Cluster {
    fn last_heading(&mut self) -> Option<&mut Heading> {
        self.headings.last_mut()
    }
}

// == VIAF Scratch ==
/// Per-pass state of the VIAF parser.
#[derive(Debug, Default)]
pub struct ViafScratch {
    query_text: String,
    /// Upper-cased source code whose heading (and, in proxy mode, id) is preferred
    preferred_source: Option<String>,
    /// Use the preferred source's own identifier instead of the VIAF id
    proxy: bool,
    cluster: Cluster,
}

impl ViafScratch {
    pub fn new(query_text: &str, preferred_source: Option<&str>, proxy: bool) -> Self {
        Self {
            query_text: query_text.to_string(),
            preferred_source: preferred_source.map(str::to_uppercase),
            proxy,
            cluster: Cluster::default(),
        }
    }

    /// Turns the finished cluster into a record, if it has a usable label and id.
    fn finish_cluster(&mut self) -> Option<Record> {
        let cluster = std::mem::take(&mut self.cluster);
        let heading = self.choose_heading(&cluster)?;
        let label = heading.text.trim().to_string();
        if label.is_empty() {
            return None;
        }

        let id = if self.proxy {
            let code = self.preferred_source.as_deref()?;
            source_local_id(&cluster, code)?
        } else {
            cluster.viaf_id.trim().to_string()
        };
        if id.is_empty() {
            return None;
        }

        let mut record = Record::new(id, label.clone())
            .with_score(similarity(&self.query_text, &label))
            .with_match(label.eq_ignore_ascii_case(self.query_text.trim()));

        if let Some(code) = cluster.name_type.as_deref() {
            match dialect::by_backend_code(code) {
                Ok(entry) => record = record.with_type(entry.type_label()),
                Err(err) => debug!("Cluster {} has no known type: {}", cluster.viaf_id, err),
            }
        }
        Some(record)
    }

    /// Heading from the preferred source, else the most widely contributed one.
    fn choose_heading<'c>(&self, cluster: &'c Cluster) -> Option<&'c Heading> {
        if let Some(code) = &self.preferred_source {
            let preferred = cluster
                .headings
                .iter()
                .find(|h| h.sources.iter().any(|s| s.eq_ignore_ascii_case(code)));
            if preferred.is_some() {
                return preferred;
            }
        }

        // max_by_key keeps the last of equal maxima; reverse so ties go to the first
        cluster
            .headings
            .iter()
            .rev()
            .max_by_key(|h| h.sources.len())
    }
}

/// Identifier a contributing source uses for this cluster, from `CODE|local id`.
fn source_local_id(cluster: &Cluster, code: &str) -> Option<String> {
    cluster
        .headings
        .iter()
        .flat_map(|h| h.sids.iter())
        .find_map(|sid| {
            let (sid_code, local) = sid.trim().split_once('|')?;
            sid_code
                .eq_ignore_ascii_case(code)
                .then(|| local.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        })
        .filter(|id| !id.is_empty())
}

// == Parser Construction ==
/// Builds the VIAF parser. Built once and shared by all VIAF sources.
pub fn viaf_parser() -> StreamingRecordParser<ViafScratch> {
    StreamingRecordParser::new(ViafScratch::default)
        .on_enter(CLUSTER, |state, _| state.scratch.cluster = Cluster::default())
        .on_text(&format!("{}/viafID", CLUSTER), |state, text| {
            state.scratch.cluster.viaf_id = text;
        })
        .on_text(&format!("{}/nameType", CLUSTER), |state, text| {
            state.scratch.cluster.name_type = Some(text.trim().to_string());
        })
        .on_enter(&format!("{}/mainHeadings/data", CLUSTER), |state, _| {
            state.scratch.cluster.headings.push(Heading::default());
        })
        .on_text(&format!("{}/mainHeadings/data/text", CLUSTER), |state, text| {
            if let Some(heading) = state.scratch.cluster.last_heading() {
                heading.text = text;
            }
        })
        .on_text(&format!("{}/mainHeadings/data/sources/s", CLUSTER), |state, text| {
            if let Some(heading) = state.scratch.cluster.last_heading() {
                heading.sources.push(text.trim().to_string());
            }
        })
        .on_text(&format!("{}/mainHeadings/data/sources/sid", CLUSTER), |state, text| {
            if let Some(heading) = state.scratch.cluster.last_heading() {
                heading.sids.push(text);
            }
        })
        .on_exit(CLUSTER, |state, _| {
            if let Some(record) = state.scratch.finish_cluster() {
                state.emit(record);
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<searchRetrieveResponse xmlns="http://www.loc.gov/zing/srw/">
  <numberOfRecords>2</numberOfRecords>
  <records>
    <record>
      <recordData>
        <ns2:VIAFCluster xmlns:ns2="http://viaf.org/viaf/terms#">
          <ns2:viafID>102333412</ns2:viafID>
          <ns2:nameType>Personal</ns2:nameType>
          <ns2:mainHeadings>
            <ns2:data>
              <ns2:text>Austen, Jane, 1775-1817</ns2:text>
              <ns2:sources><ns2:s>LC</ns2:s><ns2:sid>LC|n  79032879</ns2:sid><ns2:s>NKC</ns2:s><ns2:sid>NKC|jn19990000355</ns2:sid></ns2:sources>
            </ns2:data>
            <ns2:data>
              <ns2:text>Austen, Jane</ns2:text>
              <ns2:sources><ns2:s>DNB</ns2:s><ns2:sid>DNB|118505173</ns2:sid></ns2:sources>
            </ns2:data>
          </ns2:mainHeadings>
        </ns2:VIAFCluster>
      </recordData>
    </record>
    <record>
      <recordData>
        <ns2:VIAFCluster xmlns:ns2="http://viaf.org/viaf/terms#">
          <ns2:viafID>64013650</ns2:viafID>
          <ns2:nameType>Imaginary</ns2:nameType>
          <ns2:mainHeadings>
            <ns2:data>
              <ns2:text>Austen family</ns2:text>
              <ns2:sources><ns2:s>LC</ns2:s><ns2:sid>LC|sh 85009939</ns2:sid></ns2:sources>
            </ns2:data>
          </ns2:mainHeadings>
        </ns2:VIAFCluster>
      </recordData>
    </record>
  </records>
</searchRetrieveResponse>"#;

    #[test]
    fn test_canonical_records() {
        let scratch = ViafScratch::new("Jane Austen", None, false);
        let records = viaf_parser().parse_with(RESPONSE.as_bytes(), scratch).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "102333412");
        assert_eq!(records[0].name, "Austen, Jane, 1775-1817");
        assert_eq!(records[0].types[0].name, "Person");
        assert!(!records[0].matched);
        assert!(records[0].score > 0.0);

        // Unknown type code is advisory
        assert_eq!(records[1].id, "64013650");
        assert!(records[1].types.is_empty());
    }

    #[test]
    fn test_preferred_source_heading() {
        let scratch = ViafScratch::new("Austen, Jane", Some("dnb"), false);
        let records = viaf_parser().parse_with(RESPONSE.as_bytes(), scratch).unwrap();

        assert_eq!(records[0].id, "102333412");
        assert_eq!(records[0].name, "Austen, Jane");
        assert!(records[0].matched);
        assert_eq!(records[0].score, 1.0);
    }

    #[test]
    fn test_proxy_mode_uses_source_ids() {
        let scratch = ViafScratch::new("Jane Austen", Some("LC"), true);
        let records = viaf_parser().parse_with(RESPONSE.as_bytes(), scratch).unwrap();

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["n79032879", "sh85009939"]);
    }

    #[test]
    fn test_proxy_mode_skips_clusters_without_source() {
        let scratch = ViafScratch::new("Jane Austen", Some("DNB"), true);
        let records = viaf_parser().parse_with(RESPONSE.as_bytes(), scratch).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "118505173");
    }

    #[test]
    fn test_empty_result_set() {
        let xml = r#"<searchRetrieveResponse><numberOfRecords>0</numberOfRecords></searchRetrieveResponse>"#;
        let records = viaf_parser().parse(xml.as_bytes()).unwrap();
        assert!(records.is_empty());
    }
}
