//! NCBI E-utilities Client
//!
//! PubMed, ClinVar, Gene and OMIM all follow the same two-step protocol:
//! 1. `esearch.fcgi` turns the free-text term into a list of record ids
//! 2. `esummary.fcgi` returns a `result` object keyed by those ids
//!
//! An empty id list ends the lookup before the summary request is made.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{non_empty, BioDataClient, SourceError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubMedArticle {
    pub title: String,
    pub authors: String,
    pub journal: String,
    pub year: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinVarVariant {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gene: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub significance: Option<String>,
    pub variation_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneRecord {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub uid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OmimEntry {
    pub omim_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub entry_type: String,
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Summary records in the order esearch returned their ids
fn records<'a>(result: &'a Value, ids: &'a [String]) -> impl Iterator<Item = (&'a str, &'a Value)> {
    ids.iter()
        .filter_map(move |id| result.get(id.as_str()).map(|record| (id.as_str(), record)))
}

impl BioDataClient {
    async fn esearch(&self, db: &str, term: &str, retmax: u32) -> Result<Vec<String>, SourceError> {
        let url = format!("{}/esearch.fcgi", self.config().eutils_base);
        let retmax = retmax.to_string();
        let body: Value = self
            .http()
            .get(&url)
            .query(&[
                ("db", db),
                ("term", term),
                ("retmode", "json"),
                ("retmax", retmax.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let ids = body
            .get("esearchresult")
            .and_then(|r| r.get("idlist"))
            .and_then(|l| l.as_array())
            .map(|list| {
                list.iter()
                    .filter_map(|id| match id {
                        Value::String(s) if !s.is_empty() => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        debug!(db = %db, ids = ?ids, "esearch completed");
        Ok(ids)
    }

    async fn esummary(&self, db: &str, ids: &[String]) -> Result<Value, SourceError> {
        let url = format!("{}/esummary.fcgi", self.config().eutils_base);
        let id_list = ids.join(",");
        let mut body: Value = self
            .http()
            .get(&url)
            .query(&[("db", db), ("id", id_list.as_str()), ("retmode", "json")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match body.get_mut("result").map(Value::take) {
            Some(result @ Value::Object(_)) => Ok(result),
            _ => Err(SourceError::Malformed(format!(
                "esummary for {} returned no result object",
                db
            ))),
        }
    }

    pub async fn fetch_pubmed(&self, query: &str) -> Result<Option<Vec<PubMedArticle>>, SourceError> {
        let ids = self
            .esearch("pubmed", query, self.config().pubmed_max_results)
            .await?;
        if ids.is_empty() {
            return Ok(None);
        }

        let result = self.esummary("pubmed", &ids).await?;
        let articles: Vec<PubMedArticle> = records(&result, &ids)
            .filter_map(|(id, paper)| {
                let title = str_field(paper, "title")?;
                let authors = paper
                    .get("authors")
                    .and_then(|a| a.as_array())
                    .map(|list| {
                        list.iter()
                            .filter_map(|a| a.get("name").and_then(|n| n.as_str()))
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .unwrap_or_default();
                let year = str_field(paper, "pubdate")
                    .and_then(|d| d.split_whitespace().next().map(String::from))
                    .unwrap_or_default();
                let uid = str_field(paper, "uid").unwrap_or_else(|| id.to_string());

                Some(PubMedArticle {
                    title,
                    authors,
                    journal: str_field(paper, "fulljournalname").unwrap_or_default(),
                    year,
                    link: format!("https://pubmed.ncbi.nlm.nih.gov/{}/", uid),
                })
            })
            .collect();

        info!(count = articles.len(), "PubMed lookup completed");
        Ok(non_empty(articles))
    }

    pub async fn fetch_clinvar(&self, query: &str) -> Result<Option<Vec<ClinVarVariant>>, SourceError> {
        let term = format!("{} AND pathogenic[clinical significance]", query);
        let ids = self
            .esearch("clinvar", &term, self.config().clinvar_max_results)
            .await?;
        if ids.is_empty() {
            return Ok(None);
        }

        let result = self.esummary("clinvar", &ids).await?;
        let variants: Vec<ClinVarVariant> = records(&result, &ids)
            .filter_map(|(id, variant)| {
                let title = str_field(variant, "title")?;
                let gene = variant
                    .get("genes")
                    .and_then(|g| g.as_array())
                    .and_then(|g| g.first())
                    .and_then(|g| str_field(g, "symbol"));
                // Newer ClinVar summaries moved the call to germline_classification
                let significance = ["clinical_significance", "germline_classification"]
                    .iter()
                    .find_map(|key| variant.get(*key).and_then(|c| str_field(c, "description")));

                Some(ClinVarVariant {
                    title,
                    gene,
                    significance,
                    variation_id: str_field(variant, "uid").unwrap_or_else(|| id.to_string()),
                })
            })
            .collect();

        info!(count = variants.len(), "ClinVar lookup completed");
        Ok(non_empty(variants))
    }

    pub async fn fetch_gene(&self, query: &str) -> Result<Option<GeneRecord>, SourceError> {
        let term = format!("{} AND human[organism]", query);
        let ids = self.esearch("gene", &term, 1).await?;
        let Some(id) = ids.first() else {
            return Ok(None);
        };

        let result = self.esummary("gene", &ids[..1]).await?;
        let Some(gene) = result.get(id.as_str()) else {
            return Ok(None);
        };
        let Some(symbol) = str_field(gene, "name") else {
            return Ok(None);
        };

        info!(symbol = %symbol, "NCBI Gene lookup completed");
        Ok(Some(GeneRecord {
            symbol,
            description: str_field(gene, "description"),
            summary: str_field(gene, "summary"),
            location: str_field(gene, "maplocation"),
            uid: id.clone(),
        }))
    }

    pub async fn fetch_omim(&self, query: &str) -> Result<Option<Vec<OmimEntry>>, SourceError> {
        let ids = self
            .esearch("omim", query, self.config().omim_max_results)
            .await?;
        if ids.is_empty() {
            return Ok(None);
        }

        let result = self.esummary("omim", &ids).await?;
        let entries: Vec<OmimEntry> = records(&result, &ids)
            .filter_map(|(id, entry)| {
                Some(OmimEntry {
                    title: str_field(entry, "title")?,
                    omim_id: str_field(entry, "uid").unwrap_or_else(|| id.to_string()),
                    entry_type: str_field(entry, "type").unwrap_or_else(|| "phenotype".to_string()),
                })
            })
            .collect();

        info!(count = entries.len(), "OMIM lookup completed");
        Ok(non_empty(entries))
    }
}
