//! UniProt Client

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{non_empty, BioDataClient, SourceError};

/// Condensed UniProtKB entry used as a protein target candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniProtEntry {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gene: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

fn nested_str(value: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |current, key| current.get(*key))
        .and_then(|v| v.as_str())
        .map(String::from)
}

fn parse_entry(result: &Value) -> Option<UniProtEntry> {
    let id = nested_str(result, &["primaryAccession"])?;

    let name = nested_str(
        result,
        &["proteinDescription", "recommendedName", "fullName", "value"],
    );

    let gene = result
        .get("genes")
        .and_then(|g| g.as_array())
        .and_then(|g| g.first())
        .and_then(|g| nested_str(g, &["geneName", "value"]));

    let function = result
        .get("comments")
        .and_then(|c| c.as_array())
        .and_then(|comments| {
            comments
                .iter()
                .find(|c| c.get("commentType").and_then(|t| t.as_str()) == Some("FUNCTION"))
        })
        .and_then(|c| c.get("texts"))
        .and_then(|t| t.as_array())
        .and_then(|t| t.first())
        .and_then(|t| nested_str(t, &["value"]));

    Some(UniProtEntry {
        id,
        name,
        gene,
        function,
    })
}

impl BioDataClient {
    pub async fn fetch_uniprot(&self, query: &str) -> Result<Option<Vec<UniProtEntry>>, SourceError> {
        let url = format!("{}/uniprotkb/search", self.config().uniprot_base);
        let size = self.config().uniprot_max_results.to_string();
        let body: Value = self
            .http()
            .get(&url)
            .query(&[("query", query), ("format", "json"), ("size", size.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(results) = body.get("results").and_then(|r| r.as_array()) else {
            return Ok(None);
        };

        let entries: Vec<UniProtEntry> = results.iter().filter_map(parse_entry).collect();

        info!(count = entries.len(), "UniProt lookup completed");
        Ok(non_empty(entries))
    }
}
