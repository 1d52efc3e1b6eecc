//! Orphanet Client
//!
//! Orphanet has no free-text search endpoint, so the lookup downloads the Orphadata
//! nomenclature product (`EN_Product1.xml`) and scans it for the first disorder whose
//! preferred name contains the query.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{BioDataClient, SourceError};

pub const ORPHANET_SOURCE: &str = "Orphanet API";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanetRecord {
    pub name: String,
    pub orpha_code: String,
    pub source: String,
}

#[derive(Default)]
struct PartialDisorder {
    orpha_code: Option<String>,
    name: Option<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum Capture {
    None,
    OrphaCode,
    Name,
}

/// Find the first `Disorder` whose own `Name` contains `query` (case-insensitive).
///
/// Only the `Name` and `OrphaCode` elements that are direct children of a `Disorder` count;
/// nested blocks such as `DisorderType` carry their own `Name` elements.
pub fn parse_orphanet_xml(xml: &str, query: &str) -> Result<Option<OrphanetRecord>, SourceError> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(None);
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut disorders: Vec<PartialDisorder> = Vec::new();
    let mut capture = Capture::None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                let parent_is_disorder = path.last().map(|p| p.as_slice()) == Some(b"Disorder".as_slice());
                capture = match name.as_slice() {
                    b"Disorder" => {
                        disorders.push(PartialDisorder::default());
                        Capture::None
                    }
                    b"OrphaCode" if parent_is_disorder => Capture::OrphaCode,
                    b"Name" if parent_is_disorder => Capture::Name,
                    _ => Capture::None,
                };
                text.clear();
                path.push(name);
            }
            Event::Text(t) => {
                if capture != Capture::None {
                    text.push_str(&t.unescape()?);
                }
            }
            Event::CData(t) => {
                if capture != Capture::None {
                    text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::End(e) => {
                let ended = e.name().as_ref().to_vec();
                if let Some(current) = disorders.last_mut() {
                    match capture {
                        Capture::OrphaCode => current.orpha_code = Some(text.trim().to_string()),
                        Capture::Name => current.name = Some(text.trim().to_string()),
                        Capture::None => {}
                    }
                }
                capture = Capture::None;
                path.pop();

                if ended.as_slice() == b"Disorder" {
                    if let Some(disorder) = disorders.pop() {
                        if let (Some(name), Some(code)) = (disorder.name, disorder.orpha_code) {
                            if !code.is_empty() && name.to_lowercase().contains(&needle) {
                                return Ok(Some(OrphanetRecord {
                                    name,
                                    orpha_code: code,
                                    source: ORPHANET_SOURCE.to_string(),
                                }));
                            }
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(None)
}

impl BioDataClient {
    pub async fn fetch_orphanet(&self, query: &str) -> Result<Option<OrphanetRecord>, SourceError> {
        let xml = self
            .http()
            .get(&self.config().orphanet_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let record = parse_orphanet_xml(&xml, query)?;
        if let Some(found) = &record {
            info!(name = %found.name, orpha_code = %found.orpha_code, "Orphanet lookup completed");
        }
        Ok(record)
    }
}
