use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::Citation;

#[derive(Debug, Default)]
struct CitationSet {
    seen: HashSet<String>,
    entries: Vec<Citation>,
}

/// Append-only, uri-keyed citation collection shared by the concurrent agents of one search.
///
/// The first citation seen for a uri wins; later titles for the same uri are ignored.
#[derive(Debug, Clone, Default)]
pub struct CitationSink {
    inner: Arc<RwLock<CitationSet>>,
}

impl CitationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the citations whose uri is not yet present; returns how many were added
    pub async fn extend<I>(&self, citations: I) -> usize
    where
        I: IntoIterator<Item = Citation>,
    {
        // Check and append under one guard so concurrent agents cannot both insert a uri
        let mut guard = self.inner.write().await;
        let mut added = 0;
        for citation in citations {
            if guard.seen.insert(citation.uri.clone()) {
                guard.entries.push(citation);
                added += 1;
            }
        }
        added
    }

    pub async fn snapshot(&self) -> Vec<Citation> {
        let guard = self.inner.read().await;
        guard.entries.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
