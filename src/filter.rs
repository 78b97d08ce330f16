//! Candidate filtering.
//!
//! [`filter_unprocessed`] drops candidates whose `(source_name, path)` key
//! already has a provenance record. [`gather_candidates`] runs every
//! registered source, filters its listing, and returns the pooled
//! candidates together with a per-source outcome: a source that cannot list
//! is reported and skipped, never aborting the others.

use tracing::{info, warn};

use crate::error::SourceError;
use crate::models::CandidateItem;
use crate::provenance::ProvenanceStore;
use crate::select::Candidate;
use crate::traits::SourceRegistry;

/// Keep only candidates with no provenance record. Order-preserving.
pub fn filter_unprocessed(candidates: Vec<CandidateItem>, store: &ProvenanceStore) -> Vec<CandidateItem> {
    if store.is_empty() {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|item| !store.contains(&item.source_name, &item.path))
        .collect()
}

/// Counts for a source that listed successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceCounts {
    pub listed: usize,
    pub unprocessed: usize,
}

/// Outcome of listing one source.
#[derive(Debug)]
pub struct SourceReport {
    pub source_name: String,
    pub source_type: String,
    pub outcome: Result<SourceCounts, SourceError>,
}

/// Unprocessed candidates from all sources, with per-source outcomes.
pub struct CandidatePool<'a> {
    pub candidates: Vec<Candidate<'a>>,
    pub reports: Vec<SourceReport>,
}

impl CandidatePool<'_> {
    /// Number of sources that listed successfully.
    pub fn healthy_sources(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_ok()).count()
    }
}

/// List every source, drop already-processed items, and pool the rest.
pub async fn gather_candidates<'a>(
    registry: &'a SourceRegistry,
    store: &ProvenanceStore,
) -> CandidatePool<'a> {
    let mut candidates = Vec::new();
    let mut reports = Vec::with_capacity(registry.len());

    for adapter in registry.adapters() {
        let adapter = adapter.as_ref();
        let outcome = match adapter.list_candidates().await {
            Ok(items) => {
                let listed = items.len();
                let unprocessed = filter_unprocessed(items, store);
                info!(
                    source = adapter.name(),
                    kind = adapter.source_type(),
                    listed,
                    unprocessed = unprocessed.len(),
                    "listed source"
                );
                let counts = SourceCounts {
                    listed,
                    unprocessed: unprocessed.len(),
                };
                candidates.extend(unprocessed.into_iter().map(|item| Candidate { adapter, item }));
                Ok(counts)
            }
            Err(e) => {
                warn!(source = adapter.name(), error = %e, "source unavailable, skipping");
                Err(e)
            }
        };
        reports.push(SourceReport {
            source_name: adapter.name().to_string(),
            source_type: adapter.source_type().to_string(),
            outcome,
        });
    }

    CandidatePool {
        candidates,
        reports,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProvenanceRecord;
    use chrono::Utc;

    fn item(source: &str, path: &str) -> CandidateItem {
        CandidateItem::new(source, path, format!("mem://{}", path))
    }

    fn store_with(keys: &[(&str, &str)]) -> ProvenanceStore {
        let mut store = ProvenanceStore::new();
        for (source, path) in keys {
            store.append(ProvenanceRecord {
                source_name: source.to_string(),
                path: path.to_string(),
                artifact_id: format!("2024-01-01_{}", path.replace('/', "-")),
                processed_at: Utc::now(),
                content_sha256: None,
            });
        }
        store
    }

    #[test]
    fn empty_store_returns_input_unchanged() {
        let input = vec![item("gh", "b.py"), item("gh", "a.py")];
        assert_eq!(filter_unprocessed(input.clone(), &ProvenanceStore::new()), input);
    }

    #[test]
    fn empty_input_returns_empty() {
        let store = store_with(&[("gh", "a.py")]);
        assert!(filter_unprocessed(Vec::new(), &store).is_empty());
    }

    #[test]
    fn drops_processed_keys_and_preserves_order() {
        let store = store_with(&[("gh", "sorts/b.py"), ("gh", "graph/d.py")]);
        let input = vec![
            item("gh", "sorts/c.py"),
            item("gh", "sorts/b.py"),
            item("gh", "sorts/a.py"),
            item("gh", "graph/d.py"),
            item("gh", "graph/e.py"),
        ];
        let out = filter_unprocessed(input, &store);
        let paths: Vec<_> = out.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["sorts/c.py", "sorts/a.py", "graph/e.py"]);
    }

    #[test]
    fn key_includes_source_name() {
        let store = store_with(&[("gh", "sorts/a.py")]);
        let out = filter_unprocessed(vec![item("mirror", "sorts/a.py")], &store);
        assert_eq!(out.len(), 1);
    }
}
