//! Ingestion: turn one selected candidate into an artifact set.
//!
//! Fetches the candidate's content through its adapter and derives the
//! title, language tag, tags, and description. Produces three documents
//! under `<problems_dir>/<YYYY-MM-DD>_<slug>/`:
//!
//! | File | Content |
//! |------|---------|
//! | `README.md` | summary document |
//! | `solution.<ext>` | verbatim content |
//! | `notes.md` | notes scaffold |
//!
//! Nothing is written here. The caller appends the provenance record and
//! hands the artifacts to a publisher.

use chrono::{DateTime, Local, Utc};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::derive::{
    extension_for_language, extract_description, language_for_path, slugify, tags_from_path,
    title_from_path,
};
use crate::error::FetchError;
use crate::models::{Artifact, ArtifactSet, ProvenanceRecord};
use crate::provenance::ProvenanceStore;
use crate::render::{notes_scaffold, summary_document, Summary};
use crate::select::Candidate;
use crate::workspace::Workspace;

/// Result of ingesting one candidate.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub title: String,
    pub language: &'static str,
    /// Folder name the artifacts live under; recorded in provenance.
    pub artifact_id: String,
    pub artifacts: ArtifactSet,
    pub content_sha256: String,
}

impl Ingested {
    pub fn message(&self) -> String {
        format!("Add {} algorithm", self.title)
    }

    pub fn record(&self, candidate: &Candidate<'_>, processed_at: DateTime<Utc>) -> ProvenanceRecord {
        ProvenanceRecord {
            source_name: candidate.item.source_name.clone(),
            path: candidate.item.path.clone(),
            artifact_id: self.artifact_id.clone(),
            processed_at,
            content_sha256: Some(self.content_sha256.clone()),
        }
    }
}

/// Fetch and materialize one candidate.
pub async fn ingest(
    candidate: &Candidate<'_>,
    workspace: &Workspace,
    store: &ProvenanceStore,
    now: DateTime<Local>,
) -> Result<Ingested, FetchError> {
    let item = &candidate.item;
    let fetched = candidate.adapter.fetch_content(item).await?;

    let title = title_from_path(&item.path);
    let language = language_for_path(&item.path);
    let tags = tags_from_path(&item.path);
    let description = extract_description(&fetched.raw_text);

    let artifact_id = unique_artifact_id(
        &format!("{}_{}", now.format("%Y-%m-%d"), slugify(&title)),
        workspace,
        store,
    );
    let dir = workspace.artifact_dir(&artifact_id);

    let summary = summary_document(&Summary {
        title: &title,
        locator: &fetched.locator,
        language,
        path: &item.path,
        description: description.as_deref(),
        tags: &tags,
        fetched_at: now,
    });

    let mut hasher = Sha256::new();
    hasher.update(fetched.raw_text.as_bytes());
    let content_sha256 = format!("{:x}", hasher.finalize());

    let artifacts = ArtifactSet {
        primary: Artifact::new(dir.join("README.md"), summary),
        raw_copy: Some(Artifact::new(
            dir.join(format!("solution.{}", extension_for_language(language))),
            fetched.raw_text,
        )),
        notes: Some(Artifact::new(dir.join("notes.md"), notes_scaffold(&title))),
    };

    info!(
        source = %item.source_name,
        path = %item.path,
        title = %title,
        language,
        artifact_id = %artifact_id,
        "ingested candidate"
    );

    Ok(Ingested {
        title,
        language,
        artifact_id,
        artifacts,
        content_sha256,
    })
}

/// `base`, or `base-2`, `base-3`… if the id is taken by a provenance
/// record or an existing folder.
fn unique_artifact_id(base: &str, workspace: &Workspace, store: &ProvenanceStore) -> String {
    let taken = |id: &str| {
        store.has_artifact_id(id) || workspace.resolve(&workspace.artifact_dir(id)).exists()
    };
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|id| !taken(id))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::models::{CandidateItem, FetchedContent};
    use crate::traits::SourceAdapter;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct OneFile {
        body: Option<&'static str>,
    }

    #[async_trait]
    impl SourceAdapter for OneFile {
        fn name(&self) -> &str {
            "gh"
        }

        async fn list_candidates(&self) -> Result<Vec<CandidateItem>, SourceError> {
            Ok(Vec::new())
        }

        async fn fetch_content(&self, item: &CandidateItem) -> Result<FetchedContent, FetchError> {
            match self.body {
                Some(body) => Ok(FetchedContent {
                    raw_text: body.to_string(),
                    locator: format!("https://example.test/{}", item.path),
                }),
                None => Err(FetchError::new("gh", &item.path, "404 Not Found")),
            }
        }
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn builds_three_documents() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path());
        let adapter = OneFile {
            body: Some("\"\"\"Bubble sort.\"\"\"\ndef bubble(a):\n    return a\n"),
        };
        let candidate = Candidate {
            adapter: &adapter,
            item: CandidateItem::new("gh", "sorts/bubble.py", "mem://bubble"),
        };

        let ingested = ingest(&candidate, &ws, &ProvenanceStore::new(), now())
            .await
            .unwrap();
        assert_eq!(ingested.title, "Bubble");
        assert_eq!(ingested.language, "python");
        assert_eq!(ingested.artifact_id, "2024-03-01_bubble");
        assert_eq!(ingested.message(), "Add Bubble algorithm");

        let set = &ingested.artifacts;
        assert_eq!(set.primary.relative_path, PathBuf::from("problems/2024-03-01_bubble/README.md"));
        assert!(set.primary.content.contains("Bubble sort."));
        assert!(set.primary.content.contains("`Sorts`"));
        let raw = set.raw_copy.as_ref().unwrap();
        assert_eq!(raw.relative_path, PathBuf::from("problems/2024-03-01_bubble/solution.py"));
        assert!(raw.content.starts_with("\"\"\"Bubble sort."));
        let notes = set.notes.as_ref().unwrap();
        assert!(notes.content.contains("## Time Complexity"));

        // Nothing was written.
        assert!(!tmp.path().join("problems").exists());

        let record = ingested.record(&candidate, Utc::now());
        assert_eq!(record.source_name, "gh");
        assert_eq!(record.path, "sorts/bubble.py");
        assert_eq!(record.content_sha256.as_deref().map(str::len), Some(64));
    }

    #[tokio::test]
    async fn fetch_failure_propagates() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path());
        let adapter = OneFile { body: None };
        let candidate = Candidate {
            adapter: &adapter,
            item: CandidateItem::new("gh", "sorts/gone.py", "mem://gone"),
        };
        let err = ingest(&candidate, &ws, &ProvenanceStore::new(), now())
            .await
            .unwrap_err();
        assert_eq!(err.path, "sorts/gone.py");
    }

    #[tokio::test]
    async fn same_day_collision_gets_suffix() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path());
        let mut store = ProvenanceStore::new();
        store.append(ProvenanceRecord {
            source_name: "other".into(),
            path: "bubble.py".into(),
            artifact_id: "2024-03-01_bubble".into(),
            processed_at: Utc::now(),
            content_sha256: None,
        });
        std::fs::create_dir_all(tmp.path().join("problems/2024-03-01_bubble-2")).unwrap();

        let adapter = OneFile { body: Some("pass\n") };
        let candidate = Candidate {
            adapter: &adapter,
            item: CandidateItem::new("gh", "sorts/bubble.py", "mem://bubble"),
        };
        let ingested = ingest(&candidate, &ws, &store, now()).await.unwrap();
        assert_eq!(ingested.artifact_id, "2024-03-01_bubble-3");
    }
}
