//! Core data models used throughout the harness.
//!
//! These types describe the items a source offers, the files a run
//! produces, and the provenance entries that record what has been ingested.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fetchable unit offered by a source.
///
/// Identified by `(source_name, path)`; `locator` is adapter-specific
/// (an API URL, an absolute file path) and opaque to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    pub source_name: String,
    pub path: String,
    pub locator: String,
}

impl CandidateItem {
    pub fn new(
        source_name: impl Into<String>,
        path: impl Into<String>,
        locator: impl Into<String>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            path: path.into(),
            locator: locator.into(),
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.source_name, &self.path)
    }
}

/// Full content of a candidate as returned by its source.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub raw_text: String,
    /// Human-browsable location of the content (e.g. a GitHub blob URL).
    pub locator: String,
}

/// Identity of an ingested item: `(source_name, path)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub source_name: String,
    pub path: String,
}

impl RecordKey {
    pub fn new(source_name: &str, path: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            path: path.to_string(),
        }
    }
}

/// Append-only record of one ingested item.
///
/// Field names on disk follow the `processed.json` layout:
/// `file_path`, `source`, `folder_name`, `processed_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    #[serde(rename = "source")]
    pub source_name: String,
    #[serde(rename = "file_path")]
    pub path: String,
    /// Folder name the artifacts were written under (e.g. `2024-03-01_bubble-sort`).
    #[serde(rename = "folder_name")]
    pub artifact_id: String,
    #[serde(rename = "processed_date", with = "crate::provenance::timestamp")]
    pub processed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_sha256: Option<String>,
}

impl ProvenanceRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.source_name, &self.path)
    }
}

/// A single generated file: a path relative to the workspace root and its
/// full contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub relative_path: PathBuf,
    pub content: String,
}

impl Artifact {
    pub fn new(relative_path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            content: content.into(),
        }
    }
}

/// The files produced by one run.
///
/// Primary ingestion fills all three slots (summary document, verbatim
/// content copy, notes scaffold). Fallback produces only a primary document:
/// an amended notes file or a log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub primary: Artifact,
    pub raw_copy: Option<Artifact>,
    pub notes: Option<Artifact>,
}

impl ArtifactSet {
    pub fn single(primary: Artifact) -> Self {
        Self {
            primary,
            raw_copy: None,
            notes: None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        std::iter::once(&self.primary)
            .chain(self.raw_copy.as_ref())
            .chain(self.notes.as_ref())
    }

    pub fn paths(&self) -> Vec<&Path> {
        self.iter().map(|a| a.relative_path.as_path()).collect()
    }
}

/// Which pipeline produced the artifact set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOrigin {
    /// Primary ingestion of a candidate.
    Ingested { source_name: String, path: String },
    /// Fallback generation by the named strategy.
    Fallback { strategy: String },
}

/// An artifact set ready to publish, with its changeset message.
#[derive(Debug, Clone)]
pub struct Produced {
    pub artifacts: ArtifactSet,
    pub message: String,
    pub origin: ArtifactOrigin,
}
