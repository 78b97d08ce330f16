//! Fallback artifact generation from local state only.
//!
//! Used when the primary path yields nothing. Strategies are tried in
//! configured order and the first to produce an artifact wins. The learning
//! log always succeeds given a writable root, so it is appended as the
//! terminal strategy when the configured list omits it.
//!
//! | Strategy | Artifact | Message |
//! |----------|----------|---------|
//! | `amend_notes` | dated insight in an ingested item's `notes.md` | `Update <Title> notes` |
//! | `learning_log` | dated reflection in the learning log | `Add daily learning reflection` |
//! | `progress_log` | dated milestone in the progress log | `Update learning progress` |

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::derive::title_from_artifact_id;
use crate::error::StorageError;
use crate::models::{Artifact, ArtifactOrigin, ArtifactSet, Produced};
use crate::provenance::ProvenanceStore;
use crate::render::{amend_notes, append_log_entry};
use crate::workspace::Workspace;

const INSIGHTS: &[&str] = &[
    "- Reviewed implementation details",
    "- Analyzed edge cases",
    "- Considered optimization opportunities",
    "- Compared with alternative approaches",
    "- Noted practical applications",
    "- Identified related problems",
    "- Studied complexity trade-offs",
];

const REFLECTIONS: &[&str] = &[
    "Reviewing algorithm fundamentals",
    "Practicing problem-solving patterns",
    "Exploring data structure concepts",
    "Analyzing time complexity",
    "Understanding space complexity",
    "Studying algorithm design patterns",
    "Reviewing sorting techniques",
    "Exploring graph algorithms",
    "Understanding dynamic programming",
    "Practicing recursive thinking",
];

const MILESTONES: &[&str] = &[
    "Consistent daily learning habit",
    "Algorithm pattern recognition improving",
    "Problem-solving confidence growing",
    "Understanding complexity analysis better",
    "Building algorithmic intuition",
    "Expanding problem-solving toolkit",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStrategy {
    AmendNotes,
    LearningLog,
    ProgressLog,
}

impl FallbackStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackStrategy::AmendNotes => "amend_notes",
            FallbackStrategy::LearningLog => "learning_log",
            FallbackStrategy::ProgressLog => "progress_log",
        }
    }
}

impl fmt::Display for FallbackStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FallbackStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amend_notes" => Ok(FallbackStrategy::AmendNotes),
            "learning_log" => Ok(FallbackStrategy::LearningLog),
            "progress_log" => Ok(FallbackStrategy::ProgressLog),
            other => Err(format!(
                "unknown fallback strategy '{}'. Must be amend_notes, learning_log, or progress_log",
                other
            )),
        }
    }
}

pub struct FallbackGenerator {
    strategies: Vec<FallbackStrategy>,
}

impl FallbackGenerator {
    pub fn new(mut strategies: Vec<FallbackStrategy>) -> Self {
        if !strategies.contains(&FallbackStrategy::LearningLog) {
            strategies.push(FallbackStrategy::LearningLog);
        }
        Self { strategies }
    }

    pub fn strategies(&self) -> &[FallbackStrategy] {
        &self.strategies
    }

    /// Produce exactly one artifact from local state.
    ///
    /// Reads existing documents but writes nothing; the publisher persists
    /// the result. Fails only when the workspace cannot be read.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        store: &ProvenanceStore,
        workspace: &Workspace,
        date: NaiveDate,
        rng: &mut R,
    ) -> Result<Produced, StorageError> {
        workspace.ensure_accessible()?;

        for strategy in &self.strategies {
            let produced = match strategy {
                FallbackStrategy::AmendNotes => amend_random_notes(store, workspace, date, rng)?,
                FallbackStrategy::LearningLog => Some(learning_log(workspace, date, rng)?),
                FallbackStrategy::ProgressLog => Some(progress_log(workspace, date, rng)?),
            };
            match produced {
                Some((artifact, message)) => {
                    info!(strategy = %strategy, path = %artifact.relative_path.display(), "fallback artifact produced");
                    return Ok(Produced {
                        artifacts: ArtifactSet::single(artifact),
                        message,
                        origin: ArtifactOrigin::Fallback {
                            strategy: strategy.as_str().to_string(),
                        },
                    });
                }
                None => debug!(strategy = %strategy, "fallback strategy produced nothing"),
            }
        }

        // `new` guarantees the learning log is in the list.
        let (artifact, message) = learning_log(workspace, date, rng)?;
        Ok(Produced {
            artifacts: ArtifactSet::single(artifact),
            message,
            origin: ArtifactOrigin::Fallback {
                strategy: FallbackStrategy::LearningLog.as_str().to_string(),
            },
        })
    }
}

/// Pick a random ingested item whose notes file exists and add a dated
/// insight to it. `None` when no such item exists.
fn amend_random_notes<R: Rng + ?Sized>(
    store: &ProvenanceStore,
    workspace: &Workspace,
    date: NaiveDate,
    rng: &mut R,
) -> Result<Option<(Artifact, String)>, StorageError> {
    let mut ids: Vec<&str> = store.records().iter().map(|r| r.artifact_id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();

    let mut existing = Vec::new();
    for id in ids {
        let notes_path = workspace.artifact_dir(id).join("notes.md");
        if let Some(content) = workspace.read_optional(&notes_path)? {
            existing.push((id, notes_path, content));
        }
    }

    let Some((id, notes_path, content)) = existing.choose(rng) else {
        return Ok(None);
    };
    let insight = INSIGHTS.choose(rng).copied().unwrap_or(INSIGHTS[0]);
    Ok(Some((
        Artifact::new(notes_path.clone(), amend_notes(content, date, insight)),
        format!("Update {} notes", title_from_artifact_id(id)),
    )))
}

fn learning_log<R: Rng + ?Sized>(
    workspace: &Workspace,
    date: NaiveDate,
    rng: &mut R,
) -> Result<(Artifact, String), StorageError> {
    let path = workspace.learning_log();
    let existing = workspace.read_optional(path)?;
    let reflection = REFLECTIONS.choose(rng).copied().unwrap_or(REFLECTIONS[0]);
    let content = append_log_entry(
        existing.as_deref(),
        "Algorithm Learning Log",
        "Daily reflections and progress tracking.",
        date,
        &format!("- {}", reflection),
    );
    Ok((
        Artifact::new(path, content),
        "Add daily learning reflection".to_string(),
    ))
}

fn progress_log<R: Rng + ?Sized>(
    workspace: &Workspace,
    date: NaiveDate,
    rng: &mut R,
) -> Result<(Artifact, String), StorageError> {
    let path = workspace.progress_log();
    let existing = workspace.read_optional(path)?;
    let milestone = MILESTONES.choose(rng).copied().unwrap_or(MILESTONES[0]);
    let content = append_log_entry(
        existing.as_deref(),
        "Learning Progress",
        "Tracking algorithm study journey.",
        date,
        &format!("✅ {}", milestone),
    );
    Ok((
        Artifact::new(path, content),
        "Update learning progress".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProvenanceRecord;
    use crate::render::notes_scaffold;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::Path;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
    }

    fn record(artifact_id: &str) -> ProvenanceRecord {
        ProvenanceRecord {
            source_name: "gh".into(),
            path: format!("{}.py", artifact_id),
            artifact_id: artifact_id.into(),
            processed_at: Utc::now(),
            content_sha256: None,
        }
    }

    fn default_generator() -> FallbackGenerator {
        FallbackGenerator::new(vec![FallbackStrategy::AmendNotes, FallbackStrategy::LearningLog])
    }

    #[test]
    fn parses_strategy_names() {
        assert_eq!("amend_notes".parse(), Ok(FallbackStrategy::AmendNotes));
        assert_eq!("progress_log".parse(), Ok(FallbackStrategy::ProgressLog));
        assert!("tweet".parse::<FallbackStrategy>().is_err());
        assert_eq!(FallbackStrategy::LearningLog.to_string(), "learning_log");
    }

    #[test]
    fn learning_log_is_always_terminal() {
        let generator = FallbackGenerator::new(vec![FallbackStrategy::AmendNotes]);
        assert_eq!(
            generator.strategies(),
            &[FallbackStrategy::AmendNotes, FallbackStrategy::LearningLog]
        );
    }

    #[test]
    fn zero_state_creates_learning_log() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path());
        let produced = default_generator()
            .generate(&ProvenanceStore::new(), &ws, date(), &mut StdRng::seed_from_u64(1))
            .unwrap();

        assert_eq!(produced.message, "Add daily learning reflection");
        assert_eq!(produced.artifacts.primary.relative_path, Path::new("learning_log.md"));
        let body = &produced.artifacts.primary.content;
        assert!(body.starts_with("# Algorithm Learning Log\n"));
        assert!(body.contains("## 2024-03-02\n- "));
        assert!(produced.artifacts.raw_copy.is_none());
        // Nothing written until publish.
        assert!(!tmp.path().join("learning_log.md").exists());
    }

    #[test]
    fn amends_existing_notes() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path());
        let dir = tmp.path().join("problems/2024-03-01_bubble-sort");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("notes.md"), notes_scaffold("Bubble Sort")).unwrap();

        let mut store = ProvenanceStore::new();
        store.append(record("2024-03-01_bubble-sort"));
        // Recorded but its folder is gone; never chosen.
        store.append(record("2024-02-01_deleted"));

        for seed in 0..10 {
            let produced = default_generator()
                .generate(&store, &ws, date(), &mut StdRng::seed_from_u64(seed))
                .unwrap();
            assert_eq!(produced.message, "Update Bubble Sort notes");
            assert_eq!(
                produced.artifacts.primary.relative_path,
                Path::new("problems/2024-03-01_bubble-sort/notes.md")
            );
            assert!(produced
                .artifacts
                .primary
                .content
                .contains("## Personal Notes\n\n### 2024-03-02\n- "));
            assert!(matches!(
                produced.origin,
                ArtifactOrigin::Fallback { ref strategy } if strategy == "amend_notes"
            ));
        }
    }

    #[test]
    fn progress_log_appends_to_existing() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("PROGRESS.md"),
            "# Learning Progress\n\nTracking algorithm study journey.\n\n## 2024-03-01\n✅ Building algorithmic intuition\n",
        )
        .unwrap();
        let ws = Workspace::new(tmp.path());
        let produced = FallbackGenerator::new(vec![FallbackStrategy::ProgressLog])
            .generate(&ProvenanceStore::new(), &ws, date(), &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(produced.message, "Update learning progress");
        let body = &produced.artifacts.primary.content;
        assert!(body.starts_with("# Learning Progress\n"));
        assert!(body.contains("## 2024-03-01\n"));
        assert!(body.contains("## 2024-03-02\n✅ "));
    }

    #[test]
    fn inaccessible_workspace_is_storage_error() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path().join("missing"));
        let err = default_generator()
            .generate(&ProvenanceStore::new(), &ws, date(), &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }
}
