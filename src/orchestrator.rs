//! The run state machine.
//!
//! ```text
//! START ─▶ PRIMARY_ATTEMPT ─┬──────────────────────▶ PUBLISH ─┬─▶ DONE
//!                           └─▶ FALLBACK_ATTEMPT ───▶         └─▶ FAILED
//! ```
//!
//! Any primary-path failure (no candidates, every source down, a fetch
//! error) routes to the fallback generator, so a run with a writable
//! workspace always produces an artifact. Storage and publish errors are
//! fatal.
//!
//! On primary success the provenance record is appended and saved before
//! publishing, so the record is part of the same changeset. If publishing
//! then fails before anything is committed, the artifact files and the
//! store loaded at START are written back. A changeset that was committed
//! but not pushed keeps its record.

use chrono::{DateTime, Local};
use rand::Rng;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{PrimaryError, RunError};
use crate::fallback::FallbackGenerator;
use crate::filter::{gather_candidates, SourceReport};
use crate::ingest::ingest;
use crate::models::{ArtifactOrigin, ProvenanceRecord, Produced};
use crate::provenance::{ProvenanceStorage, ProvenanceStore};
use crate::publish::{PublishReceipt, Publisher};
use crate::select::select;
use crate::traits::SourceRegistry;
use crate::workspace::Workspace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Start,
    PrimaryAttempt,
    FallbackAttempt,
    Publish,
    Done,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Start => "START",
            RunState::PrimaryAttempt => "PRIMARY_ATTEMPT",
            RunState::FallbackAttempt => "FALLBACK_ATTEMPT",
            RunState::Publish => "PUBLISH",
            RunState::Done => "DONE",
            RunState::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything observable about one run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    /// States entered, in order. Always ends in a terminal state.
    pub states: Vec<RunState>,
    pub sources: Vec<SourceReport>,
    /// Why the primary path yielded nothing, when it was attempted.
    pub fallback_reason: Option<PrimaryError>,
    pub origin: Option<ArtifactOrigin>,
    pub message: Option<String>,
    pub receipt: Option<PublishReceipt>,
    pub error: Option<RunError>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            states: Vec::new(),
            sources: Vec::new(),
            fallback_reason: None,
            origin: None,
            message: None,
            receipt: None,
            error: None,
        }
    }

    fn enter(&mut self, state: RunState) {
        info!(state = %state, "entering state");
        self.states.push(state);
    }

    pub fn final_state(&self) -> RunState {
        self.states.last().copied().unwrap_or(RunState::Start)
    }

    /// Success is reported only from `DONE`.
    pub fn succeeded(&self) -> bool {
        self.final_state() == RunState::Done
    }

    pub fn exit_code(&self) -> u8 {
        if self.succeeded() {
            0
        } else {
            1
        }
    }
}

/// Owns the collaborators of a run.
pub struct Orchestrator<R> {
    registry: SourceRegistry,
    provenance: Box<dyn ProvenanceStorage>,
    workspace: Workspace,
    publisher: Box<dyn Publisher>,
    fallback: FallbackGenerator,
    rng: R,
}

impl<R: Rng> Orchestrator<R> {
    pub fn new(
        registry: SourceRegistry,
        provenance: Box<dyn ProvenanceStorage>,
        workspace: Workspace,
        publisher: Box<dyn Publisher>,
        fallback: FallbackGenerator,
        rng: R,
    ) -> Self {
        Self {
            registry,
            provenance,
            workspace,
            publisher,
            fallback,
            rng,
        }
    }

    /// Full run: primary ingestion, falling back on any primary failure.
    pub async fn run(&mut self, now: DateTime<Local>) -> RunReport {
        self.execute(now, true).await
    }

    /// Skip the primary path and publish a fallback artifact.
    pub async fn run_fallback(&mut self, now: DateTime<Local>) -> RunReport {
        self.execute(now, false).await
    }

    async fn execute(&mut self, now: DateTime<Local>, primary: bool) -> RunReport {
        let mut report = RunReport::new();
        let span = info_span!("run", run_id = %report.run_id, publisher = self.publisher.name());

        let outcome = self
            .drive(now, primary, &mut report)
            .instrument(span.clone())
            .await;

        let _entered = span.enter();
        match outcome {
            Ok(()) => {
                report.enter(RunState::Done);
                info!(commit_message = report.message.as_deref().unwrap_or(""), "run complete");
            }
            Err(e) => {
                error!(error = %e, "run failed");
                report.error = Some(e);
                report.enter(RunState::Failed);
            }
        }
        report
    }

    async fn drive(
        &mut self,
        now: DateTime<Local>,
        primary: bool,
        report: &mut RunReport,
    ) -> Result<(), RunError> {
        report.enter(RunState::Start);
        let baseline = self.provenance.load()?;
        info!(records = baseline.len(), "provenance loaded");

        let mut store = baseline.clone();
        let mut produced = None;

        if primary {
            report.enter(RunState::PrimaryAttempt);
            let (sources, attempt) =
                primary_attempt(&self.registry, &store, &self.workspace, &mut self.rng, now).await;
            report.sources = sources;
            match attempt {
                Ok((ingested, record)) => {
                    store.append(record);
                    self.provenance.save(&store)?;
                    produced = Some(ingested);
                }
                Err(e) => {
                    warn!(error = %e, "primary path produced nothing, falling back");
                    report.fallback_reason = Some(e);
                }
            }
        }

        let produced = match produced {
            Some(p) => p,
            None => {
                report.enter(RunState::FallbackAttempt);
                self.fallback
                    .generate(&store, &self.workspace, now.date_naive(), &mut self.rng)?
            }
        };

        report.enter(RunState::Publish);
        report.origin = Some(produced.origin.clone());
        report.message = Some(produced.message.clone());

        let snapshot = self.workspace.snapshot(&produced.artifacts)?;
        match self.publisher.publish(&produced.artifacts, &produced.message) {
            Ok(receipt) => {
                report.receipt = Some(receipt);
                Ok(())
            }
            Err(e) => {
                if let Some(commit) = e.committed() {
                    // The record is in the commit; keep it.
                    warn!(commit = %commit, "changeset committed but not pushed");
                    return Err(e.into());
                }
                match snapshot.restore() {
                    Ok(()) => warn!("artifacts rolled back after publish failure"),
                    Err(restore) => {
                        error!(error = %restore, "failed to roll back artifacts after publish failure")
                    }
                }
                if store.len() != baseline.len() {
                    match self.provenance.save(&baseline) {
                        Ok(()) => warn!("provenance restored to pre-run state"),
                        Err(restore) => {
                            error!(error = %restore, "failed to restore provenance after publish failure")
                        }
                    }
                }
                Err(e.into())
            }
        }
    }
}

/// Filter, select, and ingest. Source reports are returned even when the
/// attempt fails.
async fn primary_attempt<R: Rng + ?Sized>(
    registry: &SourceRegistry,
    store: &ProvenanceStore,
    workspace: &Workspace,
    rng: &mut R,
    now: DateTime<Local>,
) -> (Vec<SourceReport>, Result<(Produced, ProvenanceRecord), PrimaryError>) {
    let pool = gather_candidates(registry, store).await;
    let healthy = pool.healthy_sources();
    let sources = pool.reports;

    let chosen = match select(pool.candidates, healthy, rng) {
        Ok(chosen) => chosen,
        Err(e) => return (sources, Err(e.into())),
    };
    info!(source = %chosen.item.source_name, path = %chosen.item.path, "selected candidate");

    let ingested = match ingest(&chosen, workspace, store, now).await {
        Ok(ingested) => ingested,
        Err(e) => return (sources, Err(e.into())),
    };

    let record = ingested.record(&chosen, now.with_timezone(&chrono::Utc));
    let produced = Produced {
        message: ingested.message(),
        origin: ArtifactOrigin::Ingested {
            source_name: chosen.item.source_name.clone(),
            path: chosen.item.path.clone(),
        },
        artifacts: ingested.artifacts,
    };
    (sources, Ok((produced, record)))
}
