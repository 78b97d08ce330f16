//! # Algo Harness
//!
//! A daily study harvester. Each run picks one source file that has never
//! been ingested, writes a study folder for it, and records the result as a
//! single changeset. When nothing new can be ingested, a fallback artifact
//! built from local state is published instead, so every successful run
//! leaves exactly one changeset behind.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────┐   ┌──────────┐   ┌───────────┐
//! │   Sources   │──▶│  Filter  │──▶│ Selector │──▶│ Ingestor  │──┐
//! │ GitHub / FS │   │ (ledger) │   │ (random) │   │           │  │
//! └─────────────┘   └──────────┘   └──────────┘   └───────────┘  │
//!                                                                ▼
//!                 ┌────────────┐  on any primary failure   ┌───────────┐
//!                 │  Fallback  │─────────────────────────▶ │ Publisher │
//!                 │ (local)    │                           │ git/local │
//!                 └────────────┘                           └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! algo init                     # write config, create problems/ and the ledger
//! algo sources                  # show configured sources
//! algo candidates               # list items not yet ingested
//! algo run --dry-run            # preview today's artifact
//! algo run                      # ingest, commit, push
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Error taxonomy |
//! | [`provenance`] | Ingestion ledger and its storage |
//! | [`traits`] | Source adapter trait and registry |
//! | [`source_github`] | GitHub contents API source |
//! | [`source_fs`] | Local directory source |
//! | [`filter`] | Drop already-ingested candidates |
//! | [`select`] | Uniform random choice |
//! | [`derive`] | Titles, languages, tags, slugs |
//! | [`render`] | Markdown documents |
//! | [`ingest`] | Candidate → artifact set |
//! | [`fallback`] | Artifacts from local state |
//! | [`workspace`] | Artifact storage on disk |
//! | [`publish`] | Git, local, and dry-run publishers |
//! | [`orchestrator`] | Run state machine |
//! | [`logging`] | Tracing setup |
//! | [`sources`] | Source status for the CLI |
//! | [`history`] | Ingestion history for the CLI |

pub mod config;
pub mod derive;
pub mod error;
pub mod fallback;
pub mod filter;
pub mod history;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod provenance;
pub mod publish;
pub mod render;
pub mod select;
pub mod source_fs;
pub mod source_github;
pub mod sources;
pub mod traits;
pub mod workspace;
