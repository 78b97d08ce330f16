//! # Algo Harness CLI (`algo`)
//!
//! ## Usage
//!
//! ```bash
//! algo --config ./config/algo.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `algo init` | Write a starter config, create `problems/` and the ledger |
//! | `algo run` | Ingest one new item (or fall back) and publish it |
//! | `algo fallback` | Publish a fallback artifact without contacting sources |
//! | `algo sources` | List configured sources |
//! | `algo candidates` | List items not yet ingested |
//! | `algo history` | Show the most recent ingestions |
//!
//! `run` and `fallback` exit 0 only when the run reaches `DONE`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use algo_harness::config::{self, Config, LoggingConfig};
use algo_harness::fallback::FallbackGenerator;
use algo_harness::history;
use algo_harness::logging;
use algo_harness::models::ArtifactOrigin;
use algo_harness::orchestrator::{Orchestrator, RunReport};
use algo_harness::provenance::{JsonProvenanceFile, ProvenanceStorage};
use algo_harness::publish::{DryRunPublisher, GitPublisher, LocalPublisher, Publisher};
use algo_harness::sources;
use algo_harness::traits::SourceRegistry;
use algo_harness::workspace::Workspace;
use anyhow::Context;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

const EXAMPLE_CONFIG: &str = include_str!("../config/algo.example.toml");

/// Algo Harness: one new algorithm study note per day, committed to git.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/algo.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "algo",
    about = "Algo Harness: pick one unseen source file, write study notes, commit them",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/algo.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the example config if missing and prepare the workspace.
    ///
    /// Existing files are never overwritten.
    Init,

    /// Ingest one unprocessed item and publish it.
    ///
    /// Falls back to a locally generated artifact when no source yields
    /// a fetchable candidate.
    Run(RunArgs),

    /// Publish a fallback artifact without contacting any source.
    Fallback(RunArgs),

    /// List configured sources and whether they look usable.
    Sources,

    /// List candidates that have not been ingested yet.
    Candidates {
        /// Only list this source.
        #[arg(long)]
        source: Option<String>,
    },

    /// Show recent entries from the provenance ledger.
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Print what would be published; write nothing, record nothing.
    #[arg(long)]
    dry_run: bool,

    /// Seed the random choices for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Commit but do not push, regardless of `publish.push`.
    #[arg(long)]
    no_push: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Init runs before any config exists.
    if let Commands::Init = cli.command {
        logging::init_tracing(&LoggingConfig::default())?;
        init(&cli.config)?;
        return Ok(ExitCode::SUCCESS);
    }

    let cfg = config::load_config(&cli.config)?;
    logging::init_tracing(&cfg.logging)?;

    match cli.command {
        Commands::Run(args) => run(&cfg, &args, false).await,
        Commands::Fallback(args) => run(&cfg, &args, true).await,
        Commands::Sources => {
            sources::list_sources(&cfg)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Candidates { source } => {
            sources::list_candidates(&cfg, source.as_deref()).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::History { limit } => {
            history::show_history(&cfg, limit)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init => Ok(ExitCode::SUCCESS),
    }
}

fn init(config_path: &Path) -> anyhow::Result<()> {
    if config_path.exists() {
        println!("Config exists: {}", config_path.display());
    } else {
        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(config_path, EXAMPLE_CONFIG)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        println!("Wrote config: {}", config_path.display());
    }

    let cfg = config::load_config(config_path)?;
    let workspace = Workspace::from_config(&cfg.workspace);
    for path in workspace.init(&cfg.workspace.provenance_file())? {
        println!("Created: {}", path.display());
    }
    Ok(())
}

async fn run(cfg: &Config, args: &RunArgs, fallback_only: bool) -> anyhow::Result<ExitCode> {
    let registry = SourceRegistry::from_config(cfg)?;
    let workspace = Workspace::from_config(&cfg.workspace);
    let provenance_file = cfg.workspace.provenance_file();

    let (provenance, publisher): (Box<dyn ProvenanceStorage>, Box<dyn Publisher>) = if args.dry_run
    {
        (
            Box::new(JsonProvenanceFile::read_only(&provenance_file)),
            Box::new(DryRunPublisher),
        )
    } else {
        (
            Box::new(JsonProvenanceFile::new(&provenance_file)),
            build_publisher(cfg, workspace.clone(), provenance_file, args.no_push),
        )
    };

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut orchestrator = Orchestrator::new(
        registry,
        provenance,
        workspace,
        publisher,
        FallbackGenerator::new(cfg.fallback.parsed()),
        rng,
    );

    let report = if fallback_only {
        orchestrator.run_fallback(Local::now()).await
    } else {
        orchestrator.run(Local::now()).await
    };
    print_report(&report);
    Ok(ExitCode::from(report.exit_code()))
}

fn build_publisher(
    cfg: &Config,
    workspace: Workspace,
    provenance_file: PathBuf,
    no_push: bool,
) -> Box<dyn Publisher> {
    match cfg.publish.mode.as_str() {
        "local" => Box::new(LocalPublisher::new(workspace)),
        _ => {
            let mut git = GitPublisher::new(workspace).track(provenance_file);
            if cfg.publish.push && !no_push {
                let remote = cfg.publish.remote.clone().unwrap_or_else(|| "origin".to_string());
                git = git.push_to(remote, cfg.publish.branch.clone());
            }
            Box::new(git)
        }
    }
}

fn print_report(report: &RunReport) {
    let path: Vec<&str> = report.states.iter().map(|s| s.as_str()).collect();
    println!("Run {}: {}", report.run_id, report.final_state());
    println!("  States:  {}", path.join(" -> "));

    if let Some(reason) = &report.fallback_reason {
        println!("  Fallback reason: {}", reason);
    }
    match &report.origin {
        Some(ArtifactOrigin::Ingested { source_name, path }) => {
            println!("  Ingested: {}:{}", source_name, path)
        }
        Some(ArtifactOrigin::Fallback { strategy }) => println!("  Fallback: {}", strategy),
        None => {}
    }
    if let Some(message) = &report.message {
        println!("  Message: {}", message);
    }
    if let Some(receipt) = &report.receipt {
        for file in &receipt.written {
            println!("  Wrote:   {}", file.display());
        }
        if let Some(commit) = &receipt.commit {
            println!("  Commit:  {}{}", commit, if receipt.pushed { " (pushed)" } else { "" });
        }
    }
    if let Some(error) = &report.error {
        eprintln!("Error: {}", error);
    }
}
