//! Source status and candidate listing for the CLI.
//!
//! `algo sources` shows every configured source without touching the
//! network. `algo candidates` lists each enabled source and prints the
//! items that have not been ingested yet.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::filter::gather_candidates;
use crate::provenance::{JsonProvenanceFile, ProvenanceStorage};
use crate::traits::SourceRegistry;

/// One row of the `sources` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub name: String,
    pub kind: &'static str,
    pub enabled: bool,
    pub location: String,
    pub healthy: bool,
}

/// Status rows for all configured sources, GitHub first, each group in
/// name order.
pub fn get_sources(config: &Config) -> Vec<SourceStatus> {
    let mut rows = Vec::new();

    for (name, gh) in &config.sources.github {
        rows.push(SourceStatus {
            name: name.clone(),
            kind: "github",
            enabled: gh.enabled,
            location: format!("{}/{}@{}", gh.owner, gh.repo, gh.branch),
            // Reachability is only known after listing.
            healthy: gh.enabled,
        });
    }

    for (name, fs) in &config.sources.filesystem {
        rows.push(SourceStatus {
            name: name.clone(),
            kind: "filesystem",
            enabled: fs.enabled,
            location: fs.root.display().to_string(),
            healthy: fs.enabled && fs.root.is_dir(),
        });
    }

    rows
}

pub fn list_sources(config: &Config) -> Result<()> {
    let rows = get_sources(config);
    if rows.is_empty() {
        println!("No sources configured. Add [sources.github.<name>] or [sources.filesystem.<name>].");
        return Ok(());
    }

    println!("{:<16} {:<12} {:<8} {:<8} LOCATION", "SOURCE", "TYPE", "ENABLED", "HEALTHY");
    for row in rows {
        println!(
            "{:<16} {:<12} {:<8} {:<8} {}",
            row.name, row.kind, row.enabled, row.healthy, row.location
        );
    }
    Ok(())
}

/// Print unprocessed candidates, optionally for a single source.
pub async fn list_candidates(config: &Config, source: Option<&str>) -> Result<()> {
    let mut registry = SourceRegistry::from_config(config)?;
    if let Some(name) = source {
        registry.retain_named(name);
        if registry.is_empty() {
            bail!("No enabled source named '{}'", name);
        }
    }

    let store = JsonProvenanceFile::read_only(config.workspace.provenance_file()).load()?;
    let pool = gather_candidates(&registry, &store).await;

    for report in &pool.reports {
        match &report.outcome {
            Ok(counts) => println!(
                "{} ({}): {} listed, {} unprocessed",
                report.source_name, report.source_type, counts.listed, counts.unprocessed
            ),
            Err(e) => println!("{} ({}): {}", report.source_name, report.source_type, e),
        }
    }
    for candidate in &pool.candidates {
        println!("  {}:{}", candidate.item.source_name, candidate.item.path);
    }
    println!("{} candidate(s)", pool.candidates.len());
    Ok(())
}
