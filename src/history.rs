//! Ingestion history from the provenance file.

use anyhow::Result;

use crate::config::Config;
use crate::models::ProvenanceRecord;
use crate::provenance::{JsonProvenanceFile, ProvenanceStorage, ProvenanceStore};

/// The `limit` most recent records, newest first.
pub fn recent(store: &ProvenanceStore, limit: usize) -> Vec<&ProvenanceRecord> {
    let mut records: Vec<&ProvenanceRecord> = store.records().iter().collect();
    // Stable sort keeps append order among equal timestamps.
    records.sort_by(|a, b| b.processed_at.cmp(&a.processed_at));
    records.truncate(limit);
    records
}

pub fn show_history(config: &Config, limit: usize) -> Result<()> {
    let path = config.workspace.provenance_file();
    let store = JsonProvenanceFile::read_only(&path).load()?;

    println!("Provenance: {}", path.display());
    match store.last_updated() {
        Some(ts) => println!("Records:    {} (last updated {})", store.len(), ts.to_rfc3339()),
        None => println!("Records:    {}", store.len()),
    }
    if store.is_empty() {
        return Ok(());
    }
    println!();

    println!("{:<20} {:<16} {:<40} FOLDER", "PROCESSED", "SOURCE", "PATH");
    for record in recent(&store, limit) {
        println!(
            "{:<20} {:<16} {:<40} {}",
            record.processed_at.format("%Y-%m-%d %H:%M:%S"),
            record.source_name,
            record.path,
            record.artifact_id
        );
    }
    Ok(())
}
