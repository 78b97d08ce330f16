//! Provenance: the durable record of which items have been ingested.
//!
//! [`ProvenanceStore`] is an append log plus a derived lookup index keyed by
//! `(source_name, path)`. It does not reject duplicate keys itself; the
//! candidate filter consults it before selection so a key is never
//! selected twice.
//!
//! The store is loaded once at the start of a run, mutated in memory, and
//! written back through a [`ProvenanceStorage`] implementation. The JSON
//! file format is:
//!
//! ```json
//! {
//!   "processed_files": [
//!     {
//!       "file_path": "sorts/bubble_sort.py",
//!       "source": "TheAlgorithms",
//!       "folder_name": "2024-03-01_bubble-sort",
//!       "processed_date": "2024-03-01T09:15:02Z"
//!     }
//!   ],
//!   "last_updated": "2024-03-01T09:15:02Z"
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::models::{ProvenanceRecord, RecordKey};

/// In-memory provenance log for one run.
#[derive(Debug, Clone, Default)]
pub struct ProvenanceStore {
    records: Vec<ProvenanceRecord>,
    last_updated: Option<DateTime<Utc>>,
    index: HashSet<RecordKey>,
}

impl ProvenanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ProvenanceRecord>, last_updated: Option<DateTime<Utc>>) -> Self {
        let index = records.iter().map(ProvenanceRecord::key).collect();
        Self {
            records,
            last_updated,
            index,
        }
    }

    /// Whether an item with this key has already been ingested.
    pub fn contains(&self, source_name: &str, path: &str) -> bool {
        self.index.contains(&RecordKey::new(source_name, path))
    }

    /// Append a record and advance `last_updated` to its timestamp.
    pub fn append(&mut self, record: ProvenanceRecord) {
        self.index.insert(record.key());
        self.last_updated = Some(match self.last_updated {
            Some(prev) if prev > record.processed_at => prev,
            _ => record.processed_at,
        });
        self.records.push(record);
    }

    pub fn records(&self) -> &[ProvenanceRecord] {
        &self.records
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Whether any record already uses this artifact id (folder name).
    pub fn has_artifact_id(&self, artifact_id: &str) -> bool {
        self.records.iter().any(|r| r.artifact_id == artifact_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Load/save capability for the provenance store.
pub trait ProvenanceStorage: Send + Sync {
    fn load(&self) -> Result<ProvenanceStore, StorageError>;
    fn save(&self, store: &ProvenanceStore) -> Result<(), StorageError>;

    /// File backing this storage, if any. Publishers stage it alongside
    /// the artifacts.
    fn path(&self) -> Option<&Path> {
        None
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProvenanceFileFormat {
    #[serde(default)]
    processed_files: Vec<ProvenanceRecord>,
    #[serde(default, with = "optional_timestamp", skip_serializing_if = "Option::is_none")]
    last_updated: Option<DateTime<Utc>>,
}

/// JSON file storage (`config/processed.json` by default).
///
/// A missing file loads as an empty store. A read-only instance never
/// writes, which is what `--dry-run` uses.
#[derive(Debug, Clone)]
pub struct JsonProvenanceFile {
    path: PathBuf,
    read_only: bool,
}

impl JsonProvenanceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_only: false,
        }
    }

    pub fn read_only(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_only: true,
        }
    }
}

impl ProvenanceStorage for JsonProvenanceFile {
    fn load(&self) -> Result<ProvenanceStore, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ProvenanceStore::new());
            }
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };
        if raw.trim().is_empty() {
            return Ok(ProvenanceStore::new());
        }

        let file: ProvenanceFileFormat =
            serde_json::from_str(&raw).map_err(|source| StorageError::Format {
                path: self.path.clone(),
                source,
            })?;
        Ok(ProvenanceStore::from_records(
            file.processed_files,
            file.last_updated,
        ))
    }

    fn save(&self, store: &ProvenanceStore) -> Result<(), StorageError> {
        if self.read_only {
            return Ok(());
        }

        let file = ProvenanceFileFormat {
            processed_files: store.records().to_vec(),
            last_updated: store.last_updated(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|source| StorageError::Format {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        // Replaced by rename: readers never observe a partial file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, format!("{}\n", json)).map_err(|e| StorageError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StorageError::io(&self.path, e))?;
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        if self.read_only {
            None
        } else {
            Some(&self.path)
        }
    }
}

/// Serde helpers for provenance timestamps.
///
/// Writes RFC 3339. Reads RFC 3339, or a naive ISO-8601 datetime
/// (`2024-03-01T09:15:02.123456`) which is taken as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
    }
}

mod optional_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        ts: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => super::timestamp::serialize(ts, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| super::timestamp::parse(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
