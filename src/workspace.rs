//! Local artifact storage rooted at the study repository.

use std::path::{Path, PathBuf};

use crate::config::WorkspaceConfig;
use crate::error::StorageError;
use crate::models::{Artifact, ArtifactSet};
use crate::provenance::{JsonProvenanceFile, ProvenanceStorage, ProvenanceStore};

/// The working tree artifacts are read from and written to.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    problems_dir: PathBuf,
    learning_log: PathBuf,
    progress_log: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_config(&WorkspaceConfig {
            root: root.into(),
            ..WorkspaceConfig::default()
        })
    }

    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self {
            root: config.root.clone(),
            problems_dir: config.problems_dir.clone(),
            learning_log: config.learning_log.clone(),
            progress_log: config.progress_log.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root-relative directory holding one folder per ingested item.
    pub fn problems_dir(&self) -> &Path {
        &self.problems_dir
    }

    pub fn learning_log(&self) -> &Path {
        &self.learning_log
    }

    pub fn progress_log(&self) -> &Path {
        &self.progress_log
    }

    /// Root-relative folder for an artifact id.
    pub fn artifact_dir(&self, artifact_id: &str) -> PathBuf {
        self.problems_dir.join(artifact_id)
    }

    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Fail unless the root exists and is a directory.
    pub fn ensure_accessible(&self) -> Result<(), StorageError> {
        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StorageError::Inaccessible(self.root.clone())),
            Err(e) => Err(StorageError::io(&self.root, e)),
        }
    }

    /// Read a root-relative file; `None` when it does not exist.
    pub fn read_optional(&self, relative: &Path) -> Result<Option<String>, StorageError> {
        let path = self.resolve(relative);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    pub fn write(&self, artifact: &Artifact) -> Result<PathBuf, StorageError> {
        let path = self.resolve(&artifact.relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        std::fs::write(&path, &artifact.content).map_err(|e| StorageError::io(&path, e))?;
        Ok(path)
    }

    /// Write every artifact in the set, returning the absolute paths.
    pub fn write_all(&self, artifacts: &ArtifactSet) -> Result<Vec<PathBuf>, StorageError> {
        artifacts.iter().map(|a| self.write(a)).collect()
    }

    /// Record the current state of every path the set would write, so a
    /// failed publish can be undone.
    pub fn snapshot(&self, artifacts: &ArtifactSet) -> Result<Snapshot, StorageError> {
        let mut files = Vec::new();
        let mut created_dirs: Vec<PathBuf> = Vec::new();

        for relative in artifacts.paths() {
            let prior = self.read_optional(relative)?;
            let path = self.resolve(relative);

            let mut dir = path.parent().map(Path::to_path_buf);
            while let Some(d) = dir {
                if d == self.root || d.exists() || created_dirs.contains(&d) {
                    break;
                }
                dir = d.parent().map(Path::to_path_buf);
                created_dirs.push(d);
            }

            files.push((path, prior));
        }

        Ok(Snapshot {
            files,
            created_dirs,
        })
    }

    /// Create the problems directory and an empty provenance file when
    /// missing. Returns what was created; existing files are left alone.
    pub fn init(&self, provenance_file: &Path) -> Result<Vec<PathBuf>, StorageError> {
        let mut created = Vec::new();

        let problems = self.resolve(&self.problems_dir);
        if !problems.is_dir() {
            std::fs::create_dir_all(&problems).map_err(|e| StorageError::io(&problems, e))?;
            created.push(problems);
        }

        if !provenance_file.exists() {
            JsonProvenanceFile::new(provenance_file).save(&ProvenanceStore::new())?;
            created.push(provenance_file.to_path_buf());
        }

        Ok(created)
    }
}

/// Prior contents of the files an artifact set touches.
#[derive(Debug)]
pub struct Snapshot {
    /// `None` for files that did not exist.
    files: Vec<(PathBuf, Option<String>)>,
    created_dirs: Vec<PathBuf>,
}

impl Snapshot {
    /// Put every file back as it was: rewrite amended files, delete new
    /// ones, and remove directories that did not exist before.
    pub fn restore(self) -> Result<(), StorageError> {
        for (path, prior) in &self.files {
            match prior {
                Some(content) => {
                    std::fs::write(path, content).map_err(|e| StorageError::io(path, e))?
                }
                None => ignore_missing(std::fs::remove_file(path), path)?,
            }
        }

        let mut dirs = self.created_dirs;
        dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
        for dir in &dirs {
            ignore_missing(std::fs::remove_dir(dir), dir)?;
        }
        Ok(())
    }
}

fn ignore_missing(result: std::io::Result<()>, path: &Path) -> Result<(), StorageError> {
    match result {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(StorageError::io(path, e)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_nested_artifacts_and_reads_back() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path());
        let set = ArtifactSet {
            primary: Artifact::new("problems/2024-03-01_x/README.md", "# X\n"),
            raw_copy: Some(Artifact::new("problems/2024-03-01_x/solution.py", "pass\n")),
            notes: None,
        };

        let written = ws.write_all(&set).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(
            ws.read_optional(Path::new("problems/2024-03-01_x/solution.py")).unwrap().as_deref(),
            Some("pass\n")
        );
        assert!(ws.read_optional(Path::new("missing.md")).unwrap().is_none());
    }

    #[test]
    fn accessibility() {
        let tmp = TempDir::new().unwrap();
        assert!(Workspace::new(tmp.path()).ensure_accessible().is_ok());
        assert!(Workspace::new(tmp.path().join("gone")).ensure_accessible().is_err());

        let file = tmp.path().join("file");
        std::fs::write(&file, "").unwrap();
        assert!(matches!(
            Workspace::new(&file).ensure_accessible(),
            Err(StorageError::Inaccessible(_))
        ));
    }

    #[test]
    fn init_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path());
        let provenance = tmp.path().join("config/processed.json");

        let created = ws.init(&provenance).unwrap();
        assert_eq!(created.len(), 2);
        assert!(tmp.path().join("problems").is_dir());
        let store = JsonProvenanceFile::new(&provenance).load().unwrap();
        assert!(store.is_empty());

        assert!(ws.init(&provenance).unwrap().is_empty());
    }

    #[test]
    fn snapshot_restore_undoes_writes() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path());
        std::fs::write(tmp.path().join("learning_log.md"), "# Log\n").unwrap();

        let set = ArtifactSet {
            primary: Artifact::new("learning_log.md", "# Log\n\n## 2024-03-01\n- entry\n"),
            raw_copy: Some(Artifact::new("problems/2024-03-01_x/solution.py", "pass\n")),
            notes: Some(Artifact::new("problems/2024-03-01_x/notes.md", "# Notes\n")),
        };
        let snapshot = ws.snapshot(&set).unwrap();
        ws.write_all(&set).unwrap();

        snapshot.restore().unwrap();
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("learning_log.md")).unwrap(),
            "# Log\n"
        );
        assert!(!tmp.path().join("problems").exists());
    }

    #[test]
    fn restore_after_partial_write_keeps_existing_dirs() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path());
        std::fs::create_dir_all(tmp.path().join("problems/2024-02-01_old")).unwrap();

        let set = ArtifactSet {
            primary: Artifact::new("problems/2024-03-01_x/README.md", "# X\n"),
            raw_copy: Some(Artifact::new("problems/2024-03-01_x/solution.py", "pass\n")),
            notes: None,
        };
        let snapshot = ws.snapshot(&set).unwrap();
        // Only the first file made it to disk.
        ws.write(&set.primary).unwrap();

        snapshot.restore().unwrap();
        assert!(!tmp.path().join("problems/2024-03-01_x").exists());
        assert!(tmp.path().join("problems/2024-02-01_old").is_dir());
    }

    #[test]
    fn artifact_dir_is_under_problems() {
        let ws = Workspace::new("/repo");
        assert_eq!(ws.artifact_dir("2024-03-01_x"), PathBuf::from("problems/2024-03-01_x"));
    }
}
