//! Publishers: persist an artifact set and record it as one changeset.
//!
//! - [`GitPublisher`] writes the artifacts into a git working tree, stages
//!   them together with the provenance file, commits, and optionally pushes.
//! - [`LocalPublisher`] only writes the files.
//! - [`DryRunPublisher`] prints what would be written and touches nothing.
//!
//! An artifact set that leaves the tree unchanged fails with
//! [`PublishError::NothingToPublish`]. When staging or committing fails the
//! git index is reset for the staged paths; restoring the files themselves
//! is the caller's job (see [`crate::workspace::Snapshot`]).

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::{Command, Output};

use tracing::{debug, info, warn};

use crate::error::PublishError;
use crate::models::ArtifactSet;
use crate::workspace::Workspace;

/// What a successful publish did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Absolute paths of the files written.
    pub written: Vec<PathBuf>,
    /// Commit id, when the publisher records changesets.
    pub commit: Option<String>,
    pub pushed: bool,
}

pub trait Publisher: Send + Sync {
    /// Short name shown in logs (`git`, `local`, `dry-run`).
    fn name(&self) -> &str;

    fn publish(&self, artifacts: &ArtifactSet, message: &str) -> Result<PublishReceipt, PublishError>;
}

/// True when every artifact already exists with identical content.
fn unchanged(workspace: &Workspace, artifacts: &ArtifactSet) -> Result<bool, PublishError> {
    for artifact in artifacts.iter() {
        let current = workspace.read_optional(&artifact.relative_path)?;
        if current.as_deref() != Some(artifact.content.as_str()) {
            return Ok(false);
        }
    }
    Ok(true)
}

// ============ Local ============

pub struct LocalPublisher {
    workspace: Workspace,
}

impl LocalPublisher {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

impl Publisher for LocalPublisher {
    fn name(&self) -> &str {
        "local"
    }

    fn publish(&self, artifacts: &ArtifactSet, message: &str) -> Result<PublishReceipt, PublishError> {
        self.workspace.ensure_accessible()?;
        if unchanged(&self.workspace, artifacts)? {
            return Err(PublishError::NothingToPublish);
        }
        let written = self.workspace.write_all(artifacts)?;
        info!(files = written.len(), commit_message = message, "artifacts written");
        Ok(PublishReceipt {
            written,
            commit: None,
            pushed: false,
        })
    }
}

// ============ Dry run ============

pub struct DryRunPublisher;

impl Publisher for DryRunPublisher {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn publish(&self, artifacts: &ArtifactSet, message: &str) -> Result<PublishReceipt, PublishError> {
        println!("Dry run: would publish \"{}\"", message);
        for artifact in artifacts.iter() {
            println!(
                "  {} ({} bytes)",
                artifact.relative_path.display(),
                artifact.content.len()
            );
        }
        Ok(PublishReceipt::default())
    }
}

// ============ Git ============

pub struct GitPublisher {
    workspace: Workspace,
    /// Extra files staged with every changeset (the provenance file).
    tracked: Vec<PathBuf>,
    push: bool,
    remote: String,
    branch: Option<String>,
}

impl GitPublisher {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            tracked: Vec::new(),
            push: false,
            remote: "origin".to_string(),
            branch: None,
        }
    }

    /// Also stage `path` in every commit, when it exists.
    pub fn track(mut self, path: impl Into<PathBuf>) -> Self {
        self.tracked.push(path.into());
        self
    }

    /// Push after committing. `branch` of `None` pushes the current HEAD
    /// to its same-named remote branch.
    pub fn push_to(mut self, remote: impl Into<String>, branch: Option<String>) -> Self {
        self.push = true;
        self.remote = remote.into();
        self.branch = branch;
        self
    }

    fn git<I, S>(&self, args: I) -> Result<Output, PublishError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let command = describe(&args);
        debug!(command = %command, "running git");
        Command::new("git")
            .args(&args)
            .current_dir(self.workspace.root())
            .output()
            .map_err(|source| PublishError::Spawn { command, source })
    }

    /// Run git and fail with its stderr unless it exits successfully.
    fn git_checked<I, S>(&self, args: I) -> Result<String, PublishError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let output = self.git(&args)?;
        if !output.status.success() {
            return Err(PublishError::Git {
                command: describe(&args),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn ensure_repository(&self) -> Result<(), PublishError> {
        self.workspace.ensure_accessible()?;
        let output = self.git(["rev-parse", "--git-dir"])?;
        if !output.status.success() {
            return Err(PublishError::NotARepository(
                self.workspace.root().to_path_buf(),
            ));
        }
        Ok(())
    }
}

fn describe<S: AsRef<OsStr>>(args: &[S]) -> String {
    let mut command = String::from("git");
    for arg in args {
        command.push(' ');
        command.push_str(&arg.as_ref().to_string_lossy());
    }
    command
}

impl Publisher for GitPublisher {
    fn name(&self) -> &str {
        "git"
    }

    fn publish(&self, artifacts: &ArtifactSet, message: &str) -> Result<PublishReceipt, PublishError> {
        self.ensure_repository()?;

        let written = self.workspace.write_all(artifacts)?;

        // Absolute paths: git runs from the workspace root.
        let staged: Vec<PathBuf> = written
            .iter()
            .chain(self.tracked.iter().filter(|p| p.exists()))
            .map(|p| std::fs::canonicalize(p).unwrap_or_else(|_| p.clone()))
            .collect();

        let commit = match self.commit(&staged, message) {
            Ok(commit) => commit,
            Err(e) => {
                self.unstage(&staged);
                return Err(e);
            }
        };
        info!(commit = %commit, commit_message = message, "committed");

        let mut pushed = false;
        if self.push {
            let refspec = match &self.branch {
                Some(branch) => format!("HEAD:{}", branch),
                None => "HEAD".to_string(),
            };
            if let Err(e) = self.git_checked(["push", self.remote.as_str(), refspec.as_str()]) {
                return Err(PublishError::PushFailed {
                    commit,
                    source: Box::new(e),
                });
            }
            info!(remote = %self.remote, refspec = %refspec, "pushed");
            pushed = true;
        }

        Ok(PublishReceipt {
            written,
            commit: Some(commit),
            pushed,
        })
    }
}

impl GitPublisher {
    /// Stage `paths` and commit them, returning the new HEAD.
    fn commit(&self, paths: &[PathBuf], message: &str) -> Result<String, PublishError> {
        let mut add: Vec<&OsStr> = vec![OsStr::new("add"), OsStr::new("--")];
        add.extend(paths.iter().map(|p| p.as_os_str()));
        self.git_checked(&add)?;

        // Exit 0 means the index matches HEAD.
        let diff = self.git(["diff", "--cached", "--quiet"])?;
        match diff.status.code() {
            Some(0) => return Err(PublishError::NothingToPublish),
            Some(1) => {}
            _ => {
                return Err(PublishError::Git {
                    command: "git diff --cached --quiet".to_string(),
                    stderr: String::from_utf8_lossy(&diff.stderr).trim().to_string(),
                })
            }
        }

        self.git_checked(["commit", "-m", message])?;
        self.git_checked(["rev-parse", "HEAD"])
    }

    /// Reset the index entries for `paths` back to HEAD.
    fn unstage(&self, paths: &[PathBuf]) {
        let mut reset: Vec<&OsStr> = vec![OsStr::new("reset"), OsStr::new("-q"), OsStr::new("--")];
        reset.extend(paths.iter().map(|p| p.as_os_str()));
        if let Err(e) = self.git_checked(&reset) {
            warn!(error = %e, "failed to unstage after publish failure");
        }
    }
}
