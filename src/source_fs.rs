use anyhow::Result;
use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use crate::config::FilesystemSourceConfig;
use crate::error::{FetchError, SourceError};
use crate::models::{CandidateItem, FetchedContent};
use crate::traits::SourceAdapter;

/// Local directory source. Candidates are files under `root` matching the
/// include globs; paths are root-relative with `/` separators.
pub struct FilesystemSource {
    name: String,
    config: FilesystemSourceConfig,
    include_set: GlobSet,
    exclude_set: GlobSet,
}

impl FilesystemSource {
    pub fn new(name: String, config: FilesystemSourceConfig) -> Result<Self> {
        let include_set = build_globset(&config.include_globs)?;

        let mut default_excludes = vec![
            "**/.git/**".to_string(),
            "**/target/**".to_string(),
            "**/node_modules/**".to_string(),
        ];
        default_excludes.extend(config.exclude_globs.clone());
        let exclude_set = build_globset(&default_excludes)?;

        Ok(Self {
            name,
            config,
            include_set,
            exclude_set,
        })
    }

    fn scan(&self) -> Result<Vec<CandidateItem>> {
        let root = &self.config.root;
        if !root.is_dir() {
            anyhow::bail!("root does not exist: {}", root.display());
        }

        let mut items = Vec::new();

        let walker = WalkDir::new(root).follow_links(self.config.follow_symlinks);
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let rel_str = relative_slash_path(path, root);

            if self.exclude_set.is_match(&rel_str) {
                continue;
            }
            if !self.include_set.is_match(&rel_str) {
                continue;
            }

            items.push(CandidateItem::new(
                self.name.clone(),
                rel_str,
                path.to_string_lossy().to_string(),
            ));
        }

        items.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(items)
    }
}

#[async_trait]
impl SourceAdapter for FilesystemSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> &str {
        "filesystem"
    }

    async fn list_candidates(&self) -> Result<Vec<CandidateItem>, SourceError> {
        self.scan()
            .map_err(|e| SourceError::unavailable(&self.name, format!("{:#}", e)))
    }

    async fn fetch_content(&self, item: &CandidateItem) -> Result<FetchedContent, FetchError> {
        let raw_text = std::fs::read_to_string(&item.locator)
            .map_err(|e| FetchError::new(&self.name, &item.path, e))?;
        Ok(FetchedContent {
            raw_text,
            locator: format!("file://{}", item.locator),
        })
    }
}

fn relative_slash_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub(crate) fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn source(root: &Path, include: &[&str], exclude: &[&str]) -> FilesystemSource {
        FilesystemSource::new(
            "local".to_string(),
            FilesystemSourceConfig {
                root: root.to_path_buf(),
                include_globs: include.iter().map(|s| s.to_string()).collect(),
                exclude_globs: exclude.iter().map(|s| s.to_string()).collect(),
                follow_symlinks: false,
                enabled: true,
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn lists_matching_files_sorted() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("sorts")).unwrap();
        fs::create_dir_all(tmp.path().join("graph")).unwrap();
        fs::write(tmp.path().join("sorts/quick.py"), "q").unwrap();
        fs::write(tmp.path().join("sorts/bubble.py"), "b").unwrap();
        fs::write(tmp.path().join("graph/bfs.py"), "g").unwrap();
        fs::write(tmp.path().join("graph/README.md"), "r").unwrap();
        fs::write(tmp.path().join("sorts/__init__.py"), "").unwrap();

        let src = source(tmp.path(), &["**/*.py"], &["**/__init__.py"]);
        let items = src.list_candidates().await.unwrap();
        let paths: Vec<_> = items.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["graph/bfs.py", "sorts/bubble.py", "sorts/quick.py"]);
        assert!(items.iter().all(|i| i.source_name == "local"));
    }

    #[tokio::test]
    async fn missing_root_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let src = source(&tmp.path().join("nope"), &["**/*.py"], &[]);
        let err = src.list_candidates().await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn fetch_reads_file_and_reports_missing() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bubble.py"), "def bubble(): pass\n").unwrap();
        let src = source(tmp.path(), &["**/*.py"], &[]);

        let items = src.list_candidates().await.unwrap();
        let content = src.fetch_content(&items[0]).await.unwrap();
        assert_eq!(content.raw_text, "def bubble(): pass\n");
        assert!(content.locator.starts_with("file://"));

        fs::remove_file(tmp.path().join("bubble.py")).unwrap();
        let err = src.fetch_content(&items[0]).await.unwrap_err();
        assert_eq!(err.path, "bubble.py");
    }
}
