//! TOML configuration parsing.
//!
//! ```toml
//! [workspace]
//! root = "."
//! problems_dir = "problems"
//! provenance_path = "config/processed.json"
//!
//! [logging]
//! filter = "info"
//!
//! [sources.github.python]
//! owner = "TheAlgorithms"
//! repo = "Python"
//!
//! [publish]
//! mode = "git"
//! push = true
//!
//! [fallback]
//! strategies = ["amend_notes", "learning_log"]
//! ```
//!
//! Paths under `[workspace]` other than `root` are relative to `root`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::fallback::FallbackStrategy;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkspaceConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_problems_dir")]
    pub problems_dir: PathBuf,
    #[serde(default = "default_provenance_path")]
    pub provenance_path: PathBuf,
    #[serde(default = "default_learning_log")]
    pub learning_log: PathBuf,
    #[serde(default = "default_progress_log")]
    pub progress_log: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            problems_dir: default_problems_dir(),
            provenance_path: default_provenance_path(),
            learning_log: default_learning_log(),
            progress_log: default_progress_log(),
        }
    }
}

impl WorkspaceConfig {
    /// Absolute-or-CWD-relative location of the provenance file.
    pub fn provenance_file(&self) -> PathBuf {
        self.root.join(&self.provenance_path)
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_problems_dir() -> PathBuf {
    PathBuf::from("problems")
}
fn default_provenance_path() -> PathBuf {
    PathBuf::from("config/processed.json")
}
fn default_learning_log() -> PathBuf {
    PathBuf::from("learning_log.md")
}
fn default_progress_log() -> PathBuf {
    PathBuf::from("PROGRESS.md")
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: default_log_format(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "human".to_string()
}

/// Named source instances, e.g. `[sources.github.python]`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourcesConfig {
    #[serde(default)]
    pub github: BTreeMap<String, GithubSourceConfig>,
    #[serde(default)]
    pub filesystem: BTreeMap<String, FilesystemSourceConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GithubSourceConfig {
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_directories")]
    pub directories: Vec<String>,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default = "default_github_excludes")]
    pub exclude_globs: Vec<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_branch() -> String {
    "master".to_string()
}
fn default_directories() -> Vec<String> {
    [
        "sorts",
        "searches",
        "data_structures/binary_tree",
        "data_structures/linked_list",
        "dynamic_programming",
        "graph",
        "backtracking",
        "greedy",
        "divide_and_conquer",
    ]
    .iter()
    .map(|d| d.to_string())
    .collect()
}
fn default_include_globs() -> Vec<String> {
    vec!["**/*.py".to_string()]
}
fn default_github_excludes() -> Vec<String> {
    vec!["**/__init__.py".to_string()]
}
fn default_api_base() -> String {
    "https://api.github.com".to_string()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_request_delay_ms() -> u64 {
    100
}
fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilesystemSourceConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PublishConfig {
    #[serde(default = "default_publish_mode")]
    pub mode: String,
    #[serde(default = "default_push")]
    pub push: bool,
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            mode: default_publish_mode(),
            push: default_push(),
            remote: None,
            branch: None,
        }
    }
}

fn default_publish_mode() -> String {
    "git".to_string()
}
fn default_push() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct FallbackConfig {
    #[serde(default = "default_strategies")]
    pub strategies: Vec<String>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
        }
    }
}

impl FallbackConfig {
    /// Parsed strategy list. Names are checked by [`load_config`], so
    /// unknown entries are skipped here.
    pub fn parsed(&self) -> Vec<FallbackStrategy> {
        self.strategies
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect()
    }
}

fn default_strategies() -> Vec<String> {
    vec!["amend_notes".to_string(), "learning_log".to_string()]
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

/// Parse and validate a configuration document.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    for (name, gh) in &config.sources.github {
        if gh.owner.trim().is_empty() || gh.repo.trim().is_empty() {
            bail!("sources.github.{}: owner and repo must be non-empty", name);
        }
        if gh.timeout_secs == 0 {
            bail!("sources.github.{}: timeout_secs must be > 0", name);
        }
        if gh.include_globs.is_empty() {
            bail!("sources.github.{}: include_globs must not be empty", name);
        }
    }

    for (name, fs) in &config.sources.filesystem {
        if fs.include_globs.is_empty() {
            bail!("sources.filesystem.{}: include_globs must not be empty", name);
        }
    }

    match config.publish.mode.as_str() {
        "git" | "local" => {}
        other => bail!(
            "Unknown publish mode: '{}'. Must be git or local.",
            other
        ),
    }

    match config.logging.format.as_str() {
        "human" | "json" => {}
        other => bail!("Unknown logging format: '{}'. Must be human or json.", other),
    }

    if config.fallback.strategies.is_empty() {
        bail!("fallback.strategies must list at least one strategy");
    }
    for name in &config.fallback.strategies {
        if name.parse::<FallbackStrategy>().is_err() {
            bail!(
                "Unknown fallback strategy: '{}'. Must be amend_notes, learning_log, or progress_log.",
                name
            );
        }
    }

    Ok(config)
}
