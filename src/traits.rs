//! Source adapter trait and registry.
//!
//! A source is anything that can list candidate items and fetch the content
//! of one of them. Built-in adapters cover GitHub repositories and local
//! directories; additional sources are added by implementing
//! [`SourceAdapter`] and registering the adapter, never by branching on a
//! type string.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │             SourceRegistry               │
//! │  ┌──────────┐ ┌────────────┐ ┌─────────┐ │
//! │  │  GitHub  │ │ Filesystem │ │ Custom  │ │
//! │  └──────────┘ └────────────┘ └─────────┘ │
//! └──────────────┬───────────────────────────┘
//!                ▼
//!     filter → select → ingest → publish
//! ```

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{FetchError, SourceError};
use crate::models::{CandidateItem, FetchedContent};

/// A content source offering candidate items for ingestion.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use algo_harness::error::{FetchError, SourceError};
/// use algo_harness::models::{CandidateItem, FetchedContent};
/// use algo_harness::traits::SourceAdapter;
///
/// pub struct Fixed;
///
/// #[async_trait]
/// impl SourceAdapter for Fixed {
///     fn name(&self) -> &str { "fixed" }
///
///     async fn list_candidates(&self) -> Result<Vec<CandidateItem>, SourceError> {
///         Ok(vec![CandidateItem::new("fixed", "sorts/bubble.py", "mem://bubble")])
///     }
///
///     async fn fetch_content(&self, item: &CandidateItem) -> Result<FetchedContent, FetchError> {
///         Ok(FetchedContent { raw_text: "pass\n".into(), locator: item.locator.clone() })
///     }
/// }
/// ```
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Instance name. Recorded as `source` in provenance, so renaming a
    /// source makes its items eligible again.
    fn name(&self) -> &str;

    /// Adapter type (`"github"`, `"filesystem"`, `"custom"`).
    fn source_type(&self) -> &str {
        "custom"
    }

    /// List every item this source currently offers.
    async fn list_candidates(&self) -> Result<Vec<CandidateItem>, SourceError>;

    /// Retrieve the full content of one listed item.
    async fn fetch_content(&self, item: &CandidateItem) -> Result<FetchedContent, FetchError>;
}

/// Registry of enabled source adapters, in configuration order.
pub struct SourceRegistry {
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// Build a registry holding every enabled source from the config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        use crate::source_fs::FilesystemSource;
        use crate::source_github::GithubSource;

        let mut registry = Self::new();

        for (name, cfg) in &config.sources.github {
            if cfg.enabled {
                registry.register(Box::new(GithubSource::new(name.clone(), cfg.clone())?));
            }
        }
        for (name, cfg) in &config.sources.filesystem {
            if cfg.enabled {
                registry.register(Box::new(FilesystemSource::new(name.clone(), cfg.clone())?));
            }
        }

        Ok(registry)
    }

    pub fn register(&mut self, adapter: Box<dyn SourceAdapter>) {
        self.adapters.push(adapter);
    }

    pub fn adapters(&self) -> &[Box<dyn SourceAdapter>] {
        &self.adapters
    }

    pub fn find(&self, name: &str) -> Option<&dyn SourceAdapter> {
        self.adapters
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
    }

    /// Keep only the adapters whose name is `name`.
    pub fn retain_named(&mut self, name: &str) {
        self.adapters.retain(|a| a.name() == name);
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
