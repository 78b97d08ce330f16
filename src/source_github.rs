//! GitHub repository source.
//!
//! Lists files through the REST contents API, walking each configured
//! directory, and fetches a single file's content on demand. No clone is
//! made; one run touches one file.
//!
//! # Configuration
//!
//! ```toml
//! [sources.github.python]
//! owner = "TheAlgorithms"
//! repo = "Python"
//! branch = "master"
//! directories = ["sorts", "graph"]
//! include_globs = ["**/*.py"]
//! exclude_globs = ["**/__init__.py"]
//! ```
//!
//! # Authentication
//!
//! If the environment variable named by `token_env` (default
//! `GITHUB_TOKEN`) is set, requests carry `Authorization: Bearer <token>`,
//! which raises the API rate limit.
//!
//! # Listing failures
//!
//! A directory that cannot be listed is logged and skipped. The source is
//! reported unavailable only when none of the configured directories could
//! be listed.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use globset::GlobSet;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GithubSourceConfig;
use crate::error::{FetchError, SourceError};
use crate::models::{CandidateItem, FetchedContent};
use crate::source_fs::build_globset;
use crate::traits::SourceAdapter;

/// One entry of a contents-API response.
#[derive(Debug, Deserialize)]
struct ContentEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

/// The contents API returns an array for directories and an object for files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing {
    Dir(Vec<ContentEntry>),
    File(ContentEntry),
}

pub struct GithubSource {
    name: String,
    config: GithubSourceConfig,
    client: reqwest::Client,
    token: Option<String>,
    include_set: GlobSet,
    exclude_set: GlobSet,
}

impl GithubSource {
    pub fn new(name: String, config: GithubSourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("algo-harness/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());

        Ok(Self {
            include_set: build_globset(&config.include_globs)?,
            exclude_set: build_globset(&config.exclude_globs)?,
            name,
            config,
            client,
            token,
        })
    }

    fn contents_url(&self, path: &str) -> String {
        contents_url(&self.config, path)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()?;
        Ok(response)
    }

    async fn list_directory(&self, dir: &str) -> Result<Vec<ContentEntry>> {
        let listing: Listing = self.get(&self.contents_url(dir)).await?.json().await?;
        Ok(match listing {
            Listing::Dir(entries) => entries,
            Listing::File(entry) => vec![entry],
        })
    }

    /// Walk one configured directory, descending into subdirectories.
    ///
    /// Fails only if the directory itself cannot be listed; nested failures
    /// are logged and skipped.
    async fn walk(&self, root: &str, out: &mut Vec<CandidateItem>) -> Result<()> {
        let mut pending = vec![root.to_string()];
        let mut first = true;

        while let Some(dir) = pending.pop() {
            if !first {
                tokio::time::sleep(Duration::from_millis(self.config.request_delay_ms)).await;
            }
            let entries = match self.list_directory(&dir).await {
                Ok(entries) => entries,
                Err(e) if first => return Err(e),
                Err(e) => {
                    warn!(source = %self.name, dir = %dir, error = %format!("{:#}", e), "skipping directory");
                    continue;
                }
            };
            first = false;

            for entry in entries {
                if self.exclude_set.is_match(&entry.path) {
                    continue;
                }
                match entry.kind.as_str() {
                    "dir" => pending.push(entry.path),
                    "file" if self.include_set.is_match(&entry.path) => {
                        let locator = self.contents_url(&entry.path);
                        out.push(CandidateItem::new(self.name.clone(), entry.path, locator));
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }

    async fn fetch(&self, item: &CandidateItem) -> Result<FetchedContent> {
        let entry = match self.get(&item.locator).await?.json::<Listing>().await? {
            Listing::File(entry) => entry,
            Listing::Dir(_) => anyhow::bail!("path is a directory"),
        };

        let raw_text = match (entry.encoding.as_deref(), entry.content.as_deref()) {
            (Some("base64"), Some(content)) if !content.is_empty() => decode_content(content)?,
            // Files over 1 MB come back without inline content.
            _ => {
                let url = entry
                    .download_url
                    .as_deref()
                    .context("response has neither content nor download_url")?;
                self.get(url).await?.text().await?
            }
        };

        let locator = entry
            .html_url
            .unwrap_or_else(|| blob_url(&self.config, &item.path));
        Ok(FetchedContent { raw_text, locator })
    }
}

#[async_trait]
impl SourceAdapter for GithubSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> &str {
        "github"
    }

    async fn list_candidates(&self) -> Result<Vec<CandidateItem>, SourceError> {
        let roots: Vec<&str> = if self.config.directories.is_empty() {
            vec![""]
        } else {
            self.config.directories.iter().map(String::as_str).collect()
        };

        let mut items = Vec::new();
        let mut listed = 0usize;
        let mut last_error = None;

        for (i, root) in roots.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.request_delay_ms)).await;
            }
            match self.walk(root, &mut items).await {
                Ok(()) => listed += 1,
                Err(e) => {
                    warn!(source = %self.name, dir = %root, error = %format!("{:#}", e), "could not list directory");
                    last_error = Some(e);
                }
            }
        }

        if listed == 0 {
            let reason = last_error
                .map(|e| format!("{:#}", e))
                .unwrap_or_else(|| "no directories configured".to_string());
            return Err(SourceError::unavailable(&self.name, reason));
        }

        items.sort_by(|a, b| a.path.cmp(&b.path));
        items.dedup_by(|a, b| a.path == b.path);
        debug!(source = %self.name, count = items.len(), "listed candidates");
        Ok(items)
    }

    async fn fetch_content(&self, item: &CandidateItem) -> Result<FetchedContent, FetchError> {
        self.fetch(item)
            .await
            .map_err(|e| FetchError::new(&self.name, &item.path, format!("{:#}", e)))
    }
}

fn contents_url(config: &GithubSourceConfig, path: &str) -> String {
    let base = config.api_base.trim_end_matches('/');
    let path = path.trim_matches('/');
    format!(
        "{}/repos/{}/{}/contents/{}?ref={}",
        base, config.owner, config.repo, path, config.branch
    )
}

fn blob_url(config: &GithubSourceConfig, path: &str) -> String {
    format!(
        "https://github.com/{}/{}/blob/{}/{}",
        config.owner, config.repo, config.branch, path
    )
}

/// Decode the API's base64 `content` field, which is wrapped at 60 columns.
fn decode_content(content: &str) -> Result<String> {
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .context("invalid base64 content")?;
    String::from_utf8(bytes).context("content is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use axum::http::{StatusCode, Uri};
    use axum::response::{IntoResponse, Response};
    use axum::Router;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn config() -> GithubSourceConfig {
        parse_config(
            r#"
[sources.github.python]
owner = "TheAlgorithms"
repo = "Python"
api_base = "https://api.example.test/"
"#,
        )
        .unwrap()
        .sources
        .github
        .remove("python")
        .unwrap()
    }

    #[test]
    fn builds_contents_and_blob_urls() {
        let cfg = config();
        assert_eq!(
            contents_url(&cfg, "/sorts/bubble_sort.py"),
            "https://api.example.test/repos/TheAlgorithms/Python/contents/sorts/bubble_sort.py?ref=master"
        );
        assert_eq!(
            blob_url(&cfg, "sorts/bubble_sort.py"),
            "https://github.com/TheAlgorithms/Python/blob/master/sorts/bubble_sort.py"
        );
    }

    #[test]
    fn decodes_wrapped_base64() {
        let encoded = "ZGVmIGJ1YmJsZShh\ncnIpOgogICAgcGFz\ncwo=\n";
        assert_eq!(decode_content(encoded).unwrap(), "def bubble(arr):\n    pass\n");
        assert!(decode_content("!!!").is_err());
    }

    #[test]
    fn listing_accepts_array_or_object() {
        let dir: Listing = serde_json::from_str(
            r#"[{"path": "sorts/a.py", "type": "file"}, {"path": "sorts/sub", "type": "dir"}]"#,
        )
        .unwrap();
        assert!(matches!(dir, Listing::Dir(ref e) if e.len() == 2));

        let file: Listing = serde_json::from_str(
            r#"{"path": "sorts/a.py", "type": "file", "content": "cGFzcwo=", "encoding": "base64"}"#,
        )
        .unwrap();
        assert!(matches!(file, Listing::File(ref e) if e.encoding.as_deref() == Some("base64")));
    }

    // ─── Stub contents API ──────────────────────────────────────────

    /// Serve canned bodies keyed by request path; anything else is a 404.
    async fn serve(routes: Vec<(String, StatusCode, String)>) -> String {
        let routes: Arc<HashMap<String, (StatusCode, String)>> = Arc::new(
            routes
                .into_iter()
                .map(|(path, status, body)| (path, (status, body)))
                .collect(),
        );
        let app = Router::new().fallback(move |uri: Uri| {
            let routes = routes.clone();
            async move {
                let response: Response = match routes.get(uri.path()) {
                    Some((status, body)) => (*status, body.clone()).into_response(),
                    None => StatusCode::NOT_FOUND.into_response(),
                };
                response
            }
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn contents(path: &str) -> String {
        format!("/repos/TheAlgorithms/Python/contents/{}", path)
    }

    fn ok(path: &str, body: &str) -> (String, StatusCode, String) {
        (contents(path), StatusCode::OK, body.to_string())
    }

    fn stub_source(api_base: &str, directories: &[&str]) -> GithubSource {
        let dirs: Vec<String> = directories.iter().map(|d| format!("\"{}\"", d)).collect();
        let cfg = parse_config(&format!(
            r#"
[sources.github.python]
owner = "TheAlgorithms"
repo = "Python"
api_base = "{}"
directories = [{}]
exclude_globs = ["**/__init__.py", "sorts/legacy"]
token_env = "ALGO_HARNESS_TEST_UNSET_TOKEN"
timeout_secs = 5
request_delay_ms = 0
"#,
            api_base,
            dirs.join(", ")
        ))
        .unwrap()
        .sources
        .github
        .remove("python")
        .unwrap();
        GithubSource::new("python".to_string(), cfg).unwrap()
    }

    #[tokio::test]
    async fn walk_skips_failed_and_excluded_directories() {
        let base = serve(vec![
            ok(
                "sorts",
                r#"[
                    {"path": "sorts/bubble_sort.py", "type": "file"},
                    {"path": "sorts/__init__.py", "type": "file"},
                    {"path": "sorts/README.md", "type": "file"},
                    {"path": "sorts/nested", "type": "dir"},
                    {"path": "sorts/broken", "type": "dir"},
                    {"path": "sorts/legacy", "type": "dir"}
                ]"#,
            ),
            ok("sorts/nested", r#"[{"path": "sorts/nested/heap_sort.py", "type": "file"}]"#),
            (contents("sorts/broken"), StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()),
            ok("sorts/legacy", r#"[{"path": "sorts/legacy/old_sort.py", "type": "file"}]"#),
            ok("graph", r#"[{"path": "graph/bfs.py", "type": "file"}]"#),
        ])
        .await;

        // `missing` 404s; the other roots still list.
        let source = stub_source(&base, &["sorts", "graph", "missing"]);
        let items = source.list_candidates().await.unwrap();

        let paths: Vec<&str> = items.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["graph/bfs.py", "sorts/bubble_sort.py", "sorts/nested/heap_sort.py"]
        );
        assert!(items.iter().all(|i| i.source_name == "python"));
        assert_eq!(
            items[0].locator,
            format!("{}{}?ref=master", base, contents("graph/bfs.py"))
        );
    }

    #[tokio::test]
    async fn every_root_failing_is_unavailable() {
        let source = stub_source("http://127.0.0.1:1", &["sorts", "graph"]);
        let err = source.list_candidates().await.unwrap_err();
        let SourceError::Unavailable { source_name, .. } = err;
        assert_eq!(source_name, "python");
    }

    #[tokio::test]
    async fn fetch_decodes_inline_content() {
        let base = serve(vec![ok(
            "sorts/bubble_sort.py",
            r#"{
                "path": "sorts/bubble_sort.py",
                "type": "file",
                "encoding": "base64",
                "content": "ZGVmIGJ1YmJsZShh\ncnIpOgogICAgcGFz\ncwo=\n",
                "html_url": "https://github.com/TheAlgorithms/Python/blob/master/sorts/bubble_sort.py"
            }"#,
        )])
        .await;
        let source = stub_source(&base, &["sorts"]);
        let item = CandidateItem::new(
            "python",
            "sorts/bubble_sort.py",
            source.contents_url("sorts/bubble_sort.py"),
        );

        let fetched = source.fetch_content(&item).await.unwrap();
        assert_eq!(fetched.raw_text, "def bubble(arr):\n    pass\n");
        assert_eq!(
            fetched.locator,
            "https://github.com/TheAlgorithms/Python/blob/master/sorts/bubble_sort.py"
        );
    }

    #[tokio::test]
    async fn fetch_without_inline_content_uses_download_url() {
        // Raw files live on a second server the entry points at.
        let raw_base = serve(vec![(
            "/raw/sorts/big_sort.py".to_string(),
            StatusCode::OK,
            "def big():\n    pass\n".to_string(),
        )])
        .await;

        let base = serve(vec![ok(
            "sorts/big_sort.py",
            &format!(
                r#"{{"path": "sorts/big_sort.py", "type": "file", "download_url": "{}/raw/sorts/big_sort.py"}}"#,
                raw_base
            ),
        )])
        .await;
        let source = stub_source(&base, &["sorts"]);
        let item = CandidateItem::new(
            "python",
            "sorts/big_sort.py",
            source.contents_url("sorts/big_sort.py"),
        );

        let fetched = source.fetch_content(&item).await.unwrap();
        assert_eq!(fetched.raw_text, "def big():\n    pass\n");
        // No html_url in the response: the locator is the blob URL.
        assert_eq!(
            fetched.locator,
            "https://github.com/TheAlgorithms/Python/blob/master/sorts/big_sort.py"
        );
    }

    #[tokio::test]
    async fn fetch_of_missing_file_is_a_fetch_error() {
        let base = serve(vec![]).await;
        let source = stub_source(&base, &["sorts"]);
        let item = CandidateItem::new("python", "sorts/gone.py", source.contents_url("sorts/gone.py"));

        let err = source.fetch_content(&item).await.unwrap_err();
        assert_eq!(err.source_name, "python");
        assert_eq!(err.path, "sorts/gone.py");
    }
}
