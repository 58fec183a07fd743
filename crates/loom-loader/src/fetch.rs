// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Document fetchers.
//!
//! The loader only needs "give me the text at this path". [`HttpFetcher`]
//! serves a deployed site, [`FsFetcher`] a local directory, and
//! [`MemoryFetcher`] in-memory documents.

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{header, Client, StatusCode};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::FetchError;

/// Whether cached responses may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Platform default caching
    Default,
    /// Always fetch fresh content
    NoStore,
}

/// Source of module documents.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the text at `path`.
    async fn fetch(&self, path: &str, policy: CachePolicy) -> Result<String, FetchError>;
}

/// Strips the `/` or `./` prefix of a normalized path.
fn relative(path: &str) -> &str {
    path.trim_start_matches("./").trim_start_matches('/')
}

/// Fetches documents over HTTP relative to a base URL.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    base: Url,
}

impl HttpFetcher {
    /// Create a fetcher for `base_url`.
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let mut base = Url::parse(base_url).map_err(|e| FetchError::Network {
            path: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("loom/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network {
                path: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { client, base })
    }

    /// The base URL.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// URL for a module path.
    pub fn url_for(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(relative(path))
            .map_err(|_| FetchError::InvalidPath(path.to_string()))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, path: &str, policy: CachePolicy) -> Result<String, FetchError> {
        let url = self.url_for(path)?;
        debug!("Fetching {}", url);

        let mut request = self.client.get(url);
        if policy == CachePolicy::NoStore {
            request = request
                .header(header::CACHE_CONTROL, "no-store")
                .header(header::PRAGMA, "no-cache");
        }

        let network = |e: reqwest::Error| FetchError::Network {
            path: path.to_string(),
            reason: e.to_string(),
        };
        let response = request.send().await.map_err(network)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(path.to_string()));
        }
        if !response.status().is_success() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.text().await.map_err(network)
    }
}

/// Serves documents from a directory.
///
/// With [`CachePolicy::Default`] file contents are memoized.
pub struct FsFetcher {
    root: PathBuf,
    memo: DashMap<String, String>,
}

impl FsFetcher {
    /// Serve files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            memo: DashMap::new(),
        }
    }

    /// The served directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, path: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(relative(path));
        // Normalized paths never climb, so a `..` here is an escape attempt.
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(FetchError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl Fetcher for FsFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, path: &str, policy: CachePolicy) -> Result<String, FetchError> {
        if policy == CachePolicy::Default {
            if let Some(text) = self.memo.get(path) {
                debug!("Memo hit for {}", path);
                return Ok(text.clone());
            }
        }

        let file = self.file_path(path)?;
        debug!("Reading {}", file.display());
        let text = tokio::fs::read_to_string(&file).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FetchError::NotFound(path.to_string())
            } else {
                FetchError::Io {
                    path: path.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        if policy == CachePolicy::Default {
            self.memo.insert(path.to_string(), text.clone());
        }
        Ok(text)
    }
}

/// In-memory documents with per-path fetch counters.
#[derive(Default)]
pub struct MemoryFetcher {
    documents: DashMap<String, String>,
    counts: DashMap<String, usize>,
    total: AtomicUsize,
    latency: Option<Duration>,
}

impl MemoryFetcher {
    /// An empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryFetcher::insert`].
    pub fn with(self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    /// Delay every fetch, so concurrent requests overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Add or replace a document.
    pub fn insert(&self, path: impl Into<String>, text: impl Into<String>) {
        self.documents.insert(path.into(), text.into());
    }

    /// How many times `path` was fetched.
    pub fn fetch_count(&self, path: &str) -> usize {
        self.counts.get(path).map(|c| *c).unwrap_or(0)
    }

    /// Fetches across all paths.
    pub fn total_fetches(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, path: &str, _policy: CachePolicy) -> Result<String, FetchError> {
        *self.counts.entry(path.to_string()).or_insert(0) += 1;
        self.total.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.documents
            .get(path)
            .map(|text| text.clone())
            .ok_or_else(|| FetchError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_url_joining() {
        let fetcher = HttpFetcher::new("https://example.com/site").unwrap();
        assert_eq!(
            fetcher.url_for("/app/main.component").unwrap().as_str(),
            "https://example.com/site/app/main.component"
        );
        assert_eq!(
            fetcher.url_for("./app/main.component").unwrap().as_str(),
            "https://example.com/site/app/main.component"
        );
        assert_eq!(fetcher.url_for("Counter").unwrap().as_str(), "https://example.com/site/Counter");
    }

    #[test]
    fn test_http_rejects_bad_base() {
        assert!(HttpFetcher::new("not a url").is_err());
    }

    #[tokio::test]
    async fn test_memory_fetcher_counts() {
        let fetcher = MemoryFetcher::new().with("/a.js", "export default 1");
        assert_eq!(fetcher.fetch("/a.js", CachePolicy::NoStore).await.unwrap(), "export default 1");
        fetcher.fetch("/a.js", CachePolicy::NoStore).await.unwrap();
        assert!(matches!(
            fetcher.fetch("/b.js", CachePolicy::NoStore).await,
            Err(FetchError::NotFound(_))
        ));
        assert_eq!(fetcher.fetch_count("/a.js"), 2);
        assert_eq!(fetcher.fetch_count("/b.js"), 1);
        assert_eq!(fetcher.total_fetches(), 3);
    }

    #[tokio::test]
    async fn test_fs_fetcher_memoizes_only_with_default_policy() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("util.js");
        std::fs::write(&file, "v1").unwrap();
        let fetcher = FsFetcher::new(dir.path());

        assert_eq!(fetcher.fetch("/util.js", CachePolicy::Default).await.unwrap(), "v1");
        std::fs::write(&file, "v2").unwrap();
        assert_eq!(fetcher.fetch("/util.js", CachePolicy::Default).await.unwrap(), "v1");
        assert_eq!(fetcher.fetch("./util.js", CachePolicy::NoStore).await.unwrap(), "v2");
    }

    #[tokio::test]
    async fn test_fs_fetcher_errors() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FsFetcher::new(dir.path());
        assert!(matches!(
            fetcher.fetch("/missing.js", CachePolicy::NoStore).await,
            Err(FetchError::NotFound(_))
        ));
        assert!(matches!(
            fetcher.fetch("../etc/passwd", CachePolicy::NoStore).await,
            Err(FetchError::InvalidPath(_))
        ));
    }
}
