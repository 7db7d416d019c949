//! Request/response types, resolved settings, and errors.

use std::path::PathBuf;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Cache name used when none is configured.
pub const DEFAULT_CACHE_VERSION: &str = "ttx-v3";
/// Page shell served when the network is unreachable.
pub const DEFAULT_SHELL: &str = "./index.html";
/// Background music track within the manifest.
pub const DEFAULT_MUSIC_ASSET: &str = "./audio/ambient-loop.mp3";
/// Assets pre-fetched on install.
pub const DEFAULT_ASSETS: &[&str] = &[
    "./",
    "./index.html",
    "./style.css",
    "./main.js",
    "./manifest.webmanifest",
    "./audio/ambient-loop.mp3",
    "./icons/icon-32.png",
    "./icons/icon-192.png",
    "./icons/icon-512.png",
];

#[derive(Debug, Error)]
pub enum OfflineError {
    #[error("invalid asset url {input:?}: {source}")]
    InvalidUrl {
        input: String,
        source: url::ParseError,
    },
    #[error("invalid cache name {0:?}")]
    InvalidCacheName(String),
    #[error("network request for {url} failed: {source}")]
    Network { url: Url, source: reqwest::Error },
    #[error("install failed: {url} answered {status}")]
    Install { url: Url, status: u16 },
    #[error("{url} is not cached and the network is unreachable")]
    Unavailable { url: Url },
    #[error("cache io at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt cache entry at {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// How the page is allowed to see a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Same-origin response.
    Basic,
    /// Cross-origin response that opted in with `Access-Control-Allow-Origin`.
    Cors,
    /// Cross-origin response without CORS headers. Never cached.
    Opaque,
}

/// A request issued by the app for one asset.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<Vec<u8>>,
}

impl AssetRequest {
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            body: None,
        }
    }

    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            body: None,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// A response as handed back to the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    /// Final URL after redirects.
    pub url: Url,
    pub status: u16,
    pub kind: ResponseKind,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl AssetResponse {
    /// Whether this response may be written to the cache.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.kind != ResponseKind::Opaque
    }
}

/// Resolved worker settings.
#[derive(Debug, Clone)]
pub struct OfflineSettings {
    pub origin: Url,
    pub version: String,
    pub assets: Vec<String>,
    pub shell: String,
    pub dir: PathBuf,
}

impl OfflineSettings {
    /// Settings with the default manifest, version, and shell.
    ///
    /// A trailing slash is added to the origin path so relative assets resolve
    /// beneath it rather than beside it.
    #[must_use]
    pub fn new(mut origin: Url, dir: PathBuf) -> Self {
        if !origin.path().ends_with('/') {
            let path = format!("{}/", origin.path());
            origin.set_path(&path);
        }
        Self {
            origin,
            version: DEFAULT_CACHE_VERSION.to_string(),
            assets: DEFAULT_ASSETS.iter().map(ToString::to_string).collect(),
            shell: DEFAULT_SHELL.to_string(),
            dir,
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_assets(mut self, assets: Vec<String>) -> Self {
        self.assets = assets;
        self
    }

    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Resolve a manifest-relative path against the origin.
    pub fn resolve(&self, asset: &str) -> Result<Url, OfflineError> {
        self.origin
            .join(asset)
            .map_err(|source| OfflineError::InvalidUrl {
                input: asset.to_string(),
                source,
            })
    }
}
