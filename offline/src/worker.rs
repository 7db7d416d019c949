//! Install, activate, and request handling.

use futures_util::future::try_join_all;
use reqwest::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use reqwest::{Client, Method};
use tracing::{debug, info, warn};
use url::Url;

use crate::store::{Cache, CacheStorage};
use crate::types::{AssetRequest, AssetResponse, OfflineError, OfflineSettings, ResponseKind};

/// Offline cache worker for one origin.
#[derive(Debug, Clone)]
pub struct OfflineWorker {
    settings: OfflineSettings,
    storage: CacheStorage,
    client: Client,
}

impl OfflineWorker {
    #[must_use]
    pub fn new(settings: OfflineSettings) -> Self {
        Self::with_client(settings, Client::new())
    }

    #[must_use]
    pub fn with_client(settings: OfflineSettings, client: Client) -> Self {
        let storage = CacheStorage::new(settings.dir.clone());
        Self {
            settings,
            storage,
            client,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &OfflineSettings {
        &self.settings
    }

    #[must_use]
    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// The cache for the configured version.
    pub fn current_cache(&self) -> Result<Cache, OfflineError> {
        self.storage.open(&self.settings.version)
    }

    /// Pre-fetch the whole manifest into the current cache.
    ///
    /// All assets are fetched before anything is written; one failure leaves
    /// the cache untouched.
    pub async fn install(&self) -> Result<usize, OfflineError> {
        let urls = self
            .settings
            .assets
            .iter()
            .map(|asset| self.settings.resolve(asset))
            .collect::<Result<Vec<_>, _>>()?;

        let responses = try_join_all(urls.iter().map(|url| async move {
            let response = self.fetch(&AssetRequest::get(url.clone())).await?;
            if (200..300).contains(&response.status) {
                Ok::<_, OfflineError>((url, response))
            } else {
                Err(OfflineError::Install {
                    url: url.clone(),
                    status: response.status,
                })
            }
        }))
        .await?;

        let cache = self.current_cache()?;
        for (url, response) in &responses {
            cache.put(url, response)?;
        }

        info!(
            version = %self.settings.version,
            assets = responses.len(),
            "Offline cache installed"
        );
        Ok(responses.len())
    }

    /// Whether the current cache already holds every manifest asset.
    pub fn is_installed(&self) -> Result<bool, OfflineError> {
        let cache = self.current_cache()?;
        for asset in &self.settings.assets {
            let url = self.settings.resolve(asset)?;
            if cache.body_path(&url).is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Install unless this version is already complete on disk.
    ///
    /// Returns the number of assets fetched, or `None` when nothing was needed.
    pub async fn install_if_needed(&self) -> Result<Option<usize>, OfflineError> {
        if self.is_installed()? {
            debug!(version = %self.settings.version, "Offline cache already installed");
            return Ok(None);
        }
        self.install().await.map(Some)
    }

    /// Delete caches left behind by other versions. Returns the deleted names.
    pub fn activate(&self) -> Result<Vec<String>, OfflineError> {
        let mut deleted = Vec::new();
        for name in self.storage.keys()? {
            if name != self.settings.version && self.storage.delete(&name)? {
                deleted.push(name);
            }
        }
        info!(
            version = %self.settings.version,
            removed = ?deleted,
            "Offline cache activated"
        );
        Ok(deleted)
    }

    /// Answer one request.
    ///
    /// Non-GET requests go straight to the network. GET is cache-first; a miss
    /// goes to the network and a cacheable answer is stored on the way back.
    /// When the network fails, the cached page shell is served instead.
    pub async fn handle(&self, request: AssetRequest) -> Result<AssetResponse, OfflineError> {
        if request.method != Method::GET {
            return self.fetch(&request).await;
        }

        if let Some(cached) = self.storage.match_any(&request.url) {
            debug!(url = %request.url, "Offline cache hit");
            return Ok(cached);
        }

        match self.fetch(&request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    let stored = self
                        .current_cache()
                        .and_then(|cache| cache.put(&request.url, &response));
                    if let Err(err) = stored {
                        warn!(url = %request.url, "Failed to cache response: {err}");
                    }
                }
                Ok(response)
            }
            Err(err) => {
                debug!(url = %request.url, "Network failed, trying shell: {err}");
                let shell = self.settings.resolve(&self.settings.shell)?;
                self.storage
                    .match_any(&shell)
                    .ok_or(OfflineError::Unavailable { url: request.url })
            }
        }
    }

    /// Resolve `asset` against the origin and handle it as a GET.
    pub async fn get(&self, asset: &str) -> Result<AssetResponse, OfflineError> {
        let url = self.settings.resolve(asset)?;
        self.handle(AssetRequest::get(url)).await
    }

    /// Local file holding the cached body of `asset`, fetching it if needed.
    pub async fn local_path(&self, asset: &str) -> Result<std::path::PathBuf, OfflineError> {
        let url = self.settings.resolve(asset)?;
        if let Some(path) = self.storage.body_path_any(&url) {
            return Ok(path);
        }
        let response = self.handle(AssetRequest::get(url.clone())).await?;
        if !response.is_cacheable() {
            return Err(OfflineError::Install {
                url,
                status: response.status,
            });
        }
        self.storage
            .body_path_any(&url)
            .ok_or(OfflineError::Unavailable { url })
    }

    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, OfflineError> {
        let network_err = |source| OfflineError::Network {
            url: request.url.clone(),
            source,
        };

        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(network_err)?;
        let url = response.url().clone();
        let status = response.status().as_u16();
        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let kind = self.classify(&url, headers.contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
        let body = response.bytes().await.map_err(network_err)?.to_vec();

        Ok(AssetResponse {
            url,
            status,
            kind,
            content_type,
            body,
        })
    }

    fn classify(&self, url: &Url, allows_cors: bool) -> ResponseKind {
        if url.origin() == self.settings.origin.origin() {
            ResponseKind::Basic
        } else if allows_cors {
            ResponseKind::Cors
        } else {
            ResponseKind::Opaque
        }
    }
}
