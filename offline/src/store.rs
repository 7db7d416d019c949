//! Named on-disk caches.
//!
//! Layout: `{root}/{cache_name}/{first2}/{sha256(url)}.json` holds the entry
//! metadata and a sibling `.body` file holds the raw bytes. Both are written
//! with temp + rename so a crash never leaves a half-written entry visible.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use url::Url;

use crate::types::{AssetResponse, OfflineError, ResponseKind};

/// Current entry format version.
const ENTRY_FORMAT: u32 = 1;

/// Entry metadata stored on disk.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct EntryMeta {
    format: u32,
    /// Request URL (fragment stripped) the entry answers.
    request_url: String,
    /// Final URL after redirects.
    response_url: String,
    status: u16,
    kind: ResponseKind,
    content_type: Option<String>,
    /// RFC3339, second precision.
    stored_at: String,
}

/// All named caches under one root directory.
#[derive(Debug, Clone)]
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Open (creating if needed) the cache called `name`.
    pub fn open(&self, name: &str) -> Result<Cache, OfflineError> {
        validate_name(name)?;
        let dir = self.root.join(name);
        fs::create_dir_all(&dir).map_err(|source| OfflineError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Cache {
            name: name.to_string(),
            dir,
        })
    }

    /// Names of every existing cache, sorted.
    pub fn keys(&self) -> Result<Vec<String>, OfflineError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(OfflineError::Io {
                    path: self.root.clone(),
                    source,
                });
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| validate_name(name).is_ok())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Delete the cache called `name`. Returns whether it existed.
    pub fn delete(&self, name: &str) -> Result<bool, OfflineError> {
        validate_name(name)?;
        let dir = self.root.join(name);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(OfflineError::Io { path: dir, source }),
        }
    }

    /// Look `url` up in every cache, in name order.
    #[must_use]
    pub fn match_any(&self, url: &Url) -> Option<AssetResponse> {
        self.keys()
            .ok()?
            .iter()
            .filter_map(|name| self.open(name).ok())
            .find_map(|cache| cache.match_url(url))
    }

    /// On-disk body of the first cache holding `url`.
    #[must_use]
    pub fn body_path_any(&self, url: &Url) -> Option<PathBuf> {
        self.keys()
            .ok()?
            .iter()
            .filter_map(|name| self.open(name).ok())
            .find_map(|cache| cache.body_path(url))
    }
}

/// One named cache.
#[derive(Debug, Clone)]
pub struct Cache {
    name: String,
    dir: PathBuf,
}

impl Cache {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cached response for `url`.
    ///
    /// Unreadable or corrupt entries are treated as a miss.
    #[must_use]
    pub fn match_url(&self, url: &Url) -> Option<AssetResponse> {
        let (meta_path, body_path) = self.entry_paths(url);
        let meta = match read_meta(&meta_path) {
            Ok(Some(meta)) => meta,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!("Dropping unreadable cache entry: {err}");
                self.delete(url);
                return None;
            }
        };
        if meta.format != ENTRY_FORMAT {
            tracing::debug!(path = %meta_path.display(), "Dropping cache entry with old format");
            self.delete(url);
            return None;
        }

        let body = fs::read(&body_path).ok()?;
        let response_url = Url::parse(&meta.response_url).unwrap_or_else(|_| url.clone());
        Some(AssetResponse {
            url: response_url,
            status: meta.status,
            kind: meta.kind,
            content_type: meta.content_type,
            body,
        })
    }

    /// On-disk body file for `url`, if cached.
    #[must_use]
    pub fn body_path(&self, url: &Url) -> Option<PathBuf> {
        let (meta_path, body_path) = self.entry_paths(url);
        (meta_path.is_file() && body_path.is_file()).then_some(body_path)
    }

    /// Store `response` as the answer for `url`, replacing any previous entry.
    pub fn put(&self, url: &Url, response: &AssetResponse) -> Result<(), OfflineError> {
        let (meta_path, body_path) = self.entry_paths(url);
        let parent = meta_path
            .parent()
            .map_or_else(|| self.dir.clone(), Path::to_path_buf);
        fs::create_dir_all(&parent).map_err(|source| OfflineError::Io {
            path: parent.clone(),
            source,
        })?;

        let meta = EntryMeta {
            format: ENTRY_FORMAT,
            request_url: normalize(url).to_string(),
            response_url: response.url.to_string(),
            status: response.status,
            kind: response.kind,
            content_type: response.content_type.clone(),
            stored_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        };
        let meta_json = serde_json::to_vec_pretty(&meta).map_err(|source| OfflineError::Corrupt {
            path: meta_path.clone(),
            source,
        })?;

        // Body first: a metadata file is only ever visible next to a complete body.
        write_atomic(&body_path, &response.body)?;
        write_atomic(&meta_path, &meta_json)?;
        Ok(())
    }

    /// Remove the entry for `url`. Returns whether it existed.
    pub fn delete(&self, url: &Url) -> bool {
        let (meta_path, body_path) = self.entry_paths(url);
        let existed = fs::remove_file(&meta_path).is_ok();
        let _ = fs::remove_file(&body_path);
        existed
    }

    /// Request URLs of every entry in this cache.
    #[must_use]
    pub fn urls(&self) -> Vec<Url> {
        let Ok(shards) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut urls: Vec<Url> = shards
            .filter_map(Result::ok)
            .filter_map(|shard| fs::read_dir(shard.path()).ok())
            .flatten()
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| read_meta(&path).ok().flatten())
            .filter_map(|meta| Url::parse(&meta.request_url).ok())
            .collect();
        urls.sort();
        urls
    }

    fn entry_paths(&self, url: &Url) -> (PathBuf, PathBuf) {
        let key = cache_key(url);
        let shard = self.dir.join(&key[..2]);
        (
            shard.join(format!("{key}.json")),
            shard.join(format!("{key}.body")),
        )
    }
}

/// Cache names double as directory names.
fn validate_name(name: &str) -> Result<(), OfflineError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(OfflineError::InvalidCacheName(name.to_string()))
    }
}

/// Entries are keyed without the fragment.
fn normalize(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

fn cache_key(url: &Url) -> String {
    let digest = Sha256::digest(normalize(url).as_str().as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn read_meta(path: &Path) -> Result<Option<EntryMeta>, OfflineError> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(OfflineError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_slice(&content)
        .map(Some)
        .map_err(|source| OfflineError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), OfflineError> {
    let io_err = |source| OfflineError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}
