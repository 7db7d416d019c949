//! Configuration for Hopscotch, read from `~/.hopscotch/config.toml`.
//!
//! ```toml
//! [app]
//! ascii_only = false
//! high_contrast = false
//! reduced_motion = false
//!
//! [playback]
//! table = 7
//! hop_ms = 1200
//! volume = 60
//!
//! [narration]
//! enabled = true
//! command = "espeak-ng"
//!
//! [audio]
//! enabled = true
//! track = "${HOME}/music/ambient-loop.mp3"
//! player = "ffplay"
//!
//! [offline]
//! origin = "https://example.org/times/"
//! version = "ttx-v3"
//! ```
//!
//! Every section is optional. Values are validated by the engine, which falls
//! back to defaults for anything out of range.

use std::{env, fs, path::PathBuf};

use serde::Deserialize;
use thiserror::Error;

// Default value function for serde (bool::default() is false, so only true needs a fn)
const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HopscotchConfig {
    pub app: Option<AppConfig>,
    pub playback: Option<PlaybackConfig>,
    pub narration: Option<NarrationConfig>,
    pub audio: Option<AudioConfig>,
    pub offline: Option<OfflineConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Use ASCII-only glyphs for the marker and affordances.
    #[serde(default)]
    pub ascii_only: bool,
    /// Enable a high-contrast color palette.
    #[serde(default)]
    pub high_contrast: bool,
    /// Make marker hops land instantly.
    #[serde(default)]
    pub reduced_motion: bool,
}

/// Initial control values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaybackConfig {
    /// Table selected at launch (1-20).
    pub table: Option<i64>,
    /// Hop duration in milliseconds (400-3000).
    pub hop_ms: Option<u32>,
    /// Volume in percent (0-100).
    pub volume: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NarrationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Speech program to run instead of the auto-detected one.
    pub command: Option<String>,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Local background track. Takes precedence over the offline cache.
    pub track: Option<String>,
    /// Player program to run instead of the auto-detected one.
    pub player: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            track: None,
            player: None,
        }
    }
}

/// Offline asset cache in front of the origin that hosts the demo assets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfflineConfig {
    /// Base URL every manifest entry is resolved against.
    pub origin: Option<String>,
    /// Cache name; caches with any other name are deleted on activation.
    pub version: Option<String>,
    /// Asset manifest pre-fetched on install.
    pub assets: Option<Vec<String>>,
    /// Asset served when the network is unreachable.
    pub shell: Option<String>,
    /// Asset used as background music.
    pub music: Option<String>,
    /// Cache root directory. Defaults to `~/.hopscotch/cache`.
    pub dir: Option<String>,
}

/// Expand `${VAR}` references from the environment. Unknown variables become empty.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(open) = rest.find("${") {
        let Some(close_rel) = rest[open + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..open]);
        let var = &rest[open + 2..open + 2 + close_rel];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[open + 2 + close_rel + 1..];
    }

    out.push_str(rest);
    out
}

impl HopscotchConfig {
    /// Load from the default location. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: PathBuf) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read { path, source: err });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse { path, source: err })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }
}

/// `~/.hopscotch`, home of the config file, logs, and the offline cache.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".hopscotch"))
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("config.toml"))
}
