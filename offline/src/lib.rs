//! Offline asset cache for the Hopscotch demo assets.
//!
//! The demo's static assets (page shell, styles, icons, background music) live
//! on an HTTP origin. This crate keeps a versioned copy of them on disk so the
//! app keeps working without a network connection.
//!
//! # Lifecycle
//!
//! 1. **Install** - every manifest entry is fetched and stored under the
//!    current cache version. Any failed fetch aborts the install and nothing
//!    is written.
//! 2. **Activate** - caches from other versions are deleted.
//! 3. **Handle** - requests are answered cache-first (GET only), falling back
//!    to the network and then to the cached page shell.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`types`] | Requests, responses, settings, errors |
//! | [`store`] | Named on-disk caches with atomic entry writes |
//! | [`worker`] | Install / activate / handle |

mod store;
mod types;
mod worker;

pub use store::{Cache, CacheStorage};
pub use types::{
    AssetRequest, AssetResponse, DEFAULT_ASSETS, DEFAULT_CACHE_VERSION, DEFAULT_MUSIC_ASSET,
    DEFAULT_SHELL, OfflineError, OfflineSettings, ResponseKind,
};
pub use worker::OfflineWorker;
