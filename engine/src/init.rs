//! Application initialization for the App.

use std::path::PathBuf;

use tokio::sync::oneshot;
use tracing::{info, warn};
use url::Url;

use hopscotch_config::{
    AudioConfig, HopscotchConfig, NarrationConfig, OfflineConfig, data_dir, expand_env_vars,
};
use hopscotch_offline::{DEFAULT_MUSIC_ASSET, OfflineError, OfflineSettings, OfflineWorker};
use hopscotch_types::{HopDuration, TableBase, UiOptions, Volume};

use crate::audio::{CommandPlayer, MusicPlayer, PlayerProgram, SilentPlayer};
use crate::narration::{CommandNarrator, Narrator, SilentNarrator, SpeechProgram};
use crate::run::RunController;
use crate::ui::Presentation;
use crate::{App, TrackReceiver};

impl App {
    /// Build the session from `~/.hopscotch/config.toml`.
    ///
    /// A broken config file is reported in the status line and otherwise ignored.
    /// Must be called from within a tokio runtime when an offline origin is configured.
    #[must_use]
    pub fn new() -> Self {
        let (config, config_error) = match HopscotchConfig::load() {
            Ok(config) => (config, None),
            Err(err) => (None, Some(err)),
        };

        let mut app = Self::from_config(config.as_ref());
        if let Some(err) = config_error {
            warn!("Ignoring config: {err}");
            app.status = Some(format!("Config ignored: {err}"));
        }
        app
    }

    #[must_use]
    pub fn from_config(config: Option<&HopscotchConfig>) -> Self {
        let app_config = config.and_then(|cfg| cfg.app.as_ref());
        let ui_options = UiOptions {
            ascii_only: app_config.is_some_and(|app| app.ascii_only),
            high_contrast: app_config.is_some_and(|app| app.high_contrast),
            reduced_motion: app_config.is_some_and(|app| app.reduced_motion),
        };

        let playback = config.and_then(|cfg| cfg.playback.as_ref());
        let selection = playback
            .and_then(|p| p.table)
            .map(|table| match TableBase::new(table) {
                Ok(base) => base,
                Err(err) => {
                    warn!("Invalid table in config: {err}");
                    TableBase::default()
                }
            })
            .unwrap_or_default();
        let hop = playback
            .and_then(|p| p.hop_ms)
            .map(HopDuration::from_millis)
            .unwrap_or_default();
        let volume = playback
            .and_then(|p| p.volume)
            .map(Volume::from_percent)
            .unwrap_or_default();

        let narration = config
            .and_then(|cfg| cfg.narration.as_ref())
            .cloned()
            .unwrap_or_default();
        let audio = config
            .and_then(|cfg| cfg.audio.as_ref())
            .cloned()
            .unwrap_or_default();

        let narrator = narrator_from_config(&narration);
        let local_track = audio
            .track
            .as_deref()
            .map(|track| PathBuf::from(expand_env_vars(track)));
        let music = player_from_config(&audio, local_track.clone());

        let mut app = Self::with_services(ui_options, selection, hop, volume, narrator, music);

        if audio.enabled && local_track.is_none() {
            let offline = config
                .and_then(|cfg| cfg.offline.as_ref())
                .cloned()
                .unwrap_or_default();
            app.pending_track = spawn_offline_bootstrap(&offline);
        }
        app
    }

    /// Session with explicit services and no offline bootstrap.
    #[must_use]
    pub fn with_services(
        ui_options: UiOptions,
        selection: TableBase,
        hop: HopDuration,
        volume: Volume,
        narrator: Box<dyn Narrator>,
        music: Box<dyn MusicPlayer>,
    ) -> Self {
        let stage = Presentation::new(ui_options.reduced_motion);
        let run = RunController::new(stage, narrator, music, hop, volume);
        Self {
            run,
            selection,
            hop,
            volume,
            ui_options,
            pending_track: None,
            status: None,
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::with_services(
            UiOptions::default(),
            TableBase::default(),
            HopDuration::default(),
            Volume::default(),
            Box::new(SilentNarrator),
            Box::new(SilentPlayer),
        )
    }
}

fn narrator_from_config(config: &NarrationConfig) -> Box<dyn Narrator> {
    if !config.enabled {
        info!("Narration disabled");
        return Box::new(SilentNarrator);
    }
    let program = match config.command.as_deref() {
        Some(command) => SpeechProgram::custom(&expand_env_vars(command)),
        None => SpeechProgram::detect(),
    };
    match program {
        Some(program) => {
            info!(?program, "Narration enabled");
            Box::new(CommandNarrator::new(program))
        }
        None => {
            info!("No speech program found; narration skipped");
            Box::new(SilentNarrator)
        }
    }
}

fn player_from_config(config: &AudioConfig, track: Option<PathBuf>) -> Box<dyn MusicPlayer> {
    if !config.enabled {
        info!("Background music disabled");
        return Box::new(SilentPlayer);
    }
    let program = match config.player.as_deref() {
        Some(name) => {
            let program = PlayerProgram::named(name);
            if program.is_none() {
                warn!("Unsupported music player {name}");
            }
            program
        }
        None => PlayerProgram::detect(),
    };
    match program {
        Some(program) => Box::new(CommandPlayer::new(program, track)),
        None => {
            info!("No music player found; background music skipped");
            Box::new(SilentPlayer)
        }
    }
}

fn offline_settings(config: &OfflineConfig) -> Option<OfflineSettings> {
    let origin = expand_env_vars(config.origin.as_deref()?);
    let origin = match Url::parse(origin.trim()) {
        Ok(url) => url,
        Err(err) => {
            warn!("Invalid offline origin {origin}: {err}");
            return None;
        }
    };
    let dir = match config.dir.as_deref() {
        Some(dir) => PathBuf::from(expand_env_vars(dir)),
        None => data_dir()?.join("cache"),
    };

    let mut settings = OfflineSettings::new(origin, dir);
    if let Some(version) = config.version.as_deref() {
        settings = settings.with_version(version);
    }
    if let Some(assets) = config.assets.clone() {
        settings = settings.with_assets(assets);
    }
    if let Some(shell) = config.shell.as_deref() {
        settings = settings.with_shell(shell);
    }
    Some(settings)
}

fn spawn_offline_bootstrap(config: &OfflineConfig) -> Option<TrackReceiver> {
    let settings = offline_settings(config)?;
    let music = config
        .music
        .clone()
        .unwrap_or_else(|| DEFAULT_MUSIC_ASSET.to_string());

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let worker = OfflineWorker::new(settings);
        let _ = tx.send(bootstrap(&worker, &music).await);
    });
    Some(rx)
}

async fn bootstrap(worker: &OfflineWorker, music: &str) -> Result<PathBuf, OfflineError> {
    match worker.install_if_needed().await {
        Ok(Some(count)) => {
            info!(count, version = %worker.settings().version, "Offline cache installed");
        }
        Ok(None) => {}
        Err(err) => warn!("Offline cache install failed: {err}"),
    }
    if let Err(err) = worker.activate() {
        warn!("Offline cache activation failed: {err}");
    }
    worker.local_path(music).await
}
