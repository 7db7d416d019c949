//! Background music.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::debug;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to start music player {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

/// Looping background music.
///
/// `gain` is in `0.0..=1.0`, already shaped by [`hopscotch_types::Volume::music_gain`].
pub trait MusicPlayer: Send {
    /// Rewind and loop from the start.
    fn start(&mut self, gain: f64) -> Result<(), AudioError>;

    /// Pause and rewind.
    fn stop(&mut self);

    /// Takes effect immediately, playing or not.
    fn set_gain(&mut self, gain: f64);

    /// The track became available after construction.
    fn set_track(&mut self, _track: PathBuf) {}

    fn is_playing(&self) -> bool;
}

/// Player with nothing to play.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl MusicPlayer for SilentPlayer {
    fn start(&mut self, _gain: f64) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop(&mut self) {}

    fn set_gain(&mut self, _gain: f64) {}

    fn is_playing(&self) -> bool {
        false
    }
}

/// An external looping audio player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerProgram {
    Ffplay(PathBuf),
    Mpv(PathBuf),
}

impl PlayerProgram {
    #[must_use]
    pub fn detect() -> Option<Self> {
        if let Ok(path) = which::which("ffplay") {
            return Some(Self::Ffplay(path));
        }
        which::which("mpv").ok().map(Self::Mpv)
    }

    /// Resolve a configured player by name; only ffplay and mpv are understood.
    #[must_use]
    pub fn named(name: &str) -> Option<Self> {
        let path = which::which(name).ok()?;
        let stem = path.file_stem()?.to_string_lossy().to_ascii_lowercase();
        match stem.as_str() {
            "ffplay" => Some(Self::Ffplay(path)),
            "mpv" => Some(Self::Mpv(path)),
            _ => None,
        }
    }

    fn path(&self) -> &Path {
        match self {
            Self::Ffplay(path) | Self::Mpv(path) => path,
        }
    }

    fn args(&self, track: &Path, gain: f64) -> Vec<String> {
        let volume = (gain.clamp(0.0, 1.0) * 100.0).round() as u32;
        let track = track.display().to_string();
        match self {
            Self::Ffplay(_) => vec![
                "-nodisp".to_string(),
                "-autoexit".to_string(),
                "-loglevel".to_string(),
                "quiet".to_string(),
                "-loop".to_string(),
                "0".to_string(),
                "-volume".to_string(),
                volume.to_string(),
                track,
            ],
            Self::Mpv(_) => vec![
                "--no-video".to_string(),
                "--really-quiet".to_string(),
                "--loop-file=inf".to_string(),
                format!("--volume={volume}"),
                track,
            ],
        }
    }
}

/// Music player driving an external process.
///
/// Restarting the process is the only way to change its volume or rewind,
/// so both do exactly that.
#[derive(Debug)]
pub struct CommandPlayer {
    program: PlayerProgram,
    track: Option<PathBuf>,
    gain: f64,
    playing: bool,
    child: Option<Child>,
}

impl CommandPlayer {
    #[must_use]
    pub fn new(program: PlayerProgram, track: Option<PathBuf>) -> Self {
        Self {
            program,
            track,
            gain: 0.0,
            playing: false,
            child: None,
        }
    }

    #[must_use]
    pub fn gain(&self) -> f64 {
        self.gain
    }

    fn kill(&mut self) {
        if let Some(mut child) = self.child.take()
            && let Err(err) = child.start_kill()
        {
            debug!("Music process already gone: {err}");
        }
    }

    fn spawn(&mut self) -> Result<(), AudioError> {
        self.kill();
        let Some(track) = self.track.as_deref() else {
            debug!("No music track available yet");
            return Ok(());
        };
        if self.gain <= 0.0 {
            return Ok(());
        }

        let path = self.program.path();
        let child = Command::new(path)
            .args(self.program.args(track, self.gain))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AudioError::Spawn {
                program: path.display().to_string(),
                source,
            })?;
        self.child = Some(child);
        Ok(())
    }
}

impl MusicPlayer for CommandPlayer {
    fn start(&mut self, gain: f64) -> Result<(), AudioError> {
        self.gain = gain;
        self.playing = true;
        self.spawn()
    }

    fn stop(&mut self) {
        self.playing = false;
        self.kill();
    }

    fn set_gain(&mut self, gain: f64) {
        if (gain - self.gain).abs() < f64::EPSILON {
            return;
        }
        self.gain = gain;
        if self.playing
            && let Err(err) = self.spawn()
        {
            debug!("Music restart after volume change failed: {err}");
        }
    }

    fn set_track(&mut self, track: PathBuf) {
        self.track = Some(track);
        if self.playing
            && let Err(err) = self.spawn()
        {
            debug!("Music start after track arrived failed: {err}");
        }
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

impl Drop for CommandPlayer {
    fn drop(&mut self) {
        self.kill();
    }
}
