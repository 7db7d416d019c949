//! Spoken narration of each step.

use std::path::PathBuf;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use hopscotch_types::{HopDuration, TableBase, TableStep, Volume};

const LANG: &str = "en-US";
const QUICK_RATE: f32 = 1.05;
const FULL_RATE: f32 = 0.95;
const PITCH: f32 = 1.05;

/// espeak's default words per minute at rate 1.0.
const ESPEAK_WPM: f32 = 175.0;
/// macOS `say` default words per minute at rate 1.0.
const SAY_WPM: f32 = 180.0;

/// One thing to say.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub lang: &'static str,
    pub rate: f32,
    pub pitch: f32,
    /// `0.0..=1.0`.
    pub volume: f32,
}

impl Utterance {
    /// Narration for one step: just the product when hopping quickly,
    /// otherwise the full sentence.
    #[must_use]
    pub fn for_step(base: TableBase, step: TableStep, hop: HopDuration, volume: Volume) -> Self {
        let quick = hop.is_quick();
        let text = if quick {
            step.product.to_string()
        } else {
            format!("{base} times {} is {}", step.multiplier, step.product)
        };
        Self {
            text,
            lang: LANG,
            rate: if quick { QUICK_RATE } else { FULL_RATE },
            pitch: PITCH,
            volume: volume.level().clamp(0.0, 1.0) as f32,
        }
    }
}

#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("failed to start speech program {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

/// Speech capability.
///
/// The most recent `speak` owns the speech resource; it cancels whatever
/// was speaking before.
pub trait Narrator: Send {
    fn is_available(&self) -> bool;

    fn speak(&mut self, utterance: &Utterance) -> Result<(), NarrationError>;

    fn cancel(&mut self);
}

/// Narrator used when no speech program exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNarrator;

impl Narrator for SilentNarrator {
    fn is_available(&self) -> bool {
        false
    }

    fn speak(&mut self, _utterance: &Utterance) -> Result<(), NarrationError> {
        Ok(())
    }

    fn cancel(&mut self) {}
}

/// A speech program on `PATH`, or a configured one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechProgram {
    EspeakNg(PathBuf),
    Espeak(PathBuf),
    Say(PathBuf),
    /// Receives the text as its only argument.
    Custom(PathBuf),
}

impl SpeechProgram {
    /// First speech program found on `PATH`.
    #[must_use]
    pub fn detect() -> Option<Self> {
        if let Ok(path) = which::which("espeak-ng") {
            return Some(Self::EspeakNg(path));
        }
        if let Ok(path) = which::which("espeak") {
            return Some(Self::Espeak(path));
        }
        which::which("say").ok().map(Self::Say)
    }

    /// Resolve a configured command name or path.
    #[must_use]
    pub fn custom(command: &str) -> Option<Self> {
        match which::which(command) {
            Ok(path) => Some(Self::Custom(path)),
            Err(err) => {
                warn!("Speech command {command} not usable: {err}");
                None
            }
        }
    }

    fn path(&self) -> &PathBuf {
        match self {
            Self::EspeakNg(path) | Self::Espeak(path) | Self::Say(path) | Self::Custom(path) => {
                path
            }
        }
    }

    fn args(&self, utterance: &Utterance) -> Vec<String> {
        match self {
            Self::EspeakNg(_) | Self::Espeak(_) => {
                let speed = (ESPEAK_WPM * utterance.rate).round() as u32;
                let pitch = (50.0 * utterance.pitch).round().clamp(0.0, 99.0) as u32;
                let amplitude = (100.0 * utterance.volume).round() as u32;
                vec![
                    "-v".to_string(),
                    utterance.lang.to_ascii_lowercase(),
                    "-s".to_string(),
                    speed.to_string(),
                    "-p".to_string(),
                    pitch.to_string(),
                    "-a".to_string(),
                    amplitude.to_string(),
                    "--".to_string(),
                    utterance.text.clone(),
                ]
            }
            Self::Say(_) => {
                let wpm = (SAY_WPM * utterance.rate).round() as u32;
                vec![
                    "-r".to_string(),
                    wpm.to_string(),
                    "--".to_string(),
                    utterance.text.clone(),
                ]
            }
            Self::Custom(_) => vec![utterance.text.clone()],
        }
    }
}

/// Narrator backed by an external speech program.
#[derive(Debug)]
pub struct CommandNarrator {
    program: SpeechProgram,
    current: Option<Child>,
}

impl CommandNarrator {
    #[must_use]
    pub fn new(program: SpeechProgram) -> Self {
        Self {
            program,
            current: None,
        }
    }
}

impl Narrator for CommandNarrator {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<(), NarrationError> {
        self.cancel();
        if utterance.volume <= 0.0 {
            return Ok(());
        }

        let path = self.program.path();
        let child = Command::new(path)
            .args(self.program.args(utterance))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| NarrationError::Spawn {
                program: path.display().to_string(),
                source,
            })?;
        self.current = Some(child);
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.current.take()
            && let Err(err) = child.start_kill()
        {
            debug!("Speech process already gone: {err}");
        }
    }
}

impl Drop for CommandNarrator {
    fn drop(&mut self) {
        self.cancel();
    }
}
