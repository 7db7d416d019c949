//! The run controller: plays one multiplication table at a time.
//!
//! A run is walked by a spawned sequencer task that only sleeps and reports
//! steps. Every visible effect happens in [`RunController::poll`] on the
//! caller's side, after checking that the step's token is still the live one.
//! Starting or stopping advances the live token, which leaves any older
//! sequencer inert without having to abort it.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};
use tracing::{debug, error, info, warn};

use hopscotch_types::{HopDuration, LEAD_IN, RunToken, TableBase, TableStep, Volume};

use crate::audio::MusicPlayer;
use crate::narration::{Narrator, Utterance};
use crate::palette::PaletteCache;
use crate::ui::Stage;

/// The authoritative run token, shared with sequencer tasks.
#[derive(Debug, Clone, Default)]
pub struct LiveToken(Arc<AtomicU64>);

impl LiveToken {
    #[must_use]
    pub fn current(&self) -> RunToken {
        RunToken::new(self.0.load(Ordering::SeqCst))
    }

    /// Mint a new live token, invalidating every older one.
    pub fn advance(&self) -> RunToken {
        let previous = self.0.fetch_add(1, Ordering::SeqCst);
        RunToken::new(previous).next()
    }

    #[must_use]
    pub fn is_current(&self, token: RunToken) -> bool {
        self.current() == token
    }
}

/// Hop duration read by the sequencer before every dwell.
#[derive(Debug, Clone)]
pub struct HopSetting(Arc<AtomicU32>);

impl HopSetting {
    #[must_use]
    pub fn new(hop: HopDuration) -> Self {
        Self(Arc::new(AtomicU32::new(hop.as_millis())))
    }

    #[must_use]
    pub fn get(&self) -> HopDuration {
        HopDuration::from_millis(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, hop: HopDuration) {
        self.0.store(hop.as_millis(), Ordering::Relaxed);
    }
}

impl Default for HopSetting {
    fn default() -> Self {
        Self::new(HopDuration::default())
    }
}

/// Reported by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    Step { token: RunToken, step: TableStep },
    Finished { token: RunToken },
}

/// Externally observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running { token: RunToken, base: TableBase },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cleanup {
    Completed,
    Aborted,
}

struct ActiveRun {
    token: RunToken,
    base: TableBase,
    events: UnboundedReceiver<RunEvent>,
}

enum RunState {
    Idle,
    Running(ActiveRun),
}

/// Drives runs against a [`Stage`] and the speech and music services.
pub struct RunController<S: Stage> {
    stage: S,
    narrator: Box<dyn Narrator>,
    music: Box<dyn MusicPlayer>,
    palettes: PaletteCache,
    live: LiveToken,
    hop: HopSetting,
    volume: Volume,
    state: RunState,
}

impl<S: Stage> RunController<S> {
    pub fn new(
        stage: S,
        narrator: Box<dyn Narrator>,
        music: Box<dyn MusicPlayer>,
        hop: HopDuration,
        volume: Volume,
    ) -> Self {
        let mut controller = Self {
            stage,
            narrator,
            music,
            palettes: PaletteCache::new(),
            live: LiveToken::default(),
            hop: HopSetting::new(hop),
            volume,
            state: RunState::Idle,
        };
        controller.stage.set_running(false);
        controller.music.set_gain(volume.music_gain());
        controller
    }

    #[must_use]
    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut S {
        &mut self.stage
    }

    #[must_use]
    pub fn phase(&self) -> RunPhase {
        match &self.state {
            RunState::Idle => RunPhase::Idle,
            RunState::Running(run) => RunPhase::Running {
                token: run.token,
                base: run.base,
            },
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running(_))
    }

    #[must_use]
    pub fn live_token(&self) -> RunToken {
        self.live.current()
    }

    #[must_use]
    pub fn hop(&self) -> HopDuration {
        self.hop.get()
    }

    #[must_use]
    pub fn volume(&self) -> Volume {
        self.volume
    }

    #[must_use]
    pub fn palettes(&self) -> &PaletteCache {
        &self.palettes
    }

    /// Start a run of `base`, superseding whatever was running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, base: TableBase) -> RunToken {
        self.stage.clear_visited();
        self.stage.hide_marker();
        let palette = self.palettes.palette_for(base);
        self.stage.apply_palette(&palette);
        if let Err(err) = self.music.start(self.volume.music_gain()) {
            warn!("Background music did not start: {err}");
        }

        let token = self.live.advance();
        self.stage.set_running(true);
        self.narrator.cancel();

        self.stage.clear_active();
        self.stage.clear_product();
        self.stage.hide_marker();

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(sequence(base, token, self.live.clone(), self.hop.clone(), tx));
        self.state = RunState::Running(ActiveRun {
            token,
            base,
            events: rx,
        });
        info!(%base, %token, "Run started");
        token
    }

    /// Start from raw selection text; anything that is not a valid table is ignored.
    pub fn start_selection(&mut self, selection: &str) -> Option<RunToken> {
        match selection.parse::<TableBase>() {
            Ok(base) => Some(self.start(base)),
            Err(err) => {
                debug!("Ignoring start request: {err}");
                None
            }
        }
    }

    /// Abandon the current run, if any. Harmless when idle.
    pub fn stop(&mut self) {
        let token = self.live.advance();
        if matches!(self.state, RunState::Running(_)) {
            info!(%token, "Run stopped");
        }
        self.state = RunState::Idle;
        self.cleanup(Cleanup::Aborted);
    }

    pub fn set_hop(&mut self, hop: HopDuration) {
        self.hop.set(hop);
        if self.stage.active_cell().is_some() {
            self.stage.settle_marker();
        }
    }

    pub fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
        self.music.set_gain(volume.music_gain());
    }

    pub fn set_track(&mut self, track: PathBuf) {
        info!(track = %track.display(), "Background music track ready");
        self.music.set_track(track);
    }

    /// Settle the marker on the active cell after the layout changed.
    pub fn relayout(&mut self) {
        if self.stage.active_cell().is_some() {
            self.stage.settle_marker();
        }
    }

    /// Apply whatever the sequencer reported since the last poll.
    pub fn poll(&mut self) {
        let RunState::Running(run) = &mut self.state else {
            return;
        };

        let mut events = Vec::new();
        let disconnected = loop {
            match run.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break false,
                Err(TryRecvError::Disconnected) => break true,
            }
        };
        let (token, base) = (run.token, run.base);

        for event in events {
            match event {
                RunEvent::Step { token: step_token, step } => {
                    if step_token != token || !self.live.is_current(step_token) {
                        debug!(%step_token, "Discarding step from stale run");
                        continue;
                    }
                    self.apply_step(base, step);
                }
                RunEvent::Finished { token: done } => {
                    if done == token && self.live.is_current(done) {
                        self.state = RunState::Idle;
                        self.cleanup(Cleanup::Completed);
                        info!(%base, %token, "Run finished");
                        return;
                    }
                }
            }
        }

        if disconnected && self.live.is_current(token) {
            error!(%base, %token, "Run sequencer ended unexpectedly");
            self.live.advance();
            self.state = RunState::Idle;
            self.cleanup(Cleanup::Aborted);
        }
    }

    /// Stop everything before exit.
    pub fn shutdown(&mut self) {
        self.stop();
    }

    fn apply_step(&mut self, base: TableBase, step: TableStep) {
        let Some(cell) = step.cell() else {
            debug!(product = step.product, "Step has no cell; skipping");
            return;
        };
        if !self.stage.highlight(cell) {
            debug!(product = step.product, "Cell missing from board; skipping");
            return;
        }

        let hop = self.hop.get();
        self.stage.show_product(&step.equation(base));
        self.stage.move_marker(cell, hop.as_duration());

        if self.narrator.is_available() {
            let utterance = Utterance::for_step(base, step, hop, self.volume);
            if let Err(err) = self.narrator.speak(&utterance) {
                warn!("Narration failed: {err}");
            }
        }
    }

    fn cleanup(&mut self, kind: Cleanup) {
        self.stage.set_running(false);
        self.music.stop();
        self.stage.clear_active();
        self.stage.hide_marker();
        if kind == Cleanup::Aborted {
            self.stage.clear_product();
            self.narrator.cancel();
        }
    }
}

impl<S: Stage> Drop for RunController<S> {
    fn drop(&mut self) {
        // Leaves any sequencer still sleeping inert.
        self.live.advance();
    }
}

async fn sequence(
    base: TableBase,
    token: RunToken,
    live: LiveToken,
    hop: HopSetting,
    events: UnboundedSender<RunEvent>,
) {
    let steps = base.steps();
    tokio::time::sleep(LEAD_IN).await;

    for step in steps {
        if !live.is_current(token) {
            debug!(%token, "Run superseded");
            return;
        }
        if events.send(RunEvent::Step { token, step }).is_err() {
            return;
        }
        tokio::time::sleep(hop.get().dwell()).await;
    }

    if live.is_current(token) {
        let _ = events.send(RunEvent::Finished { token });
    }
}

#[cfg(test)]
impl<S: Stage> RunController<S> {
    /// Swap the current run's event stream, simulating a sequencer that died.
    pub(crate) fn replace_events(&mut self, events: UnboundedReceiver<RunEvent>) {
        if let RunState::Running(run) = &mut self.state {
            run.events = events;
        }
    }
}
