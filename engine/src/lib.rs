//! Core engine for Hopscotch - run controller and session state.
//!
//! This crate contains the App session without TUI dependencies. The TUI reads
//! [`Presentation`] every frame and forwards key presses to the `App` methods.

use std::path::PathBuf;

use tokio::sync::oneshot;
use tracing::{info, warn};

pub use hopscotch_config::{self as config, ConfigError, HopscotchConfig};
pub use hopscotch_offline::OfflineError;
pub use hopscotch_types::{
    CellValue, GRID_COLUMNS, GRID_LIMIT, GRID_ROWS, HopDuration, Hsla, MAX_TABLE, RunPalette,
    RunToken, TableBase, TableStep, UiOptions, Volume,
};

mod audio;
mod init;
mod narration;
mod palette;
mod run;
pub mod ui;

pub use audio::{AudioError, CommandPlayer, MusicPlayer, PlayerProgram, SilentPlayer};
pub use narration::{
    CommandNarrator, NarrationError, Narrator, SilentNarrator, SpeechProgram, Utterance,
};
pub use palette::PaletteCache;
pub use run::{HopSetting, LiveToken, RunController, RunEvent, RunPhase};
pub use ui::{Board, Cell, Hop, Marker, Presentation, Stage};

type TrackReceiver = oneshot::Receiver<Result<PathBuf, OfflineError>>;

/// One interactive session: the selection, the pacing and volume controls,
/// and the run controller they feed.
pub struct App {
    run: RunController<Presentation>,
    selection: TableBase,
    hop: HopDuration,
    volume: Volume,
    ui_options: UiOptions,
    /// Background music track still being resolved through the offline cache.
    pending_track: Option<TrackReceiver>,
    status: Option<String>,
}

impl App {
    #[must_use]
    pub fn presentation(&self) -> &Presentation {
        self.run.stage()
    }

    #[must_use]
    pub fn selection(&self) -> TableBase {
        self.selection
    }

    #[must_use]
    pub fn hop(&self) -> HopDuration {
        self.hop
    }

    #[must_use]
    pub fn volume(&self) -> Volume {
        self.volume
    }

    #[must_use]
    pub fn speed_label(&self) -> String {
        self.hop.label()
    }

    #[must_use]
    pub fn volume_label(&self) -> String {
        self.volume.label()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run.is_running()
    }

    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.run.phase()
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        self.ui_options
    }

    #[must_use]
    pub fn status_message(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Selecting a table never starts or interrupts a run.
    pub fn select_table(&mut self, base: TableBase) {
        self.selection = base;
    }

    pub fn select_next_table(&mut self) {
        self.select_table(self.selection.next());
    }

    pub fn select_prev_table(&mut self) {
        self.select_table(self.selection.prev());
    }

    pub fn set_hop(&mut self, hop: HopDuration) {
        self.hop = hop;
        self.run.set_hop(hop);
    }

    pub fn faster(&mut self) {
        self.set_hop(self.hop.faster());
    }

    pub fn slower(&mut self) {
        self.set_hop(self.hop.slower());
    }

    pub fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
        self.run.set_volume(volume);
    }

    pub fn volume_up(&mut self) {
        self.set_volume(self.volume.louder());
    }

    pub fn volume_down(&mut self) {
        self.set_volume(self.volume.quieter());
    }

    /// Play the selected table from the start.
    pub fn start(&mut self) -> RunToken {
        self.status = None;
        self.run.start(self.selection)
    }

    pub fn stop(&mut self) {
        self.run.stop();
    }

    pub fn handle_resize(&mut self) {
        self.run.relayout();
    }

    /// Advance one frame: apply sequencer progress and pick up the music track.
    pub fn tick(&mut self) {
        self.poll_pending_track();
        self.run.poll();
    }

    pub fn shutdown(&mut self) {
        self.pending_track = None;
        self.run.shutdown();
        info!("Session closed");
    }

    fn poll_pending_track(&mut self) {
        let Some(receiver) = self.pending_track.as_mut() else {
            return;
        };
        match receiver.try_recv() {
            Ok(Ok(track)) => {
                self.pending_track = None;
                self.run.set_track(track);
            }
            Ok(Err(err)) => {
                self.pending_track = None;
                warn!("Background music unavailable: {err}");
                self.status = Some("Background music unavailable offline".to_string());
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                self.pending_track = None;
            }
        }
    }
}

#[cfg(test)]
mod tests;
