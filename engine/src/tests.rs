//! Unit tests for the engine crate.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::*;

const FRAME: Duration = Duration::from_millis(10);
/// Poll granularity plus scheduling slack.
const TOLERANCE: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Highlight(u16),
    ClearActive,
    ClearVisited,
    MoveMarker(u16, Duration),
    SettleMarker,
    HideMarker,
    ShowProduct(String),
    ClearProduct,
    ApplyPalette(u16),
    SetRunning(bool),
}

#[derive(Debug, Default)]
struct RecordingStage {
    calls: Vec<(Instant, Call)>,
    active: Option<CellValue>,
    running: bool,
    product: Option<String>,
    /// Cells this stage pretends not to have.
    missing: Vec<u16>,
}

impl RecordingStage {
    fn record(&mut self, call: Call) {
        self.calls.push((Instant::now(), call));
    }

    fn products(&self) -> Vec<String> {
        self.product_times().into_iter().map(|(_, p)| p).collect()
    }

    fn product_times(&self) -> Vec<(Instant, String)> {
        self.calls
            .iter()
            .filter_map(|(at, call)| match call {
                Call::ShowProduct(text) => Some((*at, text.clone())),
                _ => None,
            })
            .collect()
    }

    fn palette_hues(&self) -> Vec<u16> {
        self.calls
            .iter()
            .filter_map(|(_, call)| match call {
                Call::ApplyPalette(hue) => Some(*hue),
                _ => None,
            })
            .collect()
    }

    fn count(&self, wanted: &Call) -> usize {
        self.calls.iter().filter(|(_, call)| call == wanted).count()
    }

    fn last_calls(&self, n: usize) -> Vec<Call> {
        let start = self.calls.len().saturating_sub(n);
        self.calls[start..].iter().map(|(_, c)| c.clone()).collect()
    }
}

impl Stage for RecordingStage {
    fn highlight(&mut self, cell: CellValue) -> bool {
        if self.missing.contains(&cell.get()) {
            return false;
        }
        self.active = Some(cell);
        self.record(Call::Highlight(cell.get()));
        true
    }

    fn clear_active(&mut self) {
        self.active = None;
        self.record(Call::ClearActive);
    }

    fn clear_visited(&mut self) {
        self.active = None;
        self.record(Call::ClearVisited);
    }

    fn active_cell(&self) -> Option<CellValue> {
        self.active
    }

    fn move_marker(&mut self, cell: CellValue, duration: Duration) {
        self.record(Call::MoveMarker(cell.get(), duration));
    }

    fn settle_marker(&mut self) {
        self.record(Call::SettleMarker);
    }

    fn hide_marker(&mut self) {
        self.record(Call::HideMarker);
    }

    fn show_product(&mut self, text: &str) {
        self.product = Some(text.to_string());
        self.record(Call::ShowProduct(text.to_string()));
    }

    fn clear_product(&mut self) {
        self.product = None;
        self.record(Call::ClearProduct);
    }

    fn apply_palette(&mut self, palette: &RunPalette) {
        self.record(Call::ApplyPalette(palette.hue));
    }

    fn set_running(&mut self, running: bool) {
        self.running = running;
        self.record(Call::SetRunning(running));
    }
}

#[derive(Debug)]
struct NarratorLog {
    available: bool,
    spoken: Vec<Utterance>,
    cancels: usize,
}

struct RecordingNarrator(Arc<Mutex<NarratorLog>>);

impl Narrator for RecordingNarrator {
    fn is_available(&self) -> bool {
        self.0.lock().unwrap().available
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<(), NarrationError> {
        let mut log = self.0.lock().unwrap();
        log.cancels += 1;
        log.spoken.push(utterance.clone());
        Ok(())
    }

    fn cancel(&mut self) {
        self.0.lock().unwrap().cancels += 1;
    }
}

#[derive(Debug, Default)]
struct PlayerLog {
    fail_start: bool,
    playing: bool,
    starts: Vec<f64>,
    stops: usize,
    gains: Vec<f64>,
}

struct RecordingPlayer(Arc<Mutex<PlayerLog>>);

impl MusicPlayer for RecordingPlayer {
    fn start(&mut self, gain: f64) -> Result<(), AudioError> {
        let mut log = self.0.lock().unwrap();
        log.starts.push(gain);
        if log.fail_start {
            return Err(AudioError::Spawn {
                program: "blocked".to_string(),
                source: std::io::Error::other("autoplay blocked"),
            });
        }
        log.playing = true;
        Ok(())
    }

    fn stop(&mut self) {
        let mut log = self.0.lock().unwrap();
        log.playing = false;
        log.stops += 1;
    }

    fn set_gain(&mut self, gain: f64) {
        self.0.lock().unwrap().gains.push(gain);
    }

    fn is_playing(&self) -> bool {
        self.0.lock().unwrap().playing
    }
}

struct Fixture {
    controller: RunController<RecordingStage>,
    narrator: Arc<Mutex<NarratorLog>>,
    player: Arc<Mutex<PlayerLog>>,
}

impl Fixture {
    fn new(hop_ms: u32) -> Self {
        Self::with_stage(hop_ms, RecordingStage::default(), false)
    }

    fn with_stage(hop_ms: u32, stage: RecordingStage, fail_music: bool) -> Self {
        let narrator = Arc::new(Mutex::new(NarratorLog {
            available: true,
            spoken: Vec::new(),
            cancels: 0,
        }));
        let player = Arc::new(Mutex::new(PlayerLog {
            fail_start: fail_music,
            ..PlayerLog::default()
        }));
        let controller = RunController::new(
            stage,
            Box::new(RecordingNarrator(Arc::clone(&narrator))),
            Box::new(RecordingPlayer(Arc::clone(&player))),
            HopDuration::from_millis(hop_ms),
            Volume::default(),
        );
        Self {
            controller,
            narrator,
            player,
        }
    }

    fn stage(&self) -> &RecordingStage {
        self.controller.stage()
    }

    /// Poll every frame until `done` holds or `limit` of simulated time passes.
    async fn drive_until(
        &mut self,
        limit: Duration,
        mut done: impl FnMut(&RunController<RecordingStage>) -> bool,
    ) {
        let deadline = Instant::now() + limit;
        while Instant::now() < deadline {
            self.controller.poll();
            if done(&self.controller) {
                return;
            }
            tokio::time::sleep(FRAME).await;
        }
        panic!("condition not reached within {limit:?}");
    }

    async fn run_to_completion(&mut self) {
        self.drive_until(Duration::from_secs(120), |c| !c.is_running())
            .await;
    }

    async fn run_until_products(&mut self, n: usize) {
        self.drive_until(Duration::from_secs(60), |c| c.stage().products().len() >= n)
            .await;
    }

    async fn idle_for(&mut self, span: Duration) {
        let deadline = Instant::now() + span;
        while Instant::now() < deadline {
            self.controller.poll();
            tokio::time::sleep(FRAME).await;
        }
    }
}

fn base(n: i64) -> TableBase {
    TableBase::new(n).unwrap()
}

fn assert_close(actual: Duration, expected: Duration) {
    let diff = actual.abs_diff(expected);
    assert!(
        diff <= TOLERANCE,
        "expected about {expected:?}, got {actual:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn run_of_thirteen_visits_each_multiple_in_order() {
    let mut fx = Fixture::new(1200);
    fx.controller.start(base(13));
    fx.run_to_completion().await;

    let expected: Vec<String> = (1..=11)
        .map(|m| format!("13 x {m} = {}", 13 * m))
        .collect();
    assert_eq!(fx.stage().products(), expected);
    assert_eq!(fx.stage().count(&Call::Highlight(143)), 1);
    assert_eq!(fx.stage().count(&Call::Highlight(156)), 0);

    let stage = fx.stage();
    assert!(!stage.running);
    assert_eq!(stage.product.as_deref(), Some("13 x 11 = 143"));
    assert_eq!(stage.active, None);
    assert!(stage.last_calls(5).contains(&Call::HideMarker));
    assert!(!stage.last_calls(5).contains(&Call::ClearProduct));
    assert_eq!(fx.controller.phase(), RunPhase::Idle);

    let player = fx.player.lock().unwrap();
    assert_eq!(player.starts.len(), 1);
    assert!(!player.playing);

    let narrator = fx.narrator.lock().unwrap();
    assert_eq!(narrator.spoken.len(), 11);
}

#[tokio::test(start_paused = true)]
async fn completed_equation_stays_until_next_start_or_stop() {
    let mut fx = Fixture::new(400);
    fx.controller.start(base(7));
    fx.run_to_completion().await;
    assert_eq!(fx.stage().product.as_deref(), Some("7 x 12 = 84"));

    fx.idle_for(Duration::from_secs(5)).await;
    assert_eq!(fx.stage().product.as_deref(), Some("7 x 12 = 84"));

    fx.controller.start(base(2));
    assert_eq!(fx.stage().product, None);

    fx.run_to_completion().await;
    assert_eq!(fx.stage().product.as_deref(), Some("2 x 12 = 24"));
    fx.controller.stop();
    assert_eq!(fx.stage().product, None);
}

#[tokio::test(start_paused = true)]
async fn first_hop_follows_lead_in_and_marker_uses_hop_duration() {
    let mut fx = Fixture::new(1200);
    let started = Instant::now();
    fx.controller.start(base(3));
    fx.run_until_products(1).await;

    let shown_at = fx.stage().product_times()[0].0;
    assert_close(shown_at - started, hopscotch_types::LEAD_IN);
    assert_eq!(
        fx.stage().count(&Call::MoveMarker(3, Duration::from_millis(1200))),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn immediate_restart_shows_only_the_new_table() {
    let mut fx = Fixture::new(400);
    fx.controller.start(base(7));
    fx.controller.start(base(9));
    fx.run_to_completion().await;

    let products = fx.stage().products();
    assert_eq!(products.len(), 12);
    assert!(products.iter().all(|p| p.starts_with("9 x ")));
}

#[tokio::test(start_paused = true)]
async fn restart_mid_run_never_interleaves() {
    let mut fx = Fixture::new(400);
    fx.controller.start(base(7));
    fx.run_until_products(2).await;
    fx.controller.start(base(9));
    fx.run_to_completion().await;

    let products = fx.stage().products();
    let first_nine = products
        .iter()
        .position(|p| p.starts_with("9 x "))
        .unwrap();
    assert_eq!(first_nine, 2);
    assert!(products[first_nine..].iter().all(|p| p.starts_with("9 x ")));
    assert_eq!(products.len(), 2 + 12);
}

#[tokio::test(start_paused = true)]
async fn stop_while_idle_is_harmless() {
    let mut fx = Fixture::new(1200);
    fx.controller.stop();
    fx.controller.stop();

    let stage = fx.stage();
    assert!(!stage.running);
    assert_eq!(stage.product, None);
    assert_eq!(fx.controller.phase(), RunPhase::Idle);
    assert_eq!(fx.player.lock().unwrap().starts.len(), 0);
}

#[tokio::test(start_paused = true)]
async fn stop_mid_run_freezes_the_display() {
    let mut fx = Fixture::new(400);
    fx.controller.start(base(4));
    fx.run_until_products(3).await;
    let cancels_before = fx.narrator.lock().unwrap().cancels;

    fx.controller.stop();
    fx.idle_for(Duration::from_secs(10)).await;

    let stage = fx.stage();
    assert_eq!(stage.products().len(), 3);
    assert!(!stage.running);
    assert_eq!(stage.product, None);
    assert_eq!(stage.active, None);
    assert_eq!(
        stage.last_calls(4),
        [
            Call::SetRunning(false),
            Call::ClearActive,
            Call::HideMarker,
            Call::ClearProduct,
        ]
    );
    assert!(fx.narrator.lock().unwrap().cancels > cancels_before);
    assert!(!fx.player.lock().unwrap().playing);
}

#[tokio::test(start_paused = true)]
async fn speed_change_applies_to_the_next_dwell_only() {
    let mut fx = Fixture::new(1200);
    fx.controller.start(base(2));
    fx.run_until_products(1).await;

    fx.controller.set_hop(HopDuration::from_millis(3000));
    fx.run_until_products(3).await;

    let times = fx.stage().product_times();
    assert_close(times[1].0 - times[0].0, Duration::from_millis(1200 + 260));
    assert_close(times[2].0 - times[1].0, Duration::from_millis(3000 + 260));
    assert_eq!(
        fx.stage().count(&Call::MoveMarker(6, Duration::from_millis(3000))),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn speed_change_settles_marker_on_active_cell() {
    let mut fx = Fixture::new(1200);
    fx.controller.set_hop(HopDuration::from_millis(800));
    assert_eq!(fx.stage().count(&Call::SettleMarker), 0);

    fx.controller.start(base(2));
    fx.run_until_products(1).await;
    fx.controller.set_hop(HopDuration::from_millis(900));
    assert_eq!(fx.stage().count(&Call::SettleMarker), 1);
    assert_eq!(fx.controller.hop().as_millis(), 900);
}

#[tokio::test(start_paused = true)]
async fn quick_hops_narrate_only_the_product() {
    let mut fx = Fixture::new(1000);
    fx.controller.start(base(3));
    fx.run_until_products(2).await;

    let narrator = fx.narrator.lock().unwrap();
    let texts: Vec<&str> = narrator.spoken.iter().map(|u| u.text.as_str()).collect();
    assert_eq!(texts, ["3", "6"]);
}

#[tokio::test(start_paused = true)]
async fn slow_hops_narrate_the_full_sentence() {
    let mut fx = Fixture::new(1500);
    fx.controller.start(base(3));
    fx.run_until_products(2).await;

    let narrator = fx.narrator.lock().unwrap();
    let texts: Vec<&str> = narrator.spoken.iter().map(|u| u.text.as_str()).collect();
    assert_eq!(texts, ["3 times 1 is 3", "3 times 2 is 6"]);
}

#[tokio::test(start_paused = true)]
async fn unavailable_narration_is_skipped() {
    let mut fx = Fixture::new(400);
    fx.narrator.lock().unwrap().available = false;
    fx.controller.start(base(20));
    fx.run_to_completion().await;

    assert_eq!(fx.stage().products().len(), 7);
    assert!(fx.narrator.lock().unwrap().spoken.is_empty());
}

#[tokio::test(start_paused = true)]
async fn music_failure_does_not_abort_the_run() {
    let mut fx = Fixture::with_stage(400, RecordingStage::default(), true);
    fx.controller.start(base(2));
    assert!(fx.controller.is_running());
    fx.run_to_completion().await;

    assert_eq!(fx.stage().products().len(), 12);
    assert_eq!(fx.player.lock().unwrap().starts.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn missing_cell_is_skipped() {
    let stage = RecordingStage {
        missing: vec![6],
        ..RecordingStage::default()
    };
    let mut fx = Fixture::with_stage(400, stage, false);
    fx.controller.start(base(3));
    fx.run_to_completion().await;

    let products = fx.stage().products();
    assert_eq!(products.len(), 11);
    assert!(!products.contains(&"3 x 2 = 6".to_string()));
    assert!(products.contains(&"3 x 3 = 9".to_string()));
}

#[tokio::test(start_paused = true)]
async fn lost_sequencer_forces_aborted_cleanup() {
    let mut fx = Fixture::new(1200);
    fx.controller.start(base(5));
    fx.run_until_products(1).await;
    let cancels_before = fx.narrator.lock().unwrap().cancels;

    let (tx, rx) = mpsc::unbounded_channel();
    drop(tx);
    fx.controller.replace_events(rx);
    fx.controller.poll();

    assert!(!fx.controller.is_running());
    let stage = fx.stage();
    assert!(!stage.running);
    assert_eq!(stage.product, None);
    assert!(fx.narrator.lock().unwrap().cancels > cancels_before);

    fx.idle_for(Duration::from_secs(5)).await;
    assert_eq!(fx.stage().products().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn same_table_reuses_its_palette() {
    let mut fx = Fixture::new(400);
    fx.controller.start(base(5));
    fx.controller.stop();
    fx.controller.start(base(5));
    fx.controller.stop();

    let hues = fx.stage().palette_hues();
    assert_eq!(hues.len(), 2);
    assert_eq!(hues[0], hues[1]);
    assert_eq!(fx.controller.palettes().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn volume_recomputes_gain_while_idle() {
    let mut fx = Fixture::new(1200);
    fx.controller.set_volume(Volume::MUTE);
    fx.controller.set_volume(Volume::FULL);

    let player = fx.player.lock().unwrap();
    let gains = &player.gains;
    assert!(gains[gains.len() - 2].abs() < f64::EPSILON);
    assert!((gains[gains.len() - 1] - 0.9).abs() < 1e-9);
    assert!(!fx.controller.is_running());
}

#[tokio::test(start_paused = true)]
async fn invalid_selection_is_ignored() {
    let mut fx = Fixture::new(1200);
    assert_eq!(fx.controller.start_selection("0"), None);
    assert_eq!(fx.controller.start_selection("-3"), None);
    assert_eq!(fx.controller.start_selection("21"), None);
    assert_eq!(fx.controller.start_selection("seven"), None);
    assert_eq!(fx.stage().count(&Call::SetRunning(true)), 0);

    assert!(fx.controller.start_selection(" 7 ").is_some());
    assert!(fx.controller.is_running());
}

#[tokio::test(start_paused = true)]
async fn tokens_increase_on_every_start_and_stop() {
    let mut fx = Fixture::new(1200);
    let first = fx.controller.start(base(2));
    fx.controller.stop();
    let stopped = fx.controller.live_token();
    let second = fx.controller.start(base(2));

    assert!(first < stopped);
    assert!(stopped < second);
    assert_eq!(
        fx.controller.phase(),
        RunPhase::Running {
            token: second,
            base: base(2)
        }
    );
}

async fn tick_until(app: &mut App, limit: Duration, mut done: impl FnMut(&App) -> bool) {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        app.tick();
        if done(app) {
            return;
        }
        tokio::time::sleep(FRAME).await;
    }
    panic!("condition not reached within {limit:?}");
}

#[test]
fn selection_clamps_at_both_ends() {
    let mut app = App::default();
    assert_eq!(app.selection().get(), 2);
    app.select_prev_table();
    app.select_prev_table();
    assert_eq!(app.selection().get(), 1);

    app.select_table(TableBase::MAX);
    app.select_next_table();
    assert_eq!(app.selection().get(), MAX_TABLE);
}

#[test]
fn controls_update_labels() {
    let mut app = App::default();
    assert_eq!(app.speed_label(), "1.2s");
    assert_eq!(app.volume_label(), "60%");

    app.faster();
    app.faster();
    assert_eq!(app.speed_label(), "1.0s");
    app.slower();
    assert_eq!(app.hop().as_millis(), 1100);

    app.volume_up();
    assert_eq!(app.volume_label(), "65%");
    for _ in 0..30 {
        app.volume_down();
    }
    assert_eq!(app.volume_label(), "0%");
}

#[tokio::test(start_paused = true)]
async fn app_run_leaves_visited_trail() {
    let mut app = App::default();
    app.select_table(base(12));
    app.start();
    assert!(app.presentation().is_running());

    tick_until(&mut app, Duration::from_secs(5), |app| {
        app.presentation().product() == Some("12 x 1 = 12")
    })
    .await;
    assert!(app.presentation().marker().is_visible());
    assert_eq!(
        app.presentation().board().active(),
        CellValue::new(12)
    );

    tick_until(&mut app, Duration::from_secs(60), |app| !app.is_running()).await;
    let presentation = app.presentation();
    assert!(!presentation.is_running());
    assert_eq!(presentation.product(), Some("12 x 12 = 144"));
    assert!(!presentation.marker().is_visible());
    assert_eq!(presentation.board().active(), None);
    assert_eq!(presentation.board().visited().len(), 12);
    assert!(presentation.palette().is_some());
}

#[tokio::test(start_paused = true)]
async fn app_start_clears_previous_trail() {
    let mut app = App::default();
    app.select_table(base(20));
    app.start();
    tick_until(&mut app, Duration::from_secs(60), |app| !app.is_running()).await;
    assert_eq!(app.presentation().board().visited().len(), 7);

    app.select_table(base(1));
    app.start();
    tick_until(&mut app, Duration::from_secs(5), |app| {
        app.presentation().product().is_some()
    })
    .await;
    assert_eq!(app.presentation().board().visited().len(), 1);

    app.stop();
    assert!(!app.is_running());
    assert_eq!(app.presentation().product(), None);
}
