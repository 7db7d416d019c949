//! End-to-end playback driven through key presses.

use std::time::Duration;

use crossterm::event::{Event, KeyCode};

use hopscotch_engine::{App, CellValue, RunPhase};
use hopscotch_tui::apply_event;

use crate::common::{frames_until, press, record_products};

#[tokio::test(start_paused = true)]
async fn keyboard_run_plays_the_selected_table() {
    let mut app = App::default();
    for _ in 0..3 {
        press(&mut app, KeyCode::Right);
    }
    assert_eq!(app.selection().get(), 5);
    for _ in 0..8 {
        press(&mut app, KeyCode::Char(']'));
    }
    assert_eq!(app.hop().as_millis(), 400);

    press(&mut app, KeyCode::Enter);
    assert!(app.is_running());

    let mut products = Vec::new();
    record_products(&mut app, Duration::from_secs(15), &mut products).await;

    let expected: Vec<String> = (1..=12).map(|m| format!("5 x {m} = {}", 5 * m)).collect();
    assert_eq!(products, expected);
    assert!(!app.is_running());
    assert_eq!(app.presentation().board().visited().len(), 12);
    assert_eq!(
        app.presentation().board().visited().last(),
        CellValue::new(60).as_ref()
    );
}

#[tokio::test(start_paused = true)]
async fn enter_is_ignored_while_running() {
    let mut app = App::default();
    press(&mut app, KeyCode::Enter);
    let RunPhase::Running { token, .. } = app.phase() else {
        panic!("run should have started");
    };

    press(&mut app, KeyCode::Enter);
    let RunPhase::Running { token: still, .. } = app.phase() else {
        panic!("run should still be going");
    };
    assert_eq!(token, still);
}

#[tokio::test(start_paused = true)]
async fn escape_stops_and_a_new_table_starts_clean() {
    let mut app = App::default();
    press(&mut app, KeyCode::Enter);
    frames_until(&mut app, Duration::from_secs(10), |app| {
        app.presentation().board().visited().len() >= 3
    })
    .await;

    press(&mut app, KeyCode::Esc);
    assert!(!app.is_running());
    assert_eq!(app.presentation().product(), None);
    assert!(!app.presentation().marker().is_visible());

    let mut products = Vec::new();
    record_products(&mut app, Duration::from_secs(5), &mut products).await;
    assert!(products.is_empty());

    press(&mut app, KeyCode::Left);
    press(&mut app, KeyCode::Char('s'));
    frames_until(&mut app, Duration::from_secs(5), |app| {
        app.presentation().product().is_some()
    })
    .await;
    assert_eq!(app.presentation().product(), Some("1 x 1 = 1"));
    assert_eq!(app.presentation().board().visited().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn resize_mid_hop_settles_the_marker() {
    let mut app = App::default();
    app.set_hop(hopscotch_engine::HopDuration::from_millis(3000));
    press(&mut app, KeyCode::Enter);
    frames_until(&mut app, Duration::from_secs(10), |app| {
        app.presentation().board().visited().len() >= 2
    })
    .await;

    apply_event(&mut app, &Event::Resize(120, 40));
    let hopscotch_engine::Marker::Visible(hop) = app.presentation().marker() else {
        panic!("marker should be visible");
    };
    assert_eq!(hop.duration(), Duration::ZERO);
    assert!(app.is_running());
}

#[test]
fn quit_key_reports_quit() {
    let mut app = App::default();
    assert!(!press(&mut app, KeyCode::Char('+')));
    assert_eq!(app.volume().percent(), 65);
    assert!(press(&mut app, KeyCode::Char('q')));
}
