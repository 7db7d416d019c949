//! Shared test utilities and fixtures

#![allow(dead_code)]

use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

use hopscotch_engine::App;
use hopscotch_tui::apply_event;

pub const FRAME: Duration = Duration::from_millis(16);

/// Feed one key press to the app. Returns `true` if it asked to quit.
pub fn press(app: &mut App, code: KeyCode) -> bool {
    apply_event(app, &Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
}

/// Run frames on the paused clock until `done` holds.
pub async fn frames_until(app: &mut App, limit: Duration, mut done: impl FnMut(&App) -> bool) {
    let mut elapsed = Duration::ZERO;
    while elapsed < limit {
        app.tick();
        if done(app) {
            return;
        }
        tokio::time::sleep(FRAME).await;
        elapsed += FRAME;
    }
    panic!("condition not reached within {limit:?}");
}

/// Run frames for `span`, recording every distinct product shown.
pub async fn record_products(app: &mut App, span: Duration, products: &mut Vec<String>) {
    let mut elapsed = Duration::ZERO;
    while elapsed < span {
        app.tick();
        if let Some(product) = app.presentation().product()
            && products.last().map(String::as_str) != Some(product)
        {
            products.push(product.to_string());
        }
        tokio::time::sleep(FRAME).await;
        elapsed += FRAME;
    }
}
