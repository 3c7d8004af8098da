//! Countdown driver.
//!
//! Waits for the deadline the engine publishes and fires it. The engine
//! stays the single owner of its countdown slot: when the slot changes
//! (pause, reset, skip, re-arm) the pending sleep is abandoned, and a
//! deadline that raced with such a change is rejected by
//! [`TimerEngine::fire`]. The driver returns once the engine is destroyed.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::sleep_until;

use super::timer::TimerEngine;

/// Drives `engine` until it is destroyed.
pub async fn drive(engine: Arc<Mutex<TimerEngine>>) {
    let mut countdown = engine.lock().await.watch_countdown();

    loop {
        let armed = *countdown.borrow_and_update();

        match armed {
            Some(due) => {
                tokio::select! {
                    _ = sleep_until(due.deadline()) => {
                        if !engine.lock().await.fire(due) {
                            tracing::trace!(generation = due.generation(), "stale countdown ignored");
                        }
                    }
                    changed = countdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            None => {
                if countdown.changed().await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!("countdown driver stopped");
}
