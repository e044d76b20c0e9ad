//! The session controller collaborator (SPEC_FULL.md §6, §10.5): at session
//! close, enumerates resting `GoodForDay` ids and cancels them.
//!
//! The core never carries a per-order deadline (see DESIGN.md's "Open
//! Questions resolved"); this is the external driver that makes
//! `GoodForDay` actually expire. Shaped like the teacher's
//! `utils::shutdown_token` — a small tokio task reacting to a signal,
//! rather than logic baked into the engine.

use std::time::Duration;

use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::state::AppState;

/// How often the session controller checks for a session close. In this
/// demo deployment "session close" is simulated by a fixed wall-clock
/// interval rather than a real trading-calendar clock.
const DEFAULT_SESSION_INTERVAL: Duration = Duration::from_secs(60 * 60 * 8);

/// Spawn the background task that expires `GoodForDay` orders once per
/// session. Returns the `JoinHandle` so callers can await it at shutdown.
pub fn spawn_session_controller(
    state: AppState,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    spawn_session_controller_with_interval(state, shutdown, DEFAULT_SESSION_INTERVAL)
}

fn spawn_session_controller_with_interval(
    state: AppState,
    shutdown: CancellationToken,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    expire_good_for_day(&state).await;
                }
                _ = shutdown.cancelled() => {
                    info!("session controller shutting down");
                    break;
                }
            }
        }
    })
}

/// One end-of-day sweep: cancel every currently-resting `GoodForDay` order.
async fn expire_good_for_day(state: &AppState) {
    let ids = {
        let book = state.order_book.lock().await;
        book.good_for_day_ids()
    };
    if ids.is_empty() {
        return;
    }
    {
        let mut book = state.order_book.lock().await;
        for id in &ids {
            book.cancel(*id);
        }
    }
    let _ = state.book_tx.send(());
    info!(count = ids.len(), "expired good-for-day orders at session close");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    use crate::order::Order;
    use crate::types::{OrderType, Side};

    #[tokio::test]
    async fn sweep_cancels_all_resting_good_for_day_orders() {
        let state = AppState::new();
        {
            let mut book = state.order_book.lock().await;
            book.submit(Order::new(1, 100, Side::Bid, OrderType::GoodForDay, 5).unwrap());
            book.submit(Order::new(2, 90, Side::Bid, OrderType::GoodTillCancel, 5).unwrap());
        }

        expire_good_for_day(&state).await;

        let book = state.order_book.lock().await;
        assert!(!book.contains(1));
        assert!(book.contains(2));
    }

    #[tokio::test]
    async fn controller_runs_at_least_once_before_shutdown() {
        let state = AppState::new();
        {
            let mut book = state.order_book.lock().await;
            book.submit(Order::new(1, 100, Side::Bid, OrderType::GoodForDay, 5).unwrap());
        }

        let shutdown = CancellationToken::new();
        let handle = spawn_session_controller_with_interval(
            state.clone(),
            shutdown.clone(),
            StdDuration::from_millis(10),
        );

        tokio::time::sleep(StdDuration::from_millis(50)).await;
        shutdown.cancel();
        handle.await.unwrap();

        let book = state.order_book.lock().await;
        assert!(!book.contains(1));
    }
}
