//! Shared, lock-guarded engine state handed to every HTTP/WS handler.
//!
//! Grounded on the teacher's `AppState`, simplified from a multi-pair
//! `HashMap<Pair, OrderBook>` down to the single book this surface fronts,
//! and extended with the two broadcast channels `api.rs`'s websocket loop
//! subscribes to.

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};

use crate::book::OrderBook;
use crate::trade::Trade;

const BROADCAST_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct AppState {
    pub order_book: Arc<Mutex<OrderBook>>,
    pub trade_log: Arc<Mutex<Vec<Trade>>>,
    pub trade_tx: broadcast::Sender<Trade>,
    pub book_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new() -> Self {
        let (trade_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (book_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            order_book: Arc::new(Mutex::new(OrderBook::new())),
            trade_log: Arc::new(Mutex::new(Vec::new())),
            trade_tx,
            book_tx,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        AppState::new()
    }
}
