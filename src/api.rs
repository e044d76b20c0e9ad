//! HTTP + WebSocket transport for the matching core.
//!
//! Grounded on the teacher's `api.rs`: the `LoggedJson` extractor, the
//! tagged `WsFrame` enum, and the `TraceLayer`-wrapped router are kept
//! verbatim in spirit. Multi-pair routing (`/orders/{pair}/{id}`,
//! `Query<Pair>` middleware) is dropped along with `instrument.rs`: this
//! surface fronts exactly one [`OrderBook`].

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, warn};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        FromRequest, Path, Request, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::order::Order;
use crate::state::AppState;
use crate::trade::Trade;
use crate::types::{OrderId, OrderType, Price, Quantity, Side};

type ApiErr = (StatusCode, Json<serde_json::Value>);

fn err(status: StatusCode, msg: &str) -> ApiErr {
    (status, Json(json!({ "error": msg })))
}

fn log_rejected(payload: &NewOrder, reason: &str) {
    warn!(
        reason,
        side = ?payload.side,
        order_type = ?payload.order_type,
        price = payload.price,
        quantity = payload.quantity,
        "order rejected"
    );
}

/// A `Json`-like extractor that logs the request body on deserialization
/// failure, instead of silently returning a bare 422.
pub struct LoggedJson<T>(pub T);

impl<S, T> FromRequest<S> for LoggedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiErr;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let method = req.method().clone();
        let uri = req.uri().clone();
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| err(StatusCode::BAD_REQUEST, &e.to_string()))?;

        match serde_json::from_slice::<T>(&bytes) {
            Ok(val) => Ok(LoggedJson(val)),
            Err(e) => {
                let preview = String::from_utf8_lossy(&bytes);
                let preview = &preview[..preview.len().min(4096)];
                warn!(
                    error = %e,
                    %method,
                    uri = %uri,
                    body_preview = %preview,
                    "order rejected: JSON deserialization failed"
                );
                Err(err(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()))
            }
        }
    }
}

/// Request payload for `POST /orders`.
#[derive(Deserialize)]
pub struct NewOrder {
    pub side: Side,
    pub order_type: OrderType,
    #[serde(default)]
    pub price: Price,
    pub quantity: Quantity,
}

/// Response for `POST /orders`: the generated order id plus any trades the
/// submission produced immediately.
#[derive(Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: OrderId,
    pub trades: Vec<Trade>,
}

#[derive(Deserialize)]
pub struct ModifyOrder {
    pub price: Price,
    pub quantity: Quantity,
}

/// A point-in-time view of both sides of the book, best price first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub bids: Vec<(Price, Quantity)>,
    pub asks: Vec<(Price, Quantity)>,
}

/// A websocket message: either a book snapshot or a single trade event,
/// serialized as an internally-tagged enum:
/// ```text
/// {"type": "BookSnapshot", "data": { ... }}
/// {"type": "Trade", "data": { ... }}
/// ```
#[derive(Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WsFrame {
    BookSnapshot(BookSnapshot),
    Trade(Trade),
}

const SNAPSHOT_DEPTH: usize = 25;

async fn book_snapshot(state: &AppState) -> BookSnapshot {
    let book = state.order_book.lock().await;
    BookSnapshot {
        bids: book.snapshot_bids(SNAPSHOT_DEPTH),
        asks: book.snapshot_asks(SNAPSHOT_DEPTH),
    }
}

/// `GET /book` — a snapshot of the current order book.
pub async fn get_order_book(State(state): State<AppState>) -> impl IntoResponse {
    Json(book_snapshot(&state).await)
}

/// `GET /trades` — the in-memory trade log, most recent last.
pub async fn get_trade_log(State(state): State<AppState>) -> impl IntoResponse {
    let log = state.trade_log.lock().await;
    Json(log.clone())
}

/// `POST /orders` — submits a new order.
///
/// *Success:* 200, JSON [`OrderAck`].
/// *Bad Request:* 400, JSON `{ "error": "..." }` if the order is malformed.
pub async fn create_order(
    State(state): State<AppState>,
    LoggedJson(payload): LoggedJson<NewOrder>,
) -> Result<Json<OrderAck>, ApiErr> {
    let order_id = Uuid::new_v4().as_u128() as OrderId;
    let order = match Order::new(order_id, payload.price, payload.side, payload.order_type, payload.quantity) {
        Ok(order) => order,
        Err(e) => {
            log_rejected(&payload, &e.to_string());
            return Err(err(StatusCode::BAD_REQUEST, &e.to_string()));
        }
    };

    let trades = {
        let mut book = state.order_book.lock().await;
        book.submit(order)
    };

    if !trades.is_empty() {
        let mut log = state.trade_log.lock().await;
        log.extend(trades.iter().copied());
    }
    for trade in &trades {
        let _ = state.trade_tx.send(*trade);
    }
    let _ = state.book_tx.send(());

    Ok(Json(OrderAck { order_id, trades }))
}

/// `DELETE /orders/{id}` — cancels a resting order.
///
/// Cancelling an unknown id is not an error (SPEC_FULL.md §4.4): this always
/// answers `200`.
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> impl IntoResponse {
    {
        let mut book = state.order_book.lock().await;
        book.cancel(order_id);
    }
    info!(order_id, "cancel requested");
    let _ = state.book_tx.send(());
    (StatusCode::OK, Json(json!({"status": "cancelled"})))
}

/// `PATCH /orders/{id}` — cancels and resubmits a resting order at a new
/// price/quantity, losing time priority.
pub async fn modify_order(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    LoggedJson(payload): LoggedJson<ModifyOrder>,
) -> impl IntoResponse {
    let trades = {
        let mut book = state.order_book.lock().await;
        book.modify(order_id, payload.price, payload.quantity)
    };
    if !trades.is_empty() {
        let mut log = state.trade_log.lock().await;
        log.extend(trades.iter().copied());
    }
    for trade in &trades {
        let _ = state.trade_tx.send(*trade);
    }
    let _ = state.book_tx.send(());
    Json(OrderAck { order_id, trades })
}

/// `GET /ws` — upgrades to a WebSocket and streams book snapshots and trade
/// events as they happen.
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drives one websocket connection: an initial snapshot, then forwards
/// trade events and post-mutation snapshots as they're broadcast.
pub async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut trade_rx = state.trade_tx.subscribe();
    let mut book_rx = state.book_tx.subscribe();

    let initial = book_snapshot(&state).await;
    if let Err(e) = socket
        .send(Message::Text(
            serde_json::to_string(&WsFrame::BookSnapshot(initial)).unwrap().into(),
        ))
        .await
    {
        error!("failed to send initial snapshot: {:?}", e);
        return;
    }

    loop {
        tokio::select! {
            Ok(trade) = trade_rx.recv() => {
                let frame = serde_json::to_string(&WsFrame::Trade(trade)).unwrap();
                if let Err(e) = socket.send(Message::Text(frame.into())).await {
                    error!("websocket send trade failed: {:?}", e);
                    break;
                }
            }
            Ok(()) = book_rx.recv() => {
                let snap = book_snapshot(&state).await;
                let frame = serde_json::to_string(&WsFrame::BookSnapshot(snap)).unwrap();
                if let Err(e) = socket.send(Message::Text(frame.into())).await {
                    error!("websocket send snapshot failed: {:?}", e);
                    break;
                }
            }
            else => break,
        }
    }
}

/// Builds the application's `Router` with all routes and shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/{id}", delete(cancel_order).patch(modify_order))
        .route("/trades", get(get_trade_log))
        .route("/book", get(get_order_book))
        .route("/ws", get(ws_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .include_headers(false)
                        .level(tracing::Level::TRACE),
                )
                .on_response(DefaultOnResponse::new().level(tracing::Level::TRACE)),
        )
        .with_state(state)
}
