//! Two-sided quoting bot over the REST+WS surface (SPEC_FULL.md §10.4):
//! posts a bid a little below the book's mid price and an ask a little
//! above it, refreshing both whenever the mid moves.
//!
//! Grounded on the teacher's `market_maker.rs`, with the per-pair `/ws/{pair}`
//! and `/orders/{pair}/{id}` routes collapsed to the single-instrument
//! surface now that `instrument.rs` is gone.

use errors::MarketMakerError;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::{sync::watch, time};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMsg};
use tokio_util::sync::CancellationToken;

use crate::{
    api::{BookSnapshot, OrderAck, WsFrame},
    errors,
    types::{OrderId, OrderType, Price, Side},
};

/// How far from mid to quote, in ticks.
const SPREAD: Price = 2;
/// How many milliseconds between quote refreshes.
const PACE_MS: u64 = 500;

#[derive(Deserialize, Serialize)]
struct NewOrder {
    side: Side,
    order_type: OrderType,
    price: Price,
    quantity: u64,
}

/// Runs the market maker loop against a REST+WS API at `api_base` until
/// `token` is cancelled.
///
/// Connects to `ws://{api_base}/ws`, tracks the book's mid price from the
/// snapshot frames it streams, and every `PACE_MS` milliseconds — if the
/// mid has moved since the last quote — cancels the previous bid/ask and
/// posts a fresh pair around the new mid.
pub async fn run_market_maker(api_base: &str, token: CancellationToken) -> Result<(), MarketMakerError> {
    let ws_url = format!("ws://{host}/ws", host = api_base.trim_start_matches("http://"));
    tracing::warn!("market maker: connecting to: {:?}", ws_url);

    let ws_stream = loop {
        match connect_async(&ws_url).await {
            Ok((stream, _)) => {
                tracing::info!("market maker: ws connected successfully");
                break stream;
            }
            Err(e) => {
                tracing::warn!("market maker: ws connect failed: {}; retrying...", e);
                tokio::time::sleep(std::time::Duration::from_millis(100)).await
            }
        }
    };

    let (_write, read) = ws_stream.split();

    let (mid_tx, mid_rx) = watch::channel(None::<Price>);

    let frames = read.filter_map(|msg| async move {
        match msg {
            Ok(WsMsg::Text(txt)) => match serde_json::from_str::<WsFrame>(&txt) {
                Ok(frame) => Some(frame),
                Err(err) => {
                    tracing::warn!("invalid WS frame: {err}");
                    None
                }
            },
            _ => None,
        }
    });
    tokio::spawn(async move {
        tokio::pin!(frames);
        while let Some(frame) = frames.next().await {
            if let WsFrame::BookSnapshot(BookSnapshot { bids, asks }) = frame {
                if let (Some(&(bb, _)), Some(&(aa, _))) = (bids.first(), asks.first()) {
                    let mid = (bb + aa) / 2;
                    let _ = mid_tx.send(Some(mid));
                }
            }
        }
    });

    let client = reqwest::Client::new();
    let mut outstanding: Vec<OrderId> = Vec::new();
    let mut interval = time::interval(time::Duration::from_millis(PACE_MS));
    let mut last_mid = None;
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                tracing::info!("market maker: shutdown requested, tearing down...");
                break;
            }
            _ = interval.tick() => {
                let mid_opt: Option<Price> = *mid_rx.borrow();
                if let Some(mid_price) = mid_opt {
                    if Some(mid_price) != last_mid {
                        for id in outstanding.drain(..) {
                            let _ = client.delete(format!("{}/orders/{}", api_base, id)).send().await;
                        }

                        let bid_price = (mid_price - SPREAD).max(1);
                        tracing::info!(bid_price, "placing bid");
                        if let Ok(resp) = client
                            .post(format!("{}/orders", api_base))
                            .json(&NewOrder {
                                side: Side::Bid,
                                order_type: OrderType::GoodTillCancel,
                                price: bid_price,
                                quantity: 1,
                            })
                            .send()
                            .await
                        {
                            if let Ok(ack) = resp.json::<OrderAck>().await {
                                outstanding.push(ack.order_id);
                            }
                        }

                        let ask_price = mid_price + SPREAD;
                        tracing::info!(ask_price, "placing ask");
                        if let Ok(resp) = client
                            .post(format!("{}/orders", api_base))
                            .json(&NewOrder {
                                side: Side::Ask,
                                order_type: OrderType::GoodTillCancel,
                                price: ask_price,
                                quantity: 1,
                            })
                            .send()
                            .await
                        {
                            if let Ok(ack) = resp.json::<OrderAck>().await {
                                outstanding.push(ack.order_id);
                            }
                        }
                        last_mid = Some(mid_price);
                    }
                }
            }
        }
    }
    Ok(())
}
