//! Random order-flow generator (SPEC_FULL.md §10.3): a noisy producer of
//! limit and market orders against the HTTP surface, for exercising the
//! engine end-to-end without a human at a terminal.
//!
//! Grounded on the teacher's `simulate.rs`: same Poisson inter-arrival /
//! Gaussian mid-drift model, with the multi-pair `symbol` field dropped
//! along with `instrument.rs`.

use rand::Rng;
use rand_distr::{Distribution, Exp, Exp1, Normal};
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Clone)]
pub struct SimConfig {
    pub api_base: String,
    pub run_secs: Option<u64>,
    pub attack_rate_hz: f64,
    pub noise_sigma: f64,
    pub mean_qty: f64,
}

#[derive(Deserialize)]
struct Ack {
    trades: Vec<AckTrade>,
}

#[derive(Deserialize)]
struct AckTrade {
    bid: AckLeg,
    ask: AckLeg,
}

#[derive(Deserialize)]
struct AckLeg {
    price: i64,
    quantity: u64,
}

/// Noisy limit-order simulation loop: a Poisson process of order arrivals,
/// quoted around a mid price that drifts as a Gaussian random walk.
pub async fn run_simulation(cfg: SimConfig, cancel_token: CancellationToken) -> anyhow::Result<()> {
    let client: Client = ClientBuilder::new().timeout(Duration::from_secs(5)).build()?;

    let ia = Exp::new(cfg.attack_rate_hz).expect("attack_rate_hz must be > 0");
    let drift = Normal::new(0.0, cfg.noise_sigma).expect("noise_sigma >= 0");
    let size = Exp1;

    let mut iv: i64 = 0;
    let mut pnl: f64 = 0.0;
    let mut mid: f64 = 50.0;
    let start = Instant::now();
    let spread = 1.0_f64;

    loop {
        if let Some(max_secs) = cfg.run_secs {
            if start.elapsed().as_secs() >= max_secs {
                break;
            }
        }

        let wait_secs: f64 = ia.sample(&mut rand::rng());
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("received shutdown; exiting simulation loop");
                break;
            }
            _ = sleep(Duration::from_secs_f64(wait_secs)) => {}
        }

        let unit: f64 = size.sample(&mut rand::rng());
        let qty = (unit * cfg.mean_qty).max(1.0).round() as u64;

        mid += drift.sample(&mut rand::rng());

        let (price, side) = if rand::rng().random_bool(0.5) {
            (mid - spread, "Bid")
        } else {
            (mid + spread, "Ask")
        };
        let price = price.max(1.0).round() as i64;

        match client
            .post(format!("{}/orders", cfg.api_base))
            .json(&json!({
                "side": side,
                "order_type": "GoodTillCancel",
                "price": price,
                "quantity": qty,
            }))
            .send()
            .await
        {
            Ok(resp) => {
                if let Err(e) = resp.error_for_status_ref() {
                    warn!(error = %e, "order post returned non-success");
                    continue;
                }
                match resp.json::<Ack>().await {
                    Ok(ack) => {
                        for t in ack.trades {
                            let leg = if side == "Bid" { &t.bid } else { &t.ask };
                            let px = leg.price as f64;
                            let q = leg.quantity as f64;
                            if side == "Bid" {
                                iv += q as i64;
                                pnl -= px * q;
                            } else {
                                iv -= q as i64;
                                pnl += px * q;
                            }
                        }
                        info!(
                            elapsed = format_args!("{:.1}s", start.elapsed().as_secs_f64()),
                            side,
                            qty,
                            price,
                            mid = format_args!("{:.2}", mid),
                            inventory = iv,
                            pnl = format_args!("{:.2}", pnl),
                            "sim tick"
                        );
                    }
                    Err(e) => warn!(error = %e, "failed to parse Ack JSON"),
                }
            }
            Err(e) => {
                warn!(error = %e, "HTTP request failed");
                continue;
            }
        }
    }

    info!(inventory = iv, pnl = format_args!("{:.2}", pnl), "simulation done");
    Ok(())
}
