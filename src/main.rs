use std::time::Duration;

use axum::Router;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use order_book_core::{api, market_maker, session, simulate, state::AppState, utils::shutdown_token};

#[derive(Parser)]
#[command(name = "engine-cli")]
#[command(version = "0.1", about = "A demo of a limit-order-book engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server plus a market maker and random order-flow generator
    /// against it.
    Simulate { port: u16, secs: u64 },
    /// Run just the HTTP/WS server.
    Server { port: u16 },
}

async fn wait_for_server(api_base: &str) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    loop {
        match client.get(format!("{}/book", api_base)).send().await {
            Ok(resp) if resp.status().is_success() => break,
            _ => tokio::time::sleep(Duration::from_millis(25)).await,
        };
    }
    Ok(())
}

async fn get_app_listener(port: u16, state: AppState) -> anyhow::Result<(TcpListener, Router)> {
    let app = api::router(state);
    let ep = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(ep.clone()).await?;
    Ok((listener, app))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let state = AppState::new();
    let token = shutdown_token();
    let server_token = token.clone();
    let mm_token = token.clone();
    let sim_token = token.clone();
    let session_token = token.clone();

    let _session_handle = session::spawn_session_controller(state.clone(), session_token);

    let cli = Cli::parse();
    let base = "http://127.0.0.1".to_string();
    match cli.command {
        Commands::Simulate { port, secs } => {
            let mut handlers = tokio::task::JoinSet::new();
            let (listener, app) = get_app_listener(port, state.clone()).await?;
            tracing::info!(port, secs, "spawning the server task");
            handlers.spawn(async move {
                tracing::info!("HTTP/WS server listening on 0.0.0.0:{}", port);
                axum::serve(listener, app)
                    .with_graceful_shutdown(server_token.cancelled_owned())
                    .await
                    .unwrap();
            });
            let ep = format!("{}:{}", base.clone(), port);
            tracing::info!("end_point: {}", ep);
            wait_for_server(&ep).await?;

            let mmb = base.clone();
            handlers.spawn(async move {
                if let Err(e) = market_maker::run_market_maker(&mmb, mm_token).await {
                    tracing::error!("market maker exited: {:?}", e);
                }
            });

            handlers.spawn(async move {
                if let Err(e) = simulate::run_simulation(
                    simulate::SimConfig {
                        api_base: base,
                        run_secs: if secs == 0 { None } else { Some(secs) },
                        attack_rate_hz: 5.0,
                        noise_sigma: 0.1,
                        mean_qty: 3.0,
                    },
                    sim_token,
                )
                .await
                {
                    tracing::error!("simulation error: {:?}", e);
                }
            });
            handlers.join_all().await;
        }
        Commands::Server { port } => {
            let (listener, app) = get_app_listener(port, state.clone()).await?;
            let svh = tokio::spawn(async move {
                tracing::info!("HTTP/WS server listening on 0.0.0.0:{}", port);
                axum::serve(listener, app)
                    .with_graceful_shutdown(server_token.cancelled_owned())
                    .await
                    .unwrap();
            });
            svh.await?;
        }
    };
    Ok(())
}
