//! Headless runner: drives populations of cars around a procedural circuit
//! and prints one JSON report per episode.

mod driver;
mod telemetry;
mod tracks;

use anyhow::{Context, Result};
use rally_core::RunnerConfig;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = RunnerConfig::default();

    // Initialize telemetry
    telemetry::init_telemetry(config.json_logs)?;

    // The track defines where cars spawn
    let oval = tracks::OvalCircuit::for_config(&config.track);
    config.episode.car.spawn_position = oval.spawn(&config.episode.car.footprint);
    config.validate()?;

    info!(
        population = config.population,
        episodes = config.episodes,
        policy = ?config.policy,
        seed = config.seed,
        "Starting rally runner"
    );

    let track = Arc::new(oval.build(&config.track)?);
    let config = Arc::new(config);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.cancel();
    });

    for episode_index in 0..config.episodes {
        if cancel.is_cancelled() {
            break;
        }

        let config = config.clone();
        let track = track.clone();
        let cancel = cancel.clone();
        let report = tokio::task::spawn_blocking(move || {
            driver::run_episode(&config, track, episode_index, &cancel)
        })
        .await
        .context("episode task panicked")?;

        match report {
            Ok(report) => println!("{}", serde_json::to_string(&report)?),
            Err(e) => {
                error!("Episode {} failed: {}", episode_index, e);
                return Err(e.into());
            }
        }
    }

    info!("Shutting down rally runner");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
