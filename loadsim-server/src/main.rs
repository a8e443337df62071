//! The loadsim server binary.
//!
//! Simulates a backend service under load: inbound requests are admitted
//! through a bounded resource pool with injected contention, and an embedded
//! load generator drives the server with synthetic traffic.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use argh::FromArgs;
use tokio::signal::unix::SignalKind;
use tokio_util::sync::CancellationToken;

use loadgen::{ConstantRate, LoadGenerator};
use loadsim_server::config::Config;
use loadsim_server::observability::{initialize_tracing, maybe_initialize_metrics};
use loadsim_server::state::State;
use loadsim_server::web;

/// Simulated backend service under self-generated load.
#[derive(Debug, FromArgs)]
pub struct Args {
    /// path to the yaml configuration file
    #[argh(option, short = 'c')]
    pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    let config = Config::load(args.config.as_deref())?;

    let runtime = tokio::runtime::Runtime::new()?;
    let _runtime_guard = runtime.enter();

    initialize_tracing();
    tracing::info!("Starting service");
    tracing::debug!(?config);

    maybe_initialize_metrics(&config)?;

    runtime.block_on(async move {
        let state = State::new(config);

        // Bind before anything else starts: an unusable listen address is a
        // fatal startup error, not something to log from a background task.
        let listener =
            web::listen(&state.config).context("failed to start TCP listener")?;

        let generator_shutdown = CancellationToken::new();
        if state.config.load_generator.enabled {
            let generator = build_generator(&state.config);
            let shutdown = generator_shutdown.clone();
            tokio::spawn(async move { generator.run(shutdown).await });
        }

        tokio::spawn(async move {
            if let Err(error) = web::server(state, listener).await {
                tracing::error!(?error, "HTTP server failed");
            }
        });

        elegant_departure::tokio::depart()
            .on_termination()
            .on_sigint()
            .on_signal(SignalKind::hangup())
            .on_signal(SignalKind::quit())
            .await;

        generator_shutdown.cancel();
        tracing::info!("shutting down");

        Ok(())
    })
}

/// Builds the embedded load generator pointed at our own listening port.
fn build_generator(config: &Config) -> LoadGenerator {
    let target = format!("http://localhost:{}", config.http_addr.port());
    let rate = ConstantRate(config.load_generator.requests_per_second);

    LoadGenerator::new(target, rate).with_population(
        config.simulation.num_customers,
        config.simulation.num_operations,
    )
}
