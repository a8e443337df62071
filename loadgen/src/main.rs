//! Standalone load generator binary.
//!
//! Drives a remote loadsim instance at a fixed rate until interrupted.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use argh::FromArgs;
use tokio_util::sync::CancellationToken;

use loadgen::generator::{DEFAULT_NUM_CUSTOMERS, DEFAULT_NUM_OPERATIONS};
use loadgen::rate::DEFAULT_RATE;
use loadgen::{ConstantRate, LoadGenerator};

/// Synthetic load generator for the loadsim server.
#[derive(Debug, FromArgs)]
pub struct Args {
    /// base URL of the target server
    #[argh(option, short = 't', default = "String::from(\"http://localhost:6767\")")]
    pub target: String,

    /// requests per second to dispatch
    #[argh(option, short = 'r', default = "DEFAULT_RATE")]
    pub rate: u32,

    /// size of the synthetic customer population
    #[argh(option, default = "DEFAULT_NUM_CUSTOMERS")]
    pub customers: u32,

    /// number of synthetic operation kinds
    #[argh(option, default = "DEFAULT_NUM_OPERATIONS")]
    pub operations: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Args = argh::from_env();
    tracing::info!("generating load against {} at {} rps", args.target, args.rate);

    let generator = LoadGenerator::new(args.target, ConstantRate(args.rate))
        .with_population(args.customers, args.operations);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown.cancel();
        }
    });

    generator.run(shutdown).await;
    Ok(())
}
