//! Round-based paced request driver.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::rate::RateSource;

/// Default size of the synthetic customer population.
pub const DEFAULT_NUM_CUSTOMERS: u32 = 100;
/// Default number of synthetic operation kinds.
pub const DEFAULT_NUM_OPERATIONS: u32 = 10;

/// Dispatches synthetic requests against a target at a paced rate.
#[derive(Debug)]
pub struct LoadGenerator {
    client: reqwest::Client,
    target: String,
    rate: Arc<dyn RateSource>,
    num_customers: u32,
    num_operations: u32,
}

impl LoadGenerator {
    /// Creates a generator for the given target base URL.
    pub fn new(target: impl Into<String>, rate: impl RateSource + 'static) -> Self {
        Self {
            client: reqwest::Client::new(),
            target: target.into(),
            rate: Arc::new(rate),
            num_customers: DEFAULT_NUM_CUSTOMERS,
            num_operations: DEFAULT_NUM_OPERATIONS,
        }
    }

    /// Overrides the synthetic customer and operation populations.
    pub fn with_population(mut self, num_customers: u32, num_operations: u32) -> Self {
        self.num_customers = num_customers.max(1);
        self.num_operations = num_operations.max(1);
        self
    }

    /// Runs rounds until the token is cancelled.
    ///
    /// Cancellation is cooperative: the current round stops scheduling new
    /// dispatches but still waits for the ones already in flight.
    pub async fn run(&self, shutdown: CancellationToken) {
        while !shutdown.is_cancelled() {
            self.run_round(&shutdown).await;
        }
        tracing::info!("load generator stopped");
    }

    /// Executes one round and returns the number of requests dispatched.
    ///
    /// The round queries the rate source once, spaces that many dispatch
    /// ticks evenly across one second, and does not return until every
    /// dispatched request has completed or failed.
    pub async fn run_round(&self, cancel: &CancellationToken) -> usize {
        let rate = self.rate.requests_per_second().max(1);
        let mut ticker = tokio::time::interval(Duration::from_secs(1) / rate);

        let mut tasks = Vec::with_capacity(rate as usize);
        for _ in 0..rate {
            tokio::select! {
                _ = ticker.tick() => {
                    tasks.push(tokio::spawn(self.dispatch()));
                }
                _ = cancel.cancelled() => break,
            }
        }
        drop(ticker);

        let dispatched = tasks.len();
        for result in futures::future::join_all(tasks).await {
            // Dispatch tasks handle their own errors; a panic here is a bug.
            result.expect("dispatch task panicked");
        }

        dispatched
    }

    /// Builds one request future with freshly drawn customer and operation
    /// tags. The future owns everything it needs so it can be spawned.
    fn dispatch(&self) -> impl Future<Output = ()> + Send + 'static {
        let customer = format!(
            "customer-{}",
            rand::rng().random_range(0..self.num_customers)
        );
        let operation = format!(
            "operation-{}",
            rand::rng().random_range(0..self.num_operations)
        );
        let request = self
            .client
            .get(&self.target)
            .header("X-Customer", customer)
            .header("X-Operation", operation);

        async move {
            match request.send().await {
                Ok(response) => {
                    // Drain and discard the body.
                    let _ = response.bytes().await;
                }
                Err(err) => {
                    tracing::warn!("load generator request failed: {err}");
                }
            }
        }
    }
}
