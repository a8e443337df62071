//! Target-rate selection for the load generator.

use std::fmt;

/// Default target rate in requests per second.
pub const DEFAULT_RATE: u32 = 500;

/// Supplies the target rate for each round.
///
/// Queried once at the start of every round, so implementations can vary the
/// rate over time.
pub trait RateSource: fmt::Debug + Send + Sync {
    /// The number of requests to dispatch in the upcoming one-second round.
    fn requests_per_second(&self) -> u32;
}

/// A fixed rate.
#[derive(Clone, Copy, Debug)]
pub struct ConstantRate(pub u32);

impl Default for ConstantRate {
    fn default() -> Self {
        Self(DEFAULT_RATE)
    }
}

impl RateSource for ConstantRate {
    fn requests_per_second(&self) -> u32 {
        self.0
    }
}
