//! Recurring hot-customer contention injector.
//!
//! [`SpikeInjector`] maintains a single time-bounded "spike window" during
//! which one designated customer experiences deliberately elevated latency.
//! Windows are not driven by a background timer; the state machine advances
//! lazily whenever a request probes it via [`compute_delay`], with the check
//! and mutation in one critical section so exactly one caller resolves each
//! transition.
//!
//! [`compute_delay`]: SpikeInjector::compute_delay

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

/// Upper bound for the baseline pre-admission delay.
const BASELINE_DELAY_MAX: Duration = Duration::from_millis(50);
/// Delay range for requests from the spiking customer.
const SPIKE_DELAY_MIN_MS: u64 = 1500;
const SPIKE_DELAY_MAX_MS: u64 = 2000;

/// Configuration for the [`SpikeInjector`].
#[derive(Clone, Debug)]
pub struct SpikeConfig {
    /// Wall-clock time between window starts.
    pub interval: Duration,
    /// How long a window stays active once started.
    pub duration: Duration,
    /// Size of the synthetic customer population a target is drawn from.
    pub num_customers: u32,
}

impl Default for SpikeConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
            duration: Duration::from_secs(30),
            num_customers: 100,
        }
    }
}

/// Shared injector handle; clones refer to the same window state.
#[derive(Clone, Debug)]
pub struct SpikeInjector {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: SpikeConfig,
    state: Mutex<WindowState>,
}

/// The current spike window, if any.
///
/// `started_at` doubles as the interval clock: it marks the start of the most
/// recent window and is deliberately left in place when the target is
/// cleared, so the next window only opens `interval` after the last one.
#[derive(Debug, Default)]
struct WindowState {
    started_at: Option<Instant>,
    target: Option<String>,
}

/// A pre-admission delay produced by the injector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectedDelay {
    /// Regular queueing latency, uniform in [0ms, 50ms).
    Baseline(Duration),
    /// Elevated latency for the spiking customer, uniform in [1500ms, 2000ms).
    Spike(Duration),
}

impl InjectedDelay {
    /// The duration to sleep before attempting pool admission.
    pub fn duration(&self) -> Duration {
        match *self {
            InjectedDelay::Baseline(d) | InjectedDelay::Spike(d) => d,
        }
    }

    /// Whether this delay was injected by an active spike window.
    pub fn is_spike(&self) -> bool {
        matches!(self, InjectedDelay::Spike(_))
    }
}

impl SpikeInjector {
    /// Creates an injector with no window started yet.
    ///
    /// The first probe immediately opens a window, matching the behavior of
    /// a freshly started process.
    pub fn new(config: SpikeConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(WindowState::default()),
            }),
        }
    }

    /// Advances the window state machine and computes the delay for one
    /// request.
    ///
    /// Any caller can resolve a pending transition: opening a new window
    /// (re-)selects a target uniformly from the customer population,
    /// regardless of which customer's request triggered it. Probing is
    /// idempotent in between transitions.
    pub fn compute_delay(&self, customer: &str) -> InjectedDelay {
        let config = &self.inner.config;
        let mut state = self.inner.state.lock().unwrap();
        let now = Instant::now();

        if state
            .started_at
            .is_none_or(|started| now.duration_since(started) > config.interval)
        {
            state.started_at = Some(now);
            let pick = rand::rng().random_range(0..config.num_customers.max(1));
            state.target = Some(format!("customer-{pick}"));
        }

        // `started_at` is always set at this point.
        let elapsed = now.duration_since(state.started_at.unwrap());
        if elapsed > config.duration {
            state.target = None;
        }

        if elapsed < config.duration && state.target.as_deref() == Some(customer) {
            let millis = rand::rng().random_range(SPIKE_DELAY_MIN_MS..SPIKE_DELAY_MAX_MS);
            return InjectedDelay::Spike(Duration::from_millis(millis));
        }

        let baseline = rand::rng().random_range(0..BASELINE_DELAY_MAX.as_millis() as u64);
        InjectedDelay::Baseline(Duration::from_millis(baseline))
    }
}
