//! Per-request simulation pipeline.
//!
//! [`RequestProcessor`] takes one [`RequestDescriptor`] end-to-end: it sleeps
//! the injected pre-admission delay, admits the request through the
//! [`ResourcePool`], simulates backend work while holding the slot, draws the
//! simulated failure, and reports the outcome to the metrics sink. Exactly one
//! `requests` counter and one `latency` timing are emitted per request, on
//! every branch.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use crate::error::Error;
use crate::metrics::MetricsSink;
use crate::pool::ResourcePool;
use crate::spike::SpikeInjector;

/// Sentinel used when a request carries no customer or operation.
const UNKNOWN: &str = "unknown";

/// Tunables for the simulated work a request performs after admission.
#[derive(Clone, Copy, Debug)]
pub struct SimulationConfig {
    /// Probability of a simulated internal failure, drawn per request.
    pub failure_probability: f64,
    /// Upper bound for the simulated processing delay.
    pub max_work_delay: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            failure_probability: 0.05,
            max_work_delay: Duration::from_millis(50),
        }
    }
}

/// One synthetic request, immutable once created.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    /// The logical customer issuing the request.
    pub customer: String,
    /// The operation kind the request performs.
    pub operation: String,
}

impl RequestDescriptor {
    /// Creates a descriptor, defaulting missing fields to `"unknown"`.
    pub fn new(customer: Option<String>, operation: Option<String>) -> Self {
        Self {
            customer: customer.unwrap_or_else(|| UNKNOWN.to_owned()),
            operation: operation.unwrap_or_else(|| UNKNOWN.to_owned()),
        }
    }
}

/// Status of a processed request, mapped to an HTTP status by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// The request was admitted and processed successfully.
    Ok,
    /// The request was admitted but hit the simulated internal failure.
    InternalError,
    /// The request was rejected because the pool timed out.
    Unavailable,
}

impl Status {
    /// The HTTP status code equivalent.
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::InternalError => 500,
            Status::Unavailable => 503,
        }
    }
}

/// Terminal result of processing one request.
#[derive(Clone, Debug)]
pub struct Outcome {
    /// The classified status.
    pub status: Status,
    /// Plain-text response body.
    pub body: String,
}

/// Processes synthetic requests against the shared pool and spike state.
///
/// Cheap to clone; all clones share the same pool and injector.
#[derive(Clone, Debug)]
pub struct RequestProcessor {
    pool: ResourcePool,
    spike: SpikeInjector,
    metrics: Arc<dyn MetricsSink>,
    config: SimulationConfig,
}

impl RequestProcessor {
    /// Creates a processor over the given shared pool and injector.
    pub fn new(
        pool: ResourcePool,
        spike: SpikeInjector,
        metrics: Arc<dyn MetricsSink>,
        config: SimulationConfig,
    ) -> Self {
        Self {
            pool,
            spike,
            metrics,
            config,
        }
    }

    /// Runs one request end-to-end and returns its outcome.
    ///
    /// The pool slot is held across the simulated work, modeling a database
    /// connection held for the duration of a query. Release happens exactly
    /// once per admission, on every exit path.
    pub async fn process(&self, request: RequestDescriptor) -> Outcome {
        let start = Instant::now();
        let RequestDescriptor {
            customer,
            operation,
        } = request;

        let delay = self.spike.compute_delay(&customer);
        if delay.is_spike() {
            self.metrics
                .count("spike_requests", 1, &[("customer", customer.clone())]);
        }
        tokio::time::sleep(delay.duration()).await;

        let (status, body) = match self.pool.acquire().await {
            Ok(_permit) => {
                // Acquire latency includes the injected delay, as seen by a
                // client waiting for a connection.
                self.metrics.timing(
                    "db_connection_latency",
                    start.elapsed(),
                    &[("customer", customer.clone())],
                );

                tokio::time::sleep(self.work_delay()).await;

                if rand::rng().random::<f64>() < self.config.failure_probability {
                    self.metrics.count(
                        "errors",
                        1,
                        &[
                            ("cause", "internal_server_error".to_owned()),
                            ("customer", customer.clone()),
                            ("operation", operation.clone()),
                        ],
                    );
                    (Status::InternalError, "Internal Server Error".to_owned())
                } else {
                    let body = format!("Hello, {customer}! Operation: {operation}");
                    (Status::Ok, body)
                }
            }
            Err(Error::PoolExhausted) => {
                self.metrics.count(
                    "errors",
                    1,
                    &[
                        ("cause", "db_connection_timeout".to_owned()),
                        ("customer", customer.clone()),
                        ("operation", operation.clone()),
                    ],
                );
                (
                    Status::Unavailable,
                    "Database Connection Timeout".to_owned(),
                )
            }
        };

        let tags = [
            ("operation", operation),
            ("status", status.code().to_string()),
            ("customer", customer),
        ];
        self.metrics.count("requests", 1, &tags);
        self.metrics.timing("latency", start.elapsed(), &tags);

        Outcome { status, body }
    }

    fn work_delay(&self) -> Duration {
        let max = self.config.max_work_delay.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricValue;
    use crate::spike::SpikeConfig;

    const ACQUIRE_TIMEOUT: Duration = Duration::from_millis(50);

    /// A spike config whose window never targets the test customers.
    fn quiet_spike() -> SpikeInjector {
        SpikeInjector::new(SpikeConfig {
            interval: Duration::from_secs(300),
            duration: Duration::from_secs(30),
            num_customers: 1,
        })
    }

    fn processor(
        capacity: usize,
        failure_probability: f64,
        spike: SpikeInjector,
    ) -> (RequestProcessor, Arc<crate::RecordingSink>, ResourcePool) {
        let pool = ResourcePool::new(capacity, ACQUIRE_TIMEOUT);
        let sink = Arc::new(crate::RecordingSink::new());
        let processor = RequestProcessor::new(
            pool.clone(),
            spike,
            sink.clone(),
            SimulationConfig {
                failure_probability,
                max_work_delay: Duration::from_millis(50),
            },
        );
        (processor, sink, pool)
    }

    fn descriptor() -> RequestDescriptor {
        RequestDescriptor::new(Some("alice".to_owned()), Some("checkout".to_owned()))
    }

    #[test]
    fn descriptor_defaults_missing_fields() {
        let descriptor = RequestDescriptor::new(None, None);
        assert_eq!(descriptor.customer, "unknown");
        assert_eq!(descriptor.operation, "unknown");
    }

    #[tokio::test(start_paused = true)]
    async fn success_path_emits_one_request_and_releases() {
        let (processor, sink, pool) = processor(1, 0.0, quiet_spike());

        let outcome = processor.process(descriptor()).await;

        assert_eq!(outcome.status, Status::Ok);
        assert_eq!(outcome.body, "Hello, alice! Operation: checkout");
        assert_eq!(pool.in_use(), 0);

        assert_eq!(sink.counter_total("requests"), 1);
        assert_eq!(sink.counter_total("errors"), 0);
        assert_eq!(sink.events_named("latency").len(), 1);
        assert_eq!(sink.events_named("db_connection_latency").len(), 1);

        let request = &sink.events_named("requests")[0];
        assert_eq!(request.tag("status"), Some("200"));
        assert_eq!(request.tag("customer"), Some("alice"));
        assert_eq!(request.tag("operation"), Some("checkout"));
    }

    #[tokio::test(start_paused = true)]
    async fn forced_failure_emits_classified_error_and_releases() {
        let (processor, sink, pool) = processor(1, 1.0, quiet_spike());

        let outcome = processor.process(descriptor()).await;

        assert_eq!(outcome.status, Status::InternalError);
        assert_eq!(outcome.body, "Internal Server Error");
        assert_eq!(pool.in_use(), 0);

        assert_eq!(sink.counter_total("requests"), 1);
        let errors = sink.events_named("errors");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].tag("cause"), Some("internal_server_error"));
        assert_eq!(sink.events_named("requests")[0].tag("status"), Some("500"));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_pool_yields_unavailable_outcome() {
        let (processor, sink, pool) = processor(1, 0.0, quiet_spike());
        let _held = pool.acquire().await.unwrap();

        let outcome = processor.process(descriptor()).await;

        assert_eq!(outcome.status, Status::Unavailable);
        assert_eq!(outcome.body, "Database Connection Timeout");

        let errors = sink.events_named("errors");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].tag("cause"), Some("db_connection_timeout"));
        assert_eq!(errors[0].tag("customer"), Some("alice"));

        // The rejected request still reports exactly one outcome, but no
        // acquire latency.
        assert_eq!(sink.counter_total("requests"), 1);
        assert_eq!(sink.events_named("requests")[0].tag("status"), Some("503"));
        assert_eq!(sink.events_named("latency").len(), 1);
        assert!(sink.events_named("db_connection_latency").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slot_frees_up_for_the_next_request() {
        let (processor, _sink, pool) = processor(1, 0.0, quiet_spike());
        let held = pool.acquire().await.unwrap();

        let rejected = processor.process(descriptor()).await;
        assert_eq!(rejected.status, Status::Unavailable);

        drop(held);
        let admitted = processor.process(descriptor()).await;
        assert_eq!(admitted.status, Status::Ok);
    }

    #[tokio::test(start_paused = true)]
    async fn spiking_customer_is_counted_and_delayed() {
        let spike = SpikeInjector::new(SpikeConfig {
            interval: Duration::from_secs(300),
            duration: Duration::from_secs(30),
            num_customers: 1,
        });
        let (processor, sink, _pool) = processor(10, 0.0, spike);

        let request = RequestDescriptor::new(
            Some("customer-0".to_owned()),
            Some("operation-0".to_owned()),
        );
        let outcome = processor.process(request).await;

        assert_eq!(outcome.status, Status::Ok);
        assert_eq!(sink.counter_total("spike_requests"), 1);

        let latency = &sink.events_named("latency")[0];
        let MetricValue::Timing(total) = latency.value else {
            panic!("latency must be a timing");
        };
        assert!(total >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_fields_flow_into_metric_tags() {
        let (processor, sink, _pool) = processor(1, 0.0, quiet_spike());

        processor.process(RequestDescriptor::new(None, None)).await;

        let request = &sink.events_named("requests")[0];
        assert_eq!(request.tag("customer"), Some("unknown"));
        assert_eq!(request.tag("operation"), Some("unknown"));
    }
}
