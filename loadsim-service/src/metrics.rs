//! Fire-and-forget metrics emission.
//!
//! The core reports outcomes through the [`MetricsSink`] capability and never
//! blocks on or inspects the backend. [`RecorderSink`] forwards everything to
//! the [`metrics`] facade, so whichever exporter the process installs receives
//! the emissions; [`RecordingSink`] captures them in memory for tests.

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

/// A tag attached to a metric emission, e.g. `("cause", "db_connection_timeout")`.
pub type Tag = (&'static str, String);

/// Capability for emitting counters, timings and gauges.
///
/// Implementations must be cheap and non-blocking; emissions carry no
/// result the core could act on.
pub trait MetricsSink: fmt::Debug + Send + Sync {
    /// Increments a counter by `value`.
    fn count(&self, name: &'static str, value: u64, tags: &[Tag]);

    /// Records one timing observation.
    fn timing(&self, name: &'static str, duration: Duration, tags: &[Tag]);

    /// Sets a gauge to `value`.
    fn gauge(&self, name: &'static str, value: f64);
}

/// Sink backed by the global [`metrics`] recorder.
///
/// Without an installed recorder the emissions are no-ops, which keeps the
/// fire-and-forget contract.
#[derive(Debug, Default)]
pub struct RecorderSink;

impl MetricsSink for RecorderSink {
    fn count(&self, name: &'static str, value: u64, tags: &[Tag]) {
        metrics::counter!(name, tags).increment(value);
    }

    fn timing(&self, name: &'static str, duration: Duration, tags: &[Tag]) {
        metrics::histogram!(name, tags).record(duration.as_secs_f64());
    }

    fn gauge(&self, name: &'static str, value: f64) {
        metrics::gauge!(name).set(value);
    }
}

/// A single captured emission, as recorded by [`RecordingSink`].
#[derive(Clone, Debug, PartialEq)]
pub struct MetricEvent {
    /// Metric name, e.g. `"requests"`.
    pub name: &'static str,
    /// The recorded value.
    pub value: MetricValue,
    /// Tags in emission order.
    pub tags: Vec<Tag>,
}

impl MetricEvent {
    /// Returns the value of the given tag, if present.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// The value carried by a [`MetricEvent`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MetricValue {
    /// A counter increment.
    Count(u64),
    /// A timing observation.
    Timing(Duration),
    /// A gauge value.
    Gauge(f64),
}

/// An in-memory sink capturing all emissions, for use in tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<MetricEvent>>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all captured emissions.
    pub fn events(&self) -> Vec<MetricEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Returns all captured emissions with the given name.
    pub fn events_named(&self, name: &str) -> Vec<MetricEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.name == name)
            .collect()
    }

    /// Returns the summed counter value for the given name.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.events_named(name)
            .iter()
            .filter_map(|event| match event.value {
                MetricValue::Count(value) => Some(value),
                _ => None,
            })
            .sum()
    }

    fn push(&self, event: MetricEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl MetricsSink for RecordingSink {
    fn count(&self, name: &'static str, value: u64, tags: &[Tag]) {
        self.push(MetricEvent {
            name,
            value: MetricValue::Count(value),
            tags: tags.to_vec(),
        });
    }

    fn timing(&self, name: &'static str, duration: Duration, tags: &[Tag]) {
        self.push(MetricEvent {
            name,
            value: MetricValue::Timing(duration),
            tags: tags.to_vec(),
        });
    }

    fn gauge(&self, name: &'static str, value: f64) {
        self.push(MetricEvent {
            name,
            value: MetricValue::Gauge(value),
            tags: Vec::new(),
        });
    }
}
