//! The simulation core: a capacity-bounded resource pool, a recurring
//! hot-customer contention injector, and the per-request processing pipeline
//! that ties them together.
//!
//! It is designed as a library crate to be used by the `loadsim-server`, which
//! provides the HTTP transport and process wiring around it.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod error;
mod metrics;
mod pool;
mod processor;
mod spike;

pub use crate::error::{Error, Result};
pub use crate::metrics::{MetricEvent, MetricValue, MetricsSink, RecorderSink, RecordingSink, Tag};
pub use crate::pool::{PoolPermit, ResourcePool};
pub use crate::processor::{Outcome, RequestDescriptor, RequestProcessor, SimulationConfig, Status};
pub use crate::spike::{InjectedDelay, SpikeConfig, SpikeInjector};
