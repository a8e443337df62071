use std::sync::Arc;

use loadsim_service::{
    MetricsSink, RecorderSink, RequestProcessor, ResourcePool, SimulationConfig, SpikeConfig,
    SpikeInjector,
};

use crate::config::Config;

/// Shared reference to the [server state](State).
pub type ServiceState = Arc<State>;

/// Shared resources of the loadsim server.
///
/// This structure is created during server startup and shared with all HTTP
/// request handlers. In request handlers, use
/// `axum::extract::State<ServiceState>` to retrieve a shared reference.
#[derive(Debug)]
pub struct State {
    /// The server configuration.
    pub config: Config,
    /// The request processing pipeline over the shared pool and spike state.
    pub processor: RequestProcessor,
    /// Handle on the shared admission pool, for occupancy introspection.
    pub pool: ResourcePool,
}

impl State {
    /// Builds the simulation core from the configuration.
    ///
    /// This also emits the startup gauges describing the synthetic
    /// population.
    pub fn new(config: Config) -> ServiceState {
        let metrics: Arc<dyn MetricsSink> = Arc::new(RecorderSink);

        let simulation = &config.simulation;
        let pool = ResourcePool::new(simulation.max_db_connections, simulation.acquire_timeout);
        let spike = SpikeInjector::new(SpikeConfig {
            interval: config.spike.interval,
            duration: config.spike.duration,
            num_customers: simulation.num_customers,
        });
        let processor = RequestProcessor::new(
            pool.clone(),
            spike,
            Arc::clone(&metrics),
            SimulationConfig {
                failure_probability: simulation.failure_probability,
                max_work_delay: simulation.max_work_delay,
            },
        );

        metrics.gauge("num_customers", simulation.num_customers as f64);
        metrics.gauge("num_operations", simulation.num_operations as f64);

        Arc::new(Self {
            config,
            processor,
            pool,
        })
    }
}
