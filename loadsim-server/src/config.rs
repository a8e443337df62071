//! Configuration for the loadsim server.
//!
//! Configuration can be loaded from multiple sources with the following
//! precedence (highest to lowest):
//!
//! 1. Environment variables (prefixed with `LOADSIM__`)
//! 2. YAML configuration file (specified via the `-c`/`--config` flag)
//! 3. Defaults
//!
//! Environment variables use double underscores (`__`) to denote nesting, for
//! example:
//!
//! - `LOADSIM__HTTP_ADDR=0.0.0.0:8888` sets the listening address
//! - `LOADSIM__SPIKE__DURATION=45s` sets the spike window length
//! - `LOADSIM__LOAD_GENERATOR__ENABLED=false` disables the embedded generator
//!
//! The equivalent YAML:
//!
//! ```yaml
//! http_addr: 0.0.0.0:8888
//!
//! spike:
//!   duration: 45s
//!
//! load_generator:
//!   enabled: false
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "LOADSIM__";

/// Top-level server configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Address the HTTP server listens on.
    ///
    /// Defaults to `0.0.0.0:6767`.
    pub http_addr: SocketAddr,

    /// Metrics exporter configuration.
    pub metrics: Metrics,

    /// Tunables for the simulated backend.
    pub simulation: Simulation,

    /// Hot-customer spike window configuration.
    pub spike: Spike,

    /// Embedded load generator configuration.
    pub load_generator: LoadGenerator,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 6767)),
            metrics: Metrics::default(),
            simulation: Simulation::default(),
            spike: Spike::default(),
            load_generator: LoadGenerator::default(),
        }
    }
}

/// Metrics exporter configuration.
///
/// Used in: [`Config::metrics`]
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Metrics {
    /// Listen address for the Prometheus scrape endpoint.
    ///
    /// When unset, no exporter is installed and emissions are dropped.
    pub addr: Option<SocketAddr>,
}

/// Tunables for the simulated backend.
///
/// Used in: [`Config::simulation`]
#[derive(Debug, Deserialize, Serialize)]
pub struct Simulation {
    /// Capacity of the simulated database connection pool.
    pub max_db_connections: usize,

    /// How long a request waits for a pool slot before it is rejected.
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,

    /// Upper bound for the simulated per-request processing delay.
    #[serde(with = "humantime_serde")]
    pub max_work_delay: Duration,

    /// Probability of a simulated internal failure per request.
    pub failure_probability: f64,

    /// Size of the synthetic customer population.
    pub num_customers: u32,

    /// Number of synthetic operation kinds.
    pub num_operations: u32,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            max_db_connections: 1000,
            acquire_timeout: Duration::from_millis(50),
            max_work_delay: Duration::from_millis(50),
            failure_probability: 0.05,
            num_customers: 100,
            num_operations: 10,
        }
    }
}

/// Hot-customer spike window configuration.
///
/// Used in: [`Config::spike`]
#[derive(Debug, Deserialize, Serialize)]
pub struct Spike {
    /// Wall-clock time between spike window starts.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// How long a spike window stays active.
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
}

impl Default for Spike {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
            duration: Duration::from_secs(30),
        }
    }
}

/// Embedded load generator configuration.
///
/// Used in: [`Config::load_generator`]
#[derive(Debug, Deserialize, Serialize)]
pub struct LoadGenerator {
    /// Whether the server drives itself with synthetic load.
    pub enabled: bool,

    /// Target request rate per one-second round.
    pub requests_per_second: u32,
}

impl Default for LoadGenerator {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 500,
        }
    }
}

impl Config {
    /// Loads configuration from defaults, an optional YAML file, and the
    /// environment, in that order of precedence (later sources win).
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML file cannot be read or parsed, or if any
    /// source contains invalid values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }
}
