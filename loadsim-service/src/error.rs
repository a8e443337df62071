use thiserror::Error;

/// Errors that can occur in the simulation core.
#[derive(Debug, Error)]
pub enum Error {
    /// No pool slot became available within the acquire timeout.
    ///
    /// This is an expected outcome under load, not a fault. Callers classify
    /// it as a `db_connection_timeout` and keep going.
    #[error("timed out waiting for a database connection")]
    PoolExhausted,
}

/// Result type for the simulation core.
pub type Result<T, E = Error> = std::result::Result<T, E>;
