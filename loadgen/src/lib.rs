//! Synthetic load generator for the loadsim server.
//!
//! The generator runs in one-second rounds. Each round queries the current
//! target rate `R`, dispatches `R` requests evenly spaced across the second,
//! and then waits for every dispatched request to finish before starting the
//! next round. Individual request failures are logged and isolated; they never
//! abort the round.
//!
//! The crate ships both as a library (the server embeds it to generate its
//! own load) and as a standalone binary for driving a remote instance.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod generator;
pub mod rate;

pub use crate::generator::LoadGenerator;
pub use crate::rate::{ConstantRate, RateSource};
