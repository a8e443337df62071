//! The loadsim server component.
//!
//! This builds on top of [`loadsim_service`], exposing the simulation core
//! over an HTTP layer and optionally driving it with an embedded load
//! generator.

pub mod config;
pub mod endpoints;
pub mod observability;
pub mod state;
pub mod web;
