//! Observability setup for the cat simulator.

pub mod tracing_setup;
