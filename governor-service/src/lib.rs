//! Governor Service Layer
//!
//! Wraps the budget governor in a tokio runtime: a background runner
//! drives the landing-entry and landing-update sweeps on independent
//! timers, a builder composes the governor with its collaborators, and
//! telemetry initialization lives here so the domain crate stays free of
//! subscriber concerns.

pub mod builder;
pub mod config;
pub mod runner;
pub mod telemetry;

pub use builder::{GovernorService, GovernorServiceBuilder};
pub use config::ServiceConfig;
pub use runner::{BackgroundRunner, RunnerHandle};
pub use telemetry::{init_tracing, TelemetryConfig};
