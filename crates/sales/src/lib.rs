//! Composition root of the sales backend.
//!
//! Reads [`Config`] from the environment, sets up tracing and metrics, and
//! wires the stores, validators, event handlers and interactors together in
//! [`SalesServices`].

pub mod config;
pub mod container;
pub mod error;
pub mod telemetry;

pub use config::{Config, LogFormat};
pub use container::SalesServices;
pub use error::SetupError;
