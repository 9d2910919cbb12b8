//! Metrics collection and export for aeadsafe.
//!
//! Wraps the `metrics` facade. With the `prometheus` feature, metrics are
//! exported in Prometheus format. With the `tracing` feature, span context is
//! propagated to metric labels.
//!
//! ```rust,ignore
//! use aeadsafe_metrics::{counter, labels, safe};
//!
//! counter!(safe::LOCKS_TOTAL, labels::VERSION => "1").increment(1);
//! ```

mod definitions;
mod error;
mod recorder;
pub mod tracing_integration;

pub use {
    definitions::*,
    error::{Error, Result},
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, histogram};
