//! Tracing integration for metrics.
//!
//! Propagates span fields to metric labels when the `tracing` feature is on.

#[cfg(feature = "tracing")]
use {
    metrics_tracing_context::MetricsLayer,
    tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt},
};

/// Install a global subscriber that formats events, honours `RUST_LOG` and
/// forwards span labels to metrics.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
///
/// ```rust,ignore
/// aeadsafe_metrics::tracing_integration::init_tracing()?;
/// ```
#[cfg(feature = "tracing")]
pub fn init_tracing() -> crate::Result<()> {
    tracing_subscriber::registry()
        .with(MetricsLayer::new())
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()?;
    Ok(())
}
