//! Setup errors for the recorder and the tracing subscriber.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The Prometheus recorder could not be built or installed.
    #[cfg(feature = "prometheus")]
    #[error("prometheus recorder: {0}")]
    Prometheus(#[from] metrics_exporter_prometheus::BuildError),

    /// A global tracing subscriber is already installed.
    #[cfg(feature = "tracing")]
    #[error("tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

pub type Result<T> = std::result::Result<T, Error>;
