//! Shared error type across metricport crates.

use thiserror::Error;

/// Stable, machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid or out-of-range configuration.
    Config,
    /// Unsupported config schema version.
    UnsupportedVersion,
    /// Collector address could not be resolved.
    InvalidAddress,
    /// No reporting client is available.
    NoClient,
    /// A datagram could not be handed to the socket.
    Send,
    /// Registry conflict (duplicate name, kind mismatch).
    Registry,
    /// Anything else.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Config => "CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::InvalidAddress => "INVALID_ADDRESS",
            ErrorCode::NoClient => "NO_CLIENT",
            ErrorCode::Send => "SEND",
            ErrorCode::Registry => "REGISTRY",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricportError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum MetricportError {
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("invalid collector address {addr}: {reason}")]
    InvalidAddress { addr: String, reason: String },
    #[error("no statsd client")]
    NoClient,
    #[error("send failed for {metric}: {source}")]
    Send {
        metric: String,
        #[source]
        source: std::io::Error,
    },
    #[error("registry: {0}")]
    Registry(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl MetricportError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MetricportError::Config(_) => ErrorCode::Config,
            MetricportError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            MetricportError::InvalidAddress { .. } => ErrorCode::InvalidAddress,
            MetricportError::NoClient => ErrorCode::NoClient,
            MetricportError::Send { .. } => ErrorCode::Send,
            MetricportError::Registry(_) => ErrorCode::Registry,
            MetricportError::Internal(_) => ErrorCode::Internal,
        }
    }
}
