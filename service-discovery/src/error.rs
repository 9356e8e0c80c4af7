//! Error types for the discovery crate.

use thiserror::Error;

/// Errors returned by the discovery façade and its collaborators.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Error from the underlying mDNS daemon.
    #[error("mDNS error: {0}")]
    Mdns(#[from] mdns_sd::Error),

    /// The announcement could not be turned into a valid mDNS record.
    #[error("Service info error: {0}")]
    ServiceInfo(String),

    /// Port 0 cannot be announced.
    #[error("Invalid port 0 for service {0}")]
    InvalidPort(String),

    /// Another id already announces the same instance.
    #[error("Instance {fullname} is already announced by service {owner}")]
    NameConflict { fullname: String, owner: String },

    /// The registry thread has stopped.
    #[error("Registry is no longer running")]
    RegistryClosed,
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for DiscoveryError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        DiscoveryError::RegistryClosed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for DiscoveryError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        DiscoveryError::RegistryClosed
    }
}

/// Errors a service can report when it fails to begin operating.
#[derive(Debug, Error)]
pub enum StartError {
    /// Start was cancelled before the service came up.
    #[error("Service start cancelled")]
    Cancelled,

    /// The service could not bind its listener.
    #[error("Failed to bind: {0}")]
    Bind(#[from] std::io::Error),

    #[error("Service failed to start: {0}")]
    Failed(String),
}
