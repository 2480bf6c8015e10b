//! Process-level errors for the hook binary.
//!
//! Only start-up problems and failures of stdin/stdout themselves end up
//! here. Per-request failures are answered in-band and never become a
//! `HookError`.

use thiserror::Error;

use fti_core::RelayError;

#[derive(Debug, Error)]
pub enum HookError {
    /// Reading a request line or writing a response line failed.
    #[error("stdio failure: {0}")]
    Io(#[from] std::io::Error),

    /// The indexer address given on the command line is unusable.
    #[error(transparent)]
    Config(#[from] RelayError),

    /// A global tracing subscriber was already installed.
    #[error("failed to initialise logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}

/// A failed round-trip to the search indexer.
///
/// Always answered with a 500 and followed by dropping the connection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] ureq::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
