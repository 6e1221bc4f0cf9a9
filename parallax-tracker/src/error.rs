//! Tracker error types.

use std::net::SocketAddr;

use parallax_core::ConfigError;
use thiserror::Error;

use crate::receiver::ReceiverState;

/// Result type for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Errors that can occur while running the eye tracking receiver.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The socket could not be bound to the configured endpoint.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Endpoint that was requested.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The receiver configuration is unusable.
    #[error("Invalid tracker configuration: {0}")]
    Config(#[from] ConfigError),

    /// A socket option or query failed.
    #[error("Socket error: {0}")]
    Socket(#[source] std::io::Error),

    /// The receive thread could not be spawned.
    #[error("Failed to spawn receive thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The operation is not allowed in the receiver's current state.
    #[error("Receiver is {actual:?}, expected {expected:?}")]
    InvalidState {
        /// State the operation requires.
        expected: ReceiverState,
        /// State the receiver is in.
        actual: ReceiverState,
    },
}
