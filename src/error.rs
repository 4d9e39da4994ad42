//! Error types for the RSI endpoint.
//!
//! The taxonomy is deliberately closed: every public operation returns one
//! of these codes and nothing panics across the API boundary. Inside the
//! engine loop, parse and transmit failures are absorbed: the protocol has
//! no acknowledgement, so the only remediation is to wait for the robot's
//! next cycle.
//!
//! # Which errors mean what
//!
//! ## Fatal (fix and retry)
//!
//! - **`SocketFailed`**: socket creation, bind, or non-blocking
//!   configuration failed. Check the bind address and that no other
//!   endpoint already holds the port.
//! - **`ThreadFailed`**: the engine thread could not be spawned.
//!
//! ## Lifecycle preconditions (caller bug)
//!
//! - **`InitFailed`**: the endpoint was not initialized before the call.
//! - **`AlreadyRunning`**: the call expected the endpoint to be stopped.
//! - **`NotRunning`**: the call expected the endpoint to be running.
//!
//! All three leave the endpoint state unchanged.
//!
//! ## Configuration
//!
//! - **`InvalidParam`**: a configuration value failed validation (for
//!   example a bind address that is not numeric IPv4).
//!
//! `Timeout` is reserved and currently has no caller.

use thiserror::Error;

/// Errors returned by RSI endpoint operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("Initialization failed")]
    InitFailed,

    #[error("RSI is already running")]
    AlreadyRunning,

    #[error("RSI is not running")]
    NotRunning,

    #[error("Socket creation or binding failed")]
    SocketFailed,

    #[error("Thread creation failed")]
    ThreadFailed,

    #[error("Invalid parameter provided")]
    InvalidParam,

    #[error("Operation timed out")]
    Timeout,

    #[error("Unknown error")]
    Unknown,
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_strings() {
        assert_eq!(Error::InitFailed.to_string(), "Initialization failed");
        assert_eq!(Error::AlreadyRunning.to_string(), "RSI is already running");
        assert_eq!(Error::NotRunning.to_string(), "RSI is not running");
        assert_eq!(
            Error::SocketFailed.to_string(),
            "Socket creation or binding failed"
        );
        assert_eq!(Error::ThreadFailed.to_string(), "Thread creation failed");
        assert_eq!(
            Error::InvalidParam.to_string(),
            "Invalid parameter provided"
        );
        assert_eq!(Error::Timeout.to_string(), "Operation timed out");
        assert_eq!(Error::Unknown.to_string(), "Unknown error");
    }
}
