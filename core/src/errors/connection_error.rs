// core/src/errors/connection_error.rs
use thiserror::Error;

/// Transport-level failure while establishing the remote session. Fatal for
/// the whole batch.
#[derive(Debug, Clone, Error)]
pub enum ConnectionError {
    #[error("tcp connect to {addr} failed: {message}")]
    Tcp { addr: String, message: String },

    #[error("ssh handshake failed: {0}")]
    Handshake(String),

    #[error("authentication failed for user {username}: {message}")]
    Auth { username: String, message: String },

    #[error("connect timed out after {0}ms")]
    Timeout(u64),

    #[error("connect task failed: {0}")]
    Join(String),
}

/// Caller-side mistakes detected before any session is opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("connection is missing a host")]
    MissingHost,

    #[error("connection is missing a username")]
    MissingUsername,

    #[error("connection has neither a password nor a key file")]
    MissingCredentials,

    #[error("connection has both a password and a key file; exactly one is required")]
    AmbiguousCredentials,

    #[error("task description is empty")]
    EmptyDescription,
}

/// Failure of a single command on an already established session.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("session is not connected")]
    NotConnected,

    #[error("channel error: {0}")]
    Channel(String),

    #[error("command timed out after {0}s")]
    Timeout(u64),

    #[error("batch deadline exceeded")]
    DeadlineExceeded,

    #[error("exec task failed: {0}")]
    Join(String),
}
