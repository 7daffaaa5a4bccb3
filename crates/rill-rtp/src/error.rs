//! # Error Surface
//!
//! One error enum for the whole send path. Socket failures carry the
//! underlying `io::Error` verbatim; packetizer failures propagate unchanged
//! through the format router.

use thiserror::Error;

/// Errors produced by the rill-rtp send path.
#[derive(Debug, Error)]
pub enum RtpError {
    /// A required runtime resource could not be allocated or has gone away.
    #[error("resource error: {0}")]
    Resource(&'static str),

    /// Socket initialization, option setting, bind, or send failed.
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),

    /// The selected packetizer rejected the frame.
    #[error("packetizer error: {0}")]
    Packetizer(String),

    /// Malformed caller input (empty frame, unresolvable address, ...).
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// `start()` was called on a writer that is already running.
    #[error("writer already started")]
    AlreadyStarted,

    /// The operation requires a started writer.
    #[error("writer not started")]
    NotStarted,

    /// The dispatcher did not terminate within the caller's deadline.
    #[error("dispatcher stop timed out")]
    StopTimedOut,
}

pub type RtpResult<T> = Result<T, RtpError>;
