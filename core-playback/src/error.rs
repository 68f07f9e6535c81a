//! # Streamer Error Types
//!
//! Error types for remote stream control operations.

use thiserror::Error;

use crate::session::PlayerState;

/// Errors that can occur while controlling a remote stream.
#[derive(Error, Debug)]
pub enum StreamError {
    // ========================================================================
    // Caller Errors
    // ========================================================================
    /// A command argument failed validation before reaching the backend.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A command was issued in a state that does not accept it.
    #[error("Cannot {command} while {state}")]
    InvalidState {
        command: &'static str,
        state: PlayerState,
    },

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// The platform media backend reported a failure.
    #[error("Backend error: {0}")]
    Backend(String),

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// The streamer engine has been shut down and accepts no more commands.
    #[error("Streamer has been shut down")]
    Terminated,
}

impl StreamError {
    /// Build an invalid-state error for a rejected command.
    pub(crate) fn invalid_state(command: &'static str, state: PlayerState) -> Self {
        Self::InvalidState { command, state }
    }

    /// Returns `true` if this error reflects caller misuse rather than a
    /// backend failure.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            StreamError::InvalidArgument(_) | StreamError::InvalidState { .. }
        )
    }
}

impl From<bridge_traits::BridgeError> for StreamError {
    fn from(err: bridge_traits::BridgeError) -> Self {
        StreamError::Backend(err.to_string())
    }
}

/// Result type for streamer operations.
pub type Result<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message() {
        let err = StreamError::invalid_state("seek", PlayerState::Idle);
        assert_eq!(err.to_string(), "Cannot seek while idle");
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_backend_error_from_bridge() {
        let bridge = bridge_traits::BridgeError::OperationFailed("codec died".into());
        let err: StreamError = bridge.into();
        assert!(matches!(err, StreamError::Backend(_)));
        assert!(!err.is_caller_error());
    }
}
