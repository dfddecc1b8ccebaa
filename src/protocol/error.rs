use super::response::AgiResponse;
use std::fmt;

/// Kind of failure reported by the backend for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Channel hung up while the command ran (`HANGUP` line or `(hangup)` qualifier)
    Hangup,
    /// Application failed (`result=-1`)
    AppError,
    /// `510` invalid or unknown command
    InvalidCommand,
    /// `520` usage error
    UsageError,
    /// Any other non-success status
    Unknown,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Hangup => "channel hung up",
            FailureKind::AppError => "application error",
            FailureKind::InvalidCommand => "invalid command",
            FailureKind::UsageError => "usage error",
            FailureKind::Unknown => "unknown error",
        };
        f.write_str(name)
    }
}

/// Errors raised by the routing engine and the command protocol.
#[derive(Debug, thiserror::Error)]
pub enum AgiError {
    /// The backend answered a command with a failure. Only raised when the
    /// call is configured with `raise_on_error`.
    #[error("{kind} (status {}): {}", .response.status_code, .response.message)]
    Command {
        kind: FailureKind,
        response: Box<AgiResponse>,
    },
    /// A result payload could not be decoded into the expected value.
    #[error("unable to convert result {payload:?} to {expected}")]
    Value {
        /// What the payload should have decoded to, e.g. `DTMF character`
        expected: &'static str,
        payload: String,
    },
    /// A required handler parameter had no positional value, query value or default.
    #[error("route `{path}`: missing required parameter `{param}`")]
    Binding { path: String, param: String },
    /// Bound values did not fit a typed handler's parameter struct.
    #[error("route `{path}`: parameters do not fit `{target}`: {message}")]
    InvalidParams {
        path: String,
        target: &'static str,
        message: String,
    },
    /// No route registered for the requested path.
    #[error("no route for path `{0}`")]
    NoRoute(String),
    /// The header block carried no script path.
    #[error("request headers carry no script path")]
    MissingPath,
    /// The transport reached end-of-stream while a response was pending.
    #[error("connection closed while awaiting response to `{command}`")]
    ConnectionClosed { command: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AgiError {
    /// The parsed failure payload, for [`AgiError::Command`].
    #[must_use]
    pub fn response(&self) -> Option<&AgiResponse> {
        match self {
            AgiError::Command { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Failure kind, for [`AgiError::Command`].
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            AgiError::Command { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
