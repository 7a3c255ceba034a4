//! Error types at the tracer boundary
//!
//! [`TracerError`] describes what went wrong talking to the tracer. The
//! session converts every one of them into a [`SessionError`] (a message and
//! an optional source line) before anything else sees it; the diff engine and
//! playback controller never observe tracer failures.

use std::fmt;

/// Failures reported by a [`Tracer`](super::tracer::Tracer)
#[derive(Debug, Clone, PartialEq)]
pub enum TracerError {
    /// Transport failure: connection refused, timeout, unreadable file
    Unreachable { message: String },

    /// The tracer ran the program and it failed
    Execution { message: String, line: Option<u32> },

    /// The tracer answered with something that is neither a trace nor an error
    InvalidResponse { message: String },
}

impl TracerError {
    pub fn line(&self) -> Option<u32> {
        match self {
            TracerError::Execution { line, .. } => *line,
            TracerError::Unreachable { .. } | TracerError::InvalidResponse { .. } => None,
        }
    }
}

impl fmt::Display for TracerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TracerError::Unreachable { message } => {
                write!(f, "Tracer unreachable: {}", message)
            }
            TracerError::Execution {
                message,
                line: Some(line),
            } => {
                write!(f, "{} (line {})", message, line)
            }
            TracerError::Execution { message, line: None } => write!(f, "{}", message),
            TracerError::InvalidResponse { message } => {
                write!(f, "Invalid tracer response: {}", message)
            }
        }
    }
}

impl std::error::Error for TracerError {}

/// Structured error surfaced to the caller of a trace session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionError {
    pub message: String,
    pub line: Option<u32>,
}

impl From<TracerError> for SessionError {
    fn from(err: TracerError) -> Self {
        let line = err.line();
        let message = match err {
            TracerError::Execution { message, .. } => message,
            other => other.to_string(),
        };
        SessionError { message, line }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "Error on line {}: {}", line, self.message),
            None => write!(f, "Error: {}", self.message),
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_keeps_line() {
        let err: SessionError = TracerError::Execution {
            message: "name 'x' is not defined".to_string(),
            line: Some(3),
        }
        .into();
        assert_eq!(err.line, Some(3));
        assert_eq!(err.message, "name 'x' is not defined");
        assert_eq!(err.to_string(), "Error on line 3: name 'x' is not defined");
    }

    #[test]
    fn test_transport_error_has_no_line() {
        let err: SessionError = TracerError::Unreachable {
            message: "connection refused".to_string(),
        }
        .into();
        assert_eq!(err.line, None);
        assert_eq!(err.message, "Tracer unreachable: connection refused");
    }
}
