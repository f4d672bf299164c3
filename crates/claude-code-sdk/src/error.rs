use claude_code_exec::ExecError;
use thiserror::Error;

/// Result alias used across the SDK surface.
pub type Result<T> = std::result::Result<T, ClaudeCodeError>;

/// SDK-level error carrying OpenAI/Anthropic-style status codes.
#[derive(Debug, Error)]
pub enum ClaudeCodeError {
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("failed to decode CLI output: {message}")]
    Parse { message: String },
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

impl ClaudeCodeError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Numeric status in the convention of the original SDK error shape.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Exec(error) => error.status(),
            Self::Parse { .. } => 500,
            Self::InvalidRequest { .. } => 400,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Exec(_) => "exec_error",
            Self::Parse { .. } => "parse_error",
            Self::InvalidRequest { .. } => "invalid_request",
        }
    }
}
