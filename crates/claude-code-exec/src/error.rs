use std::time::Duration;

use thiserror::Error;

/// Failures raised by the Claude Code CLI transport.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn Claude Code CLI at `{cli_path}`: {source}")]
    Spawn {
        cli_path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Claude Code CLI execution timed out after {}ms", .timeout.as_millis())]
    Timeout { timeout: Duration },
    #[error("Claude Code CLI exited with code {code}{}", stderr_suffix(.stderr))]
    ExitStatus { code: i32, stderr: String },
    #[error("I/O failure while driving the Claude Code CLI: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecError {
    /// Numeric status in the convention of the OpenAI/Anthropic SDK error
    /// shapes: 408 for timeouts, 500 for spawn or I/O failures, and the
    /// process exit code otherwise.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Timeout { .. } => 408,
            Self::ExitStatus { code, .. } => u16::try_from(*code).unwrap_or(500),
            Self::Spawn { .. } | Self::Io(_) => 500,
        }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        String::new()
    } else {
        format!("; stderr: {}", stderr.trim_end())
    }
}
