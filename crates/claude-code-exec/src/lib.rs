//! Subprocess transport for the Claude Code CLI.
//!
//! The SDK does not speak HTTP; every request becomes an invocation of the
//! `claude` binary with `-p <prompt>` and an output format of `json` or
//! `stream-json`. This crate owns the argv construction, process lifecycle
//! (timeout, exit-status mapping) and the NDJSON line framing of streamed
//! output.

pub mod args;
pub mod error;

pub use args::{build_args, ExecParams, OutputFormat};
pub use error::ExecError;

use std::collections::HashMap;
use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use once_cell::sync::Lazy;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, instrument, warn};

/// Environment variable overriding the default CLI binary location.
pub const CLI_PATH_ENV: &str = "CLAUDE_CODE_CLI_PATH";

/// Default per-invocation timeout, matching the CLI's long-running turns.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

static DEFAULT_CLI_PATH: Lazy<String> =
    Lazy::new(|| std::env::var(CLI_PATH_ENV).unwrap_or_else(|_| "claude".to_string()));

/// Stream of raw stdout lines from a `stream-json` invocation.
pub type LineStream = BoxStream<'static, Result<String, ExecError>>;

/// Configuration for [`ClaudeCliExecutor`].
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Binary invoked for every request.
    pub cli_path: String,
    /// Timeout applied when a request carries none of its own.
    pub timeout: Duration,
    /// Extra environment merged over the parent environment at spawn time.
    pub env: HashMap<String, String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            cli_path: DEFAULT_CLI_PATH.clone(),
            timeout: DEFAULT_TIMEOUT,
            env: HashMap::new(),
        }
    }
}

/// Transport seam between the SDK namespaces and the CLI process.
///
/// Tests substitute their own implementation to run the full SDK surface
/// without a `claude` binary on the machine.
#[async_trait]
pub trait CliExecutor: Send + Sync {
    /// Runs the CLI to completion and returns its stdout.
    async fn execute(&self, params: ExecParams) -> Result<String, ExecError>;

    /// Runs the CLI in `stream-json` mode and yields stdout line by line.
    async fn execute_stream(&self, params: ExecParams) -> Result<LineStream, ExecError>;
}

/// Production executor spawning the real CLI binary.
#[derive(Debug, Clone)]
pub struct ClaudeCliExecutor {
    config: ExecutorConfig,
}

impl Default for ClaudeCliExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

impl ClaudeCliExecutor {
    #[must_use]
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new(&self.config.cli_path);
        command
            .args(args)
            .envs(&self.config.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn spawn_error(&self, source: io::Error) -> ExecError {
        ExecError::Spawn {
            cli_path: self.config.cli_path.clone(),
            source,
        }
    }
}

#[async_trait]
impl CliExecutor for ClaudeCliExecutor {
    #[instrument(name = "claude_exec.execute", skip_all)]
    async fn execute(&self, params: ExecParams) -> Result<String, ExecError> {
        let timeout = params.timeout.unwrap_or(self.config.timeout);
        let args = build_args(&params);
        debug!(target: "claude_exec", args = ?args, timeout = ?timeout, "invoking Claude Code CLI");

        let child = self
            .command(&args)
            .spawn()
            .map_err(|source| self.spawn_error(source))?;

        // kill_on_drop reaps the child when the timeout branch drops the
        // wait future.
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(ExecError::Timeout { timeout }),
        };

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(ExecError::ExitStatus {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        if !stderr.trim().is_empty() {
            warn!(target: "claude_exec", stderr = %stderr.trim_end(), "Claude Code CLI wrote to stderr");
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    #[instrument(name = "claude_exec.execute_stream", skip_all)]
    async fn execute_stream(&self, params: ExecParams) -> Result<LineStream, ExecError> {
        let mut params = params;
        params.output_format = Some(OutputFormat::StreamJson);
        let args = build_args(&params);
        debug!(target: "claude_exec", args = ?args, "starting Claude Code CLI stream");

        let mut child = self
            .command(&args)
            .spawn()
            .map_err(|source| self.spawn_error(source))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ExecError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "child stdout was not captured",
            ))
        })?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!(target: "claude_exec", stderr = %line, "Claude Code CLI stream stderr");
                }
            });
        }

        let (tx, rx) = mpsc::unbounded_channel::<Result<String, ExecError>>();

        tokio::spawn(async move {
            let mut frames = FramedRead::new(stdout, LinesCodec::new());
            while let Some(frame) = frames.next().await {
                let item = frame.map_err(|error| {
                    ExecError::Io(io::Error::new(io::ErrorKind::InvalidData, error))
                });
                if tx.send(item).is_err() {
                    // Consumer dropped the stream; stop the CLI.
                    let _ = child.start_kill();
                    break;
                }
            }

            match child.wait().await {
                Ok(status) if !status.success() => {
                    let _ = tx.send(Err(ExecError::ExitStatus {
                        code: status.code().unwrap_or(-1),
                        stderr: String::new(),
                    }));
                }
                Ok(_) => {}
                Err(error) => {
                    let _ = tx.send(Err(ExecError::Io(error)));
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });

        Ok(stream.boxed())
    }
}
