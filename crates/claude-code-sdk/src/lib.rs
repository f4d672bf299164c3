//! Rust SDK for the Claude Code CLI.
//!
//! [`ClaudeCode`] mirrors the resource layout of the OpenAI and Anthropic
//! clients over a subprocess transport:
//!
//! ```no_run
//! use claude_code_sdk::types::{OpenAiCompletionParams, OpenAiMessage, Role};
//! use claude_code_sdk::{ClaudeCode, ClaudeCodeOptions};
//!
//! # async fn demo() -> claude_code_sdk::Result<()> {
//! let claude = ClaudeCode::new(ClaudeCodeOptions::default());
//!
//! let completion = claude
//!     .chat
//!     .completions
//!     .create(OpenAiCompletionParams {
//!         model: "claude-code".to_string(),
//!         messages: vec![OpenAiMessage::new(Role::User, "Write a haiku about borrowck")],
//!         max_tokens: Some(1000),
//!         ..OpenAiCompletionParams::default()
//!     })
//!     .await?;
//!
//! println!("{}", completion.text().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod convert;
pub mod error;
pub mod messages;
pub mod sessions;
pub mod tools;
pub mod types;

pub use chat::{Chat, ChatCompletions, ChunkStream};
pub use error::{ClaudeCodeError, Result};
pub use messages::{EventStream, Messages};
pub use sessions::{Session, SessionContinueParams, SessionParams, Sessions};
pub use tools::{ToolCreateParams, Tools};

pub use claude_code_exec::{
    ClaudeCliExecutor, CliExecutor, ExecError, ExecParams, ExecutorConfig, OutputFormat,
};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

/// Environment variable consulted for the default API key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Environment variable carrying the MCP endpoint into the CLI process.
pub const MCP_URL_ENV: &str = "CLAUDE_CODE_MCP_URL";

/// Options accepted by [`ClaudeCode::new`].
#[derive(Debug, Clone, Default)]
pub struct ClaudeCodeOptions {
    /// Falls back to `ANTHROPIC_API_KEY` when unset.
    pub api_key: Option<String>,
    /// Falls back to `CLAUDE_CODE_CLI_PATH`, then `claude`.
    pub cli_path: Option<String>,
    /// Default per-call timeout; 300 s when unset.
    pub timeout: Option<Duration>,
    /// MCP endpoint surfaced to the CLI as `CLAUDE_CODE_MCP_URL`.
    pub mcp_server: Option<String>,
}

/// Entry point holding the resource namespaces.
pub struct ClaudeCode {
    pub chat: Chat,
    pub messages: Messages,
    pub sessions: Sessions,
    pub tools: Tools,
    executor: Arc<dyn CliExecutor>,
    config: Option<ExecutorConfig>,
}

impl ClaudeCode {
    /// Builds a client over the real CLI executor.
    #[must_use]
    pub fn new(options: ClaudeCodeOptions) -> Self {
        let api_key = options
            .api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok());

        let mut env = HashMap::new();
        if let Some(key) = api_key {
            env.insert(API_KEY_ENV.to_string(), key);
        }
        if let Some(url) = &options.mcp_server {
            env.insert(MCP_URL_ENV.to_string(), url.clone());
        }

        let mut config = ExecutorConfig::default();
        if let Some(cli_path) = options.cli_path {
            config.cli_path = cli_path;
        }
        if let Some(timeout) = options.timeout {
            config.timeout = timeout;
        }
        config.env = env;

        debug!(
            target: "claude_sdk",
            cli_path = %config.cli_path,
            timeout = ?config.timeout,
            "Claude Code client initialized"
        );

        let mut client = Self::with_executor(Arc::new(ClaudeCliExecutor::new(config.clone())));
        client.config = Some(config);
        client
    }

    /// Wires the namespaces over a caller-provided transport.
    #[must_use]
    pub fn with_executor(executor: Arc<dyn CliExecutor>) -> Self {
        Self {
            chat: Chat::new(executor.clone()),
            messages: Messages::new(executor.clone()),
            sessions: Sessions::new(executor.clone()),
            tools: Tools::new(),
            executor,
            config: None,
        }
    }

    /// The transport behind this client.
    #[must_use]
    pub fn executor(&self) -> Arc<dyn CliExecutor> {
        self.executor.clone()
    }

    /// Points subsequent calls at an MCP server.
    ///
    /// Applies only to clients built over the real CLI executor; sessions
    /// created before the change keep the previous transport.
    pub fn set_mcp_server(&mut self, url: impl Into<String>) {
        let url = url.into();
        match &mut self.config {
            Some(config) => {
                config.env.insert(MCP_URL_ENV.to_string(), url);
                let executor: Arc<dyn CliExecutor> =
                    Arc::new(ClaudeCliExecutor::new(config.clone()));
                self.rewire(executor);
            }
            None => {
                warn!(
                    target: "claude_sdk",
                    "custom transport in use; MCP endpoint not applied"
                );
            }
        }
    }

    fn rewire(&mut self, executor: Arc<dyn CliExecutor>) {
        self.executor = executor.clone();
        self.chat = Chat::new(executor.clone());
        self.messages = Messages::new(executor.clone());
        self.sessions = Sessions::new(executor);
    }
}
