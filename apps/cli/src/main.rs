use std::io::Write;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use futures::StreamExt;
use indicatif::ProgressBar;
use serde::Deserialize;
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

use claude_code_sdk::convert::anthropic_to_openai_tools;
use claude_code_sdk::types::{
    AnthropicMessage, AnthropicMessageParams, OpenAiCompletionParams, OpenAiMessage,
    PromptMessage, Role,
};
use claude_code_sdk::{
    ClaudeCode, ClaudeCodeOptions, SessionContinueParams, SessionParams, ToolCreateParams,
};
use output::{OutputFormat, Renderer};
use progress::spinner;

#[derive(Debug, Parser)]
#[command(
    name = "claude-code",
    version,
    about = "Drive the Claude Code CLI through the SDK from the shell."
)]
struct Cli {
    /// Preferred renderer for command output.
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    /// Model identifier forwarded with each request.
    #[arg(long, global = true)]
    model: Option<String>,
    /// Override the Claude Code CLI binary location.
    #[arg(long, global = true)]
    cli_path: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    /// Suppress non-critical CLI output.
    #[arg(long, global = true)]
    quiet: bool,
    /// Disable progress indicators for long-running requests.
    #[arg(long, global = true)]
    no_progress: bool,
    /// Disable ANSI colors in CLI output.
    #[arg(long, global = true)]
    no_color: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ask for a completion through the OpenAI-style surface.
    Ask {
        prompt: String,
        /// System prompt prepended to the conversation.
        #[arg(long)]
        system: Option<String>,
        #[arg(long)]
        max_tokens: Option<u32>,
        #[arg(long)]
        temperature: Option<f64>,
        /// Attach the registered tool declarations to the request.
        #[arg(long)]
        use_tools: bool,
    },
    /// Send a message through the Anthropic-style surface.
    Message {
        prompt: String,
        #[arg(long)]
        max_tokens: Option<u32>,
        #[arg(long)]
        temperature: Option<f64>,
    },
    /// Stream a completion, flushing deltas as they arrive.
    Stream {
        prompt: String,
        /// Consume Anthropic-style events instead of OpenAI-style chunks.
        #[arg(long)]
        anthropic: bool,
    },
    /// Manage the active multi-turn session.
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },
    /// Inspect and register tool declarations.
    Tools {
        #[command(subcommand)]
        command: ToolCommand,
    },
    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand)]
enum SessionCommand {
    /// Start a session and remember its id.
    New { prompt: String },
    /// Continue the remembered session.
    Continue { prompt: String },
    /// Show the remembered session id.
    Show,
    /// Forget the remembered session.
    Clear,
}

#[derive(Debug, Subcommand)]
enum ToolCommand {
    /// List registered tool declarations.
    List,
    /// Register a tool declaration.
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Input schema as JSON (`{"type": "object"}`) or @path to a JSON file.
        #[arg(long)]
        schema: String,
    },
    /// Unregister a tool declaration.
    Remove { name: String },
}

/// Defaults loaded from `CLAUDE_CODE_*` environment variables.
#[derive(Debug, Default, Deserialize)]
struct Settings {
    model: Option<String>,
    cli_path: Option<String>,
    timeout_secs: Option<u64>,
}

impl Cli {
    fn progress_enabled(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    if let Command::Completions { shell } = &cli.command {
        let mut command = Cli::command();
        clap_complete::generate(*shell, &mut command, "claude-code", &mut std::io::stdout());
        return Ok(());
    }

    let settings = load_settings()?;
    let model = cli
        .model
        .clone()
        .or_else(|| settings.model.clone())
        .unwrap_or_else(|| "claude-code".to_string());

    let claude = ClaudeCode::new(ClaudeCodeOptions {
        cli_path: cli.cli_path.clone().or(settings.cli_path),
        timeout: cli
            .timeout_secs
            .or(settings.timeout_secs)
            .map(Duration::from_secs),
        ..ClaudeCodeOptions::default()
    });

    let mut state = state::CliState::load();
    for tool in &state.tools {
        claude.tools.create(ToolCreateParams {
            name: tool.name.clone(),
            description: tool.description.clone(),
            input_schema: tool.input_schema.clone(),
        });
    }

    let renderer = Renderer::new(cli.format);
    match &cli.command {
        Command::Ask {
            prompt,
            system,
            max_tokens,
            temperature,
            use_tools,
        } => {
            let mut messages = Vec::new();
            if let Some(system) = system {
                messages.push(OpenAiMessage::new(Role::System, system.clone()));
            }
            messages.push(OpenAiMessage::new(Role::User, prompt.clone()));

            let mut params = OpenAiCompletionParams {
                model,
                messages,
                max_tokens: *max_tokens,
                temperature: *temperature,
                ..OpenAiCompletionParams::default()
            };
            if *use_tools {
                let registered = claude.tools.list();
                if !registered.is_empty() {
                    params.tools = Some(anthropic_to_openai_tools(&registered));
                }
            }

            let progress = spinner(cli.progress_enabled(), "Waiting for Claude Code...");
            let result = claude.chat.completions.create(params).await;
            finish_spinner(progress);
            let completion = result?;
            if !cli.quiet {
                renderer.completion(&completion)?;
            }
        }
        Command::Message {
            prompt,
            max_tokens,
            temperature,
        } => {
            let params = AnthropicMessageParams {
                model,
                messages: vec![AnthropicMessage::text(Role::User, prompt.clone())],
                max_tokens: *max_tokens,
                temperature: *temperature,
                ..AnthropicMessageParams::default()
            };

            let progress = spinner(cli.progress_enabled(), "Waiting for Claude Code...");
            let result = claude.messages.create(params).await;
            finish_spinner(progress);
            let response = result?;
            if !cli.quiet {
                renderer.message(&response)?;
            }
        }
        Command::Stream { prompt, anthropic } => {
            let mut stdout = std::io::stdout();
            if *anthropic {
                let mut stream = claude
                    .messages
                    .create_stream(AnthropicMessageParams {
                        model,
                        messages: vec![AnthropicMessage::text(Role::User, prompt.clone())],
                        ..AnthropicMessageParams::default()
                    })
                    .await?;
                while let Some(event) = stream.next().await {
                    if let Some(text) = event?.delta_text() {
                        write!(stdout, "{text}")?;
                        stdout.flush()?;
                    }
                }
            } else {
                let mut stream = claude
                    .chat
                    .completions
                    .create_stream(OpenAiCompletionParams {
                        model,
                        messages: vec![OpenAiMessage::new(Role::User, prompt.clone())],
                        ..OpenAiCompletionParams::default()
                    })
                    .await?;
                while let Some(chunk) = stream.next().await {
                    if let Some(text) = chunk?.delta_text() {
                        write!(stdout, "{text}")?;
                        stdout.flush()?;
                    }
                }
            }
            writeln!(stdout)?;
        }
        Command::Session { command } => match command {
            SessionCommand::New { prompt } => {
                let progress = spinner(cli.progress_enabled(), "Starting session...");
                let result = claude
                    .sessions
                    .create(SessionParams {
                        messages: vec![PromptMessage::from(OpenAiMessage::new(
                            Role::User,
                            prompt.clone(),
                        ))],
                        model: Some(model),
                    })
                    .await;
                finish_spinner(progress);
                let session = result?;
                state.session_id = Some(session.id().to_string());
                if !cli.quiet {
                    renderer.session_id(session.id())?;
                }
            }
            SessionCommand::Continue { prompt } => {
                let Some(session_id) = state.session_id.clone() else {
                    bail!("no active session; run `session new` first");
                };
                let progress = spinner(cli.progress_enabled(), "Continuing session...");
                let result = async {
                    let session = claude.sessions.resume(&session_id).await?;
                    session
                        .continue_with(SessionContinueParams {
                            messages: vec![PromptMessage::from(OpenAiMessage::new(
                                Role::User,
                                prompt.clone(),
                            ))],
                        })
                        .await
                }
                .await;
                finish_spinner(progress);
                let completion = result?;
                if !cli.quiet {
                    renderer.completion(&completion)?;
                }
            }
            SessionCommand::Show => match &state.session_id {
                Some(id) => renderer.session_id(id)?,
                None => println!("no active session"),
            },
            SessionCommand::Clear => {
                state.session_id = None;
                if !cli.quiet {
                    println!("session cleared");
                }
            }
        },
        Command::Tools { command } => match command {
            ToolCommand::List => {
                if !cli.quiet {
                    renderer.tools(&claude.tools.list())?;
                }
            }
            ToolCommand::Add {
                name,
                description,
                schema,
            } => {
                let input_schema = parse_schema(schema)?;
                let tool = claude.tools.create(ToolCreateParams {
                    name: name.clone(),
                    description: description.clone(),
                    input_schema,
                });
                state.tools.retain(|existing| existing.name != tool.name);
                state.tools.push(tool.clone());
                if !cli.quiet {
                    println!("registered tool `{}`", tool.name);
                }
            }
            ToolCommand::Remove { name } => {
                if claude.tools.remove(name).is_none() {
                    bail!("unknown tool: {name}");
                }
                state.tools.retain(|existing| &existing.name != name);
                if !cli.quiet {
                    println!("removed tool `{name}`");
                }
            }
        },
        Command::Completions { .. } => unreachable!("handled before client construction"),
    }

    state.save();
    Ok(())
}

fn load_settings() -> Result<Settings> {
    let source = config::Config::builder()
        .add_source(config::Environment::with_prefix("CLAUDE_CODE").try_parsing(true))
        .build()
        .context("failed to read environment configuration")?;
    source
        .try_deserialize()
        .context("invalid CLAUDE_CODE_* configuration")
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,claude_code_cli=info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .without_time()
        .with_ansi(!cli.no_color)
        .compact()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to initialize logging: {error}"))
}

fn parse_schema(raw: &str) -> Result<Value> {
    if let Some(path) = raw.strip_prefix('@') {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
        serde_json::from_str(&contents).with_context(|| format!("invalid JSON schema in {path}"))
    } else {
        serde_json::from_str(raw).context("invalid JSON schema")
    }
}

fn finish_spinner(spinner: Option<ProgressBar>) {
    if let Some(progress) = spinner {
        progress.finish_and_clear();
    }
}

mod progress {
    use std::time::Duration;

    use indicatif::{ProgressBar, ProgressStyle};

    pub fn spinner(enabled: bool, message: impl Into<String>) -> Option<ProgressBar> {
        if !enabled {
            return None;
        }
        let progress = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        progress.set_style(style);
        progress.set_message(message.into());
        progress.enable_steady_tick(Duration::from_millis(80));
        Some(progress)
    }
}

mod output {
    use anyhow::Result;
    use clap::ValueEnum;
    use serde_json::json;

    use claude_code_sdk::types::{AnthropicMessageResponse, AnthropicTool, OpenAiChatCompletion};

    #[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
    pub enum OutputFormat {
        Text,
        Json,
    }

    pub struct Renderer {
        format: OutputFormat,
    }

    impl Renderer {
        pub fn new(format: OutputFormat) -> Self {
            Self { format }
        }

        pub fn completion(&self, completion: &OpenAiChatCompletion) -> Result<()> {
            match self.format {
                OutputFormat::Text => println!("{}", completion.text().unwrap_or_default()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(completion)?),
            }
            Ok(())
        }

        pub fn message(&self, response: &AnthropicMessageResponse) -> Result<()> {
            match self.format {
                OutputFormat::Text => println!("{}", response.text()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(response)?),
            }
            Ok(())
        }

        pub fn session_id(&self, id: &str) -> Result<()> {
            match self.format {
                OutputFormat::Text => println!("session: {id}"),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({"session_id": id}))?);
                }
            }
            Ok(())
        }

        pub fn tools(&self, tools: &[AnthropicTool]) -> Result<()> {
            match self.format {
                OutputFormat::Text => {
                    if tools.is_empty() {
                        println!("no tools registered");
                    }
                    for tool in tools {
                        match &tool.description {
                            Some(description) => println!("{}\t{description}", tool.name),
                            None => println!("{}", tool.name),
                        }
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(tools)?),
            }
            Ok(())
        }
    }
}

mod state {
    use std::path::PathBuf;

    use directories::ProjectDirs;
    use serde::{Deserialize, Serialize};
    use tracing::{debug, warn};

    use claude_code_sdk::types::AnthropicTool;

    const STATE_FILE_NAME: &str = "cli-state.json";

    /// State carried between CLI invocations: the active session and the
    /// registered tool declarations.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CliState {
        #[serde(default, rename = "sessionId")]
        pub session_id: Option<String>,
        #[serde(default)]
        pub tools: Vec<AnthropicTool>,
    }

    impl CliState {
        fn path() -> Option<PathBuf> {
            ProjectDirs::from("dev", "ClaudeCodeSdk", "claude-code-cli")
                .map(|dirs| dirs.data_dir().join(STATE_FILE_NAME))
        }

        pub fn load() -> Self {
            let Some(path) = Self::path() else {
                return Self::default();
            };
            match std::fs::read(&path) {
                Ok(bytes) if !bytes.is_empty() => match serde_json::from_slice(&bytes) {
                    Ok(state) => state,
                    Err(error) => {
                        warn!(
                            target: "claude_code_cli",
                            error = %error,
                            path = %path.display(),
                            "failed to parse CLI state; starting fresh"
                        );
                        Self::default()
                    }
                },
                Ok(_) => Self::default(),
                Err(error) => {
                    debug!(
                        target: "claude_code_cli",
                        error = %error,
                        path = %path.display(),
                        "no CLI state restored"
                    );
                    Self::default()
                }
            }
        }

        pub fn save(&self) {
            let Some(path) = Self::path() else {
                return;
            };
            if let Some(parent) = path.parent() {
                if let Err(error) = std::fs::create_dir_all(parent) {
                    warn!(
                        target: "claude_code_cli",
                        error = %error,
                        "failed to create CLI state directory"
                    );
                    return;
                }
            }
            match serde_json::to_vec_pretty(self) {
                Ok(bytes) => {
                    if let Err(error) = std::fs::write(&path, bytes) {
                        warn!(
                            target: "claude_code_cli",
                            error = %error,
                            path = %path.display(),
                            "failed to persist CLI state"
                        );
                    }
                }
                Err(error) => {
                    warn!(target: "claude_code_cli", error = %error, "failed to serialize CLI state");
                }
            }
        }
    }
}
