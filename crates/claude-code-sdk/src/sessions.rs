//! Multi-turn sessions over the CLI `--resume` flag.

use std::sync::Arc;

use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use uuid::Uuid;

use claude_code_exec::{CliExecutor, ExecParams, OutputFormat};

use crate::convert::{parse_cli_output, render_prompt};
use crate::error::Result;
use crate::types::{OpenAiChatCompletion, PromptMessage};

/// Parameters for starting a session.
#[derive(Debug, Clone, Default)]
pub struct SessionParams {
    pub messages: Vec<PromptMessage>,
    pub model: Option<String>,
}

/// Parameters for continuing a session.
#[derive(Debug, Clone, Default)]
pub struct SessionContinueParams {
    pub messages: Vec<PromptMessage>,
}

#[derive(Clone)]
pub struct Sessions {
    executor: Arc<dyn CliExecutor>,
}

impl Sessions {
    pub(crate) fn new(executor: Arc<dyn CliExecutor>) -> Self {
        Self { executor }
    }

    /// Starts a session with an opening exchange.
    ///
    /// The session id is taken from the response when the CLI reports one,
    /// otherwise generated locally.
    #[instrument(name = "sessions.create", skip_all)]
    pub async fn create(&self, params: SessionParams) -> Result<Session> {
        let exec = ExecParams {
            prompt: Some(render_prompt(&params.messages)),
            output_format: Some(OutputFormat::Json),
            ..ExecParams::default()
        };

        let output = self.executor.execute(exec).await?;
        let response: Value = parse_cli_output(&output)?;
        let id = response
            .get("id")
            .and_then(Value::as_str)
            .map_or_else(generate_session_id, str::to_string);

        debug!(target: "claude_sdk", session = %id, "session started");
        Ok(Session::new(id, self.executor.clone(), params.messages))
    }

    /// Rebuilds a handle for an existing session id.
    ///
    /// Issues a bare `--resume` call to revalidate the id; its output is
    /// discarded and the transcript starts empty.
    #[instrument(name = "sessions.resume", skip(self))]
    pub async fn resume(&self, session_id: &str) -> Result<Session> {
        let exec = ExecParams {
            resume: Some(session_id.to_string()),
            output_format: Some(OutputFormat::Json),
            ..ExecParams::default()
        };

        self.executor.execute(exec).await?;
        Ok(Session::new(
            session_id.to_string(),
            self.executor.clone(),
            Vec::new(),
        ))
    }
}

fn generate_session_id() -> String {
    let seconds = OffsetDateTime::now_utc().unix_timestamp();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("session_{seconds}_{}", &suffix[..8])
}

/// Handle for one ongoing multi-turn conversation.
pub struct Session {
    id: String,
    executor: Arc<dyn CliExecutor>,
    messages: Mutex<Vec<PromptMessage>>,
    created_at: OffsetDateTime,
}

impl Session {
    fn new(id: String, executor: Arc<dyn CliExecutor>, messages: Vec<PromptMessage>) -> Self {
        Self {
            id,
            executor,
            messages: Mutex::new(messages),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Snapshot of the accumulated transcript. Mutating the returned vector
    /// never affects the session.
    pub async fn messages(&self) -> Vec<PromptMessage> {
        self.messages.lock().await.clone()
    }

    /// Sends follow-up messages on this session.
    ///
    /// Only the new messages are rendered; the CLI replays earlier context
    /// from the resumed session.
    #[instrument(name = "session.continue", skip_all, fields(session = %self.id))]
    pub async fn continue_with(
        &self,
        params: SessionContinueParams,
    ) -> Result<OpenAiChatCompletion> {
        {
            let mut transcript = self.messages.lock().await;
            transcript.extend(params.messages.iter().cloned());
        }

        let exec = ExecParams {
            prompt: Some(render_prompt(&params.messages)),
            resume: Some(self.id.clone()),
            output_format: Some(OutputFormat::Json),
            ..ExecParams::default()
        };

        let output = self.executor.execute(exec).await?;
        parse_cli_output(&output)
    }
}
