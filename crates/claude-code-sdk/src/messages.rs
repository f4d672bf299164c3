//! Anthropic-style `messages` namespace.

use std::sync::Arc;

use futures::future::try_join_all;
use futures::stream::BoxStream;
use tracing::instrument;

use claude_code_exec::{CliExecutor, ExecParams, OutputFormat};

use crate::convert::{decode_stream, parse_cli_output, render_prompt};
use crate::error::{ClaudeCodeError, Result};
use crate::types::{
    AnthropicMessageParams, AnthropicMessageResponse, AnthropicStreamEvent, PromptMessage,
};

/// Stream of Anthropic-style events.
pub type EventStream = BoxStream<'static, Result<AnthropicStreamEvent>>;

#[derive(Clone)]
pub struct Messages {
    executor: Arc<dyn CliExecutor>,
}

impl Messages {
    pub(crate) fn new(executor: Arc<dyn CliExecutor>) -> Self {
        Self { executor }
    }

    fn exec_params(params: &AnthropicMessageParams, format: OutputFormat) -> ExecParams {
        let messages: Vec<PromptMessage> = params
            .messages
            .iter()
            .cloned()
            .map(PromptMessage::from)
            .collect();

        let mut exec = ExecParams {
            prompt: Some(render_prompt(&messages)),
            output_format: Some(format),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            stop: params
                .stop_sequences
                .as_ref()
                .map(|sequences| sequences.join(",")),
            timeout: params.timeout,
            ..ExecParams::default()
        };

        if let Some(tools) = &params.tools {
            if !tools.is_empty() {
                exec.allowed_tools = tools.iter().map(|tool| tool.name.clone()).collect();
            }
        }

        exec
    }

    /// Creates a message.
    #[instrument(name = "messages.create", skip_all, fields(model = %params.model))]
    pub async fn create(&self, params: AnthropicMessageParams) -> Result<AnthropicMessageResponse> {
        if params.stream == Some(true) {
            return Err(ClaudeCodeError::invalid_request(
                "streaming messages go through create_stream",
            ));
        }

        let exec = Self::exec_params(&params, OutputFormat::Json);
        let output = self.executor.execute(exec).await?;
        parse_cli_output(&output)
    }

    /// Creates a streaming message yielding incremental events.
    #[instrument(name = "messages.create_stream", skip_all, fields(model = %params.model))]
    pub async fn create_stream(&self, params: AnthropicMessageParams) -> Result<EventStream> {
        let exec = Self::exec_params(&params, OutputFormat::StreamJson);
        let lines = self.executor.execute_stream(exec).await?;
        Ok(decode_stream(lines))
    }

    /// Runs several messages concurrently, failing on the first error.
    pub async fn batch_create(
        &self,
        batches: Vec<AnthropicMessageParams>,
    ) -> Result<Vec<AnthropicMessageResponse>> {
        try_join_all(batches.into_iter().map(|params| self.create(params))).await
    }
}
