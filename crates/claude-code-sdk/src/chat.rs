//! OpenAI-style `chat.completions` namespace.

use std::sync::Arc;

use futures::future::try_join_all;
use futures::stream::BoxStream;
use tracing::instrument;

use claude_code_exec::{CliExecutor, ExecParams, OutputFormat};

use crate::convert::{decode_stream, openai_to_anthropic_tools, parse_cli_output, render_prompt};
use crate::error::{ClaudeCodeError, Result};
use crate::types::{
    OpenAiChatCompletion, OpenAiChatCompletionChunk, OpenAiCompletionParams, PromptMessage,
};

/// Stream of OpenAI-style chunks.
pub type ChunkStream = BoxStream<'static, Result<OpenAiChatCompletionChunk>>;

/// The `chat` namespace; completions is its only resource.
#[derive(Clone)]
pub struct Chat {
    pub completions: ChatCompletions,
}

impl Chat {
    pub(crate) fn new(executor: Arc<dyn CliExecutor>) -> Self {
        Self {
            completions: ChatCompletions::new(executor),
        }
    }
}

#[derive(Clone)]
pub struct ChatCompletions {
    executor: Arc<dyn CliExecutor>,
}

impl ChatCompletions {
    pub(crate) fn new(executor: Arc<dyn CliExecutor>) -> Self {
        Self { executor }
    }

    fn exec_params(params: &OpenAiCompletionParams, format: OutputFormat) -> ExecParams {
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
            stop: params.stop.as_ref().map(|stop| stop.join(",")),
            timeout: params.timeout,
            ..ExecParams::default()
        };

        if let Some(tools) = &params.tools {
            if !tools.is_empty() {
                exec.allowed_tools = openai_to_anthropic_tools(tools)
                    .into_iter()
                    .map(|tool| tool.name)
                    .collect();
            }
        }

        exec
    }

    /// Creates a completion.
    ///
    /// Responses that are not JSON envelopes surface through the text
    /// fallback as a single assistant choice.
    #[instrument(name = "chat_completions.create", skip_all, fields(model = %params.model))]
    pub async fn create(&self, params: OpenAiCompletionParams) -> Result<OpenAiChatCompletion> {
        if params.stream == Some(true) {
            return Err(ClaudeCodeError::invalid_request(
                "streaming completions go through create_stream",
            ));
        }

        let exec = Self::exec_params(&params, OutputFormat::Json);
        let output = self.executor.execute(exec).await?;
        parse_cli_output(&output)
    }

    /// Creates a streaming completion yielding incremental chunks.
    #[instrument(name = "chat_completions.create_stream", skip_all, fields(model = %params.model))]
    pub async fn create_stream(&self, params: OpenAiCompletionParams) -> Result<ChunkStream> {
        let exec = Self::exec_params(&params, OutputFormat::StreamJson);
        let lines = self.executor.execute_stream(exec).await?;
        Ok(decode_stream(lines))
    }

    /// Runs several completions concurrently, failing on the first error.
    pub async fn batch_create(
        &self,
        batches: Vec<OpenAiCompletionParams>,
    ) -> Result<Vec<OpenAiChatCompletion>> {
        try_join_all(batches.into_iter().map(|params| self.create(params))).await
    }
}
