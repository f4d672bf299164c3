//! Conversions between the two API styles, prompt rendering, and CLI output
//! decoding.

use futures::stream::BoxStream;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use claude_code_exec::LineStream;

use crate::error::{ClaudeCodeError, Result};
use crate::types::{
    AnthropicContent, AnthropicMessage, AnthropicTool, ContentBlock, OpenAiFunction, OpenAiMessage,
    OpenAiTool, PromptMessage,
};

/// Wraps string content into a single text block.
#[must_use]
pub fn openai_to_anthropic_message(message: &OpenAiMessage) -> AnthropicMessage {
    AnthropicMessage {
        role: message.role,
        content: AnthropicContent::Blocks(vec![ContentBlock::text(message.content.clone())]),
        files: message.files.clone(),
    }
}

/// Flattens block content into a newline-joined string.
#[must_use]
pub fn anthropic_to_openai_message(message: &AnthropicMessage) -> OpenAiMessage {
    OpenAiMessage {
        role: message.role,
        content: message.content.flatten_text(),
        files: message.files.clone(),
    }
}

/// `function.parameters` becomes `input_schema`; an absent schema becomes an
/// empty object.
#[must_use]
pub fn openai_to_anthropic_tools(tools: &[OpenAiTool]) -> Vec<AnthropicTool> {
    tools
        .iter()
        .map(|tool| AnthropicTool {
            name: tool.function.name.clone(),
            description: tool.function.description.clone(),
            input_schema: tool.function.parameters.clone().unwrap_or_else(|| json!({})),
        })
        .collect()
}

#[must_use]
pub fn anthropic_to_openai_tools(tools: &[AnthropicTool]) -> Vec<OpenAiTool> {
    tools
        .iter()
        .map(|tool| OpenAiTool {
            tool_type: "function".to_string(),
            function: OpenAiFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: Some(tool.input_schema.clone()),
            },
        })
        .collect()
}

/// Renders a conversation into the single prompt string the CLI accepts:
/// `ROLE: content` paragraphs separated by blank lines.
#[must_use]
pub fn render_prompt(messages: &[PromptMessage]) -> String {
    messages
        .iter()
        .map(|message| {
            format!(
                "{}: {}",
                message.role().as_str().to_uppercase(),
                message.flatten_text()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Decodes CLI stdout into `T`.
///
/// Output that is not a JSON document is wrapped into an OpenAI-shaped
/// `{"choices": [...]}` envelope carrying the trimmed text, then decoded.
pub fn parse_cli_output<T: DeserializeOwned>(output: &str) -> Result<T> {
    match serde_json::from_str::<T>(output) {
        Ok(value) => Ok(value),
        Err(primary) => {
            debug!(
                target: "claude_sdk",
                error = %primary,
                "CLI output is not a typed JSON envelope; applying text fallback"
            );
            let fallback = json!({
                "choices": [{
                    "message": {"role": "assistant", "content": output.trim()}
                }]
            });
            serde_json::from_value(fallback).map_err(|fallback_error| {
                ClaudeCodeError::parse(format!(
                    "{primary}; text fallback also failed: {fallback_error}"
                ))
            })
        }
    }
}

/// Decodes an NDJSON line stream into typed chunks, skipping lines that do
/// not parse and forwarding transport errors.
pub(crate) fn decode_stream<T>(lines: LineStream) -> BoxStream<'static, Result<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    lines
        .filter_map(|line| async move {
            match line {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        return None;
                    }
                    match serde_json::from_str::<T>(trimmed) {
                        Ok(chunk) => Some(Ok(chunk)),
                        Err(error) => {
                            warn!(
                                target: "claude_sdk",
                                error = %error,
                                line = %trimmed,
                                "skipping undecodable stream line"
                            );
                            None
                        }
                    }
                }
                Err(error) => Some(Err(ClaudeCodeError::from(error))),
            }
        })
        .boxed()
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::types::{OpenAiChatCompletion, Role};

    #[test]
    fn openai_message_becomes_a_text_block() {
        let message = OpenAiMessage::new(Role::User, "Test message");

        let converted = openai_to_anthropic_message(&message);

        assert_eq!(converted.role, Role::User);
        assert_eq!(
            converted.content,
            AnthropicContent::Blocks(vec![ContentBlock::text("Test message")])
        );
    }

    #[test]
    fn file_references_survive_conversion() {
        let mut message = OpenAiMessage::new(Role::User, "Analyze this file");
        message.files = Some(vec![crate::types::FileReference {
            path: "test.rs".to_string(),
            content: Some("const A: u8 = 1;".to_string()),
        }]);

        let converted = openai_to_anthropic_message(&message);

        let files = converted.files.expect("files preserved");
        assert_eq!(files[0].path, "test.rs");
        assert_eq!(files[0].content.as_deref(), Some("const A: u8 = 1;"));
    }

    #[test]
    fn anthropic_blocks_flatten_with_newlines() {
        let message = AnthropicMessage {
            role: Role::User,
            content: AnthropicContent::Blocks(vec![
                ContentBlock::text("Text part 1"),
                ContentBlock::text("Text part 2"),
            ]),
            files: None,
        };

        let converted = anthropic_to_openai_message(&message);

        assert_eq!(converted.content, "Text part 1\nText part 2");
    }

    #[test]
    fn anthropic_string_content_passes_through() {
        let message = AnthropicMessage {
            role: Role::User,
            content: AnthropicContent::Text("Already string content".to_string()),
            files: None,
        };

        let converted = anthropic_to_openai_message(&message);

        assert_eq!(converted.content, "Already string content");
    }

    #[test]
    fn openai_tools_map_parameters_to_input_schema() {
        let tools = vec![OpenAiTool::function(
            "get_weather",
            "Get the weather for a location",
            json!({"type": "object", "properties": {"location": {"type": "string"}}}),
        )];

        let converted = openai_to_anthropic_tools(&tools);

        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].name, "get_weather");
        assert_eq!(
            converted[0].description.as_deref(),
            Some("Get the weather for a location")
        );
        assert_eq!(
            converted[0].input_schema,
            json!({"type": "object", "properties": {"location": {"type": "string"}}})
        );
    }

    #[test]
    fn missing_parameters_become_an_empty_schema() {
        let tools = vec![OpenAiTool {
            tool_type: "function".to_string(),
            function: OpenAiFunction {
                name: "noop".to_string(),
                description: None,
                parameters: None,
            },
        }];

        let converted = openai_to_anthropic_tools(&tools);

        assert_eq!(converted[0].input_schema, json!({}));
    }

    #[test]
    fn anthropic_tools_round_trip_to_openai_form() {
        let tools = vec![AnthropicTool {
            name: "get_weather".to_string(),
            description: Some("Get the weather for a location".to_string()),
            input_schema: json!({"type": "object"}),
        }];

        let converted = anthropic_to_openai_tools(&tools);

        assert_eq!(converted[0].tool_type, "function");
        assert_eq!(converted[0].function.name, "get_weather");
        assert_eq!(converted[0].function.parameters, Some(json!({"type": "object"})));
    }

    #[test]
    fn prompt_renders_uppercase_roles() {
        let messages = vec![
            PromptMessage::from(OpenAiMessage::new(Role::System, "You are a coding assistant.")),
            PromptMessage::from(OpenAiMessage::new(
                Role::User,
                "Write a hello world function.",
            )),
        ];

        assert_eq!(
            render_prompt(&messages),
            "SYSTEM: You are a coding assistant.\n\nUSER: Write a hello world function."
        );
    }

    #[test]
    fn prompt_accepts_mixed_message_styles() {
        let messages = vec![
            PromptMessage::from(OpenAiMessage::new(Role::System, "You are a coding assistant.")),
            PromptMessage::from(AnthropicMessage::text(
                Role::User,
                "Write a hello world function.",
            )),
        ];

        assert_eq!(
            render_prompt(&messages),
            "SYSTEM: You are a coding assistant.\n\nUSER: Write a hello world function."
        );
    }

    #[test]
    fn single_message_prompt_has_no_separator() {
        let messages = vec![PromptMessage::from(OpenAiMessage::new(Role::User, "hi"))];

        insta::assert_snapshot!(render_prompt(&messages), @"USER: hi");
    }

    #[test]
    fn valid_json_parses_directly() {
        let output =
            r#"{"id": "test-id", "choices": [{"message": {"role": "assistant", "content": "Hello!"}}]}"#;

        let parsed: OpenAiChatCompletion = parse_cli_output(output).expect("parses");

        assert_eq!(parsed.id, "test-id");
        assert_eq!(parsed.choices[0].message.content, "Hello!");
    }

    #[test]
    fn plain_text_wraps_into_the_fallback_envelope() {
        let parsed: OpenAiChatCompletion =
            parse_cli_output("Plain text response\n").expect("fallback parses");

        assert_eq!(parsed.id, "");
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(parsed.choices[0].message.role, Role::Assistant);
        assert_eq!(parsed.choices[0].message.content, "Plain text response");
    }

    #[test]
    fn fallback_also_covers_untyped_values() {
        let parsed: Value = parse_cli_output("not json at all").expect("fallback parses");

        assert_eq!(
            parsed["choices"][0]["message"]["content"],
            json!("not json at all")
        );
    }
}
