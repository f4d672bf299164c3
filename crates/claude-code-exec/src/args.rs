use std::time::Duration;

/// Output formats understood by the Claude Code CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Text,
    #[default]
    Json,
    StreamJson,
}

impl OutputFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::StreamJson => "stream-json",
        }
    }
}

/// Parameters for a single Claude Code CLI invocation.
///
/// `timeout` bounds the whole invocation and is enforced by the executor
/// rather than forwarded as a flag.
#[derive(Debug, Clone, Default)]
pub struct ExecParams {
    pub prompt: Option<String>,
    pub output_format: Option<OutputFormat>,
    pub system_prompt: Option<String>,
    pub continue_conversation: bool,
    pub resume: Option<String>,
    pub allowed_tools: Vec<String>,
    pub disallowed_tools: Vec<String>,
    pub mcp_config: Option<String>,
    pub max_turns: Option<u32>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub stop: Option<String>,
    pub timeout: Option<Duration>,
}

/// Renders `params` into the argv vector for the CLI.
///
/// Arguments are handed to the process as a vector, so values are passed
/// verbatim with no shell quoting.
#[must_use]
pub fn build_args(params: &ExecParams) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(prompt) = &params.prompt {
        args.push("-p".to_string());
        args.push(prompt.clone());
    }

    if let Some(format) = params.output_format {
        args.push("--output-format".to_string());
        args.push(format.as_str().to_string());
    }

    if let Some(system_prompt) = &params.system_prompt {
        args.push("--system-prompt".to_string());
        args.push(system_prompt.clone());
    }

    if params.continue_conversation {
        args.push("--continue".to_string());
    }

    if let Some(resume) = &params.resume {
        args.push("--resume".to_string());
        args.push(resume.clone());
    }

    if !params.allowed_tools.is_empty() {
        args.push("--allowedTools".to_string());
        args.push(params.allowed_tools.join(","));
    }

    if !params.disallowed_tools.is_empty() {
        args.push("--disallowedTools".to_string());
        args.push(params.disallowed_tools.join(","));
    }

    if let Some(mcp_config) = &params.mcp_config {
        args.push("--mcp-config".to_string());
        args.push(mcp_config.clone());
    }

    if let Some(max_turns) = params.max_turns {
        args.push("--max-turns".to_string());
        args.push(max_turns.to_string());
    }

    if let Some(max_tokens) = params.max_tokens {
        args.push("--max-tokens".to_string());
        args.push(max_tokens.to_string());
    }

    if let Some(temperature) = params.temperature {
        args.push("--temperature".to_string());
        args.push(temperature.to_string());
    }

    if let Some(top_p) = params.top_p {
        args.push("--top-p".to_string());
        args.push(top_p.to_string());
    }

    if let Some(stop) = &params.stop {
        args.push("--stop".to_string());
        args.push(stop.clone());
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_params_map_to_flags() {
        let args = build_args(&ExecParams {
            prompt: Some("Test prompt".to_string()),
            output_format: Some(OutputFormat::Json),
            ..ExecParams::default()
        });

        insta::assert_snapshot!(args.join(" "), @"-p Test prompt --output-format json");
    }

    #[test]
    fn system_prompt_gets_its_own_flag() {
        let args = build_args(&ExecParams {
            prompt: Some("Test prompt".to_string()),
            system_prompt: Some("You are a helpful assistant".to_string()),
            output_format: Some(OutputFormat::Json),
            ..ExecParams::default()
        });

        assert!(args.contains(&"--system-prompt".to_string()));
        assert!(args.contains(&"You are a helpful assistant".to_string()));
    }

    #[test]
    fn quotes_pass_through_unescaped() {
        let args = build_args(&ExecParams {
            prompt: Some("Test \"quoted\" prompt".to_string()),
            output_format: Some(OutputFormat::Json),
            ..ExecParams::default()
        });

        assert!(args.contains(&"Test \"quoted\" prompt".to_string()));
    }

    #[test]
    fn allowed_tools_join_with_commas() {
        let args = build_args(&ExecParams {
            prompt: Some("Test prompt".to_string()),
            allowed_tools: vec!["filesystem".to_string(), "web-search".to_string()],
            ..ExecParams::default()
        });

        assert!(args.contains(&"--allowedTools".to_string()));
        assert!(args.contains(&"filesystem,web-search".to_string()));
    }

    #[test]
    fn continuation_is_a_bare_flag() {
        let args = build_args(&ExecParams {
            prompt: Some("Continue session".to_string()),
            continue_conversation: true,
            ..ExecParams::default()
        });

        assert!(args.contains(&"--continue".to_string()));
    }

    #[test]
    fn resume_carries_the_session_id() {
        let args = build_args(&ExecParams {
            prompt: Some("Resume session".to_string()),
            resume: Some("abc123".to_string()),
            ..ExecParams::default()
        });

        assert!(args.contains(&"--resume".to_string()));
        assert!(args.contains(&"abc123".to_string()));
    }

    #[test]
    fn generation_params_become_kebab_flags() {
        let args = build_args(&ExecParams {
            prompt: Some("p".to_string()),
            output_format: Some(OutputFormat::StreamJson),
            max_tokens: Some(1000),
            temperature: Some(0.5),
            top_p: Some(0.9),
            stop: Some("END,STOP".to_string()),
            max_turns: Some(4),
            ..ExecParams::default()
        });

        insta::assert_snapshot!(
            args.join(" "),
            @"-p p --output-format stream-json --max-turns 4 --max-tokens 1000 --temperature 0.5 --top-p 0.9 --stop END,STOP"
        );
    }

    #[test]
    fn timeout_never_becomes_a_flag() {
        let args = build_args(&ExecParams {
            prompt: Some("p".to_string()),
            timeout: Some(Duration::from_secs(5)),
            ..ExecParams::default()
        });

        assert!(!args.iter().any(|arg| arg.contains("timeout")));
    }
}
