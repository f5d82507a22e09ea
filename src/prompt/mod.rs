//! Request assembly
//!
//! Combines the fixed instructions, a snapshot of the user's environment, the
//! replayed history and the new query into one [`CompletionRequest`].

pub mod environment;

pub use environment::EnvironmentSnapshot;

use crate::history::{Interaction, render_conversation};
use crate::providers::{CompletionRequest, LlmMessage, LlmRole};

/// Fixed instructions sent as the system message
pub const SYSTEM_PROMPT: &str = r#"You are an expert in the Linux command line. You turn natural language requests into shell commands.

# Rules:
1. Put ONLY the command(s) to run inside the <command></command> tags, with no commentary or extra text
2. Complex operations may span several lines joined with pipes (|) or semicolons (;)
3. Use correct shell syntax and quoting
4. When several solutions exist, give only the most efficient one
5. Never use markdown formatting or code blocks
6. Prefer features of the user's shell over generic solutions when they are available
7.1 Read the environment described in the <environment></environment> tags before choosing a command:
   - Check whether the user has the permissions (root/sudo) a privileged command needs
   - Take the current working directory and the files in it into account
   - Use features of the user's shell
   - Look at recent command history to avoid repeating work
   - Adapt to the OS version and distribution
7.2 Use that information so the command is:
   - Compatible with the user's environment
   - Within the user's permissions
   - Aware of the current directory
   - Efficient given the available files and recent operations

# Output format:
1. Your response MUST contain these XML tags:
   <thinking>Step by step analysis of the problem and solution</thinking>
   <explanation>Clear explanation of what the command does and why you chose it</explanation>
   <command>The actual command(s) to execute</command>
2. Tag requirements:
   - <thinking>: your step-by-step reasoning (the user never sees it)
   - <explanation>: clear and concise, and mentions any potential risks
   - <command>: ONLY the command(s) to execute, nothing else

# Example:
Query: "find all text files modified in the last 24 hours"

Response: <thinking>
1. The user wants text files
2. Check whether sudo is needed
3. Consider the current directory
4. Pick a suitable find invocation
</thinking>
<explanation>
Searches your home directory for .txt files modified in the last 24 hours.
It is safe to run and needs no elevated permissions.
</explanation>
<command>
find ~ -type f -name "*.txt" -mtime -1
</command>


# Before answering:
1. Reason step by step inside <thinking></thinking> tags
2. Explain what the command does inside <explanation></explanation> tags
3. Give the final command inside <command></command> tags
4. Remember that the user only sees the <command></command> and <explanation></explanation> sections. Everything else is hidden.

If you are not sure, say that you don't know instead of making something up.
"#;

/// Prefix put in front of the new query turn
pub const QUERY_PREFIX: &str = "Query: ";

/// Appends the rendered environment block to the fixed instructions
pub fn full_system_prompt(environment: &str) -> String {
    format!(
        "{}\n\nCurrent Environment:\n<environment>\n{}\n</environment>",
        SYSTEM_PROMPT, environment
    )
}

/// Builds the request for `query`.
///
/// Turns are the replayed history, oldest first, followed by the new query.
pub fn build_request(
    system: impl Into<String>,
    working_set: &[Interaction],
    query: &str,
    max_tokens: u32,
    model: Option<String>,
) -> CompletionRequest {
    let mut messages: Vec<LlmMessage> = render_conversation(working_set);
    messages.push(LlmMessage::new(
        LlmRole::User,
        format!("{}{}", QUERY_PREFIX, query),
    ));

    tracing::debug!(
        history_turns = messages.len() - 1,
        max_tokens = max_tokens,
        "Built completion request"
    );

    let request = CompletionRequest::new(system, messages).with_max_tokens(max_tokens);
    match model {
        Some(model) => request.with_model(model),
        None => request,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_describes_output_tags() {
        for tag in ["<thinking>", "<explanation>", "<command>", "<environment>"] {
            assert!(SYSTEM_PROMPT.contains(tag), "missing {tag}");
        }
    }

    #[test]
    fn test_full_system_prompt_wraps_environment() {
        let prompt = full_system_prompt("Shell: bash\nRoot privileges: no");

        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.ends_with(
            "\n\nCurrent Environment:\n<environment>\nShell: bash\nRoot privileges: no\n</environment>"
        ));
    }

    #[test]
    fn test_build_request_without_history() {
        let request = build_request("sys", &[], "list files", 1024, None);

        assert_eq!(request.system, "sys");
        assert_eq!(request.messages.len(), 1);
        assert!(request.messages[0].is_user());
        assert_eq!(request.messages[0].content, "Query: list files");
        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.max_tokens, 1024);
        assert!(request.model.is_none());
    }

    #[test]
    fn test_build_request_history_precedes_query() {
        let history = vec![
            Interaction::new("a", Some("ls".to_string()), Some("lists".to_string())),
            Interaction::new("b", None, None),
        ];
        let request = build_request("sys", &history, "c", 512, Some("m".to_string()));

        let contents: Vec<&str> = request.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents.len(), 5);
        assert_eq!(contents[0], "a");
        assert_eq!(contents[2], "b");
        assert_eq!(contents[4], "Query: c");
        assert!(request.messages[1].is_assistant());
        assert_eq!(request.max_tokens, 512);
        assert_eq!(request.model.as_deref(), Some("m"));
    }
}
