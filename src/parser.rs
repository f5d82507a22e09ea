//! Tagged-field extraction for model responses
//!
//! The model is instructed to answer with flat `<name>...</name>` sections.
//! Tags do not nest and the first complete match wins; anything else in the
//! response is ignored.

use serde::{Deserialize, Serialize};

/// Tag holding the model's step-by-step reasoning (never shown to the user)
pub const THINKING_TAG: &str = "thinking";
/// Tag holding the human-readable explanation
pub const EXPLANATION_TAG: &str = "explanation";
/// Tag holding the shell command
pub const COMMAND_TAG: &str = "command";

/// Extracts the content of the first `<tag>...</tag>` section in `text`.
///
/// The content may span several lines and is returned with surrounding
/// whitespace trimmed. Returns `None` when the opening tag is missing or never
/// closed; an empty section yields `Some("")`.
pub fn extract_tag(text: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);

    let start = text.find(&open)? + open.len();
    let end = text[start..].find(&close)? + start;

    Some(text[start..end].trim().to_string())
}

/// Wraps `content` in `<tag>...</tag>`, the inverse of [`extract_tag`].
pub fn wrap_tag(tag: &str, content: &str) -> String {
    format!("<{tag}>{content}</{tag}>")
}

/// The three sections extracted from a raw model response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAnswer {
    pub thinking: Option<String>,
    pub explanation: Option<String>,
    pub command: Option<String>,
}

impl ParsedAnswer {
    pub fn from_response(text: &str) -> Self {
        let parsed = Self {
            thinking: extract_tag(text, THINKING_TAG),
            explanation: extract_tag(text, EXPLANATION_TAG),
            command: extract_tag(text, COMMAND_TAG),
        };

        tracing::debug!(
            has_thinking = parsed.thinking.is_some(),
            has_explanation = parsed.explanation.is_some(),
            has_command = parsed.command.is_some(),
            "Parsed model response"
        );

        parsed
    }
}
