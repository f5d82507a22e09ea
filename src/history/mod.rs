//! Interaction history
//!
//! Recent query/answer pairs are replayed to the model as conversation turns so
//! follow-up requests ("now do the same for .log files") have context. Replay is
//! bounded by age and size; the file itself keeps only the last few entries.

pub mod store;
pub mod types;

pub use store::{HistoryError, InteractionStore, apply_durable_cap, select_working_set};
pub use types::{HistoryLimits, Interaction};

use crate::parser::{COMMAND_TAG, EXPLANATION_TAG, wrap_tag};
use crate::providers::{LlmMessage, LlmRole};

/// Renders past interactions as alternating user/assistant turns.
///
/// The assistant turn repeats the answer in the tagged form the model is asked
/// to produce. Absent fields render as empty tags.
pub fn render_conversation(interactions: &[Interaction]) -> Vec<LlmMessage> {
    let mut messages = Vec::with_capacity(interactions.len() * 2);

    for interaction in interactions {
        messages.push(LlmMessage::new(LlmRole::User, interaction.query.clone()));

        let answer = format!(
            "{}\n{}",
            wrap_tag(COMMAND_TAG, interaction.command.as_deref().unwrap_or_default()),
            wrap_tag(
                EXPLANATION_TAG,
                interaction.explanation.as_deref().unwrap_or_default()
            )
        );
        messages.push(LlmMessage::new(LlmRole::Assistant, answer));
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_conversation_order() {
        let interactions = vec![
            Interaction::new("first", Some("ls".to_string()), Some("lists".to_string())),
            Interaction::new("second", Some("pwd".to_string()), Some("prints".to_string())),
        ];

        let messages = render_conversation(&interactions);
        assert_eq!(messages.len(), 4);
        assert!(messages[0].is_user());
        assert_eq!(messages[0].content, "first");
        assert!(messages[1].is_assistant());
        assert_eq!(
            messages[1].content,
            "<command>ls</command>\n<explanation>lists</explanation>"
        );
        assert_eq!(messages[2].content, "second");
        assert!(messages[3].content.contains("<command>pwd</command>"));
    }

    #[test]
    fn test_render_conversation_absent_fields() {
        let messages = render_conversation(&[Interaction::new("q", None, None)]);
        assert_eq!(
            messages[1].content,
            "<command></command>\n<explanation></explanation>"
        );
    }

    #[test]
    fn test_render_empty_history() {
        assert!(render_conversation(&[]).is_empty());
    }
}
