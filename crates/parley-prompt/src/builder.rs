// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Placeholder substitution for prompt templates.

use parley_core::types::{ConversationContext, MessageType};

use crate::templates::get_template;

/// A filled-in prompt pair ready for the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Builds the system and user prompts for one request.
///
/// `formatted_history` is the output of the context formatter and lands in
/// the `{context}` slot. The relationship clause is only added when the
/// contact's relationship is known.
pub fn build_prompt(
    message: &str,
    message_type: MessageType,
    context: &ConversationContext,
    formatted_history: &str,
    suggestion_count: usize,
) -> Prompt {
    let template = get_template(message_type.as_ref(), context);
    let prefs = &context.preferences;

    let relationship = context
        .contact
        .as_ref()
        .and_then(|c| c.effective_relationship())
        .map(|r| format!(" The sender is the user's {r}; match that relationship."))
        .unwrap_or_default();

    let user = fill(template.user, |slot| match slot {
        "message" => Some(message.to_string()),
        "context" => Some(formatted_history.to_string()),
        "count" => Some(suggestion_count.to_string()),
        "chat_type" => Some(context.metadata.chat_type.to_string()),
        "tone" => Some(prefs.tone.clone()),
        "style" => Some(prefs.response_style.clone()),
        "language" => Some(prefs.language.clone()),
        "relationship" => Some(relationship.clone()),
        _ => None,
    });

    Prompt {
        system: template.system_prompt(),
        user,
    }
}

/// Single pass over `template`, so substituted values are never rescanned.
/// Unknown `{names}` are kept verbatim.
fn fill(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}').and_then(|close| {
            lookup(&after[..close]).map(|value| (close, value))
        }) {
            Some((close, value)) => {
                out.push_str(&value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
