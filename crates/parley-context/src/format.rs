// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic text rendering of a context for prompt assembly.

use std::fmt::Write;

use parley_core::types::{ContactInfo, ConversationContext};

/// Renders the context as prompt text: conversation excerpt, contact,
/// preferences and conversation info, separated by blank lines. Blocks
/// without data are left out.
pub fn format_for_prompt(context: &ConversationContext) -> String {
    let mut blocks = Vec::with_capacity(4);

    if !context.messages.is_empty() {
        let mut block = String::from("Recent conversation:");
        for message in &context.messages {
            let speaker = if message.from_self { "Me" } else { "Them" };
            let _ = write!(
                block,
                "\n[{}] {speaker}: {}",
                message.timestamp.format("%Y-%m-%d %H:%M"),
                message.content.trim()
            );
        }
        blocks.push(block);
    }

    if let Some(block) = context.contact.as_ref().and_then(contact_block) {
        blocks.push(block);
    }

    let prefs = &context.preferences;
    let mut block = format!(
        "Preferences:\n- Tone: {}\n- Style: {}\n- Language: {}",
        prefs.tone, prefs.response_style, prefs.language
    );
    if !prefs.personality_traits.is_empty() {
        let _ = write!(block, "\n- Personality: {}", prefs.personality_traits.join(", "));
    }
    blocks.push(block);

    let meta = &context.metadata;
    let mut block = format!(
        "Conversation info:\n- Chat type: {}\n- Messages exchanged: {}",
        meta.chat_type, meta.message_count
    );
    if let Some(ms) = meta.average_response_time_ms {
        let _ = write!(block, "\n- Typical reply time: {}", human_duration(ms));
    }
    if let Some(last) = meta.last_interaction_time {
        let _ = write!(block, "\n- Last message: {}", last.format("%Y-%m-%d %H:%M UTC"));
    }
    if let Some(topic) = meta.topic {
        let _ = write!(block, "\n- Topic: {topic}");
    }
    blocks.push(block);

    blocks.join("\n\n")
}

fn contact_block(contact: &ContactInfo) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(name) = contact.effective_name() {
        lines.push(format!("- Name: {name}"));
    }
    if let Some(relationship) = contact.effective_relationship() {
        lines.push(format!("- Relationship: {relationship}"));
    }
    if let Some(notes) = contact.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        lines.push(format!("- Notes: {}", notes.trim()));
    }
    if lines.is_empty() {
        return None;
    }
    Some(format!("Contact:\n{}", lines.join("\n")))
}

fn human_duration(ms: u64) -> String {
    let secs = ms / 1000;
    match secs {
        0..60 => format!("{secs}s"),
        60..3600 => format!("{} min", secs / 60),
        _ => format!("{:.1} h", secs as f64 / 3600.0),
    }
}
