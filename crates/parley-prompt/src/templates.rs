// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent-to-template table.
//!
//! Every template's `system` half is fixed guidance. The `user` half carries
//! the `{placeholders}` that [`crate::build_prompt`] fills in.

use parley_core::types::{ChatType, ConversationContext};
use strum::{AsRefStr, Display};

/// Which template pair is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum TemplateKind {
    Question,
    Invitation,
    Appreciation,
    Support,
    Business,
    Group,
    General,
}

/// A system/user prompt pair before placeholder substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub kind: TemplateKind,
    pub system: &'static str,
    pub user: &'static str,
}

/// Intent tag to template. Several tags collapse onto one template; tags
/// not listed here use [`TemplateKind::General`].
const TEMPLATE_TABLE: &[(&str, TemplateKind)] = &[
    ("question", TemplateKind::Question),
    ("event", TemplateKind::Invitation),
    ("invitation", TemplateKind::Invitation),
    ("appreciation", TemplateKind::Appreciation),
    ("thanks", TemplateKind::Appreciation),
    ("concern", TemplateKind::Support),
    ("support", TemplateKind::Support),
    ("business", TemplateKind::Business),
    ("deadline", TemplateKind::Business),
    ("work", TemplateKind::Business),
];

const OUTPUT_RULES: &str = "Reply ONLY with a JSON object of the form \
{\"suggestions\": [\"...\"], \"confidence\": 0.0, \"reasoning\": \"...\"}. \
Each suggestion is a complete message the user could send as-is, under 500 characters. \
Never include personal data such as phone numbers, emails or card numbers. \
Never be offensive, manipulative or spammy.";

const QUESTION_SYSTEM: &str = "You draft short replies that answer questions on the user's behalf. \
Be direct. When the user cannot know the answer, offer a natural way to follow up.";
const QUESTION_USER: &str = "Someone asked the user a question in a {chat_type} chat.\n\n\
{context}\n\nQuestion: \"{message}\"\n\n\
Write {count} possible replies in a {tone}, {style} voice, in language \"{language}\".{relationship}";

const INVITATION_SYSTEM: &str = "You draft replies to invitations and event plans. \
Cover accepting, declining politely and asking for details.";
const INVITATION_USER: &str = "The user received an invitation or event message in a {chat_type} chat.\n\n\
{context}\n\nMessage: \"{message}\"\n\n\
Write {count} possible replies in a {tone}, {style} voice, in language \"{language}\".{relationship}";

const APPRECIATION_SYSTEM: &str = "You draft warm, brief acknowledgements of thanks and praise. \
Keep them gracious without overdoing it.";
const APPRECIATION_USER: &str = "Someone thanked or praised the user in a {chat_type} chat.\n\n\
{context}\n\nMessage: \"{message}\"\n\n\
Write {count} possible replies in a {tone}, {style} voice, in language \"{language}\".{relationship}";

const SUPPORT_SYSTEM: &str = "You draft empathetic replies to people who are worried, upset or struggling. \
Acknowledge feelings first. Do not give medical, legal or financial advice.";
const SUPPORT_USER: &str = "Someone shared a concern with the user in a {chat_type} chat.\n\n\
{context}\n\nMessage: \"{message}\"\n\n\
Write {count} supportive replies in a {tone}, {style} voice, in language \"{language}\".{relationship}";

const BUSINESS_SYSTEM: &str = "You draft clear, professional replies to work messages. \
Confirm commitments explicitly and avoid slang.";
const BUSINESS_USER: &str = "The user received a work-related message in a {chat_type} chat.\n\n\
{context}\n\nMessage: \"{message}\"\n\n\
Write {count} possible replies in a {tone}, {style} voice, in language \"{language}\".{relationship}";

const GROUP_SYSTEM: &str = "You draft replies for a group conversation. \
Keep them short, inclusive and suitable for everyone in the group to read.";
const GROUP_USER: &str = "A new message arrived in a {chat_type} chat the user belongs to.\n\n\
{context}\n\nMessage: \"{message}\"\n\n\
Write {count} possible replies in a {tone}, {style} voice, in language \"{language}\".{relationship}";

const GENERAL_SYSTEM: &str = "You draft natural replies to everyday messages in the user's own voice.";
const GENERAL_USER: &str = "The user received a message in a {chat_type} chat.\n\n\
{context}\n\nMessage: \"{message}\"\n\n\
Write {count} possible replies in a {tone}, {style} voice, in language \"{language}\".{relationship}";

impl TemplateKind {
    /// Resolves an intent tag through the template table.
    pub fn for_tag(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        TEMPLATE_TABLE
            .iter()
            .find(|(name, _)| *name == tag)
            .map(|(_, kind)| *kind)
            .unwrap_or(TemplateKind::General)
    }

    pub fn template(self) -> PromptTemplate {
        let (system, user) = match self {
            TemplateKind::Question => (QUESTION_SYSTEM, QUESTION_USER),
            TemplateKind::Invitation => (INVITATION_SYSTEM, INVITATION_USER),
            TemplateKind::Appreciation => (APPRECIATION_SYSTEM, APPRECIATION_USER),
            TemplateKind::Support => (SUPPORT_SYSTEM, SUPPORT_USER),
            TemplateKind::Business => (BUSINESS_SYSTEM, BUSINESS_USER),
            TemplateKind::Group => (GROUP_SYSTEM, GROUP_USER),
            TemplateKind::General => (GENERAL_SYSTEM, GENERAL_USER),
        };
        PromptTemplate {
            kind: self,
            system,
            user,
        }
    }
}

impl PromptTemplate {
    /// System guidance including the shared output rules.
    pub fn system_prompt(&self) -> String {
        format!("{}\n\n{}", self.system, OUTPUT_RULES)
    }
}

/// Picks the template for an intent tag. Group chats always get the group
/// template whatever the tag.
pub fn get_template(tag: &str, context: &ConversationContext) -> PromptTemplate {
    if context.metadata.chat_type == ChatType::Group {
        return TemplateKind::Group.template();
    }
    TemplateKind::for_tag(tag).template()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::types::MessageType;

    fn context(chat_type: ChatType) -> ConversationContext {
        let mut ctx = ConversationContext::default();
        ctx.metadata.chat_type = chat_type;
        ctx
    }

    #[test]
    fn synonyms_collapse_onto_one_template() {
        let ctx = context(ChatType::Individual);
        assert_eq!(get_template("event", &ctx).kind, TemplateKind::Invitation);
        assert_eq!(get_template("invitation", &ctx).kind, TemplateKind::Invitation);
        assert_eq!(get_template("concern", &ctx).kind, TemplateKind::Support);
        assert_eq!(get_template("support", &ctx).kind, TemplateKind::Support);
        assert_eq!(get_template("Business", &ctx).kind, TemplateKind::Business);
    }

    #[test]
    fn unmapped_tags_fall_back_to_general() {
        let ctx = context(ChatType::Individual);
        assert_eq!(get_template("social", &ctx).kind, TemplateKind::General);
        assert_eq!(get_template("", &ctx).kind, TemplateKind::General);
        assert_eq!(get_template("nonsense", &ctx).kind, TemplateKind::General);
    }

    #[test]
    fn group_chat_overrides_every_intent() {
        let ctx = context(ChatType::Group);
        for tag in [
            MessageType::Question,
            MessageType::Event,
            MessageType::Appreciation,
            MessageType::Concern,
            MessageType::Business,
            MessageType::Social,
        ] {
            assert_eq!(get_template(tag.as_ref(), &ctx).kind, TemplateKind::Group);
        }
        assert_eq!(get_template("nonsense", &ctx).kind, TemplateKind::Group);
    }

    #[test]
    fn every_user_template_carries_the_message_slot() {
        for kind in [
            TemplateKind::Question,
            TemplateKind::Invitation,
            TemplateKind::Appreciation,
            TemplateKind::Support,
            TemplateKind::Business,
            TemplateKind::Group,
            TemplateKind::General,
        ] {
            let template = kind.template();
            assert!(template.user.contains("{message}"), "{kind}");
            assert!(template.user.contains("{count}"), "{kind}");
            assert!(template.system_prompt().contains("\"suggestions\""));
        }
    }
}
