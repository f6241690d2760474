// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt template selection.
//!
//! Classifies the intent of an inbound message with an ordered rule table,
//! picks a system/user template pair for that intent and chat type, and
//! fills in its placeholders.

pub mod builder;
pub mod classifier;
pub mod templates;

pub use builder::{Prompt, build_prompt};
pub use classifier::detect_message_type;
pub use templates::{PromptTemplate, TemplateKind, get_template};
