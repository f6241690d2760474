// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Safety filter for model-generated reply suggestions.
//!
//! Every candidate runs through an ordered rule table. Findings are
//! remediated in place where the severity allows it and discarded when it
//! does not. A fixed fallback pool guarantees at least one suggestion comes
//! out the other side.

pub mod filter;
pub mod remediate;
pub mod rules;

pub use filter::{FilteredResult, SafetyFilter, is_professional_relationship};
pub use rules::{IssueCategory, SafetyIssue, Severity};
