// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stages of one generation run.
//!
//! Stages run strictly in declaration order. `CacheCheck` can jump straight
//! to `Done` on a hit. Only `ModelInvoke` leads to `Failed`; every other
//! stage degrades instead.

use strum::{AsRefStr, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    CacheCheck,
    ContextBuild,
    PromptBuild,
    ModelInvoke,
    Parse,
    SafetyFilter,
    CacheWrite,
    AnalyticsRecord,
    Done,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}
