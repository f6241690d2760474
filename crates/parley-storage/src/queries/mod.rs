// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed queries, one module per table group.

pub mod analytics;
pub mod contacts;
pub mod conversations;
pub mod media;
pub mod preferences;
pub mod promises;
