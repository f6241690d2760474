// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Parley response pipeline.
//!
//! WAL-mode SQLite with embedded migrations. Every statement runs on the
//! single `tokio-rusqlite` background thread, which makes [`Database`] the
//! only writer.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
