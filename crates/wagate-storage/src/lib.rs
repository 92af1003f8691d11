// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the wagate gateway.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and typed query
//! modules for contacts, the message log, flow graphs, conversation
//! sessions, automation rules, media, templates, and system settings.
//!
//! [`Database`] wraps one `tokio_rusqlite::Connection`, every query function
//! accepts `&Database`, and tokio-rusqlite serializes all closure calls on
//! one background thread. This eliminates SQLITE_BUSY errors under
//! concurrent access and makes session-context read-modify-write cycles
//! atomic. Do NOT create additional Connection instances for writes.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::*;
