// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface for the wagate gateway.
//!
//! Webhook verification and ingestion, the operator CRUD API, and the
//! dashboard WebSocket, all over a shared [`AppState`].

pub mod handlers;
pub mod server;
pub mod ws;

pub use server::{build_router, start_server, AppState};
