// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API integration for the wagate gateway.
//!
//! Implements [`wagate_core::ProviderGateway`] over the Graph API:
//! text / interactive-button / interactive-list / template sends, media
//! upload and retrieval, and template management.

pub mod client;
pub mod types;

pub use client::CloudClient;
