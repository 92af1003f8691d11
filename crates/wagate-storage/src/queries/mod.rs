// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Each accepts `&Database` and goes through the single
//! writer thread.

pub mod contacts;
pub mod flows;
pub mod media;
pub mod messages;
pub mod rules;
pub mod sessions;
pub mod settings;
pub mod templates;
