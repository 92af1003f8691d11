// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for the wagate workspace: a capturing mock provider and
//! a full-stack engine harness over temp SQLite.

pub mod harness;
pub mod mock_provider;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_provider::{MockProvider, SentMessage};
