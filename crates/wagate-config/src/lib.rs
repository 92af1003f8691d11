// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loading for the wagate gateway.
//!
//! TOML files merged across the XDG hierarchy with environment variable
//! overrides, including the legacy bare variable names used by existing
//! deployments.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::GatewayConfig;
