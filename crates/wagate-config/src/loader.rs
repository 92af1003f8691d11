// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./wagate.toml` > `~/.config/wagate/wagate.toml` >
//! `/etc/wagate/wagate.toml`, with environment variable overrides. Two env
//! forms are accepted: `WAGATE_`-prefixed section keys, and the bare legacy
//! deployment names (`PORT`, `VERIFY_TOKEN`, `WHATSAPP_TOKEN`,
//! `PHONE_NUMBER_ID`, `WABA_ID`, `DB_PATH`, `DB_NAME`).

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::GatewayConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/wagate/wagate.toml` (system-wide)
/// 3. `~/.config/wagate/wagate.toml` (user XDG config)
/// 4. `./wagate.toml` (local directory)
/// 5. `WAGATE_*` environment variables
/// 6. Legacy bare environment variables
pub fn load_config() -> Result<GatewayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GatewayConfig::default()))
        .merge(Toml::file("/etc/wagate/wagate.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("wagate/wagate.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("wagate.toml"))
        .merge(prefixed_env_provider())
        .merge(legacy_env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no file or env lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<GatewayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GatewayConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<GatewayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GatewayConfig::default()))
        .merge(Toml::file(path))
        .merge(prefixed_env_provider())
        .merge(legacy_env_provider())
        .extract()
}

/// `WAGATE_`-prefixed variables using explicit `map()` for section-to-dot
/// mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `WAGATE_WHATSAPP_VERIFY_TOKEN` must map
/// to `whatsapp.verify_token`, not `whatsapp.verify.token`.
fn prefixed_env_provider() -> Env {
    Env::prefixed("WAGATE_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("whatsapp_", "whatsapp.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("engine_", "engine.", 1);
        mapped.into()
    })
}

/// The bare variable names the original deployment scripts export.
fn legacy_env_provider() -> Env {
    Env::raw()
        .only(&[
            "PORT",
            "VERIFY_TOKEN",
            "WHATSAPP_TOKEN",
            "PHONE_NUMBER_ID",
            "WABA_ID",
            "DB_PATH",
            "DB_NAME",
        ])
        .map(|key| {
            match key.as_str().to_ascii_lowercase().as_str() {
                "port" => "server.port",
                "verify_token" => "whatsapp.verify_token",
                "whatsapp_token" => "whatsapp.access_token",
                "phone_number_id" => "whatsapp.phone_number_id",
                "waba_id" => "whatsapp.business_account_id",
                "db_path" => "storage.database_path",
                "db_name" => "storage.database_name",
                other => return other.to_string().into(),
            }
            .into()
        })
}
