// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the wagate gateway.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level gateway configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// WhatsApp Cloud API credentials.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Flow engine tuning.
    #[serde(default)]
    pub engine: EngineConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// WhatsApp Cloud API configuration.
///
/// The token, phone number id, and business account id are also persisted to
/// the `system_settings` table at startup and reloaded from there when
/// present.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Webhook challenge verification token.
    #[serde(default)]
    pub verify_token: String,

    /// Graph API bearer token.
    #[serde(default)]
    pub access_token: String,

    /// Sending phone number id.
    #[serde(default)]
    pub phone_number_id: String,

    /// WhatsApp Business Account id (template management).
    #[serde(default)]
    pub business_account_id: String,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file. Overrides `database_name`.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Database name; used as `<name>.db` when `database_path` is untouched.
    #[serde(default)]
    pub database_name: String,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl StorageConfig {
    /// The effective database file location.
    pub fn effective_path(&self) -> String {
        if self.database_path != default_database_path() || self.database_name.is_empty() {
            self.database_path.clone()
        } else {
            format!("{}.db", self.database_name)
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            database_name: String::new(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "wagate.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Flow engine tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Capacity of each per-contact inbound queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Debugging hook: `test`/`start` keywords launch the most recently
    /// updated flow when no rule matched.
    #[serde(default)]
    pub test_triggers: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            test_triggers: false,
        }
    }
}

fn default_queue_capacity() -> usize {
    64
}
