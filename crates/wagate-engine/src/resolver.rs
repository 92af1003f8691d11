// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template variable substitution against contact and session state.
//!
//! Supported tokens: `{{contact.name}}`, `{{contact.phone}}`, and
//! `{{vars.<key>}}` for every key of the active session's context.
//! Substitution is one pass per key; produced values are not re-scanned.

use wagate_core::GatewayError;
use wagate_storage::queries::{contacts, sessions};
use wagate_storage::Database;

/// Resolve all known tokens in `text` for the given contact.
pub async fn resolve_variables(
    db: &Database,
    wa_id: &str,
    text: &str,
) -> Result<String, GatewayError> {
    let mut resolved = text.to_string();

    let name = contacts::get(db, wa_id)
        .await?
        .map(|c| c.name)
        .unwrap_or_default();
    resolved = resolved.replace("{{contact.name}}", &name);
    resolved = resolved.replace("{{contact.phone}}", wa_id);

    if let Some(session) = sessions::get_active(db, wa_id).await? {
        for (key, value) in session.context_map() {
            resolved = resolved.replace(&format!("{{{{vars.{key}}}}}"), &value);
        }
    }

    Ok(resolved)
}
