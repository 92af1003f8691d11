// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flow execution engine and automation rules for the wagate gateway.
//!
//! The [`Engine`] is the per-contact conversation state machine: it
//! interprets node/step graphs, validates input with bounded retries,
//! resolves interactive-reply branches, renders template variables, and
//! coordinates with the rule matcher for messages outside any flow.
//! [`ContactRouter`] serializes all of it per contact.

pub mod broadcast;
pub mod coordinator;
pub mod dispatcher;
pub mod edges;
pub mod events;
pub mod executor;
pub mod ingress;
pub mod outbox;
pub mod resolver;
pub mod rules;
pub mod validator;

use std::sync::Arc;

use wagate_core::ProviderGateway;
use wagate_storage::Database;

pub use broadcast::{BroadcastJob, BroadcastQueue};
pub use dispatcher::ContactRouter;
pub use events::{Event, EventHub};
pub use ingress::WebhookPayload;
pub use outbox::Outbox;

/// The flow coordinator and rule matcher, bound to storage, a provider,
/// and the dashboard event hub.
pub struct Engine {
    db: Database,
    provider: Arc<dyn ProviderGateway>,
    hub: EventHub,
    test_triggers: bool,
}

impl Engine {
    pub fn new(db: Database, provider: Arc<dyn ProviderGateway>, hub: EventHub) -> Self {
        Self {
            db,
            provider,
            hub,
            test_triggers: false,
        }
    }

    /// Enable the `test`/`start` debugging trigger.
    pub fn with_test_triggers(mut self, enabled: bool) -> Self {
        self.test_triggers = enabled;
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn provider(&self) -> &Arc<dyn ProviderGateway> {
        &self.provider
    }

    pub fn hub(&self) -> &EventHub {
        &self.hub
    }
}
