// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine testing.
//!
//! Assembles a complete engine over a temp SQLite database with a capturing
//! mock provider (wrapped in the send-logging outbox, as in production).
//! Helpers seed flows and rules and drive inbound messages through the same
//! entry point the dispatcher uses.

use std::sync::Arc;

use wagate_core::types::ConversationSession;
use wagate_core::GatewayError;
use wagate_engine::{Engine, EventHub, Outbox};
use wagate_storage::queries::{flows, rules, sessions};
use wagate_storage::Database;

use crate::mock_provider::MockProvider;

/// Builder for configuring the test harness.
pub struct TestHarnessBuilder {
    test_triggers: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            test_triggers: false,
        }
    }

    /// Enable the `test`/`start` debug trigger.
    pub fn with_test_triggers(mut self) -> Self {
        self.test_triggers = true;
        self
    }

    pub async fn build(self) -> Result<TestHarness, GatewayError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| GatewayError::Storage {
            source: e.into(),
        })?;
        let db_path = temp_dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap_or("test.db")).await?;

        let hub = EventHub::default();
        let provider = Arc::new(MockProvider::new());
        let outbox = Arc::new(Outbox::new(provider.clone(), db.clone(), hub.clone()));
        let engine = Arc::new(
            Engine::new(db.clone(), outbox, hub.clone()).with_test_triggers(self.test_triggers),
        );

        Ok(TestHarness {
            engine,
            provider,
            db,
            hub,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete engine environment over temp storage.
pub struct TestHarness {
    /// The engine under test.
    pub engine: Arc<Engine>,
    /// The capturing mock provider behind the outbox.
    pub provider: Arc<MockProvider>,
    /// Direct storage access for seeding and assertions.
    pub db: Database,
    /// Dashboard event hub.
    pub hub: EventHub,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Shorthand for the default harness.
    pub async fn new() -> Result<Self, GatewayError> {
        Self::builder().build().await
    }

    /// Save a flow graph from its authored JSON form.
    pub async fn save_flow(
        &self,
        flow_id: &str,
        name: &str,
        graph_json: &str,
    ) -> Result<(), GatewayError> {
        let payload = serde_json::from_str(graph_json)
            .map_err(|e| GatewayError::Internal(format!("bad test graph: {e}")))?;
        flows::save_graph(&self.db, flow_id, name, &payload).await
    }

    /// Create an enabled automation rule.
    pub async fn add_rule(
        &self,
        name: &str,
        priority: i64,
        conditions: &str,
        actions: &str,
    ) -> Result<i64, GatewayError> {
        rules::create(&self.db, name, "keyword", priority, conditions, actions).await
    }

    /// Drive one inbound text through the engine, exactly as a contact
    /// worker would.
    pub async fn inbound_text(&self, wa_id: &str, text: &str) -> Result<(), GatewayError> {
        self.engine.process_incoming(wa_id, text).await
    }

    /// The contact's active session, if any.
    pub async fn active_session(
        &self,
        wa_id: &str,
    ) -> Result<Option<ConversationSession>, GatewayError> {
        sessions::get_active(&self.db, wa_id).await
    }

    /// A session by id.
    pub async fn session(&self, id: i64) -> Result<Option<ConversationSession>, GatewayError> {
        sessions::get(&self.db, id).await
    }

    /// One key of a session's context.
    pub async fn context_value(
        &self,
        session_id: i64,
        key: &str,
    ) -> Result<Option<String>, GatewayError> {
        sessions::get_context(&self.db, session_id, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::new().await.unwrap();
        assert!(harness.active_session("nobody").await.unwrap().is_none());
        assert_eq!(harness.provider.sent_count().await, 0);
    }

    #[tokio::test]
    async fn harnesses_are_isolated() {
        let h1 = TestHarness::new().await.unwrap();
        let h2 = TestHarness::new().await.unwrap();

        h1.save_flow("f", "only in h1", r#"{"nodes": [], "edges": []}"#)
            .await
            .unwrap();

        assert_eq!(flows::list(&h1.db).await.unwrap().len(), 1);
        assert!(flows::list(&h2.db).await.unwrap().is_empty());
    }
}
