// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard event fan-out.
//!
//! Single-producer-multi-consumer broadcast. A slow subscriber lags and
//! loses events rather than blocking producers; publishing never waits.

use serde::Serialize;
use tokio::sync::broadcast;

/// A dashboard event as delivered over the WebSocket.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: serde_json::Value,
}

/// Broadcast hub for dashboard events.
#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<Event>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. A send with no subscribers is not an error.
    pub fn publish(&self, kind: &str, data: serde_json::Value) {
        let _ = self.tx.send(Event {
            kind: kind.to_string(),
            data,
        });
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(256)
    }
}
