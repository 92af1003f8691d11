// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-contact serialization of inbound processing.
//!
//! Every contact gets a bounded FIFO queue drained by one worker task, so
//! at most one `process_incoming` runs per contact at a time and messages
//! are handled in webhook arrival order. Nothing orders work across
//! distinct contacts.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use wagate_core::types::InboundMessage;

use crate::Engine;

/// Routes inbound messages onto per-contact worker queues.
pub struct ContactRouter {
    engine: Arc<Engine>,
    queues: DashMap<String, mpsc::Sender<InboundMessage>>,
    capacity: usize,
    cancel: CancellationToken,
}

impl ContactRouter {
    pub fn new(engine: Arc<Engine>, capacity: usize, cancel: CancellationToken) -> Self {
        Self {
            engine,
            queues: DashMap::new(),
            capacity: capacity.max(1),
            cancel,
        }
    }

    /// Enqueue a message on its contact's queue, spawning the worker on
    /// first contact. Waits for queue space, preserving arrival order.
    pub async fn dispatch(&self, message: InboundMessage) {
        if self.cancel.is_cancelled() {
            warn!(wa_id = message.wa_id.as_str(), "router stopped, dropping message");
            return;
        }

        let wa_id = message.wa_id.clone();
        let sender = self
            .queues
            .entry(wa_id.clone())
            .or_insert_with(|| self.spawn_worker(&wa_id))
            .clone();

        if sender.send(message).await.is_err() {
            // Worker exited (shutdown race); nothing left to do with the
            // message unless we are still running.
            self.queues.remove(&wa_id);
            warn!(wa_id = wa_id.as_str(), "contact worker gone, message dropped");
        }
    }

    /// Number of live contact queues.
    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }

    fn spawn_worker(&self, wa_id: &str) -> mpsc::Sender<InboundMessage> {
        let (tx, mut rx) = mpsc::channel::<InboundMessage>(self.capacity);
        let engine = self.engine.clone();
        let cancel = self.cancel.clone();
        let wa_id = wa_id.to_string();

        tokio::spawn(async move {
            debug!(wa_id = wa_id.as_str(), "contact worker started");
            loop {
                tokio::select! {
                    message = rx.recv() => {
                        let Some(message) = message else { break };
                        if let Err(e) = engine
                            .process_incoming(&message.wa_id, &message.content)
                            .await
                        {
                            // Processing failures stay inside the worker;
                            // the webhook already answered 200.
                            error!(
                                wa_id = message.wa_id.as_str(),
                                error = %e,
                                "inbound processing failed"
                            );
                        }
                    }
                    _ = cancel.cancelled() => {
                        debug!(wa_id = wa_id.as_str(), "contact worker shutting down");
                        break;
                    }
                }
            }
        });

        tx
    }
}
