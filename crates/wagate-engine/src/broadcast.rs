// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queued template broadcast.
//!
//! The operator API enqueues a job; a single background worker drains the
//! queue and sends the template to each recipient sequentially, logging
//! failures. No scheduling or recurrence beyond this loop.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use wagate_core::ProviderGateway;

/// One broadcast request.
#[derive(Debug, Clone)]
pub struct BroadcastJob {
    pub template_name: String,
    pub language: String,
    pub contacts: Vec<String>,
}

/// Handle for enqueueing broadcast jobs.
#[derive(Clone)]
pub struct BroadcastQueue {
    tx: mpsc::Sender<BroadcastJob>,
}

impl BroadcastQueue {
    /// Spawn the broadcast worker and return the queue handle.
    pub fn start(provider: Arc<dyn ProviderGateway>, cancel: CancellationToken) -> Self {
        let (tx, mut rx) = mpsc::channel::<BroadcastJob>(32);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    job = rx.recv() => {
                        let Some(job) = job else { break };
                        let mut sent = 0usize;
                        for wa_id in &job.contacts {
                            match provider
                                .send_template(wa_id, &job.template_name, &job.language)
                                .await
                            {
                                Ok(()) => sent += 1,
                                Err(e) => {
                                    warn!(
                                        wa_id = wa_id.as_str(),
                                        template = job.template_name.as_str(),
                                        error = %e,
                                        "broadcast send failed"
                                    );
                                }
                            }
                        }
                        info!(
                            template = job.template_name.as_str(),
                            sent,
                            total = job.contacts.len(),
                            "broadcast processed"
                        );
                    }
                    _ = cancel.cancelled() => break,
                }
            }
        });

        Self { tx }
    }

    /// Enqueue a job. Returns false when the queue is full or stopped.
    pub fn enqueue(&self, job: BroadcastJob) -> bool {
        self.tx.try_send(job).is_ok()
    }
}
