//! Correlation registry for brokered acquisition
//!
//! Bridges an in-process waiter to an out-of-band answer delivered later by
//! the companion extension process. Settlement is the atomic removal of the
//! entry from the table: whichever of delivery or expiry removes the entry
//! first wins, and the other becomes a no-op. Entries never outlive
//! settlement, so the table cannot grow under sustained load.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use uuid::Uuid;

use super::WebContent;

/// Process-local table of pending brokered acquisitions
#[derive(Debug, Default)]
pub struct CorrelationRegistry {
    pending: DashMap<String, oneshot::Sender<WebContent>>,
}

/// Handle returned by [`CorrelationRegistry::register`]
///
/// Awaiting it yields the delivered content, or `None` once the deadline
/// elapses without delivery.
pub struct AcquisitionWaiter {
    request_id: String,
    deadline: Duration,
    receiver: oneshot::Receiver<WebContent>,
    registry: Arc<CorrelationRegistry>,
}

impl CorrelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a unique request id and a waiter with the given deadline
    ///
    /// Ids combine a millisecond timestamp with a random suffix, which is
    /// collision-free for the process lifetime.
    pub fn register(self: &Arc<Self>, deadline: Duration) -> (String, AcquisitionWaiter) {
        let request_id = format!(
            "{}-{}",
            chrono::Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        );

        let (sender, receiver) = oneshot::channel();
        self.pending.insert(request_id.clone(), sender);

        let waiter = AcquisitionWaiter {
            request_id: request_id.clone(),
            deadline,
            receiver,
            registry: Arc::clone(self),
        };

        (request_id, waiter)
    }

    /// Deliver a result for a pending request
    ///
    /// Returns true if this call settled the entry. Duplicate or late
    /// deliveries find no entry and are no-ops.
    pub fn resolve(&self, request_id: &str, content: WebContent) -> bool {
        match self.pending.remove(request_id) {
            Some((_, sender)) => {
                // The waiter may have been dropped; settlement already
                // happened via removal either way.
                let _ = sender.send(content);
                true
            }
            None => {
                tracing::debug!("Late or duplicate delivery ignored for {request_id}");
                false
            }
        }
    }

    /// Number of unsettled entries
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl AcquisitionWaiter {
    /// Await delivery up to the deadline
    ///
    /// `None` means the deadline fired first and the entry has been settled
    /// as expired; a delivery racing the deadline still wins if it removed
    /// the entry before expiry could.
    pub async fn wait(mut self) -> Option<WebContent> {
        match tokio::time::timeout(self.deadline, &mut self.receiver).await {
            Ok(Ok(content)) => Some(content),
            // Sender dropped without sending; treat as expired.
            Ok(Err(_)) => {
                self.registry.pending.remove(&self.request_id);
                None
            }
            Err(_elapsed) => {
                if self.registry.pending.remove(&self.request_id).is_some() {
                    None
                } else {
                    // resolve won the race at the deadline; the value may
                    // already be sitting in the channel.
                    self.receiver.try_recv().ok()
                }
            }
        }
    }

    /// The id this waiter is registered under
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}
