//! Seam between the connector and the host bot runtime.

use {async_trait::async_trait, tokio::sync::oneshot, tracing::debug};

use crate::{normalize::NormalizedMessage, outbound::OutboundMessage};

/// One-shot capability to complete a deferred slash-command HTTP response.
///
/// Owned by the single in-flight request that created it and never stored
/// beyond that request's completion. Dropping it unanswered completes the
/// webhook response with an empty body.
#[derive(Debug)]
pub struct ReplySink {
    tx: oneshot::Sender<OutboundMessage>,
}

impl ReplySink {
    /// Create a sink and the receiving half the webhook endpoint awaits.
    pub fn channel() -> (Self, oneshot::Receiver<OutboundMessage>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Complete the pending response. The receiving side may already be
    /// gone; that reply is dropped.
    pub fn send(self, reply: OutboundMessage) {
        if self.tx.send(reply).is_err() {
            debug!("command reply dropped: request no longer pending");
        }
    }
}

/// Host-runtime hook receiving every normalized inbound message.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// `reply` is present exactly for slash commands and completes the
    /// deferred HTTP response; for everything else the request was already
    /// acknowledged.
    async fn on_message(&self, message: NormalizedMessage, reply: Option<ReplySink>);
}
