use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::types::types::{TransferEvent, TransferRequest};

/// Performs the actual network transfer for an update session.
///
/// The service owns the receiving end of `events` and treats it as the
/// attempt's single callback thread, so implementations only need to send
/// in order.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Reset per-attempt state. The service calls this before the transport
    /// becomes reachable through `cancel`, so a cancel that lands before
    /// `download` starts still applies to that download.
    fn prepare(&self) {}

    /// Run one transfer to completion. Must report exactly one terminal
    /// event (`Finished`, `Errored` or `Cancelled`) before returning.
    async fn download(&self, request: TransferRequest, events: mpsc::Sender<TransferEvent>);

    /// Request cooperative cancellation of the running transfer. Returns
    /// immediately; the transfer reports `Cancelled` when it stops.
    fn cancel(&self);
}
