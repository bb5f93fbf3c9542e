//! Announcement transports
//!
//! After the burn, the transfer is announced so decentralized indexers and
//! relayers can discover it without watching the source chain; in the other
//! direction, the same channel delivers minted/executed events back to the
//! tracker. Two interchangeable REST implementations are provided — the
//! gateway API and a peer-relay polling variant — behind one trait, so a
//! true push transport can be slotted in without touching the core.

pub mod gateway;
pub mod relay;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::TransportError;
use crate::types::TransferAnnouncement;

pub use gateway::GatewayAnnouncer;
pub use relay::RelayAnnouncer;

/// Event delivered by the announcement channel, keyed by
/// (destination account, nonce).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransferEvent {
    /// The indexer minted `amount` into the destination account.
    Minted { amount: U256 },
    /// The relayer executed the action.
    Executed,
    /// Execution failed terminally.
    #[serde(rename = "failed")]
    ExecutionFailed { reason: String },
}

/// Subscription key for transfer events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub destination_chain_id: u64,
    pub destination_account: Address,
    pub nonce: U256,
}

/// Live subscription. Dropping it unsubscribes (the backing poll task is
/// aborted).
pub struct EventSubscription {
    rx: mpsc::Receiver<TransferEvent>,
    task: JoinHandle<()>,
}

impl EventSubscription {
    pub(crate) fn new(rx: mpsc::Receiver<TransferEvent>, task: JoinHandle<()>) -> Self {
        Self { rx, task }
    }

    /// Next event, or `None` once the channel is closed.
    pub async fn recv(&mut self) -> Option<TransferEvent> {
        self.rx.recv().await
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Announcement capability consumed by the orchestrator and the tracker.
#[async_trait]
pub trait Announcer: Send + Sync {
    /// Publish a transfer announcement toward the destination chain.
    async fn announce(
        &self,
        announcement: &TransferAnnouncement,
        destination_chain_id: u64,
    ) -> Result<(), TransportError>;

    /// Subscribe to minted/executed events for one transfer.
    async fn subscribe(&self, filter: EventFilter) -> Result<EventSubscription, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_event_json_shape() {
        let minted = TransferEvent::Minted {
            amount: U256::from(1_000_000u64),
        };
        let json = serde_json::to_string(&minted).unwrap();
        assert!(json.contains("\"kind\":\"minted\""), "got: {json}");

        let failed: TransferEvent =
            serde_json::from_str(r#"{"kind":"failed","reason":"out of gas"}"#).unwrap();
        assert_eq!(
            failed,
            TransferEvent::ExecutionFailed {
                reason: "out of gas".into()
            }
        );
    }
}
