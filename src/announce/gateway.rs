//! Gateway HTTP announcer
//!
//! REST gateway exposing the announcement feed:
//! - `POST /v1/announce` — publish an announcement
//! - `GET /v1/status/{txHash}` — status of one announced transfer
//! - `GET /v1/transfers?destinationChainId=&destinationAccount=&nonce=` —
//!   transfer records for a subscription key
//!
//! Subscriptions are implemented by polling the transfers endpoint;
//! transient poll failures are logged and swallowed so one flaky poll never
//! kills a subscription.

use std::time::Duration;

use alloy::primitives::{B256, U256};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::announce::{Announcer, EventFilter, EventSubscription, TransferEvent};
use crate::error::TransportError;
use crate::types::TransferAnnouncement;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Gateway-backed announcer.
pub struct GatewayAnnouncer {
    http: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
}

/// One transfer record from the gateway.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayTransfer {
    pub status: String,
    #[serde(default)]
    pub amount: Option<U256>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransfersResponse {
    transfers: Vec<GatewayTransfer>,
}

impl GatewayAnnouncer {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Status of one announced transfer, keyed by its burn transaction.
    pub async fn transfer_status(&self, tx_hash: B256) -> Result<GatewayTransfer, TransportError> {
        let endpoint = format!("{}/v1/status/{}", self.base_url, tx_hash);
        let response = self.http.get(&endpoint).send().await?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
                endpoint,
            });
        }
        Ok(response.json().await?)
    }

    async fn fetch_transfers(
        http: &reqwest::Client,
        base_url: &str,
        filter: &EventFilter,
    ) -> Result<Vec<GatewayTransfer>, TransportError> {
        let endpoint = format!("{base_url}/v1/transfers");
        let response = http
            .get(&endpoint)
            .query(&[
                ("destinationChainId", filter.destination_chain_id.to_string()),
                (
                    "destinationAccount",
                    filter.destination_account.to_string(),
                ),
                ("nonce", filter.nonce.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
                endpoint,
            });
        }

        let body: TransfersResponse = response.json().await?;
        Ok(body.transfers)
    }
}

/// Progress rank of a gateway status string, for transport-level dedup.
fn event_rank(event: &TransferEvent) -> u8 {
    match event {
        TransferEvent::Minted { .. } => 1,
        TransferEvent::Executed | TransferEvent::ExecutionFailed { .. } => 2,
    }
}

pub(crate) fn transfer_to_event(transfer: &GatewayTransfer) -> Option<TransferEvent> {
    match transfer.status.as_str() {
        "minted" => Some(TransferEvent::Minted {
            amount: transfer.amount.unwrap_or(U256::ZERO),
        }),
        "executed" => Some(TransferEvent::Executed),
        "failed" => Some(TransferEvent::ExecutionFailed {
            reason: transfer
                .reason
                .clone()
                .unwrap_or_else(|| "execution failed".to_string()),
        }),
        _ => None,
    }
}

#[async_trait]
impl Announcer for GatewayAnnouncer {
    async fn announce(
        &self,
        announcement: &TransferAnnouncement,
        destination_chain_id: u64,
    ) -> Result<(), TransportError> {
        let endpoint = format!("{}/v1/announce", self.base_url);
        let response = self.http.post(&endpoint).json(announcement).send().await?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
                endpoint,
            });
        }

        info!(
            source_tx_hash = %announcement.source_tx_hash,
            destination_chain_id,
            "Announced transfer via gateway"
        );
        Ok(())
    }

    async fn subscribe(&self, filter: EventFilter) -> Result<EventSubscription, TransportError> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let http = self.http.clone();
        let base_url = self.base_url.clone();
        let poll_interval = self.poll_interval;

        let task = tokio::spawn(async move {
            let mut last_rank = 0u8;
            loop {
                tokio::time::sleep(poll_interval).await;

                let transfers = match Self::fetch_transfers(&http, &base_url, &filter).await {
                    Ok(transfers) => transfers,
                    Err(error) => {
                        debug!(%error, "Gateway transfer poll failed; will retry");
                        continue;
                    }
                };

                for transfer in &transfers {
                    let Some(event) = transfer_to_event(transfer) else {
                        continue;
                    };
                    let rank = event_rank(&event);
                    if rank <= last_rank {
                        continue;
                    }
                    last_rank = rank;
                    let terminal = rank >= 2;
                    if tx.send(event).await.is_err() {
                        return; // subscriber gone
                    }
                    if terminal {
                        return;
                    }
                }
            }
        });

        Ok(EventSubscription::new(rx, task))
    }
}
