//! Peer-relay announcer (REST polling variant)
//!
//! Talks to a relay node's REST API instead of the gateway: announcements
//! and events travel as base64 payloads on a content topic derived from the
//! destination chain id. Event messages published by indexers/relayers are
//! fetched by polling the same topic and filtered locally by
//! (destination account, nonce).

use std::time::Duration;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::announce::{Announcer, EventFilter, EventSubscription, TransferEvent};
use crate::error::TransportError;
use crate::types::TransferAnnouncement;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Content topic carrying all transfer traffic for one destination chain.
pub fn content_topic(destination_chain_id: u64) -> String {
    format!("hookbridge-transfers-{destination_chain_id}")
}

/// Relay-node-backed announcer.
pub struct RelayAnnouncer {
    http: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
}

/// Wire envelope on the relay: opaque base64 payload.
#[derive(Debug, Serialize, Deserialize)]
struct RelayMessage {
    payload: String,
}

/// Event message published on the topic by indexers and relayers.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayEvent {
    destination_account: Address,
    nonce: U256,
    #[serde(flatten)]
    event: TransferEvent,
}

impl RelayAnnouncer {
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

    fn topic_url(base_url: &str, destination_chain_id: u64) -> String {
        format!(
            "{}/relay/v1/messages/{}",
            base_url,
            content_topic(destination_chain_id)
        )
    }

    async fn fetch_messages(
        http: &reqwest::Client,
        endpoint: &str,
    ) -> Result<Vec<RelayMessage>, TransportError> {
        let response = http.get(endpoint).send().await?;
        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
                endpoint: endpoint.to_string(),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Announcer for RelayAnnouncer {
    async fn announce(
        &self,
        announcement: &TransferAnnouncement,
        destination_chain_id: u64,
    ) -> Result<(), TransportError> {
        let endpoint = Self::topic_url(&self.base_url, destination_chain_id);
        let payload = BASE64.encode(serde_json::to_vec(announcement)?);

        let response = self
            .http
            .post(&endpoint)
            .json(&RelayMessage { payload })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
                endpoint,
            });
        }

        info!(
            source_tx_hash = %announcement.source_tx_hash,
            topic = %content_topic(destination_chain_id),
            "Announced transfer via relay"
        );
        Ok(())
    }

    async fn subscribe(&self, filter: EventFilter) -> Result<EventSubscription, TransportError> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let http = self.http.clone();
        let endpoint = Self::topic_url(&self.base_url, filter.destination_chain_id);
        let poll_interval = self.poll_interval;

        let task = tokio::spawn(async move {
            // Messages already forwarded, so re-polls do not replay them.
            let mut seen = 0usize;
            loop {
                tokio::time::sleep(poll_interval).await;

                let messages = match Self::fetch_messages(&http, &endpoint).await {
                    Ok(messages) => messages,
                    Err(error) => {
                        debug!(%error, "Relay poll failed; will retry");
                        continue;
                    }
                };

                for message in messages.iter().skip(seen) {
                    seen += 1;
                    let Ok(raw) = BASE64.decode(message.payload.as_bytes()) else {
                        continue;
                    };
                    // Non-event traffic (e.g. announcements) shares the
                    // topic; skip anything that does not parse as an event.
                    let Ok(event) = serde_json::from_slice::<RelayEvent>(&raw) else {
                        continue;
                    };
                    if event.destination_account != filter.destination_account
                        || event.nonce != filter.nonce
                    {
                        continue;
                    }

                    let terminal = matches!(
                        event.event,
                        TransferEvent::Executed | TransferEvent::ExecutionFailed { .. }
                    );
                    if tx.send(event.event).await.is_err() {
                        return;
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
