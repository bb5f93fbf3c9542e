//! Attestation service client
//!
//! Queries the external attestation service for the status of a burn
//! transaction. A 404 or a pending entry is a normal "not yet available"
//! signal, not an error — the tracker polls until the attestation turns
//! complete.

use std::time::Duration;

use alloy::primitives::{Bytes, B256};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::TransportError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Attestation status for one burn transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttestationStatus {
    /// Not yet attested (404 or a pending entry).
    Pending,
    /// Attestation complete; the proof authorizes minting.
    Complete { attestation: Bytes },
}

/// Capability consumed by the tracker. Lets tests substitute a scripted
/// source for the HTTP client.
#[async_trait]
pub trait AttestationSource: Send + Sync {
    async fn message_status(
        &self,
        source_domain: u32,
        tx_hash: B256,
    ) -> Result<AttestationStatus, TransportError>;
}

/// HTTP client for the attestation service.
pub struct AttestationClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct MessageEntry {
    status: String,
    attestation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    messages: Vec<MessageEntry>,
}

impl AttestationClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl AttestationSource for AttestationClient {
    async fn message_status(
        &self,
        source_domain: u32,
        tx_hash: B256,
    ) -> Result<AttestationStatus, TransportError> {
        let endpoint = format!(
            "{}/v2/messages/{}?transactionHash={}",
            self.base_url, source_domain, tx_hash
        );
        let response = self.http.get(&endpoint).send().await?;

        // Absence means "not yet available", by contract.
        if response.status().as_u16() == 404 {
            debug!(%tx_hash, "Attestation not yet available");
            return Ok(AttestationStatus::Pending);
        }
        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
                endpoint,
            });
        }

        let body: MessagesResponse = response.json().await?;
        let entry = match body.messages.first() {
            Some(entry) => entry,
            None => return Ok(AttestationStatus::Pending),
        };

        if entry.status != "complete" {
            debug!(%tx_hash, status = %entry.status, "Attestation pending");
            return Ok(AttestationStatus::Pending);
        }

        let attestation_hex = entry
            .attestation
            .as_deref()
            .ok_or(TransportError::MissingField("attestation"))?;
        let raw = hex::decode(attestation_hex.trim_start_matches("0x"))?;

        Ok(AttestationStatus::Complete {
            attestation: Bytes::from(raw),
        })
    }
}
