//! Common types for burn-and-execute transfers
//!
//! Shared between the codec, the tracker, and the announcement transports.

use std::fmt;

use alloy::primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::{FeeConfig, FundingConfig, Permit2Approval};

// ============================================================================
// Transfer Status
// ============================================================================

/// Progress of a single transfer, merged from attestation polling, on-chain
/// flow reads, and announcement events.
///
/// Transitions are monotonic: a status can only advance along
/// `Initiated → Attested → Announced → Minted → Executed`, with `Failed`
/// reachable from any non-terminal state. `Executed` and `Failed` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Initiated,
    Attested,
    Announced,
    Minted,
    Executed,
    Failed,
}

impl TransferStatus {
    /// Ordering rank along the happy path. `Failed` has no rank; it is
    /// handled separately by the transition rules.
    pub fn rank(&self) -> u8 {
        match self {
            TransferStatus::Initiated => 0,
            TransferStatus::Attested => 1,
            TransferStatus::Announced => 2,
            TransferStatus::Minted => 3,
            TransferStatus::Executed => 4,
            TransferStatus::Failed => 5,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Executed | TransferStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Initiated => "initiated",
            TransferStatus::Attested => "attested",
            TransferStatus::Announced => "announced",
            TransferStatus::Minted => "minted",
            TransferStatus::Executed => "executed",
            TransferStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Tracked Record
// ============================================================================

/// Mutable record owned by a tracker instance for the lifetime of one
/// transfer. Mutated only through the tracker's status-advance path.
#[derive(Debug, Clone)]
pub struct TransferRecord {
    /// Burn transaction hash on the source chain.
    pub source_tx_hash: B256,
    /// Deterministic account receiving the mint on the destination chain.
    pub destination_account: Address,
    /// Caller-chosen replay-protection nonce.
    pub nonce: U256,
    /// Last-known status.
    pub status: TransferStatus,
    /// When the status last changed.
    pub last_event_at: DateTime<Utc>,
}

/// Per-nonce flow record read from the destination account contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRecord {
    pub indexer: Address,
    pub executor: Address,
    /// Minted amount; zero until the indexer has minted.
    pub amount: U256,
    pub message_hash: B256,
    /// Set once the relayer has executed the action.
    pub executed: bool,
}

// ============================================================================
// Transfer Announcement
// ============================================================================

/// Versioned announcement envelope published after the burn so indexers and
/// relayers can discover the transfer without watching the source chain.
///
/// JSON field names are camelCase; hook data travels base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferAnnouncement {
    /// Envelope format version.
    pub version: u32,
    /// The burning user (owner of the destination account).
    pub user: Address,
    pub destination_account: Address,
    pub source_tx_hash: B256,
    pub source_domain: u32,
    pub destination_domain: u32,
    pub destination_chain_id: u64,
    /// Amount the destination account is expected to hold after minting.
    pub expected_amount: U256,
    pub nonce: U256,
    /// Unix deadline after which the action is invalid.
    pub deadline: u64,
    /// Encoded action + signature, exactly as embedded in the burn.
    #[serde(with = "base64_bytes")]
    pub hook_data: Vec<u8>,
    pub fee: FeeConfig,
    pub funding: FundingConfig,
    pub permit2_setup: Vec<Permit2Approval>,
    /// Optional proofs letting any third party re-derive the destination
    /// account and re-check the user's signature without trusting us.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_proofs: Option<ValidationProofs>,
}

/// Deterministic-address derivation parameters plus the user's signature
/// over the action, for trustless announcement verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationProofs {
    /// EIP-712 signature over the action, hex-encoded in transport.
    pub signature: alloy::primitives::Bytes,
    /// Account factory the destination account was (or will be) deployed by.
    pub factory: Address,
    /// Owner of the destination account.
    pub owner: Address,
    /// CREATE2 salt.
    pub salt: B256,
    /// Hash of the account init code.
    pub init_code_hash: B256,
}

/// Base64 transport encoding for raw byte fields.
pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ordering() {
        assert!(TransferStatus::Initiated.rank() < TransferStatus::Attested.rank());
        assert!(TransferStatus::Attested.rank() < TransferStatus::Announced.rank());
        assert!(TransferStatus::Announced.rank() < TransferStatus::Minted.rank());
        assert!(TransferStatus::Minted.rank() < TransferStatus::Executed.rank());
    }

    #[test]
    fn terminal_statuses() {
        assert!(TransferStatus::Executed.is_terminal());
        assert!(TransferStatus::Failed.is_terminal());
        assert!(!TransferStatus::Minted.is_terminal());
        assert!(!TransferStatus::Initiated.is_terminal());
    }

    #[test]
    fn status_display() {
        assert_eq!(TransferStatus::Minted.to_string(), "minted");
        assert_eq!(TransferStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn announcement_json_round_trip() {
        let ann = TransferAnnouncement {
            version: 1,
            user: Address::repeat_byte(0x11),
            destination_account: Address::repeat_byte(0x22),
            source_tx_hash: B256::repeat_byte(0x33),
            source_domain: 0,
            destination_domain: 6,
            destination_chain_id: 8453,
            expected_amount: U256::from(14_998_500u64),
            nonce: U256::from(7u64),
            deadline: 1_900_000_000,
            hook_data: vec![0xde, 0xad, 0xbe, 0xef],
            fee: Default::default(),
            funding: Default::default(),
            permit2_setup: vec![],
            validation_proofs: None,
        };

        let json = serde_json::to_string(&ann).unwrap();
        assert!(json.contains("\"destinationChainId\":8453"), "got: {json}");
        assert!(json.contains("\"hookData\":\"3q2+7w==\""), "got: {json}");
        assert!(!json.contains("validationProofs"), "got: {json}");

        let back: TransferAnnouncement = serde_json::from_str(&json).unwrap();
        assert_eq!(back.hook_data, ann.hook_data);
        assert_eq!(back.expected_amount, ann.expected_amount);
        assert_eq!(back.destination_account, ann.destination_account);
    }
}
