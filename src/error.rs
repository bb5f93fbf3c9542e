//! Error taxonomy for the transfer client
//!
//! Construction/validation failures are synchronous and raised before any
//! network call. Submission failures carry the step they came from so a
//! caller can resume a half-finished transfer instead of restarting it.

use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

use crate::types::TransferStatus;

/// Fee parameter / arithmetic failures. Always local, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    /// A basis-point parameter is outside [0, 10000].
    #[error("invalid fee parameters: {name} is {value} bps, maximum is 10000")]
    InvalidFeeParameters { name: &'static str, value: u32 },

    /// A 100% rate makes the reverse calculation divide by zero.
    #[error("invalid fee parameters: {name} of 10000 bps consumes the entire amount")]
    RateConsumesAmount { name: &'static str },

    #[error("arithmetic overflow while computing {context}")]
    Overflow { context: &'static str },
}

/// Action invariant violations, raised by `action::validate` before any
/// signature or transaction is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("action has no calls and no-op transfers are not allowed here")]
    NoOpNotAllowed,

    #[error("call {index} targets the zero address")]
    ZeroAddressTarget { index: usize },

    #[error("funding arrays disagree: {tokens} tokens but {amounts} amounts")]
    FundingLengthMismatch { tokens: usize, amounts: usize },

    #[error("fee payment token is not set")]
    MissingPaymentToken,

    #[error("nonce must be non-zero")]
    ZeroNonce,

    /// Deadline already passed at validation time.
    #[error("deadline {deadline} is not in the future (now {now})")]
    Expired { deadline: U256, now: u64 },

    #[error("expected amount must be non-zero")]
    ZeroExpectedAmount,

    /// The feasibility guard: minted funds cannot cover every party's fee.
    #[error(
        "expected amount {expected} cannot cover total fees {required}; need {shortfall} more"
    )]
    InsufficientExpectedAmount {
        expected: U256,
        required: U256,
        shortfall: U256,
    },

    #[error(transparent)]
    Fee(#[from] FeeError),
}

/// Hook-data decode failures. Surfaced to whichever party attempted the
/// decode; the only recovery path is the explicit legacy-layout fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("malformed hook data: {reason}")]
    MalformedHookData { reason: String },

    #[error("malformed hook data: unsupported version {version}")]
    UnsupportedVersion { version: u8 },
}

/// Chain client failures around the burn submission.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Caught by the pre-flight balance read, before submitting.
    #[error("insufficient balance: need {needed}, have {available} ({shortfall} more required)")]
    InsufficientBalance {
        needed: U256,
        available: U256,
        shortfall: U256,
    },

    /// Caught by the pre-flight allowance read, before submitting.
    #[error(
        "insufficient allowance for {spender}: need {needed}, approved {approved} \
         ({shortfall} more required)"
    )]
    InsufficientAllowance {
        spender: Address,
        needed: U256,
        approved: U256,
        shortfall: U256,
    },

    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: B256 },

    #[error("contract error: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("transaction error: {0}")]
    Transaction(#[from] alloy::providers::PendingTransactionError),
}

/// HTTP transport failures (attestation service, gateway, relay, fee
/// oracle). Transient by default: retried with backoff at the operation
/// level, swallowed and logged during routine status polling.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response status {status} from {endpoint}")]
    Status { status: u16, endpoint: String },

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid hex in response: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("response missing required field: {0}")]
    MissingField(&'static str),
}

impl TransportError {
    /// Whether a retry can plausibly succeed. Client-side errors (4xx) are
    /// permanent; server-side and connection-level failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            TransportError::Status { status, .. } => *status >= 500 || *status == 429,
            TransportError::Rpc(_) => true,
            TransportError::Decode(_) | TransportError::Hex(_) | TransportError::MissingField(_) => {
                false
            }
        }
    }
}

/// Signer capability failures.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("signer backend error: {0}")]
    Backend(#[from] alloy::signers::Error),
}

/// Tracker wait failures. Background polling never raises these; only
/// explicit `wait_for_status` calls do.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("timed out after {waited:?} waiting for status {target}")]
    Timeout {
        target: TransferStatus,
        waited: Duration,
    },

    #[error("transfer failed: {reason}")]
    TransferFailed { reason: String },

    #[error("tracker is stopped")]
    Stopped,
}

/// Orchestrator failure, tagged with the step that produced it so callers
/// can resume from that step (e.g. re-announce a burned-but-unannounced
/// transfer) instead of burning twice.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("fee calculation failed: {0}")]
    Fee(#[from] FeeError),

    #[error("action validation failed: {0}")]
    Validation(#[from] ActionError),

    #[error("signing failed: {0}")]
    Sign(#[from] SignerError),

    #[error("pre-flight check failed: {0}")]
    Precheck(ChainError),

    #[error("burn submission failed: {0}")]
    Burn(ChainError),

    #[error("announcement failed after retries: {0}")]
    Announce(TransportError),
}
