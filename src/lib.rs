//! Hookbridge: Burn-and-Execute Transfer Client
//!
//! Client library for cross-chain stablecoin transfers that carry an
//! executable action: the user burns on the source chain, a decentralized
//! indexer mints into a deterministic destination account, and a relayer
//! executes the user's signed action with the minted funds, paying
//! indexer/relayer fees out of the bridged amount itself.
//!
//! - **Fees** - Bidirectional fee engine (burn → available-for-action and
//!   back) plus feasibility checks and a fail-open live fee oracle
//! - **Action** - Canonical action model, validation, the fixed-layout hook
//!   data codec, and the EIP-712 signing payload
//! - **Tracker** - Monotonic transfer state machine merging attestation
//!   polling, on-chain flow reads, and announcement events
//! - **Announce** - Gateway and peer-relay announcement transports behind
//!   one trait
//! - **Client** - Orchestrator sequencing the full flow with per-step
//!   error attribution
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! hookbridge = { path = "../hookbridge" }
//! ```

pub mod action;
pub mod announce;
pub mod attestation;
pub mod client;
pub mod config;
pub mod error;
pub mod evm;
pub mod fees;
pub mod metrics;
pub mod retry;
pub mod signer;
pub mod tracker;
pub mod types;
pub mod verify;

// Re-export commonly used items at the crate root
pub use action::{
    codec, normalize, typed_data, validate, Action, ActionCall, ActionInputs, CallSpec, FeeConfig,
    FundingConfig, Permit2Approval,
};
pub use announce::{
    Announcer, EventFilter, EventSubscription, GatewayAnnouncer, RelayAnnouncer, TransferEvent,
};
pub use attestation::{AttestationClient, AttestationSource, AttestationStatus};
pub use client::{
    build_announcement, AccountDerivation, AnnouncementContext, TransferClient, TransferHandle,
    TransferRequest,
};
pub use config::ClientConfig;
pub use error::{
    ActionError, ChainError, CodecError, FeeError, SignerError, TrackerError, TransferError,
    TransportError,
};
pub use evm::EvmChainClient;
pub use fees::{
    check_feasibility, compute_breakdown, compute_burn_for_target, FeeBreakdown, FeeParams,
    Feasibility, TransitFeeOracle,
};
pub use signer::{ActionSigner, LocalActionSigner};
pub use tracker::{
    FlowReader, StatusEvent, TrackerConfig, TrackerSources, TransferKeys, TransferTracker,
};
pub use types::{FlowRecord, TransferAnnouncement, TransferRecord, TransferStatus, ValidationProofs};
pub use verify::{derive_destination_account, verify_announcement, VerifyError};
