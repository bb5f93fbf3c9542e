//! Transfer orchestrator
//!
//! Sequences the full burn-and-execute flow:
//! fee breakdown → action normalization/validation → EIP-712 signing →
//! pre-flight checks → burn submission → announcement (with retry) →
//! tracking. Each step's failure is tagged so a caller can resume from the
//! failed step — in particular, a burned-but-unannounced transfer can be
//! re-announced via [`TransferClient::announce`] without burning again.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::Provider;
use chrono::Utc;
use tracing::{info, instrument};

use crate::action::{
    self, codec, typed_data, Action, ActionInputs, CallSpec, FeeConfig, FundingConfig,
    Permit2Approval,
};
use crate::announce::Announcer;
use crate::attestation::AttestationSource;
use crate::config::ClientConfig;
use crate::error::TransferError;
use crate::evm::client::{BurnParams, EvmChainClient};
use crate::fees::{self, FeeBreakdown, FeeParams, Feasibility};
use crate::metrics;
use crate::retry::{self, RetryConfig};
use crate::signer::ActionSigner;
use crate::tracker::{FlowReader, TrackerConfig, TrackerSources, TransferKeys, TransferTracker};
use crate::types::{TransferAnnouncement, ValidationProofs};

/// Current announcement envelope version.
pub const ANNOUNCEMENT_VERSION: u32 = 1;

/// Fast-transfer finality tier requested from the messaging layer.
const FAST_TRANSFER_THRESHOLD: u32 = 1000;

/// CREATE2 parameters for the destination account, when the caller wants
/// third-party-verifiable proofs attached to the announcement.
#[derive(Debug, Clone)]
pub struct AccountDerivation {
    pub factory: Address,
    pub salt: B256,
    pub init_code_hash: B256,
}

/// One transfer request.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Amount to burn on the source chain.
    pub burn_amount: U256,
    /// What the relayer should execute with the minted funds.
    pub call: CallSpec,
    /// Unique per (owner, destination account).
    pub nonce: U256,
    /// Unix deadline for execution.
    pub deadline: U256,
    /// Deterministic account receiving the mint.
    pub destination_account: Address,
    /// Per-request fee override; the client default applies when `None`.
    pub fee_params: Option<FeeParams>,
    pub permit2_setup: Vec<Permit2Approval>,
    pub funding: FundingConfig,
    /// Whether a bridge-only (no-op) transfer is acceptable.
    pub allow_noop: bool,
    /// Attach validation proofs derived from these CREATE2 parameters.
    pub derivation: Option<AccountDerivation>,
}

/// Everything a caller needs to follow one submitted transfer.
pub struct TransferHandle {
    pub source_tx_hash: B256,
    pub breakdown: FeeBreakdown,
    pub announcement: TransferAnnouncement,
    pub tracker: TransferTracker,
}

/// Client facade over the fee engine, codec, signer, chain client,
/// announcer, and tracker.
pub struct TransferClient<P: Provider + Clone> {
    source: Arc<EvmChainClient<P>>,
    flow: Arc<dyn FlowReader>,
    signer: Arc<dyn ActionSigner>,
    announcer: Arc<dyn Announcer>,
    attestation: Arc<dyn AttestationSource>,
    source_domain: u32,
    destination_domain: u32,
    destination_chain_id: u64,
    fee_defaults: FeeParams,
    retry: RetryConfig,
    tracker_config: TrackerConfig,
}

impl<P: Provider + Clone> TransferClient<P> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &ClientConfig,
        source: Arc<EvmChainClient<P>>,
        flow: Arc<dyn FlowReader>,
        signer: Arc<dyn ActionSigner>,
        announcer: Arc<dyn Announcer>,
        attestation: Arc<dyn AttestationSource>,
    ) -> Self {
        let tracker_config = TrackerConfig {
            attestation_interval: Duration::from_millis(config.poll.attestation_interval_ms),
            flow_interval: Duration::from_millis(config.poll.flow_interval_ms),
            announced_delay: Duration::from_millis(config.poll.announced_delay_ms),
        };

        Self {
            source,
            flow,
            signer,
            announcer,
            attestation,
            source_domain: config.source.domain,
            destination_domain: config.destination.domain,
            destination_chain_id: config.destination.chain_id,
            fee_defaults: config.fees.clone(),
            retry: RetryConfig::default(),
            tracker_config,
        }
    }

    /// Forward fee quote for a burn amount.
    pub fn quote(&self, burn_amount: U256) -> Result<FeeBreakdown, TransferError> {
        Ok(fees::compute_breakdown(burn_amount, &self.fee_defaults)?)
    }

    /// Reverse fee quote: the burn required for a target action amount.
    pub fn quote_for_target(&self, target: U256) -> Result<FeeBreakdown, TransferError> {
        Ok(fees::compute_burn_for_target(target, &self.fee_defaults)?)
    }

    /// Can `burn_amount` fund an action costing `action_cost`?
    pub fn feasibility(
        &self,
        burn_amount: U256,
        action_cost: U256,
    ) -> Result<Feasibility, TransferError> {
        Ok(fees::check_feasibility(
            burn_amount,
            action_cost,
            &self.fee_defaults,
        )?)
    }

    /// Run the full transfer flow and return a live tracker.
    #[instrument(skip(self, request), fields(nonce = %request.nonce))]
    pub async fn transfer(&self, request: TransferRequest) -> Result<TransferHandle, TransferError> {
        metrics::record_transfer_initiated();

        let params = request.fee_params.clone().unwrap_or_else(|| self.fee_defaults.clone());
        let breakdown = fees::compute_breakdown(request.burn_amount, &params)?;

        let action = action::normalize(
            request.call.clone(),
            ActionInputs {
                nonce: request.nonce,
                deadline: request.deadline,
                expected_amount: breakdown.expected_amount,
                fee: FeeConfig {
                    // Fees are paid in the bridged asset; the payment token
                    // field carries the source-side asset identity and the
                    // verifier resolves the minted counterpart itself.
                    payment_token: self.source.burn_token(),
                    indexer_fee: params.indexer_fee,
                    relayer_fee: params.relayer_fee,
                },
                permit2_setup: request.permit2_setup.clone(),
                funding: request.funding.clone(),
            },
        );

        let now = Utc::now().timestamp().max(0) as u64;
        action::validate(&action, request.allow_noop, params.protocol_fee_bps, now)?;

        // Signature over the destination-bound payload.
        let domain =
            typed_data::signing_domain(self.destination_chain_id, request.destination_account);
        let signature = self.signer.sign_action(&action, &domain).await?;
        let signature_bytes = signature.as_bytes().to_vec();

        let hook_data = codec::encode(&action, &signature_bytes);

        // Fail fast before spending a transaction on an unfundable burn.
        self.source
            .ensure_funds(request.burn_amount)
            .await
            .map_err(TransferError::Precheck)?;
        self.source
            .ensure_allowance(request.burn_amount)
            .await
            .map_err(TransferError::Precheck)?;

        let burn_result = self
            .source
            .burn_with_hook(BurnParams {
                amount: request.burn_amount,
                destination_domain: self.destination_domain,
                mint_recipient: request.destination_account,
                destination_caller: Address::ZERO,
                max_fee: breakdown.transit_fee,
                min_finality_threshold: FAST_TRANSFER_THRESHOLD,
                hook_data: hook_data.clone(),
            })
            .await;
        metrics::record_burn_submitted(burn_result.is_ok());
        let source_tx_hash = burn_result.map_err(TransferError::Burn)?;

        let announcement = build_announcement(
            &action,
            &signature_bytes,
            &hook_data,
            AnnouncementContext {
                user: self.signer.address(),
                destination_account: request.destination_account,
                source_tx_hash,
                source_domain: self.source_domain,
                destination_domain: self.destination_domain,
                destination_chain_id: self.destination_chain_id,
                derivation: request.derivation.clone(),
            },
        );

        self.announce(&announcement).await?;

        let tracker = self.track(source_tx_hash, request.destination_account, request.nonce);
        tracker.start();

        info!(
            %source_tx_hash,
            burn_amount = %request.burn_amount,
            amount_for_action = %breakdown.amount_for_action,
            "Transfer submitted"
        );

        Ok(TransferHandle {
            source_tx_hash,
            breakdown,
            announcement,
            tracker,
        })
    }

    /// Publish (or re-publish) an announcement, with backoff up to the
    /// retry ceiling. Exposed separately so a transfer whose burn succeeded
    /// but whose announcement failed can resume here.
    pub async fn announce(
        &self,
        announcement: &TransferAnnouncement,
    ) -> Result<(), TransferError> {
        let result = retry::with_retry(&self.retry, "announcement publish", |_attempt| {
            self.announcer
                .announce(announcement, self.destination_chain_id)
        })
        .await;
        metrics::record_announcement(result.is_ok());
        result.map_err(TransferError::Announce)
    }

    /// Build a tracker for an already-submitted transfer.
    pub fn track(
        &self,
        source_tx_hash: B256,
        destination_account: Address,
        nonce: U256,
    ) -> TransferTracker {
        TransferTracker::new(
            TransferKeys {
                source_tx_hash,
                source_domain: self.source_domain,
                destination_chain_id: self.destination_chain_id,
                destination_account,
                nonce,
            },
            TrackerSources {
                attestation: self.attestation.clone(),
                flow: self.flow.clone(),
                announcer: self.announcer.clone(),
            },
            self.tracker_config.clone(),
        )
    }
}

/// Context for assembling an announcement envelope.
pub struct AnnouncementContext {
    pub user: Address,
    pub destination_account: Address,
    pub source_tx_hash: B256,
    pub source_domain: u32,
    pub destination_domain: u32,
    pub destination_chain_id: u64,
    pub derivation: Option<AccountDerivation>,
}

/// Assemble the announcement envelope for a signed, submitted action.
pub fn build_announcement(
    action: &Action,
    signature: &[u8],
    hook_data: &[u8],
    context: AnnouncementContext,
) -> TransferAnnouncement {
    let validation_proofs = context.derivation.map(|derivation| ValidationProofs {
        signature: Bytes::copy_from_slice(signature),
        factory: derivation.factory,
        owner: context.user,
        salt: derivation.salt,
        init_code_hash: derivation.init_code_hash,
    });

    TransferAnnouncement {
        version: ANNOUNCEMENT_VERSION,
        user: context.user,
        destination_account: context.destination_account,
        source_tx_hash: context.source_tx_hash,
        source_domain: context.source_domain,
        destination_domain: context.destination_domain,
        destination_chain_id: context.destination_chain_id,
        expected_amount: action.expected_amount,
        nonce: action.nonce,
        deadline: action.deadline.saturating_to::<u64>(),
        hook_data: hook_data.to_vec(),
        fee: action.fee.clone(),
        funding: action.funding.clone(),
        permit2_setup: action.permit2_setup.clone(),
        validation_proofs,
    }
}
