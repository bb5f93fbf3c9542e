//! EVM chain client
//!
//! High-level client over an alloy provider for the three things the
//! transfer flow needs on-chain: pre-flight balance/allowance checks, the
//! burn submission carrying hook data, and destination-side flow-record
//! reads. Pre-flight failures carry the exact shortfall so callers can show
//! actionable guidance instead of a revert.

use alloy::primitives::{Address, FixedBytes, B256, U256};
use alloy::providers::Provider;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{ChainError, TransportError};
use crate::evm::contracts::{DestinationAccount, IERC20, TokenMessenger};
use crate::tracker::FlowReader;
use crate::types::FlowRecord;

/// Parameters of one burn submission.
#[derive(Debug, Clone)]
pub struct BurnParams {
    pub amount: U256,
    pub destination_domain: u32,
    /// Receives the mint on the destination chain.
    pub mint_recipient: Address,
    /// Restricts who may complete the mint; zero means anyone.
    pub destination_caller: Address,
    /// Cap on the transit fee deducted in flight.
    pub max_fee: U256,
    /// 1000 selects the fast-transfer tier.
    pub min_finality_threshold: u32,
    /// Encoded action + signature from the codec.
    pub hook_data: Vec<u8>,
}

/// Chain client bound to one chain, one signing owner, and one burn token.
///
/// Owned exclusively by one client instance; no cross-instance sharing.
pub struct EvmChainClient<P: Provider + Clone> {
    provider: P,
    chain_id: u64,
    owner: Address,
    burn_token: Address,
    token_messenger: Address,
}

impl<P: Provider + Clone> EvmChainClient<P> {
    pub fn new(
        provider: P,
        chain_id: u64,
        owner: Address,
        burn_token: Address,
        token_messenger: Address,
    ) -> Self {
        info!(chain_id, owner = %owner, "Created EVM chain client");
        Self {
            provider,
            chain_id,
            owner,
            burn_token,
            token_messenger,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn burn_token(&self) -> Address {
        self.burn_token
    }

    /// Fail fast if the owner cannot cover `amount` of the burn token.
    pub async fn ensure_funds(&self, amount: U256) -> Result<(), ChainError> {
        let token = IERC20::new(self.burn_token, &self.provider);
        let available = token.balanceOf(self.owner).call().await?._0;

        if available < amount {
            return Err(ChainError::InsufficientBalance {
                needed: amount,
                available,
                shortfall: amount - available,
            });
        }
        Ok(())
    }

    /// Fail fast if the token messenger cannot pull `amount` from the owner.
    pub async fn ensure_allowance(&self, amount: U256) -> Result<(), ChainError> {
        let token = IERC20::new(self.burn_token, &self.provider);
        let approved = token
            .allowance(self.owner, self.token_messenger)
            .call()
            .await?
            ._0;

        if approved < amount {
            return Err(ChainError::InsufficientAllowance {
                spender: self.token_messenger,
                needed: amount,
                approved,
                shortfall: amount - approved,
            });
        }
        Ok(())
    }

    /// Approve the token messenger for `amount` when the current allowance
    /// is short. Returns the approval transaction hash when one was needed.
    pub async fn approve_if_needed(&self, amount: U256) -> Result<Option<B256>, ChainError> {
        let token = IERC20::new(self.burn_token, &self.provider);
        let approved = token
            .allowance(self.owner, self.token_messenger)
            .call()
            .await?
            ._0;

        if approved >= amount {
            debug!(%approved, %amount, "Existing allowance is sufficient");
            return Ok(None);
        }

        let receipt = token
            .approve(self.token_messenger, amount)
            .send()
            .await?
            .get_receipt()
            .await?;

        if !receipt.status() {
            return Err(ChainError::Reverted {
                tx_hash: receipt.transaction_hash,
            });
        }

        info!(tx_hash = %receipt.transaction_hash, %amount, "Approved token messenger");
        Ok(Some(receipt.transaction_hash))
    }

    /// Submit the burn carrying the hook data and wait for its receipt.
    pub async fn burn_with_hook(&self, params: BurnParams) -> Result<B256, ChainError> {
        let messenger = TokenMessenger::new(self.token_messenger, &self.provider);

        let mint_recipient = FixedBytes::<32>::left_padding_from(params.mint_recipient.as_slice());
        let destination_caller =
            FixedBytes::<32>::left_padding_from(params.destination_caller.as_slice());

        let receipt = messenger
            .depositForBurnWithHook(
                params.amount,
                params.destination_domain,
                mint_recipient,
                self.burn_token,
                destination_caller,
                params.max_fee,
                params.min_finality_threshold,
                params.hook_data.into(),
            )
            .send()
            .await?
            .get_receipt()
            .await?;

        if !receipt.status() {
            return Err(ChainError::Reverted {
                tx_hash: receipt.transaction_hash,
            });
        }

        info!(
            tx_hash = %receipt.transaction_hash,
            amount = %params.amount,
            destination_domain = params.destination_domain,
            "Burn submitted"
        );
        Ok(receipt.transaction_hash)
    }

    /// Read the per-nonce flow record from a destination account.
    ///
    /// Returns `None` for the all-zero record the contract yields for an
    /// unknown nonce.
    pub async fn flow(
        &self,
        destination_account: Address,
        nonce: U256,
    ) -> Result<Option<FlowRecord>, ChainError> {
        let account = DestinationAccount::new(destination_account, &self.provider);
        let flow = account.flows(nonce).call().await?;

        let record = FlowRecord {
            indexer: flow.indexer,
            executor: flow.executor,
            amount: flow.amount,
            message_hash: flow.messageHash,
            executed: flow.executed,
        };

        if record.indexer == Address::ZERO && record.amount.is_zero() && !record.executed {
            return Ok(None);
        }
        Ok(Some(record))
    }
}

#[async_trait]
impl<P: Provider + Clone> FlowReader for EvmChainClient<P> {
    async fn flow_record(
        &self,
        destination_account: Address,
        nonce: U256,
    ) -> Result<Option<FlowRecord>, TransportError> {
        self.flow(destination_account, nonce)
            .await
            .map_err(|e| TransportError::Rpc(e.to_string()))
    }
}
