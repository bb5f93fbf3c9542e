//! Signer capability
//!
//! One polymorphic interface for producing the EIP-712 signature over an
//! action. Concrete wallet integrations adapt to this trait at the
//! boundary; the codec and orchestrator never inspect the signer beyond it.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signature, SignerSync};
use alloy::sol_types::Eip712Domain;
use async_trait::async_trait;
use tracing::info;

use crate::action::{typed_data, Action};
use crate::error::SignerError;

/// Capability to sign an action for a given destination domain.
#[async_trait]
pub trait ActionSigner: Send + Sync {
    /// The signing address (owner of the destination account).
    fn address(&self) -> Address;

    /// Sign the EIP-712 payload for `action` under `domain`.
    async fn sign_action(
        &self,
        action: &Action,
        domain: &Eip712Domain,
    ) -> Result<Signature, SignerError>;
}

/// In-process private-key signer.
pub struct LocalActionSigner {
    inner: PrivateKeySigner,
}

impl LocalActionSigner {
    /// Create from a hex private key (with or without 0x prefix).
    pub fn new(private_key: &str) -> Result<Self, SignerError> {
        let inner: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| SignerError::InvalidKey(format!("{e}")))?;

        info!(address = %inner.address(), "Local action signer initialized");
        Ok(Self { inner })
    }

    /// Fresh random key, for tests and throwaway environments.
    pub fn random() -> Self {
        Self {
            inner: PrivateKeySigner::random(),
        }
    }
}

#[async_trait]
impl ActionSigner for LocalActionSigner {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn sign_action(
        &self,
        action: &Action,
        domain: &Eip712Domain,
    ) -> Result<Signature, SignerError> {
        let digest = typed_data::signing_hash(action, domain);
        let signature = self.inner.sign_hash_sync(&digest)?;
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{normalize, ActionCall, ActionInputs, CallSpec, FeeConfig, FundingConfig};
    use alloy::primitives::{Address, Bytes, U256};

    fn sample_action() -> Action {
        normalize(
            CallSpec::Batch(vec![ActionCall {
                target: Address::repeat_byte(0x11),
                data: Bytes::from(vec![0x01]),
                value: U256::ZERO,
            }]),
            ActionInputs {
                nonce: U256::from(1u64),
                deadline: U256::from(1_900_000_000u64),
                expected_amount: U256::from(1_000_000u64),
                fee: FeeConfig {
                    payment_token: Address::repeat_byte(0xAA),
                    indexer_fee: U256::from(10u64),
                    relayer_fee: U256::from(20u64),
                },
                permit2_setup: vec![],
                funding: FundingConfig::default(),
            },
        )
    }

    #[test]
    fn rejects_invalid_key() {
        assert!(matches!(
            LocalActionSigner::new("not-a-key"),
            Err(SignerError::InvalidKey(_))
        ));
    }

    #[test]
    fn signature_recovers_to_signer_address() {
        tokio_test::block_on(async {
            let signer = LocalActionSigner::random();
            let action = sample_action();
            let domain = typed_data::signing_domain(8453, Address::repeat_byte(0x22));

            let signature = signer.sign_action(&action, &domain).await.unwrap();
            let digest = typed_data::signing_hash(&action, &domain);
            let recovered = signature.recover_address_from_prehash(&digest).unwrap();

            assert_eq!(recovered, signer.address());
        });
    }
}
