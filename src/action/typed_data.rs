//! EIP-712 signing payload
//!
//! The signed structure mirrors the action's nested shape (separate fee,
//! funding and permit2 substructures) rather than the flat wire layout; the
//! destination-chain verifier reconstructs the same structure from the
//! decoded hook data and checks the signature against it. The domain binds
//! the signature to one destination chain and one destination account, so a
//! signed action cannot be replayed elsewhere.

use std::borrow::Cow;

use alloy::primitives::{Address, B256, U256};
use alloy::sol;
use alloy::sol_types::{Eip712Domain, SolStruct};

use crate::action::Action;

/// EIP-712 domain name, fixed across deployments.
pub const SIGNING_DOMAIN_NAME: &str = "HookBridgeAccount";
/// EIP-712 domain version.
pub const SIGNING_DOMAIN_VERSION: &str = "1";

sol! {
    struct Call {
        address target;
        uint256 value;
        bytes data;
    }

    struct FeeTerms {
        address paymentToken;
        uint256 indexerFee;
        uint256 relayerFee;
    }

    struct FundingTerms {
        uint256 ethNeeded;
        address[] tokensNeeded;
        uint256[] tokenAmounts;
        uint256 maxReimbursement;
    }

    struct Permit2Setup {
        address token;
        address spender;
        uint160 amount;
    }

    /// The structure the user actually signs.
    struct HookedTransfer {
        Call[] calls;
        uint256 nonce;
        uint256 deadline;
        uint256 expectedAmount;
        FeeTerms feeConfig;
        FundingTerms fundingConfig;
        Permit2Setup[] permit2Setup;
    }
}

/// Build the signing structure from a canonical action.
pub fn signing_payload(action: &Action) -> HookedTransfer {
    HookedTransfer {
        calls: action
            .canonical_calls()
            .into_iter()
            .map(|c| Call {
                target: c.target,
                value: c.value,
                data: c.data,
            })
            .collect(),
        nonce: action.nonce,
        deadline: action.deadline,
        expectedAmount: action.expected_amount,
        feeConfig: FeeTerms {
            paymentToken: action.fee.payment_token,
            indexerFee: action.fee.indexer_fee,
            relayerFee: action.fee.relayer_fee,
        },
        fundingConfig: FundingTerms {
            ethNeeded: action.funding.eth_needed,
            tokensNeeded: action.funding.tokens_needed.clone(),
            tokenAmounts: action.funding.token_amounts.clone(),
            maxReimbursement: action.funding.max_reimbursement,
        },
        permit2Setup: action
            .permit2_setup
            .iter()
            .map(|p| Permit2Setup {
                token: p.token,
                spender: p.spender,
                amount: p.amount,
            })
            .collect(),
    }
}

/// Domain tuple binding a signature to the destination chain and the
/// destination account that will verify it.
pub fn signing_domain(destination_chain_id: u64, destination_account: Address) -> Eip712Domain {
    Eip712Domain {
        name: Some(Cow::Borrowed(SIGNING_DOMAIN_NAME)),
        version: Some(Cow::Borrowed(SIGNING_DOMAIN_VERSION)),
        chain_id: Some(U256::from(destination_chain_id)),
        verifying_contract: Some(destination_account),
        salt: None,
    }
}

/// The digest the signer capability must sign.
pub fn signing_hash(action: &Action, domain: &Eip712Domain) -> B256 {
    signing_payload(action).eip712_signing_hash(domain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{normalize, ActionCall, ActionInputs, CallSpec, FeeConfig, FundingConfig};
    use alloy::primitives::Bytes;

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
    fn signing_hash_is_deterministic() {
        let action = sample_action();
        let domain = signing_domain(8453, Address::repeat_byte(0x22));
        assert_eq!(signing_hash(&action, &domain), signing_hash(&action, &domain));
    }

    #[test]
    fn domain_separates_chains_and_accounts() {
        let action = sample_action();
        let base = signing_hash(&action, &signing_domain(8453, Address::repeat_byte(0x22)));
        let other_chain = signing_hash(&action, &signing_domain(1, Address::repeat_byte(0x22)));
        let other_account = signing_hash(&action, &signing_domain(8453, Address::repeat_byte(0x23)));

        assert_ne!(base, other_chain);
        assert_ne!(base, other_account);
    }

    #[test]
    fn payload_changes_change_the_hash() {
        let domain = signing_domain(8453, Address::repeat_byte(0x22));
        let action = sample_action();
        let mut tweaked = action.clone();
        tweaked.nonce = U256::from(2u64);

        assert_ne!(
            signing_hash(&action, &domain),
            signing_hash(&tweaked, &domain)
        );
    }

    #[test]
    fn noop_and_empty_calls_sign_identically() {
        let mut noop = sample_action();
        noop.calls = vec![ActionCall::noop()];
        let mut empty = sample_action();
        empty.calls.clear();

        let domain = signing_domain(8453, Address::repeat_byte(0x22));
        assert_eq!(signing_hash(&noop, &domain), signing_hash(&empty, &domain));
    }
}
