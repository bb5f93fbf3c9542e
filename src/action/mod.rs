//! Cross-chain action model
//!
//! An [`Action`] is the unit of cross-chain intent: the calls the relayer
//! executes on the destination chain with the minted funds, plus the fee,
//! permit2 and funding terms that make the execution economically viable.
//!
//! Caller input arrives as a [`CallSpec`] tagged union (single call, batch,
//! or explicit no-op) and is resolved exactly once into the canonical form
//! by [`normalize`]. [`validate`] enforces every invariant before a
//! signature is requested — it is the last chance to catch a transfer whose
//! fees exceed its funds before money is burned.

pub mod codec;
pub mod typed_data;

use alloy::primitives::{aliases::U160, Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::fees;

// ============================================================================
// Value Types
// ============================================================================

/// One call the relayer performs on the destination chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCall {
    pub target: Address,
    pub data: Bytes,
    pub value: U256,
}

impl ActionCall {
    /// The no-op sentinel: a single call to the zero address with empty data
    /// and zero value, meaning "just bridge, execute nothing".
    pub fn noop() -> Self {
        Self {
            target: Address::ZERO,
            data: Bytes::new(),
            value: U256::ZERO,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.target == Address::ZERO && self.data.is_empty() && self.value.is_zero()
    }
}

/// Flat per-transfer operator fees, decided by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeConfig {
    /// Token the fees are paid in (the bridged asset).
    pub payment_token: Address,
    pub indexer_fee: U256,
    pub relayer_fee: U256,
}

/// Optional pre-authorization bundled with the action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permit2Approval {
    pub token: Address,
    pub spender: Address,
    pub amount: U160,
}

/// Assets the relayer must front, and the cap on reimbursement for fronting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingConfig {
    pub eth_needed: U256,
    pub tokens_needed: Vec<Address>,
    /// Same length as `tokens_needed`.
    pub token_amounts: Vec<U256>,
    pub max_reimbursement: U256,
}

/// Canonical in-memory action. Immutable once built; constructed fresh per
/// transfer attempt via [`normalize`] and consumed once (signed, encoded,
/// submitted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Ordered calls. Never empty after normalization; a lone no-op call is
    /// the "no-op bridge" sentinel.
    pub calls: Vec<ActionCall>,
    /// Caller-chosen, unique per (owner, destination account). Carried
    /// faithfully; uniqueness is the verifier's job.
    pub nonce: U256,
    /// Unix timestamp after which the action is invalid.
    pub deadline: U256,
    /// Amount the destination account holds after minting, before fees.
    pub expected_amount: U256,
    pub fee: FeeConfig,
    pub permit2_setup: Vec<Permit2Approval>,
    pub funding: FundingConfig,
}

impl Action {
    pub fn is_noop(&self) -> bool {
        self.calls.is_empty() || (self.calls.len() == 1 && self.calls[0].is_noop())
    }

    /// Calls in wire form: an empty list becomes the single no-op sentinel.
    pub(crate) fn canonical_calls(&self) -> Vec<ActionCall> {
        if self.calls.is_empty() {
            vec![ActionCall::noop()]
        } else {
            self.calls.clone()
        }
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Caller-facing call shape, resolved once into the canonical [`Action`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallSpec {
    /// Bridge only, execute nothing.
    NoOp,
    /// A single call.
    Single {
        target: Address,
        data: Bytes,
        value: U256,
    },
    /// An ordered batch. Takes precedence over any single-call shorthand at
    /// the API boundary by construction.
    Batch(Vec<ActionCall>),
}

/// Everything besides the calls themselves.
#[derive(Debug, Clone)]
pub struct ActionInputs {
    pub nonce: U256,
    pub deadline: U256,
    pub expected_amount: U256,
    pub fee: FeeConfig,
    pub permit2_setup: Vec<Permit2Approval>,
    pub funding: FundingConfig,
}

/// Resolve loose input into the canonical action.
///
/// An empty batch, and a single call that happens to equal the sentinel
/// (zero address, empty data, zero value), both collapse into the no-op
/// representation — the wire format cannot tell "explicit no-op" from
/// "nothing supplied", so neither do we.
pub fn normalize(call: CallSpec, inputs: ActionInputs) -> Action {
    let calls = match call {
        CallSpec::NoOp => vec![ActionCall::noop()],
        CallSpec::Single {
            target,
            data,
            value,
        } => vec![ActionCall {
            target,
            data,
            value,
        }],
        CallSpec::Batch(calls) if calls.is_empty() => vec![ActionCall::noop()],
        CallSpec::Batch(calls) => calls,
    };

    Action {
        calls,
        nonce: inputs.nonce,
        deadline: inputs.deadline,
        expected_amount: inputs.expected_amount,
        fee: inputs.fee,
        permit2_setup: inputs.permit2_setup,
        funding: inputs.funding,
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Check every action invariant. `now` is the current unix time.
///
/// The final check is the feasibility guard:
/// `expected_amount >= indexer + relayer + max_reimbursement +
/// protocol_fee(expected_amount)`. Failing it reports the exact shortfall so
/// a UI can tell the user how much more to burn.
pub fn validate(
    action: &Action,
    allow_noop: bool,
    protocol_fee_bps: u32,
    now: u64,
) -> Result<(), ActionError> {
    if action.is_noop() {
        if !allow_noop {
            return Err(ActionError::NoOpNotAllowed);
        }
    } else {
        for (index, call) in action.calls.iter().enumerate() {
            if call.target == Address::ZERO {
                return Err(ActionError::ZeroAddressTarget { index });
            }
        }
    }

    let tokens = action.funding.tokens_needed.len();
    let amounts = action.funding.token_amounts.len();
    if tokens != amounts {
        return Err(ActionError::FundingLengthMismatch { tokens, amounts });
    }

    if action.fee.payment_token == Address::ZERO {
        return Err(ActionError::MissingPaymentToken);
    }

    if action.nonce.is_zero() {
        return Err(ActionError::ZeroNonce);
    }

    if action.deadline <= U256::from(now) {
        return Err(ActionError::Expired {
            deadline: action.deadline,
            now,
        });
    }

    if action.expected_amount.is_zero() {
        return Err(ActionError::ZeroExpectedAmount);
    }

    let protocol_fee = fees::protocol_fee(action.expected_amount, protocol_fee_bps)?;
    let required = action
        .fee
        .indexer_fee
        .checked_add(action.fee.relayer_fee)
        .and_then(|sum| sum.checked_add(action.funding.max_reimbursement))
        .and_then(|sum| sum.checked_add(protocol_fee))
        .ok_or(crate::error::FeeError::Overflow {
            context: "required fees",
        })?;
    if action.expected_amount < required {
        return Err(ActionError::InsufficientExpectedAmount {
            expected: action.expected_amount,
            required,
            shortfall: required - action.expected_amount,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn inputs(expected: u64) -> ActionInputs {
        ActionInputs {
            nonce: U256::from(1u64),
            deadline: U256::from(NOW + 3_600),
            expected_amount: U256::from(expected),
            fee: FeeConfig {
                payment_token: Address::repeat_byte(0xAA),
                indexer_fee: U256::from(100_000u64),
                relayer_fee: U256::from(150_000u64),
            },
            permit2_setup: vec![],
            funding: FundingConfig::default(),
        }
    }

    fn sample_call() -> ActionCall {
        ActionCall {
            target: Address::repeat_byte(0x11),
            data: Bytes::from(vec![0x01, 0x02]),
            value: U256::ZERO,
        }
    }

    #[test]
    fn noop_call_normalizes_to_sentinel() {
        let action = normalize(CallSpec::NoOp, inputs(1_000_000));
        assert_eq!(action.calls.len(), 1);
        assert!(action.calls[0].is_noop());
        assert!(action.is_noop());
    }

    #[test]
    fn empty_batch_collapses_to_sentinel() {
        let action = normalize(CallSpec::Batch(vec![]), inputs(1_000_000));
        assert!(action.is_noop());
    }

    #[test]
    fn accidental_sentinel_single_is_noop() {
        // A single call that equals the sentinel is indistinguishable from
        // an explicit no-op at the wire level; normalization mirrors that.
        let action = normalize(
            CallSpec::Single {
                target: Address::ZERO,
                data: Bytes::new(),
                value: U256::ZERO,
            },
            inputs(1_000_000),
        );
        assert!(action.is_noop());
    }

    #[test]
    fn batch_is_kept_in_order() {
        let second = ActionCall {
            target: Address::repeat_byte(0x22),
            data: Bytes::new(),
            value: U256::from(5u64),
        };
        let action = normalize(
            CallSpec::Batch(vec![sample_call(), second.clone()]),
            inputs(1_000_000),
        );
        assert_eq!(action.calls.len(), 2);
        assert_eq!(action.calls[1], second);
        assert!(!action.is_noop());
    }

    #[test]
    fn noop_rejected_when_not_allowed() {
        let action = normalize(CallSpec::NoOp, inputs(1_000_000));
        let err = validate(&action, false, 10, NOW).unwrap_err();
        assert_eq!(err, ActionError::NoOpNotAllowed);
        assert!(validate(&action, true, 10, NOW).is_ok());
    }

    #[test]
    fn zero_target_rejected_in_real_batch() {
        let action = normalize(
            CallSpec::Batch(vec![
                sample_call(),
                ActionCall {
                    target: Address::ZERO,
                    data: Bytes::from(vec![0xFF]),
                    value: U256::ZERO,
                },
            ]),
            inputs(1_000_000),
        );
        let err = validate(&action, false, 10, NOW).unwrap_err();
        assert_eq!(err, ActionError::ZeroAddressTarget { index: 1 });
    }

    #[test]
    fn funding_length_mismatch_rejected() {
        let mut action = normalize(CallSpec::Batch(vec![sample_call()]), inputs(1_000_000));
        action.funding.tokens_needed = vec![Address::repeat_byte(0x33)];
        action.funding.token_amounts = vec![];
        let err = validate(&action, false, 10, NOW).unwrap_err();
        assert_eq!(
            err,
            ActionError::FundingLengthMismatch {
                tokens: 1,
                amounts: 0
            }
        );
    }

    #[test]
    fn missing_payment_token_rejected() {
        let mut action = normalize(CallSpec::Batch(vec![sample_call()]), inputs(1_000_000));
        action.fee.payment_token = Address::ZERO;
        assert_eq!(
            validate(&action, false, 10, NOW).unwrap_err(),
            ActionError::MissingPaymentToken
        );
    }

    #[test]
    fn zero_nonce_rejected() {
        let mut action = normalize(CallSpec::Batch(vec![sample_call()]), inputs(1_000_000));
        action.nonce = U256::ZERO;
        assert_eq!(
            validate(&action, false, 10, NOW).unwrap_err(),
            ActionError::ZeroNonce
        );
    }

    #[test]
    fn past_deadline_rejected() {
        let mut action = normalize(CallSpec::Batch(vec![sample_call()]), inputs(1_000_000));
        action.deadline = U256::from(NOW);
        assert!(matches!(
            validate(&action, false, 10, NOW).unwrap_err(),
            ActionError::Expired { .. }
        ));
    }

    #[test]
    fn zero_expected_amount_rejected() {
        let action = normalize(CallSpec::Batch(vec![sample_call()]), inputs(0));
        assert_eq!(
            validate(&action, false, 10, NOW).unwrap_err(),
            ActionError::ZeroExpectedAmount
        );
    }

    #[test]
    fn feasibility_boundary_is_exact() {
        // Find the exact boundary: expected == indexer + relayer + reimb +
        // floor(expected * bps / 10000). With 10 bps and 250k flat fees,
        // expected = 250_250 gives protocol fee floor(250_250*10/10000)=250,
        // required = 250_250. Exactly at the boundary: passes.
        let mut action = normalize(CallSpec::Batch(vec![sample_call()]), inputs(250_250));
        assert!(validate(&action, false, 10, NOW).is_ok());

        // One unit less fails with a reported shortfall of exactly 1.
        action.expected_amount = U256::from(250_249u64);
        let err = validate(&action, false, 10, NOW).unwrap_err();
        match err {
            ActionError::InsufficientExpectedAmount { shortfall, .. } => {
                assert_eq!(shortfall, U256::from(1u64));
            }
            other => panic!("expected InsufficientExpectedAmount, got {other:?}"),
        }
    }

    #[test]
    fn reimbursement_counts_toward_required() {
        let mut action = normalize(CallSpec::Batch(vec![sample_call()]), inputs(250_250));
        action.funding.max_reimbursement = U256::from(1u64);
        let err = validate(&action, false, 10, NOW).unwrap_err();
        assert!(matches!(
            err,
            ActionError::InsufficientExpectedAmount { .. }
        ));
    }
}
