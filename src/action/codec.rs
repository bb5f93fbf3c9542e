//! Hook-data wire codec
//!
//! The encoded action + signature ("hook data") rides inside the burn
//! transaction and is decoded and checked by the destination-chain verifier
//! against the signed payload, bit for bit. The field order below is a
//! wire-compatibility contract; changing it breaks every deployed verifier.
//!
//! Layout (ABI tuple encoding):
//! `targets[], values[], callDatas[], nonce, deadline, expectedAmount,
//! paymentToken, indexerFee, relayerFee, permit2Setup[](token,spender,amount),
//! ethNeeded, tokensNeeded[], tokenAmounts[], maxReimbursement, signature,
//! version`
//!
//! Version 2 is the current batch layout. Version 1 encoded a single scalar
//! `target/value/callData` instead of the three arrays; decoding falls back
//! to it only after the current layout fails, and lifts the result into the
//! array representation.

use alloy::primitives::Bytes;
use alloy::sol;
use alloy::sol_types::SolValue;

use crate::action::{Action, ActionCall, FeeConfig, FundingConfig, Permit2Approval};
use crate::error::CodecError;

/// Current hook-data layout version.
pub const HOOK_VERSION: u8 = 2;
/// Pre-batch single-call layout.
pub const LEGACY_HOOK_VERSION: u8 = 1;

sol! {
    struct Permit2Tuple {
        address token;
        address spender;
        uint160 amount;
    }

    /// Current (v2) wire layout.
    struct HookPayload {
        address[] targets;
        uint256[] values;
        bytes[] callDatas;
        uint256 nonce;
        uint256 deadline;
        uint256 expectedAmount;
        address paymentToken;
        uint256 indexerFee;
        uint256 relayerFee;
        Permit2Tuple[] permit2Setup;
        uint256 ethNeeded;
        address[] tokensNeeded;
        uint256[] tokenAmounts;
        uint256 maxReimbursement;
        bytes signature;
        uint8 version;
    }

    /// Legacy (v1) wire layout: one scalar call instead of arrays.
    struct LegacyHookPayload {
        address target;
        uint256 value;
        bytes callData;
        uint256 nonce;
        uint256 deadline;
        uint256 expectedAmount;
        address paymentToken;
        uint256 indexerFee;
        uint256 relayerFee;
        Permit2Tuple[] permit2Setup;
        uint256 ethNeeded;
        address[] tokensNeeded;
        uint256[] tokenAmounts;
        uint256 maxReimbursement;
        bytes signature;
        uint8 version;
    }
}

/// Encode an action and its signature into hook data.
///
/// An empty call list is written as the single no-op sentinel call, so the
/// wire never carries zero-length arrays for the call fields.
pub fn encode(action: &Action, signature: &[u8]) -> Vec<u8> {
    let calls = action.canonical_calls();

    let payload = HookPayload {
        targets: calls.iter().map(|c| c.target).collect(),
        values: calls.iter().map(|c| c.value).collect(),
        callDatas: calls.iter().map(|c| c.data.clone()).collect(),
        nonce: action.nonce,
        deadline: action.deadline,
        expectedAmount: action.expected_amount,
        paymentToken: action.fee.payment_token,
        indexerFee: action.fee.indexer_fee,
        relayerFee: action.fee.relayer_fee,
        permit2Setup: action
            .permit2_setup
            .iter()
            .map(|p| Permit2Tuple {
                token: p.token,
                spender: p.spender,
                amount: p.amount,
            })
            .collect(),
        ethNeeded: action.funding.eth_needed,
        tokensNeeded: action.funding.tokens_needed.clone(),
        tokenAmounts: action.funding.token_amounts.clone(),
        maxReimbursement: action.funding.max_reimbursement,
        signature: Bytes::copy_from_slice(signature),
        version: HOOK_VERSION,
    };

    payload.abi_encode()
}

/// Decode hook data back into an action and its signature.
///
/// Tries the current layout first; on structural failure, tries the legacy
/// single-call layout and lifts it into the array form. Anything else is
/// [`CodecError::MalformedHookData`] — short input is an error, never a
/// silent truncation.
pub fn decode(data: &[u8]) -> Result<(Action, Bytes), CodecError> {
    let current_err = match HookPayload::abi_decode(data, true) {
        Ok(payload) if payload.version == HOOK_VERSION => return decode_current(payload),
        Ok(payload) if payload.version != LEGACY_HOOK_VERSION => {
            return Err(CodecError::UnsupportedVersion {
                version: payload.version,
            });
        }
        // A legacy version tag behind a structurally valid current-layout
        // decode means the bytes really are the old layout; fall through.
        Ok(_) => None,
        Err(e) => Some(e.to_string()),
    };

    match LegacyHookPayload::abi_decode(data, true) {
        Ok(payload) => decode_legacy(payload),
        Err(legacy_err) => Err(CodecError::MalformedHookData {
            reason: current_err.unwrap_or_else(|| legacy_err.to_string()),
        }),
    }
}

fn decode_current(mut payload: HookPayload) -> Result<(Action, Bytes), CodecError> {
    let targets = payload.targets.len();
    if payload.values.len() != targets || payload.callDatas.len() != targets {
        return Err(CodecError::MalformedHookData {
            reason: format!(
                "call arrays disagree: {} targets, {} values, {} call datas",
                targets,
                payload.values.len(),
                payload.callDatas.len()
            ),
        });
    }

    let targets = std::mem::take(&mut payload.targets);
    let values = std::mem::take(&mut payload.values);
    let call_datas = std::mem::take(&mut payload.callDatas);
    let calls = targets
        .into_iter()
        .zip(values)
        .zip(call_datas)
        .map(|((target, value), data)| ActionCall {
            target,
            data,
            value,
        })
        .collect();

    Ok(assemble(calls, payload))
}

fn decode_legacy(payload: LegacyHookPayload) -> Result<(Action, Bytes), CodecError> {
    if payload.version != LEGACY_HOOK_VERSION {
        return Err(CodecError::UnsupportedVersion {
            version: payload.version,
        });
    }

    let call = ActionCall {
        target: payload.target,
        data: payload.callData.clone(),
        value: payload.value,
    };

    let lifted = HookPayload {
        targets: vec![],
        values: vec![],
        callDatas: vec![],
        nonce: payload.nonce,
        deadline: payload.deadline,
        expectedAmount: payload.expectedAmount,
        paymentToken: payload.paymentToken,
        indexerFee: payload.indexerFee,
        relayerFee: payload.relayerFee,
        permit2Setup: payload.permit2Setup,
        ethNeeded: payload.ethNeeded,
        tokensNeeded: payload.tokensNeeded,
        tokenAmounts: payload.tokenAmounts,
        maxReimbursement: payload.maxReimbursement,
        signature: payload.signature,
        version: payload.version,
    };

    Ok(assemble(vec![call], lifted))
}

fn assemble(calls: Vec<ActionCall>, payload: HookPayload) -> (Action, Bytes) {
    let action = Action {
        calls,
        nonce: payload.nonce,
        deadline: payload.deadline,
        expected_amount: payload.expectedAmount,
        fee: FeeConfig {
            payment_token: payload.paymentToken,
            indexer_fee: payload.indexerFee,
            relayer_fee: payload.relayerFee,
        },
        permit2_setup: payload
            .permit2Setup
            .into_iter()
            .map(|p| Permit2Approval {
                token: p.token,
                spender: p.spender,
                amount: p.amount,
            })
            .collect(),
        funding: FundingConfig {
            eth_needed: payload.ethNeeded,
            tokens_needed: payload.tokensNeeded,
            token_amounts: payload.tokenAmounts,
            max_reimbursement: payload.maxReimbursement,
        },
    };

    (action, payload.signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{normalize, ActionInputs, CallSpec};
    use alloy::primitives::{aliases::U160, Address, U256};

    fn sample_inputs() -> ActionInputs {
        ActionInputs {
            nonce: U256::from(42u64),
            deadline: U256::from(1_900_000_000u64),
            expected_amount: U256::from(14_998_500u64),
            fee: FeeConfig {
                payment_token: Address::repeat_byte(0xAA),
                indexer_fee: U256::from(100_000u64),
                relayer_fee: U256::from(150_000u64),
            },
            permit2_setup: vec![Permit2Approval {
                token: Address::repeat_byte(0xBB),
                spender: Address::repeat_byte(0xCC),
                amount: U160::from(777u64),
            }],
            funding: FundingConfig {
                eth_needed: U256::from(1_000u64),
                tokens_needed: vec![Address::repeat_byte(0xDD)],
                token_amounts: vec![U256::from(2_000u64)],
                max_reimbursement: U256::from(3_000u64),
            },
        }
    }

    fn batch_action() -> Action {
        normalize(
            CallSpec::Batch(vec![
                ActionCall {
                    target: Address::repeat_byte(0x11),
                    data: Bytes::from(vec![0x01, 0x02, 0x03]),
                    value: U256::from(9u64),
                },
                ActionCall {
                    target: Address::repeat_byte(0x22),
                    data: Bytes::new(),
                    value: U256::ZERO,
                },
            ]),
            sample_inputs(),
        )
    }

    #[test]
    fn round_trip_batch() {
        let action = batch_action();
        let signature = [0x5Au8; 65];

        let encoded = encode(&action, &signature);
        let (decoded, sig) = decode(&encoded).unwrap();

        assert_eq!(decoded, action);
        assert_eq!(sig.as_ref(), &signature[..]);
    }

    #[test]
    fn round_trip_noop() {
        let action = normalize(CallSpec::NoOp, sample_inputs());
        let signature = [0x00u8; 65];

        let encoded = encode(&action, &signature);
        let (decoded, sig) = decode(&encoded).unwrap();

        assert!(decoded.is_noop());
        assert_eq!(decoded, action);
        assert_eq!(sig.len(), 65);
    }

    #[test]
    fn empty_call_list_encodes_as_sentinel() {
        let mut action = batch_action();
        action.calls.clear();

        let encoded = encode(&action, &[0u8; 65]);
        let (decoded, _) = decode(&encoded).unwrap();

        assert_eq!(decoded.calls.len(), 1);
        assert!(decoded.calls[0].is_noop());
    }

    #[test]
    fn truncated_input_is_malformed() {
        let encoded = encode(&batch_action(), &[1u8; 65]);
        let err = decode(&encoded[..encoded.len() / 2]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedHookData { .. }), "got {err:?}");
    }

    #[test]
    fn garbage_input_is_malformed() {
        let err = decode(&[0xFFu8; 40]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedHookData { .. }));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let action = batch_action();
        let calls = action.canonical_calls();
        let payload = HookPayload {
            targets: calls.iter().map(|c| c.target).collect(),
            values: calls.iter().map(|c| c.value).collect(),
            callDatas: calls.iter().map(|c| c.data.clone()).collect(),
            nonce: action.nonce,
            deadline: action.deadline,
            expectedAmount: action.expected_amount,
            paymentToken: action.fee.payment_token,
            indexerFee: action.fee.indexer_fee,
            relayerFee: action.fee.relayer_fee,
            permit2Setup: vec![],
            ethNeeded: action.funding.eth_needed,
            tokensNeeded: action.funding.tokens_needed.clone(),
            tokenAmounts: action.funding.token_amounts.clone(),
            maxReimbursement: action.funding.max_reimbursement,
            signature: Bytes::copy_from_slice(&[1u8; 65]),
            version: 9,
        };

        let err = decode(&payload.abi_encode()).unwrap_err();
        assert_eq!(err, CodecError::UnsupportedVersion { version: 9 });
    }

    #[test]
    fn empty_input_is_malformed() {
        assert!(matches!(
            decode(&[]),
            Err(CodecError::MalformedHookData { .. })
        ));
    }

    fn encode_legacy(action: &Action, signature: &[u8]) -> Vec<u8> {
        let call = &action.calls[0];
        LegacyHookPayload {
            target: call.target,
            value: call.value,
            callData: call.data.clone(),
            nonce: action.nonce,
            deadline: action.deadline,
            expectedAmount: action.expected_amount,
            paymentToken: action.fee.payment_token,
            indexerFee: action.fee.indexer_fee,
            relayerFee: action.fee.relayer_fee,
            permit2Setup: action
                .permit2_setup
                .iter()
                .map(|p| Permit2Tuple {
                    token: p.token,
                    spender: p.spender,
                    amount: p.amount,
                })
                .collect(),
            ethNeeded: action.funding.eth_needed,
            tokensNeeded: action.funding.tokens_needed.clone(),
            tokenAmounts: action.funding.token_amounts.clone(),
            maxReimbursement: action.funding.max_reimbursement,
            signature: Bytes::copy_from_slice(signature),
            version: LEGACY_HOOK_VERSION,
        }
        .abi_encode()
    }

    #[test]
    fn legacy_layout_is_lifted_into_arrays() {
        let single = normalize(
            CallSpec::Single {
                target: Address::repeat_byte(0x33),
                data: Bytes::from(vec![0xCA, 0xFE]),
                value: U256::from(4u64),
            },
            sample_inputs(),
        );
        let signature = [0x77u8; 65];

        let encoded = encode_legacy(&single, &signature);
        let (decoded, sig) = decode(&encoded).unwrap();

        assert_eq!(decoded.calls, single.calls);
        assert_eq!(decoded.nonce, single.nonce);
        assert_eq!(decoded.expected_amount, single.expected_amount);
        assert_eq!(decoded.permit2_setup, single.permit2_setup);
        assert_eq!(decoded.funding, single.funding);
        assert_eq!(sig.as_ref(), &signature[..]);
    }
}
