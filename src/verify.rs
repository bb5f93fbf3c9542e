//! Announcement verification
//!
//! Any third party can check a transfer announcement without trusting the
//! announcer: re-derive the destination account from the CREATE2 parameters
//! in the validation-proofs block, check the envelope against the decoded
//! hook data, and recover the EIP-712 signer from the embedded signature.

use alloy::primitives::{Address, B256};
use alloy::signers::Signature;
use thiserror::Error;
use tracing::debug;

use crate::action::{codec, typed_data};
use crate::error::CodecError;
use crate::types::TransferAnnouncement;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("announcement carries no validation proofs")]
    MissingProofs,

    #[error("derived destination account {derived} does not match announced {announced}")]
    AccountMismatch { derived: Address, announced: Address },

    #[error("announcement field {field} does not match the hook data")]
    FieldMismatch { field: &'static str },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("signature is not recoverable: {0}")]
    Signature(String),

    #[error("recovered signer {recovered} does not match announced owner {owner}")]
    SignerMismatch { recovered: Address, owner: Address },
}

/// CREATE2 address of the deterministic destination account.
pub fn derive_destination_account(
    factory: Address,
    salt: B256,
    init_code_hash: B256,
) -> Address {
    factory.create2(salt, init_code_hash)
}

/// Verify an announcement end to end.
///
/// Checks, in order: proofs present, CREATE2 derivation matches the
/// announced destination account, hook data decodes and agrees with the
/// envelope's nonce/amount/deadline, and the EIP-712 signature recovers to
/// the announced owner.
pub fn verify_announcement(announcement: &TransferAnnouncement) -> Result<(), VerifyError> {
    let proofs = announcement
        .validation_proofs
        .as_ref()
        .ok_or(VerifyError::MissingProofs)?;

    let derived = derive_destination_account(proofs.factory, proofs.salt, proofs.init_code_hash);
    if derived != announcement.destination_account {
        return Err(VerifyError::AccountMismatch {
            derived,
            announced: announcement.destination_account,
        });
    }

    let (action, signature_bytes) = codec::decode(&announcement.hook_data)?;

    if action.nonce != announcement.nonce {
        return Err(VerifyError::FieldMismatch { field: "nonce" });
    }
    if action.expected_amount != announcement.expected_amount {
        return Err(VerifyError::FieldMismatch {
            field: "expectedAmount",
        });
    }
    if action.deadline != alloy::primitives::U256::from(announcement.deadline) {
        return Err(VerifyError::FieldMismatch { field: "deadline" });
    }

    let domain = typed_data::signing_domain(
        announcement.destination_chain_id,
        announcement.destination_account,
    );
    let digest = typed_data::signing_hash(&action, &domain);

    let signature = Signature::try_from(signature_bytes.as_ref())
        .map_err(|e| VerifyError::Signature(e.to_string()))?;
    let recovered = signature
        .recover_address_from_prehash(&digest)
        .map_err(|e| VerifyError::Signature(e.to_string()))?;

    if recovered != proofs.owner {
        return Err(VerifyError::SignerMismatch {
            recovered,
            owner: proofs.owner,
        });
    }

    debug!(
        destination_account = %announcement.destination_account,
        owner = %proofs.owner,
        "Announcement verified"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;

    #[test]
    fn create2_derivation_matches_reference() {
        // create2: keccak256(0xff ++ factory ++ salt ++ init_code_hash)[12..]
        let factory = Address::repeat_byte(0x11);
        let salt = B256::repeat_byte(0x22);
        let init_code_hash = B256::repeat_byte(0x33);

        let mut preimage = Vec::with_capacity(1 + 20 + 32 + 32);
        preimage.push(0xff);
        preimage.extend_from_slice(factory.as_slice());
        preimage.extend_from_slice(salt.as_slice());
        preimage.extend_from_slice(init_code_hash.as_slice());
        let expected = Address::from_slice(&keccak256(&preimage)[12..]);

        assert_eq!(
            derive_destination_account(factory, salt, init_code_hash),
            expected
        );
    }

    #[test]
    fn missing_proofs_is_an_error() {
        let announcement = TransferAnnouncement {
            version: 1,
            user: Address::repeat_byte(0x11),
            destination_account: Address::repeat_byte(0x22),
            source_tx_hash: B256::repeat_byte(0x33),
            source_domain: 0,
            destination_domain: 6,
            destination_chain_id: 8453,
            expected_amount: alloy::primitives::U256::from(1u64),
            nonce: alloy::primitives::U256::from(1u64),
            deadline: 1_900_000_000,
            hook_data: vec![],
            fee: Default::default(),
            funding: Default::default(),
            permit2_setup: vec![],
            validation_proofs: None,
        };
        assert!(matches!(
            verify_announcement(&announcement),
            Err(VerifyError::MissingProofs)
        ));
    }
}
