//! Cross-module integration: sign → encode → announce → verify
//!
//! Exercises the full off-chain pipeline a third party relies on: an action
//! is normalized, validated, signed, encoded into hook data, wrapped in an
//! announcement with validation proofs, serialized over JSON, and then
//! independently verified from the wire form alone.

use alloy::primitives::{Address, Bytes, B256, U256};

use hookbridge::client::{build_announcement, AccountDerivation, AnnouncementContext};
use hookbridge::{
    codec, derive_destination_account, normalize, typed_data, validate, verify_announcement,
    ActionCall, ActionInputs, ActionSigner, CallSpec, FeeConfig, FundingConfig, LocalActionSigner,
    Permit2Approval, VerifyError,
};

const DEST_CHAIN_ID: u64 = 8453;
const NOW: u64 = 1_700_000_000;

struct Setup {
    signer: LocalActionSigner,
    derivation: AccountDerivation,
    destination_account: Address,
}

fn setup() -> Setup {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let derivation = AccountDerivation {
        factory: Address::repeat_byte(0xF0),
        salt: B256::repeat_byte(0x51),
        init_code_hash: B256::repeat_byte(0x1C),
    };
    let destination_account = derive_destination_account(
        derivation.factory,
        derivation.salt,
        derivation.init_code_hash,
    );
    Setup {
        signer: LocalActionSigner::random(),
        derivation,
        destination_account,
    }
}

fn sample_inputs() -> ActionInputs {
    ActionInputs {
        nonce: U256::from(42u64),
        deadline: U256::from(NOW + 3_600),
        expected_amount: U256::from(14_998_500u64),
        fee: FeeConfig {
            payment_token: Address::repeat_byte(0xAA),
            indexer_fee: U256::from(100_000u64),
            relayer_fee: U256::from(150_000u64),
        },
        permit2_setup: vec![Permit2Approval {
            token: Address::repeat_byte(0xBB),
            spender: Address::repeat_byte(0xCC),
            amount: alloy::primitives::aliases::U160::from(500u64),
        }],
        funding: FundingConfig {
            eth_needed: U256::from(1_000u64),
            tokens_needed: vec![Address::repeat_byte(0xDD)],
            token_amounts: vec![U256::from(2_000u64)],
            max_reimbursement: U256::from(3_000u64),
        },
    }
}

async fn signed_announcement(setup: &Setup) -> hookbridge::TransferAnnouncement {
    let action = normalize(
        CallSpec::Batch(vec![ActionCall {
            target: Address::repeat_byte(0x11),
            data: Bytes::from(vec![0xCA, 0xFE]),
            value: U256::ZERO,
        }]),
        sample_inputs(),
    );
    validate(&action, false, 10, NOW).expect("sample action must validate");

    let domain = typed_data::signing_domain(DEST_CHAIN_ID, setup.destination_account);
    let signature = setup.signer.sign_action(&action, &domain).await.unwrap();
    let signature_bytes = signature.as_bytes().to_vec();
    let hook_data = codec::encode(&action, &signature_bytes);

    build_announcement(
        &action,
        &signature_bytes,
        &hook_data,
        AnnouncementContext {
            user: setup.signer.address(),
            destination_account: setup.destination_account,
            source_tx_hash: B256::repeat_byte(0x77),
            source_domain: 0,
            destination_domain: 6,
            destination_chain_id: DEST_CHAIN_ID,
            derivation: Some(setup.derivation.clone()),
        },
    )
}

#[tokio::test]
async fn announcement_verifies_end_to_end() {
    let setup = setup();
    let announcement = signed_announcement(&setup).await;

    verify_announcement(&announcement).expect("freshly built announcement must verify");
}

#[tokio::test]
async fn announcement_survives_json_transport() {
    let setup = setup();
    let announcement = signed_announcement(&setup).await;

    let json = serde_json::to_string(&announcement).unwrap();
    let received: hookbridge::TransferAnnouncement = serde_json::from_str(&json).unwrap();

    // The wire copy verifies exactly like the original, and its hook data
    // decodes to the same action.
    verify_announcement(&received).expect("announcement must verify after JSON round trip");

    let (original, _) = codec::decode(&announcement.hook_data).unwrap();
    let (decoded, _) = codec::decode(&received.hook_data).unwrap();
    assert_eq!(original, decoded);
}

#[tokio::test]
async fn tampered_destination_account_is_rejected() {
    let setup = setup();
    let mut announcement = signed_announcement(&setup).await;
    announcement.destination_account = Address::repeat_byte(0x66);

    assert!(matches!(
        verify_announcement(&announcement),
        Err(VerifyError::AccountMismatch { .. })
    ));
}

#[tokio::test]
async fn tampered_amount_is_rejected() {
    let setup = setup();
    let mut announcement = signed_announcement(&setup).await;
    announcement.expected_amount = announcement.expected_amount + U256::from(1u64);

    assert!(matches!(
        verify_announcement(&announcement),
        Err(VerifyError::FieldMismatch {
            field: "expectedAmount"
        })
    ));
}

#[tokio::test]
async fn wrong_owner_is_rejected() {
    let setup = setup();
    let mut announcement = signed_announcement(&setup).await;
    if let Some(proofs) = announcement.validation_proofs.as_mut() {
        proofs.owner = Address::repeat_byte(0x99);
    }

    assert!(matches!(
        verify_announcement(&announcement),
        Err(VerifyError::SignerMismatch { .. })
    ));
}

#[tokio::test]
async fn corrupted_hook_data_is_rejected() {
    let setup = setup();
    let mut announcement = signed_announcement(&setup).await;
    announcement.hook_data.truncate(announcement.hook_data.len() / 2);

    assert!(matches!(
        verify_announcement(&announcement),
        Err(VerifyError::Codec(_))
    ));
}
