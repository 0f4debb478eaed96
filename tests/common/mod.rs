//! Shared fixtures for the integration tests.
//!
//! The staking/bank seam is a chain-custom query/msg pair, so tests drive the
//! entry points directly against mock dependencies with a custom querier
//! standing in for the host staking module.

#![allow(dead_code)]

use std::marker::PhantomData;

use cosmwasm_std::testing::{mock_env, mock_info, MockApi, MockQuerier, MockStorage};
use cosmwasm_std::{
    to_json_binary, Binary, ContractResult, Env, OwnedDeps, Response, SystemResult, Uint128,
};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;

use quorum_bridge::chain::{
    BondedValidator, BondedValidatorsResponse, ChainMsg, ChainQuery, DenomMetadata,
    DenomMetadataResponse, ValidatorInfo, ValidatorResponse,
};
use quorum_bridge::checkpoint::keccak256;
use quorum_bridge::contract::{instantiate, sudo};
use quorum_bridge::msg::{InstantiateMsg, SudoMsg};
use quorum_bridge::types::EthereumEvent;

pub type TestDeps = OwnedDeps<MockStorage, MockApi, MockQuerier<ChainQuery>, ChainQuery>;

pub const BRIDGE_ID: [u8; 32] = [7u8; 32];

/// Remote-origin token used throughout the tests and its derived voucher
/// denom.
pub const TOKEN: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const VOUCHER: &str = "bridge/0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

#[derive(Clone)]
pub struct Val {
    pub operator: &'static str,
    pub power: u64,
    pub bonded: bool,
    pub jailed: bool,
}

pub fn val(operator: &'static str, power: u64) -> Val {
    Val {
        operator,
        power,
        bonded: true,
        jailed: false,
    }
}

pub fn chain_querier(
    vals: Vec<Val>,
    metadata: Vec<(String, DenomMetadata)>,
) -> MockQuerier<ChainQuery> {
    MockQuerier::new(&[]).with_custom_handler(move |query| {
        let result = match query {
            ChainQuery::BondedValidators {} => to_json_binary(&BondedValidatorsResponse {
                validators: vals
                    .iter()
                    .filter(|v| v.bonded)
                    .map(|v| BondedValidator {
                        operator: v.operator.to_string(),
                        power: v.power,
                        jailed: v.jailed,
                    })
                    .collect(),
            }),
            ChainQuery::Validator { operator } => to_json_binary(&ValidatorResponse {
                validator: vals.iter().find(|v| v.operator == operator.as_str()).map(|v| {
                    ValidatorInfo {
                        bonded: v.bonded,
                        jailed: v.jailed,
                        power: v.power,
                    }
                }),
            }),
            ChainQuery::DenomMetadata { denom } => to_json_binary(&DenomMetadataResponse {
                metadata: metadata
                    .iter()
                    .find(|(d, _)| d == denom)
                    .map(|(_, m)| m.clone()),
            }),
        };
        SystemResult::Ok(ContractResult::Ok(result.unwrap()))
    })
}

/// Fresh dependencies with the given bonded set and an instantiated bridge.
pub fn setup(vals: Vec<Val>) -> TestDeps {
    setup_full(vals, vec![], None)
}

pub fn setup_with_metadata(vals: Vec<Val>, metadata: Vec<(String, DenomMetadata)>) -> TestDeps {
    setup_full(vals, metadata, None)
}

pub fn setup_with_params(vals: Vec<Val>, params: quorum_bridge::state::Params) -> TestDeps {
    setup_full(vals, vec![], Some(params))
}

pub fn setup_full(
    vals: Vec<Val>,
    metadata: Vec<(String, DenomMetadata)>,
    params: Option<quorum_bridge::state::Params>,
) -> TestDeps {
    let mut deps = OwnedDeps {
        storage: MockStorage::default(),
        api: MockApi::default(),
        querier: chain_querier(vals, metadata),
        custom_query_type: PhantomData,
    };
    instantiate(
        deps.as_mut(),
        mock_env(),
        mock_info("wasm1deployer", &[]),
        InstantiateMsg {
            bridge_id: Binary::from(BRIDGE_ID.to_vec()),
            params,
        },
    )
    .unwrap();
    deps
}

/// A bech32 account address the mock api accepts.
pub fn addr(label: &str) -> String {
    MockApi::default().addr_make(label).to_string()
}

/// Register delegate keys for a validator.
pub fn delegate(deps: &mut TestDeps, validator: &str, orchestrator: &str, remote_address: &str) {
    execute_msg(
        deps,
        validator,
        quorum_bridge::msg::ExecuteMsg::SetDelegateKeys {
            validator: validator.to_string(),
            orchestrator: orchestrator.to_string(),
            remote_address: remote_address.to_string(),
        },
    )
    .unwrap();
}

pub fn execute_msg(
    deps: &mut TestDeps,
    sender: &str,
    msg: quorum_bridge::msg::ExecuteMsg,
) -> Result<Response<ChainMsg>, quorum_bridge::ContractError> {
    quorum_bridge::contract::execute(deps.as_mut(), mock_env(), mock_info(sender, &[]), msg)
}

/// Swap the bonded set seen by the contract (power changes, unbonding).
pub fn set_validators(deps: &mut TestDeps, vals: Vec<Val>) {
    deps.querier = chain_querier(vals, vec![]);
}

pub fn env_at(height: u64) -> Env {
    let mut env = mock_env();
    env.block.height = height;
    env
}

pub fn end_block(deps: &mut TestDeps, env: Env) -> Response<ChainMsg> {
    sudo(deps.as_mut(), env, SudoMsg::EndBlock {}).unwrap()
}

// ============================================================================
// Events
// ============================================================================

pub fn deposit_event(nonce: u64, amount: u128, receiver: &str) -> EthereumEvent {
    EthereumEvent::Deposit {
        event_nonce: nonce,
        remote_height: 1_000 + nonce,
        token_contract: TOKEN.to_string(),
        amount: Uint128::new(amount),
        remote_sender: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".to_string(),
        receiver: receiver.to_string(),
    }
}

pub fn withdrawal_event(nonce: u64, batch_nonce: u64) -> EthereumEvent {
    EthereumEvent::WithdrawalExecuted {
        event_nonce: nonce,
        remote_height: 1_000 + nonce,
        token_contract: TOKEN.to_string(),
        batch_nonce,
    }
}

// ============================================================================
// Remote keys & signatures
// ============================================================================

/// Deterministic secp256k1 test key. Any small non-zero index is a valid
/// scalar.
pub fn test_key(index: u8) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes[31] = index;
    bytes
}

/// The remote address belonging to a test key (keccak of the uncompressed
/// public key, last 20 bytes).
pub fn remote_address_of(key: &[u8; 32]) -> String {
    let signing_key = SigningKey::from_bytes(key.into()).unwrap();
    let point = signing_key.verifying_key().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

/// A 65-byte r||s||v hex signature over a checkpoint, Ethereum-style v.
pub fn sign_checkpoint(key: &[u8; 32], checkpoint: &[u8; 32]) -> String {
    let signing_key = SigningKey::from_bytes(key.into()).unwrap();
    let (signature, recovery_id) = signing_key.sign_prehash_recoverable(checkpoint).unwrap();
    let mut out = [0u8; 65];
    out[..64].copy_from_slice(signature.to_bytes().as_slice());
    out[64] = recovery_id.to_byte() + 27;
    hex::encode(out)
}
