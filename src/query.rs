//! Query handlers.

use cosmwasm_std::{Deps, StdError, StdResult};

use crate::address::{bridged_denom_to_contract, contract_to_bridged_denom, is_bridged_denom};
use crate::chain::ChainQuery;
use crate::msg::{
    AttestationResponse, AttestationsResponse, BatchResponse, BatchesResponse, BridgeIdResponse,
    ConfirmEntry, ConfirmsResponse, ContractToDenomResponse, DelegateKeysResponse,
    DenomToContractResponse, LastEventNonceResponse, LastObservedEventNonceResponse,
    LogicCallResponse, LogicCallsResponse, ParamsResponse, RemoteChainInfoResponse,
    SignerSetResponse, SignerSetsResponse, StatusResponse, TransfersResponse,
};
use crate::state;

const DEFAULT_LIMIT: u32 = 30;
const MAX_LIMIT: u32 = 100;

fn cap(limit: Option<u32>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize
}

pub fn query_params(deps: Deps<ChainQuery>) -> StdResult<ParamsResponse> {
    Ok(ParamsResponse {
        params: state::PARAMS.load(deps.storage)?,
    })
}

pub fn query_bridge_id(deps: Deps<ChainQuery>) -> StdResult<BridgeIdResponse> {
    Ok(BridgeIdResponse {
        bridge_id: hex::encode(state::get_bridge_id(deps.storage)?),
    })
}

pub fn query_status(deps: Deps<ChainQuery>) -> StdResult<StatusResponse> {
    Ok(StatusResponse {
        latest_signer_set_nonce: state::latest_signer_set_nonce(deps.storage),
        last_observed_event_nonce: state::last_observed_event_nonce(deps.storage),
        last_observed_signer_set_nonce: state::last_observed_signer_set_nonce(deps.storage),
        last_slashed_signer_set_nonce: state::last_slashed_signer_set_nonce(deps.storage),
        last_slashed_batch_block: state::last_slashed_batch_block(deps.storage),
        last_unbonding_height: state::last_unbonding_height(deps.storage),
        last_pool_id: state::last_pool_id(deps.storage),
    })
}

pub fn query_delegate_keys_by_validator(
    deps: Deps<ChainQuery>,
    validator: String,
) -> StdResult<DelegateKeysResponse> {
    let remote_address = state::remote_address_by_validator(deps.storage, &validator);
    let orchestrator = remote_address
        .as_deref()
        .and_then(|remote| state::orchestrator_by_remote_address(deps.storage, remote));
    Ok(DelegateKeysResponse {
        validator: Some(validator),
        orchestrator,
        remote_address,
    })
}

pub fn query_delegate_keys_by_orchestrator(
    deps: Deps<ChainQuery>,
    orchestrator: String,
) -> StdResult<DelegateKeysResponse> {
    let validator = state::validator_by_orchestrator(deps.storage, &orchestrator);
    let remote_address = validator
        .as_deref()
        .and_then(|validator| state::remote_address_by_validator(deps.storage, validator));
    Ok(DelegateKeysResponse {
        validator,
        orchestrator: Some(orchestrator),
        remote_address,
    })
}

pub fn query_delegate_keys_by_remote(
    deps: Deps<ChainQuery>,
    remote_address: String,
) -> StdResult<DelegateKeysResponse> {
    let orchestrator = state::orchestrator_by_remote_address(deps.storage, &remote_address);
    let validator = orchestrator
        .as_deref()
        .and_then(|orch| state::validator_by_orchestrator(deps.storage, orch));
    Ok(DelegateKeysResponse {
        validator,
        orchestrator,
        remote_address: Some(remote_address),
    })
}

pub fn query_current_signer_set(deps: Deps<ChainQuery>) -> StdResult<SignerSetResponse> {
    Ok(SignerSetResponse {
        signer_set: state::latest_signer_set(deps.storage)?,
    })
}

pub fn query_signer_set(deps: Deps<ChainQuery>, nonce: u64) -> StdResult<SignerSetResponse> {
    Ok(SignerSetResponse {
        signer_set: state::get_signer_set(deps.storage, nonce)?,
    })
}

pub fn query_signer_sets(
    deps: Deps<ChainQuery>,
    limit: Option<u32>,
) -> StdResult<SignerSetsResponse> {
    let mut signer_sets = state::signer_sets_desc(deps.storage)?;
    signer_sets.truncate(cap(limit));
    Ok(SignerSetsResponse { signer_sets })
}

fn confirm_entries(pairs: Vec<(String, crate::types::Confirm)>) -> ConfirmsResponse {
    ConfirmsResponse {
        confirms: pairs
            .into_iter()
            .map(|(validator, confirm)| ConfirmEntry { validator, confirm })
            .collect(),
    }
}

pub fn query_signer_set_confirms(
    deps: Deps<ChainQuery>,
    nonce: u64,
) -> StdResult<ConfirmsResponse> {
    Ok(confirm_entries(state::signer_set_confirms(
        deps.storage,
        nonce,
    )?))
}

pub fn query_last_observed_event_nonce(
    deps: Deps<ChainQuery>,
) -> StdResult<LastObservedEventNonceResponse> {
    Ok(LastObservedEventNonceResponse {
        event_nonce: state::last_observed_event_nonce(deps.storage),
    })
}

pub fn query_last_event_nonce_by_validator(
    deps: Deps<ChainQuery>,
    validator: String,
) -> StdResult<LastEventNonceResponse> {
    // A validator that never voted starts after the last applied nonce.
    let event_nonce = state::last_event_nonce_by_validator(deps.storage, &validator)
        .unwrap_or_else(|| state::last_observed_event_nonce(deps.storage));
    Ok(LastEventNonceResponse { event_nonce })
}

pub fn query_remote_chain_info(deps: Deps<ChainQuery>) -> StdResult<RemoteChainInfoResponse> {
    Ok(RemoteChainInfoResponse {
        info: state::get_remote_chain_info(deps.storage)?,
    })
}

pub fn query_attestations(
    deps: Deps<ChainQuery>,
    event_nonce: u64,
) -> StdResult<AttestationsResponse> {
    Ok(AttestationsResponse {
        attestations: state::attestations_at_nonce(deps.storage, event_nonce)?,
    })
}

pub fn query_attestation(
    deps: Deps<ChainQuery>,
    event_nonce: u64,
    event_hash: String,
) -> StdResult<AttestationResponse> {
    let hash: [u8; 32] = hex::decode(event_hash.strip_prefix("0x").unwrap_or(&event_hash))
        .ok()
        .and_then(|bz| bz.try_into().ok())
        .ok_or_else(|| StdError::generic_err("malformed event hash"))?;
    Ok(AttestationResponse {
        attestation: state::get_attestation(deps.storage, event_nonce, &hash)?,
        event: state::get_event(deps.storage, &hash)?,
    })
}

pub fn query_pool_transfers(
    deps: Deps<ChainQuery>,
    limit: Option<u32>,
) -> StdResult<TransfersResponse> {
    let mut transfers = state::all_pool_txs(deps.storage)?;
    transfers.truncate(cap(limit));
    Ok(TransfersResponse { transfers })
}

pub fn query_pool_transfers_by_fee(
    deps: Deps<ChainQuery>,
    token_contract: String,
    limit: Option<u32>,
) -> StdResult<TransfersResponse> {
    Ok(TransfersResponse {
        transfers: state::pool_txs_by_fee_desc(deps.storage, &token_contract, cap(limit))?,
    })
}

pub fn query_batch(
    deps: Deps<ChainQuery>,
    token_contract: String,
    batch_nonce: u64,
) -> StdResult<BatchResponse> {
    let batch = state::get_batch(deps.storage, &token_contract, batch_nonce)?;
    let total_fee = batch
        .as_ref()
        .map(|b| b.total_fee())
        .unwrap_or_default();
    Ok(BatchResponse { batch, total_fee })
}

pub fn query_batches(deps: Deps<ChainQuery>, limit: Option<u32>) -> StdResult<BatchesResponse> {
    let mut batches = state::all_batches(deps.storage)?;
    batches.truncate(cap(limit));
    Ok(BatchesResponse { batches })
}

pub fn query_batch_confirms(
    deps: Deps<ChainQuery>,
    token_contract: String,
    batch_nonce: u64,
) -> StdResult<ConfirmsResponse> {
    Ok(confirm_entries(state::batch_confirms(
        deps.storage,
        &token_contract,
        batch_nonce,
    )?))
}

pub fn query_logic_call(
    deps: Deps<ChainQuery>,
    invalidation_id: cosmwasm_std::Binary,
    invalidation_nonce: u64,
) -> StdResult<LogicCallResponse> {
    Ok(LogicCallResponse {
        call: state::get_logic_call(deps.storage, invalidation_id.as_slice(), invalidation_nonce)?,
    })
}

pub fn query_logic_calls(
    deps: Deps<ChainQuery>,
    limit: Option<u32>,
) -> StdResult<LogicCallsResponse> {
    let mut calls = state::all_logic_calls(deps.storage)?;
    calls.truncate(cap(limit));
    Ok(LogicCallsResponse { calls })
}

pub fn query_logic_call_confirms(
    deps: Deps<ChainQuery>,
    invalidation_id: cosmwasm_std::Binary,
    invalidation_nonce: u64,
) -> StdResult<ConfirmsResponse> {
    Ok(confirm_entries(state::logic_call_confirms(
        deps.storage,
        invalidation_id.as_slice(),
        invalidation_nonce,
    )?))
}

pub fn query_denom_to_contract(
    deps: Deps<ChainQuery>,
    denom: String,
) -> StdResult<DenomToContractResponse> {
    let token_contract = if is_bridged_denom(&denom) {
        bridged_denom_to_contract(&denom).ok()
    } else {
        state::stored_contract_for_denom(deps.storage, &denom)
    };
    Ok(DenomToContractResponse { token_contract })
}

pub fn query_contract_to_denom(
    deps: Deps<ChainQuery>,
    token_contract: String,
) -> StdResult<ContractToDenomResponse> {
    let denom = match state::stored_denom_for_contract(deps.storage, &token_contract) {
        Some(denom) => Some(denom),
        // Unmapped contracts resolve to their derived voucher denom.
        None => contract_to_bridged_denom(&token_contract).ok(),
    };
    Ok(ContractToDenomResponse { denom })
}
