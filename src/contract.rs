//! Quorum Bridge - entry points.
//!
//! The implementation is modularized into:
//! - `execute/` - message handlers
//! - `attestation`, `signer_set`, `batch`, `slashing`, `endblock` - engines
//! - `query` - query handlers

use cosmwasm_std::{
    entry_point, to_json_binary, Binary, Deps, DepsMut, Env, Event, MessageInfo, Response,
    StdResult,
};
use cw2::set_contract_version;

use crate::chain::{ChainMsg, ChainQuery};
use crate::checkpoint::logic_call_checkpoint;
use crate::endblock::end_block;
use crate::error::ContractError;
use crate::execute::{
    execute_cancel_transfer, execute_request_batch, execute_set_delegate_keys,
    execute_submit_confirm, execute_submit_event, execute_transfer,
};
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg, SudoMsg};
use crate::query::{
    query_attestation, query_attestations, query_batch, query_batch_confirms, query_batches,
    query_bridge_id, query_contract_to_denom, query_current_signer_set,
    query_delegate_keys_by_orchestrator, query_delegate_keys_by_remote,
    query_delegate_keys_by_validator, query_denom_to_contract,
    query_last_event_nonce_by_validator, query_last_observed_event_nonce, query_logic_call,
    query_logic_call_confirms, query_logic_calls, query_params, query_pool_transfers,
    query_pool_transfers_by_fee, query_remote_chain_info, query_signer_set,
    query_signer_set_confirms, query_signer_sets, query_status,
};
use crate::signer_set::create_signer_set;
use crate::state::{self, CONTRACT_NAME, CONTRACT_VERSION, PARAMS};
use crate::types::OutgoingLogicCall;

// ============================================================================
// Instantiate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    mut deps: DepsMut<ChainQuery>,
    env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response<ChainMsg>, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let bridge_id: [u8; 32] =
        msg.bridge_id
            .as_slice()
            .try_into()
            .map_err(|_| ContractError::InvalidAddress {
                reason: format!(
                    "bridge id must be exactly 32 bytes, got {}",
                    msg.bridge_id.len()
                ),
            })?;
    state::set_bridge_id(deps.storage, &bridge_id);

    let params = msg.params.unwrap_or_default();
    params.validate()?;
    PARAMS.save(deps.storage, &params)?;

    // The genesis signer set is always emitted, even when nobody has
    // delegated keys yet.
    let signer_set = create_signer_set(deps.branch(), &env)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("bridge_id", hex::encode(bridge_id))
        .add_attribute("signer_set_nonce", signer_set.nonce.to_string()))
}

// ============================================================================
// Execute
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut<ChainQuery>,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response<ChainMsg>, ContractError> {
    match msg {
        ExecuteMsg::SetDelegateKeys {
            validator,
            orchestrator,
            remote_address,
        } => execute_set_delegate_keys(deps, info, validator, orchestrator, remote_address),
        ExecuteMsg::SubmitEvent { event } => execute_submit_event(deps, env, info, event),
        ExecuteMsg::SubmitConfirm { confirm } => execute_submit_confirm(deps, info, confirm),
        ExecuteMsg::Transfer {
            remote_recipient,
            amount,
            fee,
        } => execute_transfer(deps, env, info, remote_recipient, amount, fee),
        ExecuteMsg::CancelTransfer { id } => execute_cancel_transfer(deps, info, id),
        ExecuteMsg::RequestBatch { denom } => execute_request_batch(deps, env, info, denom),
    }
}

// ============================================================================
// Sudo (host-chain hooks)
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn sudo(
    deps: DepsMut<ChainQuery>,
    env: Env,
    msg: SudoMsg,
) -> Result<Response<ChainMsg>, ContractError> {
    match msg {
        SudoMsg::EndBlock {} => end_block(deps, env),
        SudoMsg::UpdateParams { params } => {
            params.validate()?;
            PARAMS.save(deps.storage, &params)?;
            Ok(Response::new().add_attribute("action", "update_params"))
        }
        SudoMsg::ValidatorUnbonding {} => {
            state::set_last_unbonding_height(deps.storage, env.block.height);
            Ok(Response::new()
                .add_attribute("action", "validator_unbonding")
                .add_attribute("height", env.block.height.to_string()))
        }
        SudoMsg::ScheduleLogicCall {
            invalidation_id,
            invalidation_nonce,
            logic_contract,
            payload,
            timeout,
            transfers,
            fees,
        } => {
            if invalidation_nonce == 0 {
                return Err(ContractError::InvalidEvent {
                    reason: "invalidation nonce cannot be 0".to_string(),
                });
            }
            let call = OutgoingLogicCall {
                invalidation_id,
                invalidation_nonce,
                logic_contract,
                payload,
                timeout,
                transfers,
                fees,
                block_created: env.block.height,
            };
            state::set_logic_call(deps.storage, &call)?;

            let bridge_id = state::get_bridge_id(deps.storage)?;
            let checkpoint = logic_call_checkpoint(&bridge_id, &call)?;
            state::set_past_checkpoint(deps.storage, &checkpoint, "logic_call");

            Ok(Response::new()
                .add_attribute("action", "schedule_logic_call")
                .add_event(
                    Event::new("logic_call_scheduled")
                        .add_attribute(
                            "invalidation_id",
                            hex::encode(call.invalidation_id.as_slice()),
                        )
                        .add_attribute("invalidation_nonce", call.invalidation_nonce.to_string()),
                ))
        }
    }
}

// ============================================================================
// Query
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps<ChainQuery>, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Params {} => to_json_binary(&query_params(deps)?),
        QueryMsg::BridgeId {} => to_json_binary(&query_bridge_id(deps)?),
        QueryMsg::Status {} => to_json_binary(&query_status(deps)?),

        QueryMsg::DelegateKeysByValidator { validator } => {
            to_json_binary(&query_delegate_keys_by_validator(deps, validator)?)
        }
        QueryMsg::DelegateKeysByOrchestrator { orchestrator } => {
            to_json_binary(&query_delegate_keys_by_orchestrator(deps, orchestrator)?)
        }
        QueryMsg::DelegateKeysByRemote { remote_address } => {
            to_json_binary(&query_delegate_keys_by_remote(deps, remote_address)?)
        }

        QueryMsg::CurrentSignerSet {} => to_json_binary(&query_current_signer_set(deps)?),
        QueryMsg::SignerSet { nonce } => to_json_binary(&query_signer_set(deps, nonce)?),
        QueryMsg::SignerSets { limit } => to_json_binary(&query_signer_sets(deps, limit)?),
        QueryMsg::SignerSetConfirms { nonce } => {
            to_json_binary(&query_signer_set_confirms(deps, nonce)?)
        }

        QueryMsg::LastObservedEventNonce {} => {
            to_json_binary(&query_last_observed_event_nonce(deps)?)
        }
        QueryMsg::LastEventNonceByValidator { validator } => {
            to_json_binary(&query_last_event_nonce_by_validator(deps, validator)?)
        }
        QueryMsg::RemoteChainInfo {} => to_json_binary(&query_remote_chain_info(deps)?),
        QueryMsg::Attestations { event_nonce } => {
            to_json_binary(&query_attestations(deps, event_nonce)?)
        }
        QueryMsg::Attestation {
            event_nonce,
            event_hash,
        } => to_json_binary(&query_attestation(deps, event_nonce, event_hash)?),

        QueryMsg::PoolTransfers { limit } => to_json_binary(&query_pool_transfers(deps, limit)?),
        QueryMsg::PoolTransfersByFee {
            token_contract,
            limit,
        } => to_json_binary(&query_pool_transfers_by_fee(deps, token_contract, limit)?),
        QueryMsg::Batch {
            token_contract,
            batch_nonce,
        } => to_json_binary(&query_batch(deps, token_contract, batch_nonce)?),
        QueryMsg::Batches { limit } => to_json_binary(&query_batches(deps, limit)?),
        QueryMsg::BatchConfirms {
            token_contract,
            batch_nonce,
        } => to_json_binary(&query_batch_confirms(deps, token_contract, batch_nonce)?),

        QueryMsg::LogicCall {
            invalidation_id,
            invalidation_nonce,
        } => to_json_binary(&query_logic_call(deps, invalidation_id, invalidation_nonce)?),
        QueryMsg::LogicCalls { limit } => to_json_binary(&query_logic_calls(deps, limit)?),
        QueryMsg::LogicCallConfirms {
            invalidation_id,
            invalidation_nonce,
        } => to_json_binary(&query_logic_call_confirms(
            deps,
            invalidation_id,
            invalidation_nonce,
        )?),

        QueryMsg::DenomToContract { denom } => {
            to_json_binary(&query_denom_to_contract(deps, denom)?)
        }
        QueryMsg::ContractToDenom { token_contract } => {
            to_json_binary(&query_contract_to_denom(deps, token_contract)?)
        }
    }
}

// ============================================================================
// Migrate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(
    deps: DepsMut<ChainQuery>,
    _env: Env,
    _msg: MigrateMsg,
) -> Result<Response<ChainMsg>, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("version", CONTRACT_VERSION))
}
