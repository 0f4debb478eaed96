//! Outgoing transfer pool and batcher.
//!
//! Transfers wait in a fee-indexed pool until an orchestrator (or the
//! end-block timer) folds the best-paying ones into a batch. Batches die in
//! one of two ways: the remote contract executes them (observed as a
//! `WithdrawalExecuted` event) or they time out against the last observed
//! remote height and their transfers return to the pool.

use cosmwasm_std::{Coin, CosmosMsg, Env, Event, StdResult, Storage, Uint128};

use crate::address::{bridged_denom_to_contract, contract_to_bridged_denom, is_bridged_denom};
use crate::chain::ChainMsg;
use crate::error::ContractError;
use crate::state;
use crate::types::{BatchTx, OutgoingLogicCall};

/// The remote height at which a batch created now should expire.
pub fn batch_timeout_height(storage: &dyn Storage) -> StdResult<u64> {
    let params = state::PARAMS.load(storage)?;
    let remote_height = state::get_remote_chain_info(storage)?
        .map(|info| info.height)
        .unwrap_or(0);
    Ok(remote_height + params.target_batch_timeout / params.average_remote_block_time)
}

/// Build a batch from the best-paying pool transfers for one token contract.
///
/// The chosen transfers leave the pool; they now belong to the batch.
pub fn build_batch(
    storage: &mut dyn Storage,
    env: &Env,
    token_contract: &str,
) -> Result<BatchTx, ContractError> {
    let params = state::PARAMS.load(storage)?;
    let transactions =
        state::pool_txs_by_fee_desc(storage, token_contract, params.batch_size as usize)?;
    if transactions.is_empty() {
        return Err(ContractError::NoTransfersForBatch {
            contract: token_contract.to_string(),
        });
    }

    for tx in &transactions {
        state::delete_pool_tx(storage, tx)?;
    }

    let batch = BatchTx {
        batch_nonce: state::next_batch_nonce(storage),
        token_contract: token_contract.to_string(),
        transactions,
        batch_timeout: batch_timeout_height(storage)?,
        block_created: env.block.height,
    };
    state::set_batch(storage, &batch)?;

    let bridge_id = state::get_bridge_id(storage)?;
    let checkpoint = crate::checkpoint::batch_checkpoint(&bridge_id, &batch)?;
    state::set_past_checkpoint(storage, &checkpoint, "batch");

    Ok(batch)
}

/// Escrowed value carried by a batch, `amount + fee` over all transfers.
fn batch_escrow_total(batch: &BatchTx) -> Uint128 {
    batch
        .transactions
        .iter()
        .map(|tx| tx.token.amount + tx.fee.amount)
        .sum()
}

/// Handle an observed `WithdrawalExecuted`: the executed batch and every
/// older-nonce batch for the contract are deleted without refunds. Escrowed
/// vouchers of remote-origin tokens are burned; native-origin escrow stays
/// with the module (the value now lives on the remote side).
pub fn batch_executed(
    storage: &mut dyn Storage,
    token_contract: &str,
    batch_nonce: u64,
) -> Result<(Vec<CosmosMsg<ChainMsg>>, Vec<Event>), ContractError> {
    let mut msgs: Vec<CosmosMsg<ChainMsg>> = Vec::new();
    let mut events: Vec<Event> = Vec::new();

    let mut burned = Uint128::zero();
    for batch in state::batches_for_contract(storage, token_contract)? {
        if batch.batch_nonce > batch_nonce {
            continue;
        }
        burned += batch_escrow_total(&batch);
        state::delete_batch(storage, &batch)?;
        state::delete_batch_confirms(storage, token_contract, batch.batch_nonce)?;
        events.push(
            Event::new("batch_executed")
                .add_attribute("contract", token_contract)
                .add_attribute("batch_nonce", batch.batch_nonce.to_string())
                .add_attribute(
                    "superseded",
                    (batch.batch_nonce != batch_nonce).to_string(),
                ),
        );
    }

    if !burned.is_zero() {
        if let Some(denom) = voucher_denom(storage, token_contract) {
            msgs.push(CosmosMsg::Custom(ChainMsg::Burn {
                amount: Coin {
                    denom,
                    amount: burned,
                },
            }));
        }
    }

    Ok((msgs, events))
}

/// The voucher denom to burn for `token_contract`, or None when the token is
/// native-origin and escrow must be kept.
fn voucher_denom(storage: &dyn Storage, token_contract: &str) -> Option<String> {
    if state::stored_denom_for_contract(storage, token_contract).is_some() {
        return None;
    }
    contract_to_bridged_denom(token_contract).ok()
}

/// Delete every batch whose timeout fell behind the last observed remote
/// height and put its transfers back into the pool for re-batching.
pub fn timeout_batches(storage: &mut dyn Storage) -> StdResult<Vec<(String, u64)>> {
    let remote_height = state::get_remote_chain_info(storage)?
        .map(|info| info.height)
        .unwrap_or(0);

    let mut timed_out = Vec::new();
    for batch in state::all_batches(storage)? {
        if batch.batch_timeout < remote_height {
            for tx in &batch.transactions {
                state::set_pool_tx(storage, tx)?;
            }
            state::delete_batch(storage, &batch)?;
            state::delete_batch_confirms(storage, &batch.token_contract, batch.batch_nonce)?;
            timed_out.push((batch.token_contract.clone(), batch.batch_nonce));
        }
    }
    Ok(timed_out)
}

/// Delete every logic call whose timeout fell behind the last observed remote
/// height.
pub fn timeout_logic_calls(storage: &mut dyn Storage) -> StdResult<Vec<OutgoingLogicCall>> {
    let remote_height = state::get_remote_chain_info(storage)?
        .map(|info| info.height)
        .unwrap_or(0);

    let mut timed_out = Vec::new();
    for call in state::all_logic_calls(storage)? {
        if call.timeout < remote_height {
            state::delete_logic_call(
                storage,
                call.invalidation_id.as_slice(),
                call.invalidation_nonce,
            );
            state::delete_logic_call_confirms(
                storage,
                call.invalidation_id.as_slice(),
                call.invalidation_nonce,
            );
            timed_out.push(call);
        }
    }
    Ok(timed_out)
}

/// Resolve the token contract behind a transferable denom: a stored
/// native-origin mapping or the derived remote-origin form.
pub fn token_contract_for_denom(
    storage: &dyn Storage,
    denom: &str,
) -> Result<String, ContractError> {
    if is_bridged_denom(denom) {
        return bridged_denom_to_contract(denom);
    }
    state::stored_contract_for_denom(storage, denom).ok_or(ContractError::ContractNotFound {
        denom: denom.to_string(),
    })
}
