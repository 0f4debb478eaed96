//! End-block driver.
//!
//! The host chain calls `sudo(EndBlock)` once per block, after transactions.
//! Work runs in a fixed order: signer-set drift, attestation drain, timeout
//! sweeps, slashing sweeps, pruning.

use cosmwasm_std::{DepsMut, Env, Event, Response};

use crate::attestation::process_pending_attestations;
use crate::batch::{timeout_batches, timeout_logic_calls};
use crate::chain::{ChainMsg, ChainQuery};
use crate::error::ContractError;
use crate::signer_set::{create_signer_set, drift_exceeded, prune_signer_sets};
use crate::slashing::slashing_sweeps;

pub fn end_block(
    mut deps: DepsMut<ChainQuery>,
    env: Env,
) -> Result<Response<ChainMsg>, ContractError> {
    let mut response: Response<ChainMsg> = Response::new().add_attribute("action", "end_block");

    // 1. Voting-power drift: snapshot a new signer set when it exceeds the
    //    governance bound.
    if drift_exceeded(deps.as_ref(), &env)? {
        let signer_set = create_signer_set(deps.branch(), &env)?;
        response = response.add_event(
            Event::new("signer_set_created")
                .add_attribute("nonce", signer_set.nonce.to_string())
                .add_attribute("members", signer_set.members.len().to_string()),
        );
    }

    // 2. Apply observed attestations that were held for ordering.
    let (msgs, events) = process_pending_attestations(deps.branch(), &env)?;
    response = response.add_messages(msgs).add_events(events);

    // 3. Timeouts against the last observed remote height.
    for (contract, nonce) in timeout_batches(deps.storage)? {
        response = response.add_event(
            Event::new("batch_timed_out")
                .add_attribute("contract", contract)
                .add_attribute("batch_nonce", nonce.to_string()),
        );
    }
    for call in timeout_logic_calls(deps.storage)? {
        response = response.add_event(
            Event::new("logic_call_timed_out")
                .add_attribute("invalidation_id", hex::encode(call.invalidation_id.as_slice()))
                .add_attribute("invalidation_nonce", call.invalidation_nonce.to_string()),
        );
    }

    // 4. Slashing sweeps.
    let sweep = slashing_sweeps(deps.branch(), &env)?;
    response = response.add_messages(sweep.msgs).add_events(sweep.events);

    // 5. Prune retired signer sets.
    for nonce in prune_signer_sets(deps.storage, &env)? {
        response = response
            .add_event(Event::new("signer_set_pruned").add_attribute("nonce", nonce.to_string()));
    }

    Ok(response)
}
