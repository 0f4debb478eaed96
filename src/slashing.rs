//! End-block slashing sweeps.
//!
//! Each sweep walks one artifact family past its signing/voting window and
//! emits `ChainMsg::Slash` for every bonded validator that missed its duty.
//! Sweeps advance a bookkeeping scalar so an artifact is only ever swept
//! once. One validator's problem never aborts the block: sweeps only emit
//! messages and events.

use std::collections::BTreeSet;

use cosmwasm_std::{CosmosMsg, Decimal, DepsMut, Env, Event};

use crate::chain::{query_bonded_validators, BondedValidator, ChainMsg, ChainQuery};
use crate::error::ContractError;
use crate::state;

pub struct SweepOutcome {
    pub msgs: Vec<CosmosMsg<ChainMsg>>,
    pub events: Vec<Event>,
}

fn slash(
    outcome: &mut SweepOutcome,
    validator: &str,
    fraction: Decimal,
    kind: &str,
    artifact: String,
) {
    outcome.msgs.push(CosmosMsg::Custom(ChainMsg::Slash {
        validator: validator.to_string(),
        fraction,
        jail: true,
    }));
    outcome.events.push(
        Event::new("bridge_slash")
            .add_attribute("validator", validator)
            .add_attribute("kind", kind)
            .add_attribute("artifact", artifact),
    );
}

/// Run every sweep in order: signer sets, batches, logic calls, events.
pub fn slashing_sweeps(
    deps: DepsMut<ChainQuery>,
    env: &Env,
) -> Result<SweepOutcome, ContractError> {
    let bonded: Vec<BondedValidator> = query_bonded_validators(&deps.querier)?
        .into_iter()
        .filter(|v| !v.jailed)
        .collect();

    let mut outcome = SweepOutcome {
        msgs: vec![],
        events: vec![],
    };

    signer_set_sweep(deps.storage, env, &bonded, &mut outcome)?;
    batch_sweep(deps.storage, env, &bonded, &mut outcome)?;
    logic_call_sweep(deps.storage, env, &bonded, &mut outcome)?;
    event_sweep(deps.storage, env, &bonded, &mut outcome)?;

    Ok(outcome)
}

fn signer_set_sweep(
    storage: &mut dyn cosmwasm_std::Storage,
    env: &Env,
    bonded: &[BondedValidator],
    outcome: &mut SweepOutcome,
) -> Result<(), ContractError> {
    let params = state::PARAMS.load(storage)?;
    let mut last_slashed = state::last_slashed_signer_set_nonce(storage);

    let mut sets = state::signer_sets_desc(storage)?;
    sets.reverse();
    for signer_set in sets {
        if signer_set.nonce <= last_slashed {
            continue;
        }
        if signer_set.height.saturating_add(params.signer_set_window) >= env.block.height {
            continue;
        }

        for validator in bonded {
            let signed = state::get_signer_set_confirm(storage, signer_set.nonce, &validator.operator)?
                .is_some();
            if !signed {
                slash(
                    outcome,
                    &validator.operator,
                    params.slash_fraction_signer_set,
                    "signer_set",
                    signer_set.nonce.to_string(),
                );
            }
        }
        last_slashed = signer_set.nonce;
    }

    if last_slashed > state::last_slashed_signer_set_nonce(storage) {
        state::set_last_slashed_signer_set_nonce(storage, last_slashed);
    }
    Ok(())
}

fn batch_sweep(
    storage: &mut dyn cosmwasm_std::Storage,
    env: &Env,
    bonded: &[BondedValidator],
    outcome: &mut SweepOutcome,
) -> Result<(), ContractError> {
    let params = state::PARAMS.load(storage)?;
    let last_slashed = state::last_slashed_batch_block(storage);
    let mut max_swept = last_slashed;

    for batch in state::all_batches(storage)? {
        if batch.block_created <= last_slashed {
            continue;
        }
        if batch.block_created.saturating_add(params.batch_tx_window) >= env.block.height {
            continue;
        }

        for validator in bonded {
            let signed = state::get_batch_confirm(
                storage,
                &batch.token_contract,
                batch.batch_nonce,
                &validator.operator,
            )?
            .is_some();
            if !signed {
                slash(
                    outcome,
                    &validator.operator,
                    params.slash_fraction_batch,
                    "batch",
                    format!("{}/{}", batch.token_contract, batch.batch_nonce),
                );
            }
        }
        max_swept = max_swept.max(batch.block_created);
    }

    if max_swept > last_slashed {
        state::set_last_slashed_batch_block(storage, max_swept);
    }
    Ok(())
}

fn logic_call_sweep(
    storage: &mut dyn cosmwasm_std::Storage,
    env: &Env,
    bonded: &[BondedValidator],
    outcome: &mut SweepOutcome,
) -> Result<(), ContractError> {
    let params = state::PARAMS.load(storage)?;
    let last_slashed = state::last_slashed_logic_block(storage);
    let mut max_swept = last_slashed;

    for call in state::all_logic_calls(storage)? {
        if call.block_created <= last_slashed {
            continue;
        }
        if call.block_created.saturating_add(params.batch_tx_window) >= env.block.height {
            continue;
        }

        for validator in bonded {
            let signed = state::get_logic_call_confirm(
                storage,
                call.invalidation_id.as_slice(),
                call.invalidation_nonce,
                &validator.operator,
            )?
            .is_some();
            if !signed {
                slash(
                    outcome,
                    &validator.operator,
                    params.slash_fraction_logic_call,
                    "logic_call",
                    format!(
                        "{}/{}",
                        hex::encode(call.invalidation_id.as_slice()),
                        call.invalidation_nonce
                    ),
                );
            }
        }
        max_swept = max_swept.max(call.block_created);
    }

    if max_swept > last_slashed {
        state::set_last_slashed_logic_block(storage, max_swept);
    }
    Ok(())
}

/// Sweep applied event nonces whose voting window has closed. Validators that
/// never voted on the nonce are slashed for non-voting; validators whose only
/// votes sit on losing attestations are slashed for conflicting claims.
fn event_sweep(
    storage: &mut dyn cosmwasm_std::Storage,
    env: &Env,
    bonded: &[BondedValidator],
    outcome: &mut SweepOutcome,
) -> Result<(), ContractError> {
    let params = state::PARAMS.load(storage)?;
    let last_observed = state::last_observed_event_nonce(storage);
    let mut nonce = state::last_slashed_event_nonce(storage) + 1;

    while nonce <= last_observed {
        let attestations = state::attestations_at_nonce(storage, nonce)?;
        let winner = match attestations.iter().find(|a| a.observed) {
            Some(winner) => winner,
            // An applied nonce always has an observed attestation.
            None => break,
        };

        let observed_at = winner.height_observed.unwrap_or(env.block.height);
        if observed_at.saturating_add(params.event_window) > env.block.height {
            // Window still open; later nonces were observed no earlier.
            break;
        }

        let winning_votes: BTreeSet<&str> =
            winner.votes.iter().map(String::as_str).collect();
        let all_votes: BTreeSet<&str> = attestations
            .iter()
            .flat_map(|a| a.votes.iter().map(String::as_str))
            .collect();

        for validator in bonded {
            let operator = validator.operator.as_str();
            if winning_votes.contains(operator) {
                continue;
            }
            if all_votes.contains(operator) {
                slash(
                    outcome,
                    operator,
                    params.slash_fraction_conflicting_event,
                    "conflicting_event",
                    nonce.to_string(),
                );
            } else {
                slash(
                    outcome,
                    operator,
                    params.slash_fraction_event,
                    "event",
                    nonce.to_string(),
                );
            }
        }

        state::set_last_slashed_event_nonce(storage, nonce);
        nonce += 1;
    }

    Ok(())
}
