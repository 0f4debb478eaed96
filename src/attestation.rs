//! Attestation engine.
//!
//! Turns per-validator claims about remote-chain events into chain-observed
//! facts. Votes accumulate per `(event_nonce, event_hash)`; once the voted
//! power crosses the governance threshold the attestation flips to observed.
//! Effects apply strictly in event-nonce order: the tipping vote applies its
//! own event only when it is next in line, and the end-block scan drains any
//! contiguous run of observed-but-unapplied attestations behind it.

use cosmwasm_std::{
    BankMsg, Coin, CosmosMsg, Decimal, DepsMut, Env, Event, Uint128,
};

use crate::address::{canonical_remote_address, contract_to_bridged_denom};
use crate::batch::batch_executed;
use crate::chain::{query_bonded_validators, query_denom_metadata, ChainMsg, ChainQuery};
use crate::error::ContractError;
use crate::state;
use crate::types::{Attestation, EthereumEvent, RemoteChainInfo};

/// What a single vote did.
pub struct VoteOutcome {
    /// Hex content hash of the event voted on.
    pub event_hash: String,
    /// Whether this vote tipped the attestation over the threshold.
    pub observed: bool,
    pub msgs: Vec<CosmosMsg<ChainMsg>>,
    pub events: Vec<Event>,
}

/// Record one validator's claim and tally the attestation.
pub fn vote_on_event(
    mut deps: DepsMut<ChainQuery>,
    env: &Env,
    validator: &str,
    event: &EthereumEvent,
) -> Result<VoteOutcome, ContractError> {
    event.validate()?;

    // Strict per-validator ordering. A validator that never voted starts
    // after the chain's last applied nonce.
    let last_voted = state::last_event_nonce_by_validator(deps.storage, validator)
        .unwrap_or_else(|| state::last_observed_event_nonce(deps.storage));
    let expected = last_voted + 1;
    if event.event_nonce() != expected {
        return Err(ContractError::NonceGap {
            expected,
            got: event.event_nonce(),
        });
    }

    let event_nonce = event.event_nonce();
    let event_hash = event.event_hash();

    let mut attestation = match state::get_attestation(deps.storage, event_nonce, &event_hash)? {
        Some(attestation) => attestation,
        None => {
            state::set_event(deps.storage, &event_hash, event)?;
            Attestation {
                event_nonce,
                event_hash: hex::encode(event_hash),
                votes: vec![],
                observed: false,
                height_observed: None,
            }
        }
    };

    if attestation.observed {
        return Err(ContractError::AttestationFinalized { nonce: event_nonce });
    }
    if attestation.has_voted(validator) {
        return Err(ContractError::DuplicateVote {
            validator: validator.to_string(),
        });
    }

    attestation.votes.push(validator.to_string());
    state::set_last_event_nonce_by_validator(deps.storage, validator, event_nonce);

    let mut outcome = VoteOutcome {
        event_hash: attestation.event_hash.clone(),
        observed: false,
        msgs: vec![],
        events: vec![],
    };

    // A nonce is decided once any attestation at it was observed (or already
    // applied). Late votes on competing claims are recorded as conflict
    // evidence but can never produce a second observed attestation.
    let decided = event_nonce <= state::last_observed_event_nonce(deps.storage)
        || state::attestations_at_nonce(deps.storage, event_nonce)?
            .iter()
            .any(|a| a.observed);

    if !decided && tally(&deps, &attestation)? {
        attestation.observed = true;
        attestation.height_observed = Some(env.block.height);
        outcome.observed = true;
        outcome.events.push(
            Event::new("attestation_observed")
                .add_attribute("nonce", event_nonce.to_string())
                .add_attribute("type", event.event_type()),
        );

        // Apply in order only; out-of-order observations wait for end-block.
        if event_nonce == state::last_observed_event_nonce(deps.storage) + 1 {
            let (msgs, events) = apply_event(deps.branch(), env, event)?;
            state::set_last_observed_event_nonce(deps.storage, event_nonce);
            outcome.msgs.extend(msgs);
            outcome.events.extend(events);
        }
    }

    state::set_attestation(deps.storage, event_nonce, &event_hash, &attestation)?;
    Ok(outcome)
}

/// Whether accumulated voter power meets the observation threshold against
/// the current bonded set.
fn tally(deps: &DepsMut<ChainQuery>, attestation: &Attestation) -> Result<bool, ContractError> {
    let bonded = query_bonded_validators(&deps.querier)?;
    let total_power: u128 = bonded.iter().map(|v| v.power as u128).sum();
    if total_power == 0 {
        return Ok(false);
    }

    let voted_power: u128 = bonded
        .iter()
        .filter(|v| attestation.has_voted(&v.operator))
        .map(|v| v.power as u128)
        .sum();

    let params = state::PARAMS.load(deps.storage)?;
    let voted_ratio = Decimal::from_ratio(Uint128::new(voted_power), Uint128::new(total_power));
    Ok(voted_ratio >= params.attestation_votes_power_threshold)
}

/// Apply an observed event's effect. Never called out of nonce order.
pub fn apply_event(
    deps: DepsMut<ChainQuery>,
    env: &Env,
    event: &EthereumEvent,
) -> Result<(Vec<CosmosMsg<ChainMsg>>, Vec<Event>), ContractError> {
    // Every applied event advances the observed remote height monotonically.
    let seen = state::get_remote_chain_info(deps.storage)?
        .map(|info| info.height)
        .unwrap_or(0);
    if event.remote_height() > seen {
        state::set_remote_chain_info(
            deps.storage,
            &RemoteChainInfo {
                height: event.remote_height(),
                observed_at: env.block.time.seconds(),
            },
        )?;
    }

    match event {
        EthereumEvent::Deposit {
            token_contract,
            amount,
            receiver,
            ..
        } => {
            let token_contract = canonical_remote_address(token_contract)?;
            apply_deposit(deps, &token_contract, *amount, receiver)
        }
        EthereumEvent::WithdrawalExecuted {
            token_contract,
            batch_nonce,
            ..
        } => {
            let token_contract = canonical_remote_address(token_contract)?;
            if state::get_batch(deps.storage, &token_contract, *batch_nonce)?.is_none() {
                // The batch may already be gone (timed out and re-batched);
                // the event still consumes its nonce.
                return Ok((
                    vec![],
                    vec![Event::new("withdrawal_unknown_batch")
                        .add_attribute("contract", token_contract)
                        .add_attribute("batch_nonce", batch_nonce.to_string())],
                ));
            }
            batch_executed(deps.storage, &token_contract, *batch_nonce)
        }
        EthereumEvent::Erc20Deployed {
            denom,
            token_contract,
            name,
            symbol,
            decimals,
            ..
        } => {
            let token_contract = canonical_remote_address(token_contract)?;
            apply_erc20_deployed(deps, denom, &token_contract, name, symbol, *decimals)
        }
        EthereumEvent::LogicCallExecuted {
            invalidation_id,
            invalidation_nonce,
            ..
        } => {
            state::delete_logic_call(deps.storage, invalidation_id.as_slice(), *invalidation_nonce);
            state::delete_logic_call_confirms(
                deps.storage,
                invalidation_id.as_slice(),
                *invalidation_nonce,
            );
            Ok((
                vec![],
                vec![Event::new("logic_call_invalidated")
                    .add_attribute("invalidation_id", hex::encode(invalidation_id.as_slice()))
                    .add_attribute("invalidation_nonce", invalidation_nonce.to_string())],
            ))
        }
        EthereumEvent::SignerSetUpdated {
            signer_set_nonce, ..
        } => {
            if *signer_set_nonce > state::last_observed_signer_set_nonce(deps.storage) {
                state::set_last_observed_signer_set_nonce(deps.storage, *signer_set_nonce);
            }
            Ok((
                vec![],
                vec![Event::new("signer_set_observed")
                    .add_attribute("nonce", signer_set_nonce.to_string())],
            ))
        }
    }
}

fn apply_deposit(
    deps: DepsMut<ChainQuery>,
    token_contract: &str,
    amount: Uint128,
    receiver: &str,
) -> Result<(Vec<CosmosMsg<ChainMsg>>, Vec<Event>), ContractError> {
    let receiver = match deps.api.addr_validate(receiver) {
        Ok(addr) => addr,
        // A deposit aimed at a malformed address cannot be credited; the
        // event still consumes its nonce.
        Err(_) => {
            return Ok((
                vec![],
                vec![Event::new("deposit_invalid_receiver")
                    .add_attribute("receiver", receiver)
                    .add_attribute("contract", token_contract)],
            ))
        }
    };

    let msg: CosmosMsg<ChainMsg> =
        match state::stored_denom_for_contract(deps.storage, token_contract) {
            // Native-origin token coming home: release module escrow.
            Some(denom) => CosmosMsg::Bank(BankMsg::Send {
                to_address: receiver.to_string(),
                amount: vec![Coin { denom, amount }],
            }),
            // Remote-origin token: mint the derived voucher denom.
            None => CosmosMsg::Custom(ChainMsg::Mint {
                to: receiver.to_string(),
                amount: Coin {
                    denom: contract_to_bridged_denom(token_contract)?,
                    amount,
                },
            }),
        };

    Ok((
        vec![msg],
        vec![Event::new("deposit_applied")
            .add_attribute("receiver", receiver)
            .add_attribute("contract", token_contract)
            .add_attribute("amount", amount.to_string())],
    ))
}

fn apply_erc20_deployed(
    deps: DepsMut<ChainQuery>,
    denom: &str,
    token_contract: &str,
    name: &str,
    symbol: &str,
    decimals: u8,
) -> Result<(Vec<CosmosMsg<ChainMsg>>, Vec<Event>), ContractError> {
    let reject = |reason: &str| {
        Ok((
            vec![],
            vec![Event::new("erc20_deploy_rejected")
                .add_attribute("denom", denom)
                .add_attribute("contract", token_contract)
                .add_attribute("reason", reason)],
        ))
    };

    if state::stored_contract_for_denom(deps.storage, denom).is_some()
        || state::stored_denom_for_contract(deps.storage, token_contract).is_some()
    {
        return reject("mapping already exists");
    }

    let metadata = match query_denom_metadata(&deps.querier, denom)? {
        Some(metadata) => metadata,
        None => return reject("no bank metadata for denom"),
    };
    if metadata.name != name || metadata.symbol != symbol || metadata.decimals != decimals {
        return reject("metadata mismatch");
    }

    state::set_denom_contract_pair(deps.storage, denom, token_contract);
    Ok((
        vec![],
        vec![Event::new("erc20_deployed")
            .add_attribute("denom", denom)
            .add_attribute("contract", token_contract)],
    ))
}

/// Apply the contiguous run of observed attestations sitting right after the
/// last applied nonce. Called from end-block.
pub fn process_pending_attestations(
    mut deps: DepsMut<ChainQuery>,
    env: &Env,
) -> Result<(Vec<CosmosMsg<ChainMsg>>, Vec<Event>), ContractError> {
    let mut msgs = Vec::new();
    let mut events = Vec::new();

    loop {
        let next = state::last_observed_event_nonce(deps.storage) + 1;
        let observed = state::attestations_at_nonce(deps.storage, next)?
            .into_iter()
            .find(|attestation| attestation.observed);

        let attestation = match observed {
            Some(attestation) => attestation,
            None => break,
        };

        let hash: [u8; 32] = hex::decode(&attestation.event_hash)
            .ok()
            .and_then(|bz| bz.try_into().ok())
            .ok_or(ContractError::InvalidEvent {
                reason: "malformed stored event hash".to_string(),
            })?;
        let event = state::get_event(deps.storage, &hash)?.ok_or(ContractError::InvalidEvent {
            reason: "observed attestation without stored event".to_string(),
        })?;

        let (new_msgs, new_events) = apply_event(deps.branch(), env, &event)?;
        state::set_last_observed_event_nonce(deps.storage, next);
        msgs.extend(new_msgs);
        events.extend(new_events);
    }

    Ok((msgs, events))
}
