//! Event voting handler.

use cosmwasm_std::{DepsMut, Env, MessageInfo, Response};

use crate::attestation::vote_on_event;
use crate::chain::{query_validator, ChainMsg, ChainQuery};
use crate::error::ContractError;
use crate::state;
use crate::types::EthereumEvent;

/// Resolve the validator behind an orchestrator sender. Falls back to
/// treating the sender as the validator operator itself when no delegate is
/// registered.
pub fn resolve_validator(deps: &DepsMut<ChainQuery>, sender: &str) -> String {
    state::validator_by_orchestrator(deps.storage, sender).unwrap_or_else(|| sender.to_string())
}

/// `SubmitEvent`: one validator's claim that `event` happened on the remote
/// chain.
pub fn execute_submit_event(
    mut deps: DepsMut<ChainQuery>,
    env: Env,
    info: MessageInfo,
    event: EthereumEvent,
) -> Result<Response<ChainMsg>, ContractError> {
    let validator = resolve_validator(&deps, info.sender.as_str());

    let validator_info = query_validator(&deps.querier, &validator)?.ok_or_else(|| {
        ContractError::ValidatorNotFound {
            validator: validator.clone(),
        }
    })?;
    if !validator_info.bonded {
        return Err(ContractError::ValidatorNotBonded { validator });
    }

    let outcome = vote_on_event(deps.branch(), &env, &validator, &event)?;

    Ok(Response::new()
        .add_messages(outcome.msgs)
        .add_events(outcome.events)
        .add_attribute("action", "submit_event")
        .add_attribute("event_id", outcome.event_hash)
        .add_attribute("type", event.event_type())
        .add_attribute("nonce", event.event_nonce().to_string())
        .add_attribute("orchestrator", info.sender)
        .add_attribute("observed", outcome.observed.to_string()))
}
