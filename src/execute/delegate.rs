//! Delegate-key registry handler.

use cosmwasm_std::{DepsMut, MessageInfo, Response};

use crate::address::canonical_remote_address;
use crate::chain::{query_validator, ChainMsg, ChainQuery};
use crate::error::ContractError;
use crate::state;

/// Bind a validator to its orchestrator key and remote signing address.
///
/// The three-way mapping is written atomically and is immutable afterwards.
pub fn execute_set_delegate_keys(
    deps: DepsMut<ChainQuery>,
    info: MessageInfo,
    validator: String,
    orchestrator: String,
    remote_address: String,
) -> Result<Response<ChainMsg>, ContractError> {
    let orchestrator = deps.api.addr_validate(&orchestrator)?;
    let remote_address = canonical_remote_address(&remote_address)?;

    // The validator must be known to the staking module, bonded or not.
    if query_validator(&deps.querier, &validator)?.is_none() {
        return Err(ContractError::ValidatorNotFound { validator });
    }

    // Write-once: any existing forward binding blocks the whole message.
    let taken = state::remote_address_by_validator(deps.storage, &validator).is_some()
        || state::validator_by_orchestrator(deps.storage, orchestrator.as_str()).is_some()
        || state::orchestrator_by_remote_address(deps.storage, &remote_address).is_some();
    if taken {
        return Err(ContractError::AlreadyDelegated { validator });
    }

    state::set_delegate_keys(
        deps.storage,
        &validator,
        orchestrator.as_str(),
        &remote_address,
    );

    Ok(Response::new()
        .add_attribute("action", "delegate_key_set")
        .add_attribute("sender", info.sender)
        .add_attribute("validator", validator)
        .add_attribute("orchestrator", orchestrator)
        .add_attribute("remote_address", remote_address))
}
