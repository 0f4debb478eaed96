//! Checkpoint signature handler.

use cosmwasm_std::{DepsMut, MessageInfo, Response};

use crate::address::canonical_remote_address;
use crate::chain::{query_validator, ChainMsg, ChainQuery};
use crate::checkpoint::{
    batch_checkpoint, logic_call_checkpoint, recover_remote_signer, signer_set_checkpoint,
};
use crate::error::ContractError;
use crate::execute::resolve_validator;
use crate::state;
use crate::types::Confirm;

/// `SubmitConfirm`: persist a validator's remote-key signature over a signer
/// set, batch or logic call checkpoint.
pub fn execute_submit_confirm(
    deps: DepsMut<ChainQuery>,
    info: MessageInfo,
    confirm: Confirm,
) -> Result<Response<ChainMsg>, ContractError> {
    let validator = resolve_validator(&deps, info.sender.as_str());
    if query_validator(&deps.querier, &validator)?.is_none() {
        return Err(ContractError::ValidatorNotFound { validator });
    }

    let delegated = state::remote_address_by_validator(deps.storage, &validator).ok_or(
        ContractError::InvalidAddress {
            reason: format!("validator {} has no remote address delegated", validator),
        },
    )?;
    if canonical_remote_address(confirm.remote_signer())? != delegated {
        return Err(ContractError::InvalidSignature);
    }

    // Recompute the checkpoint for the referenced artifact.
    let bridge_id = state::get_bridge_id(deps.storage)?;
    let checkpoint = match &confirm {
        Confirm::SignerSet { nonce, .. } => {
            let signer_set = state::get_signer_set(deps.storage, *nonce)?.ok_or(
                ContractError::UnknownArtifact {
                    kind: format!("signer set {}", nonce),
                },
            )?;
            signer_set_checkpoint(&bridge_id, &signer_set)?
        }
        Confirm::Batch {
            token_contract,
            batch_nonce,
            ..
        } => {
            let batch = state::get_batch(deps.storage, token_contract, *batch_nonce)?.ok_or(
                ContractError::UnknownArtifact {
                    kind: format!("batch {}/{}", token_contract, batch_nonce),
                },
            )?;
            batch_checkpoint(&bridge_id, &batch)?
        }
        Confirm::LogicCall {
            invalidation_id,
            invalidation_nonce,
            ..
        } => {
            let call = state::get_logic_call(
                deps.storage,
                invalidation_id.as_slice(),
                *invalidation_nonce,
            )?
            .ok_or(ContractError::UnknownArtifact {
                kind: format!(
                    "logic call {}/{}",
                    hex::encode(invalidation_id.as_slice()),
                    invalidation_nonce
                ),
            })?;
            logic_call_checkpoint(&bridge_id, &call)?
        }
    };

    // Checkpoints are indexed when their artifact is created; an unknown one
    // here means the store and the artifact disagree.
    if !state::has_past_checkpoint(deps.storage, &checkpoint) {
        return Err(ContractError::InvalidCheckpoint);
    }

    let duplicate = match &confirm {
        Confirm::SignerSet { nonce, .. } => {
            state::get_signer_set_confirm(deps.storage, *nonce, &validator)?.is_some()
        }
        Confirm::Batch {
            token_contract,
            batch_nonce,
            ..
        } => state::get_batch_confirm(deps.storage, token_contract, *batch_nonce, &validator)?
            .is_some(),
        Confirm::LogicCall {
            invalidation_id,
            invalidation_nonce,
            ..
        } => state::get_logic_call_confirm(
            deps.storage,
            invalidation_id.as_slice(),
            *invalidation_nonce,
            &validator,
        )?
        .is_some(),
    };
    if duplicate {
        return Err(ContractError::DuplicateSignature { validator });
    }

    let recovered = recover_remote_signer(deps.api, &checkpoint, confirm.signature())?;
    if recovered != delegated {
        return Err(ContractError::InvalidSignature);
    }

    match &confirm {
        Confirm::SignerSet { nonce, .. } => {
            state::set_signer_set_confirm(deps.storage, *nonce, &validator, &confirm)?;
        }
        Confirm::Batch {
            token_contract,
            batch_nonce,
            ..
        } => {
            state::set_batch_confirm(
                deps.storage,
                token_contract,
                *batch_nonce,
                &validator,
                &confirm,
            )?;
        }
        Confirm::LogicCall {
            invalidation_id,
            invalidation_nonce,
            ..
        } => {
            state::set_logic_call_confirm(
                deps.storage,
                invalidation_id.as_slice(),
                *invalidation_nonce,
                &validator,
                &confirm,
            )?;
        }
    }

    Ok(Response::new()
        .add_attribute("action", "submit_confirm")
        .add_attribute("validator", validator)
        .add_attribute("type", confirm.confirm_type())
        .add_attribute("checkpoint", hex::encode(checkpoint)))
}
