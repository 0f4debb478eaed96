//! Outgoing transfer pool handlers.

use cosmwasm_std::{BankMsg, Coin, DepsMut, Env, MessageInfo, Response, Uint128};

use crate::address::canonical_remote_address;
use crate::batch::{build_batch, token_contract_for_denom};
use crate::chain::{query_validator, ChainMsg, ChainQuery};
use crate::error::ContractError;
use crate::execute::resolve_validator;
use crate::state;
use crate::types::{ERC20Token, TransferTx};

/// `Transfer`: escrow `amount + fee` and queue a transfer to the remote
/// chain. The exact escrow must arrive as attached funds.
pub fn execute_transfer(
    deps: DepsMut<ChainQuery>,
    _env: Env,
    info: MessageInfo,
    remote_recipient: String,
    amount: Coin,
    fee: Coin,
) -> Result<Response<ChainMsg>, ContractError> {
    let remote_recipient = canonical_remote_address(&remote_recipient)?;

    if fee.denom != amount.denom {
        return Err(ContractError::DenomNotBridged {
            denom: fee.denom.clone(),
        });
    }
    let denom = amount.denom.clone();
    let token_contract = token_contract_for_denom(deps.storage, &denom)?;

    let needed = amount.amount + fee.amount;
    let sent = info
        .funds
        .iter()
        .filter(|coin| coin.denom == denom)
        .map(|coin| coin.amount)
        .sum::<Uint128>();
    if sent != needed || info.funds.len() != 1 {
        return Err(ContractError::InsufficientBalance { needed, sent, denom });
    }

    let id = state::next_pool_id(deps.storage);
    let tx = TransferTx {
        id,
        sender: info.sender.clone(),
        remote_recipient: remote_recipient.clone(),
        token: ERC20Token::new(token_contract.clone(), amount.amount),
        fee: ERC20Token::new(token_contract, fee.amount),
    };
    state::set_pool_tx(deps.storage, &tx)?;

    Ok(Response::new()
        .add_attribute("action", "transfer")
        .add_attribute("sender", info.sender)
        .add_attribute("receiver", remote_recipient)
        .add_attribute("tx_id", id.to_string())
        .add_attribute("denom", denom))
}

/// `CancelTransfer`: refund an un-batched transfer to its sender.
pub fn execute_cancel_transfer(
    deps: DepsMut<ChainQuery>,
    info: MessageInfo,
    id: u64,
) -> Result<Response<ChainMsg>, ContractError> {
    let tx = state::get_pool_tx(deps.storage, id)?
        .ok_or(ContractError::TransferNotFound { id })?;
    if tx.sender != info.sender {
        return Err(ContractError::NotOwner { id });
    }

    // The escrowed denom is recovered from the token contract: a stored
    // native-origin mapping or the derived voucher form.
    let denom = match state::stored_denom_for_contract(deps.storage, &tx.token.contract) {
        Some(denom) => denom,
        None => crate::address::contract_to_bridged_denom(&tx.token.contract)?,
    };

    state::delete_pool_tx(deps.storage, &tx)?;

    let refund = BankMsg::Send {
        to_address: tx.sender.to_string(),
        amount: vec![Coin {
            denom: denom.clone(),
            amount: tx.token.amount + tx.fee.amount,
        }],
    };

    Ok(Response::new()
        .add_message(refund)
        .add_attribute("action", "cancel_transfer")
        .add_attribute("tx_id", id.to_string())
        .add_attribute("sender", info.sender)
        .add_attribute("denom", denom))
}

/// `RequestBatch`: fold the best-paying pool transfers for `denom` into a new
/// batch. The signer must be an orchestrator of a bonded validator.
pub fn execute_request_batch(
    deps: DepsMut<ChainQuery>,
    env: Env,
    info: MessageInfo,
    denom: String,
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

    let token_contract = token_contract_for_denom(deps.storage, &denom)?;
    let batch = build_batch(deps.storage, &env, &token_contract)?;

    Ok(Response::new()
        .add_attribute("action", "batch_created")
        .add_attribute("batch_nonce", batch.batch_nonce.to_string())
        .add_attribute("contract", batch.token_contract)
        .add_attribute("transfers", batch.transactions.len().to_string())
        .add_attribute("timeout", batch.batch_timeout.to_string()))
}
