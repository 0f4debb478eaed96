//! Slashing sweeps: missed signer-set signatures, missed batch signatures,
//! missed votes and conflicting claims.

mod common;

use cosmwasm_std::testing::{mock_env, mock_info};
use cosmwasm_std::{coins, Coin, CosmosMsg, Decimal, Event, Response, Uint128};

use quorum_bridge::chain::ChainMsg;
use quorum_bridge::checkpoint::{batch_checkpoint, signer_set_checkpoint};
use quorum_bridge::contract::execute;
use quorum_bridge::msg::ExecuteMsg;
use quorum_bridge::state::Params;
use quorum_bridge::types::Confirm;

use common::*;

/// Slash messages in a response as `(validator, fraction, jail)` triples.
fn slashes(res: &Response<ChainMsg>) -> Vec<(String, Decimal, bool)> {
    res.messages
        .iter()
        .filter_map(|m| match &m.msg {
            CosmosMsg::Custom(ChainMsg::Slash {
                validator,
                fraction,
                jail,
            }) => Some((validator.clone(), *fraction, *jail)),
            _ => None,
        })
        .collect()
}

fn slash_kinds(res: &Response<ChainMsg>) -> Vec<(String, String)> {
    res.events
        .iter()
        .filter(|e| e.ty == "bridge_slash")
        .map(|e| {
            let get = |key: &str| {
                e.attributes
                    .iter()
                    .find(|a| a.key == key)
                    .map(|a| a.value.clone())
                    .unwrap_or_default()
            };
            (get("validator"), get("kind"))
        })
        .collect()
}

#[test]
fn missed_signer_set_signature_is_slashed() {
    let mut params = Params::default();
    params.signer_set_window = 50;
    let mut deps = setup_with_params(
        vec![val("wasmvaloper1v1", 70), val("wasmvaloper1v2", 30)],
        params,
    );

    let key1 = test_key(1);
    let key2 = test_key(2);
    delegate(&mut deps, "wasmvaloper1v1", &addr("orch1"), &remote_address_of(&key1));
    delegate(&mut deps, "wasmvaloper1v2", &addr("orch2"), &remote_address_of(&key2));

    // Snapshot set 2 at height 12350
    end_block(&mut deps, env_at(12_350));

    // Both validators sign the genesis set; only v1 signs set 2
    let genesis = {
        let deps_ref = deps.as_ref();
        quorum_bridge::state::get_signer_set(deps_ref.storage, 1)
            .unwrap()
            .unwrap()
    };
    let genesis_checkpoint = signer_set_checkpoint(&BRIDGE_ID, &genesis).unwrap();
    for (orch, key) in [(&addr("orch1"), &key1), (&addr("orch2"), &key2)] {
        execute(
            deps.as_mut(),
            mock_env(),
            mock_info(orch, &[]),
            ExecuteMsg::SubmitConfirm {
                confirm: Confirm::SignerSet {
                    nonce: 1,
                    remote_signer: remote_address_of(key),
                    signature: sign_checkpoint(key, &genesis_checkpoint),
                },
            },
        )
        .unwrap();
    }

    let set2 = {
        let deps_ref = deps.as_ref();
        quorum_bridge::state::get_signer_set(deps_ref.storage, 2)
            .unwrap()
            .unwrap()
    };
    let checkpoint2 = signer_set_checkpoint(&BRIDGE_ID, &set2).unwrap();
    execute(
        deps.as_mut(),
        mock_env(),
        mock_info(&addr("orch1"), &[]),
        ExecuteMsg::SubmitConfirm {
            confirm: Confirm::SignerSet {
                nonce: 2,
                remote_signer: remote_address_of(&key1),
                signature: sign_checkpoint(&key1, &checkpoint2),
            },
        },
    )
    .unwrap();

    // Both sets are now past the 50-block window
    let res = end_block(&mut deps, env_at(12_405));
    assert_eq!(
        slashes(&res),
        vec![(
            "wasmvaloper1v2".to_string(),
            Decimal::permille(1),
            true
        )]
    );
    assert_eq!(
        slash_kinds(&res),
        vec![("wasmvaloper1v2".to_string(), "signer_set".to_string())]
    );

    // The sweep never revisits a slashed nonce
    let res = end_block(&mut deps, env_at(12_406));
    assert!(slashes(&res).is_empty());
}

#[test]
fn missed_batch_signature_is_slashed() {
    let mut params = Params::default();
    params.batch_tx_window = 50;
    let mut deps = setup_with_params(
        vec![val("wasmvaloper1v1", 70), val("wasmvaloper1v2", 30)],
        params,
    );

    let key1 = test_key(1);
    let key2 = test_key(2);
    delegate(&mut deps, "wasmvaloper1v1", &addr("orch1"), &remote_address_of(&key1));
    delegate(&mut deps, "wasmvaloper1v2", &addr("orch2"), &remote_address_of(&key2));

    execute(
        deps.as_mut(),
        mock_env(),
        mock_info("wasm1user", &coins(11, VOUCHER)),
        ExecuteMsg::Transfer {
            remote_recipient: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".to_string(),
            amount: Coin {
                denom: VOUCHER.to_string(),
                amount: Uint128::new(10),
            },
            fee: Coin {
                denom: VOUCHER.to_string(),
                amount: Uint128::new(1),
            },
        },
    )
    .unwrap();
    execute(
        deps.as_mut(),
        mock_env(),
        mock_info(&addr("orch1"), &[]),
        ExecuteMsg::RequestBatch {
            denom: VOUCHER.to_string(),
        },
    )
    .unwrap();

    // v1 signs, v2 does not
    let batch = {
        let deps_ref = deps.as_ref();
        quorum_bridge::state::get_batch(deps_ref.storage, TOKEN, 1)
            .unwrap()
            .unwrap()
    };
    let checkpoint = batch_checkpoint(&BRIDGE_ID, &batch).unwrap();
    execute(
        deps.as_mut(),
        mock_env(),
        mock_info(&addr("orch1"), &[]),
        ExecuteMsg::SubmitConfirm {
            confirm: Confirm::Batch {
                token_contract: TOKEN.to_string(),
                batch_nonce: 1,
                remote_signer: remote_address_of(&key1),
                signature: sign_checkpoint(&key1, &checkpoint),
            },
        },
    )
    .unwrap();

    // Delay signer-set churn out of the picture: the batch window closes
    // long before the default signer-set window does
    let res = end_block(&mut deps, env_at(12_345 + 51));
    assert_eq!(
        slash_kinds(&res),
        vec![("wasmvaloper1v2".to_string(), "batch".to_string())]
    );

    let res = end_block(&mut deps, env_at(12_345 + 52));
    assert!(slashes(&res).is_empty());
}

#[test]
fn conflicting_claims_slash_the_losing_voters() {
    let mut params = Params::default();
    params.event_window = 50;
    let mut deps = setup_with_params(
        vec![
            val("wasmvaloper1v1", 4),
            val("wasmvaloper1v2", 4),
            val("wasmvaloper1v3", 4),
        ],
        params,
    );

    // v1 and v3 claim one deposit; v2 claims a different one at the same
    // nonce. v3's vote tips the first claim: 8/12 >= 0.666
    execute(
        deps.as_mut(),
        mock_env(),
        mock_info("wasmvaloper1v1", &[]),
        ExecuteMsg::SubmitEvent {
            event: deposit_event(1, 100, &addr("receiver")),
        },
    )
    .unwrap();
    execute(
        deps.as_mut(),
        mock_env(),
        mock_info("wasmvaloper1v2", &[]),
        ExecuteMsg::SubmitEvent {
            event: deposit_event(1, 999, &addr("attacker")),
        },
    )
    .unwrap();
    let res = execute(
        deps.as_mut(),
        mock_env(),
        mock_info("wasmvaloper1v3", &[]),
        ExecuteMsg::SubmitEvent {
            event: deposit_event(1, 100, &addr("receiver")),
        },
    )
    .unwrap();
    assert!(res
        .attributes
        .iter()
        .any(|a| a.key == "observed" && a.value == "true"));

    // One block before the window closes: no slashing yet
    let res = end_block(&mut deps, env_at(12_345 + 49));
    assert!(slashes(&res).is_empty());

    // At exactly observed-height + window the sweep runs; only the losing
    // voter is slashed, for conflict
    let res = end_block(&mut deps, env_at(12_345 + 50));
    assert_eq!(
        slash_kinds(&res),
        vec![("wasmvaloper1v2".to_string(), "conflicting_event".to_string())]
    );
}

#[test]
fn non_voting_validator_is_slashed_after_event_window() {
    let mut params = Params::default();
    params.event_window = 50;
    let mut deps = setup_with_params(
        vec![
            val("wasmvaloper1v1", 5),
            val("wasmvaloper1v2", 5),
            val("wasmvaloper1v4", 2),
        ],
        params,
    );

    execute(
        deps.as_mut(),
        mock_env(),
        mock_info("wasmvaloper1v1", &[]),
        ExecuteMsg::SubmitEvent {
            event: deposit_event(1, 100, &addr("receiver")),
        },
    )
    .unwrap();
    execute(
        deps.as_mut(),
        mock_env(),
        mock_info("wasmvaloper1v2", &[]),
        ExecuteMsg::SubmitEvent {
            event: deposit_event(1, 100, &addr("receiver")),
        },
    )
    .unwrap();

    let res = end_block(&mut deps, env_at(12_345 + 51));
    assert_eq!(
        slash_kinds(&res),
        vec![("wasmvaloper1v4".to_string(), "event".to_string())]
    );

    // The sweep never revisits a slashed nonce
    let res = end_block(&mut deps, env_at(12_345 + 52));
    assert!(slashes(&res).is_empty());
}

#[test]
fn sweeps_emit_events_alongside_messages() {
    let mut params = Params::default();
    params.event_window = 50;
    let mut deps = setup_with_params(
        vec![val("wasmvaloper1v1", 9), val("wasmvaloper1v2", 1)],
        params,
    );

    execute(
        deps.as_mut(),
        mock_env(),
        mock_info("wasmvaloper1v1", &[]),
        ExecuteMsg::SubmitEvent {
            event: deposit_event(1, 100, &addr("receiver")),
        },
    )
    .unwrap();

    let res = end_block(&mut deps, env_at(12_345 + 51));
    let slash_events: Vec<&Event> = res
        .events
        .iter()
        .filter(|e| e.ty == "bridge_slash")
        .collect();
    assert_eq!(slashes(&res).len(), slash_events.len());
}
