//! Signer-set lifecycle: genesis emission, drift-triggered snapshots,
//! checkpoint signing and pruning.

mod common;

use cosmwasm_std::testing::{mock_env, mock_info};
use cosmwasm_std::from_json;

use quorum_bridge::checkpoint::signer_set_checkpoint;
use quorum_bridge::contract::{execute, query};
use quorum_bridge::msg::{ConfirmsResponse, ExecuteMsg, QueryMsg, SignerSetResponse, SignerSetsResponse};
use quorum_bridge::signer_set::POWER_SCALE;
use quorum_bridge::types::{Confirm, EthereumEvent, SignerSet};
use quorum_bridge::ContractError;

use common::*;

fn current_set(deps: &TestDeps) -> SignerSet {
    let res: SignerSetResponse =
        from_json(&query(deps.as_ref(), mock_env(), QueryMsg::CurrentSignerSet {}).unwrap())
            .unwrap();
    res.signer_set.expect("a signer set always exists")
}

#[test]
fn genesis_emits_signer_set_one() {
    let deps = setup(vec![val("wasmvaloper1v1", 70), val("wasmvaloper1v2", 30)]);

    let set = current_set(&deps);
    assert_eq!(set.nonce, 1);
    // Nobody delegated a remote address yet
    assert!(set.members.is_empty());
}

#[test]
fn drift_triggers_renormalized_snapshots() {
    let mut deps = setup(vec![val("wasmvaloper1v1", 70), val("wasmvaloper1v2", 30)]);

    let addr1 = remote_address_of(&test_key(1));
    let addr2 = remote_address_of(&test_key(2));
    delegate(&mut deps, "wasmvaloper1v1", &addr("orch1"), &addr1);
    delegate(&mut deps, "wasmvaloper1v2", &addr("orch2"), &addr2);

    // The delegated set now diverges completely from the empty genesis set
    let res = end_block(&mut deps, env_at(12_400));
    assert!(res.events.iter().any(|e| e.ty == "signer_set_created"));

    let set = current_set(&deps);
    assert_eq!(set.nonce, 2);
    assert_eq!(set.height, 12_400);
    assert_eq!(set.members.len(), 2);
    // 70% and 30% of the shared scale, highest power first
    assert_eq!(set.members[0].remote_address, addr1);
    assert_eq!(set.members[0].power, 70 * POWER_SCALE / 100);
    assert_eq!(set.members[1].remote_address, addr2);
    assert_eq!(set.members[1].power, 30 * POWER_SCALE / 100);
    assert!(set.total_power() <= POWER_SCALE);

    // v1 unbonds 25 power: 70/30 becomes 45/30, drift 0.2 > 0.05
    set_validators(
        &mut deps,
        vec![val("wasmvaloper1v1", 45), val("wasmvaloper1v2", 30)],
    );
    let res = end_block(&mut deps, env_at(12_401));
    assert!(res.events.iter().any(|e| e.ty == "signer_set_created"));

    let set = current_set(&deps);
    assert_eq!(set.nonce, 3);
    assert_eq!(set.members[0].power, 45 * POWER_SCALE as u64 / 75);
    assert_eq!(set.members[1].power, 30 * POWER_SCALE as u64 / 75);

    // No further drift, no further emission
    let res = end_block(&mut deps, env_at(12_402));
    assert!(!res.events.iter().any(|e| e.ty == "signer_set_created"));
    assert_eq!(current_set(&deps).nonce, 3);
}

#[test]
fn signer_set_confirm_roundtrip() {
    let mut deps = setup(vec![val("wasmvaloper1v1", 70), val("wasmvaloper1v2", 30)]);

    let key1 = test_key(1);
    delegate(&mut deps, "wasmvaloper1v1", &addr("orch1"), &remote_address_of(&key1));
    end_block(&mut deps, env_at(12_400));

    let set = current_set(&deps);
    assert_eq!(set.nonce, 2);
    let checkpoint = signer_set_checkpoint(&BRIDGE_ID, &set).unwrap();

    execute(
        deps.as_mut(),
        mock_env(),
        mock_info(&addr("orch1"), &[]),
        ExecuteMsg::SubmitConfirm {
            confirm: Confirm::SignerSet {
                nonce: 2,
                remote_signer: remote_address_of(&key1),
                signature: sign_checkpoint(&key1, &checkpoint),
            },
        },
    )
    .unwrap();

    let res: ConfirmsResponse = from_json(
        &query(
            deps.as_ref(),
            mock_env(),
            QueryMsg::SignerSetConfirms { nonce: 2 },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(res.confirms.len(), 1);
    assert_eq!(res.confirms[0].validator, "wasmvaloper1v1");

    // Unknown artifact
    let err = execute(
        deps.as_mut(),
        mock_env(),
        mock_info(&addr("orch1"), &[]),
        ExecuteMsg::SubmitConfirm {
            confirm: Confirm::SignerSet {
                nonce: 99,
                remote_signer: remote_address_of(&key1),
                signature: sign_checkpoint(&key1, &checkpoint),
            },
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::UnknownArtifact { .. }));

    // A validator that never delegated cannot confirm
    let err = execute(
        deps.as_mut(),
        mock_env(),
        mock_info("wasmvaloper1v2", &[]),
        ExecuteMsg::SubmitConfirm {
            confirm: Confirm::SignerSet {
                nonce: 2,
                remote_signer: remote_address_of(&key1),
                signature: sign_checkpoint(&key1, &checkpoint),
            },
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::InvalidAddress { .. }));
}

#[test]
fn checkpoint_rebuilds_to_identical_bytes() {
    let mut deps = setup(vec![val("wasmvaloper1v1", 70), val("wasmvaloper1v2", 30)]);

    delegate(
        &mut deps,
        "wasmvaloper1v1",
        &addr("orch1"),
        &remote_address_of(&test_key(1)),
    );
    end_block(&mut deps, env_at(12_400));

    // Fetching the stored set twice yields byte-identical checkpoints
    let first = signer_set_checkpoint(&BRIDGE_ID, &current_set(&deps)).unwrap();
    let second = signer_set_checkpoint(&BRIDGE_ID, &current_set(&deps)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn retired_signer_sets_are_pruned() {
    let mut deps = setup(vec![val("wasmvaloper1v1", 70), val("wasmvaloper1v2", 30)]);

    delegate(
        &mut deps,
        "wasmvaloper1v1",
        &addr("orch1"),
        &remote_address_of(&test_key(1)),
    );
    end_block(&mut deps, env_at(12_400)); // nonce 2

    // v1 bulks up: drift well past the bound, and v1 alone can now observe
    set_validators(
        &mut deps,
        vec![val("wasmvaloper1v1", 100), val("wasmvaloper1v2", 30)],
    );
    end_block(&mut deps, env_at(12_401)); // nonce 3

    // The remote contract reports it adopted set 3
    execute(
        deps.as_mut(),
        mock_env(),
        mock_info("wasmvaloper1v1", &[]),
        ExecuteMsg::SubmitEvent {
            event: EthereumEvent::SignerSetUpdated {
                event_nonce: 1,
                remote_height: 5_000,
                signer_set_nonce: 3,
            },
        },
    )
    .unwrap();

    // Far past every window: sets 1 and 2 retire; 3 stays, being both the
    // latest stored and the set last observed on the remote side.
    let res = end_block(&mut deps, env_at(50_000));
    let pruned: Vec<String> = res
        .events
        .iter()
        .filter(|e| e.ty == "signer_set_pruned")
        .map(|e| e.attributes[0].value.clone())
        .collect();
    assert_eq!(pruned, vec!["2", "1"]);

    let res: SignerSetsResponse =
        from_json(&query(deps.as_ref(), mock_env(), QueryMsg::SignerSets { limit: None }).unwrap())
            .unwrap();
    let nonces: Vec<u64> = res.signer_sets.iter().map(|s| s.nonce).collect();
    assert_eq!(nonces, vec![3]);
}

#[test]
fn governance_updates_params_through_sudo() {
    let mut deps = setup(vec![val("wasmvaloper1v1", 70), val("wasmvaloper1v2", 30)]);

    let mut params = quorum_bridge::state::Params::default();
    params.batch_size = 25;
    quorum_bridge::contract::sudo(
        deps.as_mut(),
        mock_env(),
        quorum_bridge::msg::SudoMsg::UpdateParams { params },
    )
    .unwrap();

    let res: quorum_bridge::msg::ParamsResponse =
        from_json(&query(deps.as_ref(), mock_env(), QueryMsg::Params {}).unwrap()).unwrap();
    assert_eq!(res.params.batch_size, 25);

    // Invalid params are rejected
    let mut params = quorum_bridge::state::Params::default();
    params.batch_size = 0;
    quorum_bridge::contract::sudo(
        deps.as_mut(),
        mock_env(),
        quorum_bridge::msg::SudoMsg::UpdateParams { params },
    )
    .unwrap_err();
}
