//! Signer-set engine.
//!
//! Mirrors the bonded validator set onto the remote chain as a weighted
//! multisig. Powers are normalized to a shared fixed-point scale whose
//! set-wide sum stays within `u32::MAX`, so the remote contract can do its
//! quorum math in a uint.

use std::collections::BTreeMap;

use cosmwasm_std::{Decimal, Deps, DepsMut, Env, StdResult, Storage, Uint128};

use crate::chain::{query_bonded_validators, ChainQuery};
use crate::checkpoint::signer_set_checkpoint;
use crate::error::ContractError;
use crate::state;
use crate::types::{SignerSet, SignerSetMember};

/// The shared power scale. Flooring during normalization keeps the sum of
/// member powers at or below this value.
pub const POWER_SCALE: u64 = u32::MAX as u64;

/// Snapshot the current bonded set as a signer set with the given nonce.
///
/// Validators without a delegated remote address and entries that normalize
/// to zero power are dropped. Member order is canonical (power desc, address
/// bytes desc).
pub fn construct_signer_set(
    deps: Deps<ChainQuery>,
    height: u64,
    nonce: u64,
) -> StdResult<SignerSet> {
    let bonded = query_bonded_validators(&deps.querier)?;

    let mut delegated: Vec<(String, u64)> = Vec::with_capacity(bonded.len());
    let mut total_power: u128 = 0;
    for validator in bonded.iter().filter(|v| !v.jailed) {
        if let Some(remote_address) =
            state::remote_address_by_validator(deps.storage, &validator.operator)
        {
            delegated.push((remote_address, validator.power));
            total_power += validator.power as u128;
        }
    }

    let mut members: Vec<SignerSetMember> = Vec::with_capacity(delegated.len());
    if total_power > 0 {
        for (remote_address, power) in delegated {
            let normalized = (power as u128 * POWER_SCALE as u128 / total_power) as u64;
            if normalized > 0 {
                members.push(SignerSetMember {
                    remote_address,
                    power: normalized,
                });
            }
        }
    }

    let mut signer_set = SignerSet {
        nonce,
        height,
        members,
    };
    signer_set.sort();
    Ok(signer_set)
}

/// Normalized L1 distance between two signer sets on the shared power scale.
pub fn power_diff(a: &SignerSet, b: &SignerSet) -> Decimal {
    let mut powers: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for member in &a.members {
        powers.entry(member.remote_address.as_str()).or_default().0 = member.power;
    }
    for member in &b.members {
        powers.entry(member.remote_address.as_str()).or_default().1 = member.power;
    }

    let delta: u128 = powers
        .values()
        .map(|(pa, pb)| pa.abs_diff(*pb) as u128)
        .sum();

    Decimal::from_ratio(Uint128::new(delta), Uint128::new(POWER_SCALE as u128))
}

/// Persist the next signer set snapshot and index its checkpoint.
pub fn create_signer_set(
    deps: DepsMut<ChainQuery>,
    env: &Env,
) -> Result<SignerSet, ContractError> {
    let nonce = state::latest_signer_set_nonce(deps.storage) + 1;
    let signer_set = construct_signer_set(deps.as_ref(), env.block.height, nonce)?;

    state::set_signer_set(deps.storage, &signer_set)?;

    let bridge_id = state::get_bridge_id(deps.storage)?;
    let checkpoint = signer_set_checkpoint(&bridge_id, &signer_set)?;
    state::set_past_checkpoint(deps.storage, &checkpoint, "signer_set");

    Ok(signer_set)
}

/// Whether drift between the latest stored set and the current bonded set
/// calls for a new snapshot.
pub fn drift_exceeded(deps: Deps<ChainQuery>, env: &Env) -> StdResult<bool> {
    let latest = match state::latest_signer_set(deps.storage)? {
        Some(latest) => latest,
        // Nothing stored yet: only genesis reaches this, which always emits.
        None => return Ok(true),
    };

    let candidate = construct_signer_set(deps, env.block.height, latest.nonce + 1)?;
    if latest.members.is_empty() && candidate.members.is_empty() {
        return Ok(false);
    }

    let params = state::PARAMS.load(deps.storage)?;
    Ok(power_diff(&latest, &candidate) > params.max_signer_set_power_diff)
}

/// Delete signer sets that are past the slashing window and no longer the
/// newest on either chain. Their confirmations go with them.
pub fn prune_signer_sets(storage: &mut dyn Storage, env: &Env) -> StdResult<Vec<u64>> {
    let params = state::PARAMS.load(storage)?;
    let latest = state::latest_signer_set_nonce(storage);
    let last_observed = state::last_observed_signer_set_nonce(storage);

    let mut pruned = Vec::new();
    for signer_set in state::signer_sets_desc(storage)? {
        if signer_set.nonce == latest || signer_set.nonce == last_observed {
            continue;
        }
        let retire_height = signer_set
            .height
            .saturating_add(params.signer_set_window)
            .saturating_add(params.unbonding_window);
        if env.block.height > retire_height {
            state::delete_signer_set(storage, signer_set.nonce);
            state::delete_signer_set_confirms(storage, signer_set.nonce);
            pruned.push(signer_set.nonce);
        }
    }
    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(addr: &str, power: u64) -> SignerSetMember {
        SignerSetMember {
            remote_address: addr.to_string(),
            power,
        }
    }

    fn set(members: Vec<SignerSetMember>) -> SignerSet {
        SignerSet {
            nonce: 1,
            height: 1,
            members,
        }
    }

    const A: &str = "0x1111111111111111111111111111111111111111";
    const B: &str = "0x2222222222222222222222222222222222222222";

    #[test]
    fn test_power_diff_zero_for_identical_sets() {
        let s = set(vec![member(A, 3_000_000_000), member(B, 1_294_967_295)]);
        assert_eq!(power_diff(&s, &s), Decimal::zero());
    }

    #[test]
    fn test_power_diff_symmetric_and_counts_missing_members() {
        let a = set(vec![member(A, 3_000_000_000), member(B, 1_294_967_295)]);
        let b = set(vec![member(A, 3_000_000_000)]);

        let expected = Decimal::from_ratio(1_294_967_295u128, POWER_SCALE as u128);
        assert_eq!(power_diff(&a, &b), expected);
        assert_eq!(power_diff(&b, &a), expected);
    }

    #[test]
    fn test_power_diff_boundary() {
        // 5% of the scale moved from A to B: drift is exactly 10% (5% out of
        // one member, 5% into the other).
        let five_pct = POWER_SCALE / 20;
        let a = set(vec![member(A, POWER_SCALE / 2), member(B, POWER_SCALE / 2)]);
        let b = set(vec![
            member(A, POWER_SCALE / 2 - five_pct),
            member(B, POWER_SCALE / 2 + five_pct),
        ]);

        let diff = power_diff(&a, &b);
        assert_eq!(
            diff,
            Decimal::from_ratio(2 * five_pct as u128, POWER_SCALE as u128)
        );
        assert!(diff > Decimal::percent(5));
    }
}
