//! Storage layout and typed accessors.
//!
//! Governance parameters live in a `cw-storage-plus` item. Everything
//! consensus-critical uses the flat byte-keyed layout below, composed as
//! `prefix ‖ big-endian fields`. Iteration under a prefix is lexicographic on
//! raw key bytes, which is the only ordering the engines rely on.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Decimal, Order, StdError, StdResult, Storage};
use cw_storage_plus::Item;

use crate::address::parse_remote_address;
use crate::types::{
    Attestation, BatchTx, Confirm, EthereumEvent, OutgoingLogicCall, RemoteChainInfo, SignerSet,
    TransferTx,
};

// ============================================================================
// Parameters
// ============================================================================

/// Governance-tunable parameters.
#[cw_serde]
pub struct Params {
    /// Bridge contract address on the remote chain.
    pub bridge_contract_address: String,
    /// Chain id of the remote chain.
    pub bridge_chain_id: u64,
    /// Blocks a validator has to sign a signer-set checkpoint.
    pub signer_set_window: u64,
    /// Blocks a validator has to sign a batch checkpoint.
    pub batch_tx_window: u64,
    /// Blocks a validator has to vote on an observed event.
    pub event_window: u64,
    /// Target batch lifetime on the remote chain, in milliseconds.
    pub target_batch_timeout: u64,
    /// Average host-chain block time, in milliseconds.
    pub average_block_time: u64,
    /// Average remote-chain block time, in milliseconds.
    pub average_remote_block_time: u64,
    /// Maximum number of transfers per batch.
    pub batch_size: u64,
    pub slash_fraction_signer_set: Decimal,
    pub slash_fraction_batch: Decimal,
    pub slash_fraction_logic_call: Decimal,
    pub slash_fraction_event: Decimal,
    pub slash_fraction_conflicting_event: Decimal,
    /// Blocks after unbonding starts during which a validator stays slashable.
    pub unbonding_window: u64,
    /// Voting-power drift that triggers a new signer set.
    pub max_signer_set_power_diff: Decimal,
    /// Fraction of bonded power required to observe an attestation.
    pub attestation_votes_power_threshold: Decimal,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            bridge_contract_address: "0x0000000000000000000000000000000000000000".to_string(),
            bridge_chain_id: 1,
            signer_set_window: 10_000,
            batch_tx_window: 10_000,
            event_window: 10_000,
            target_batch_timeout: 43_200_000,
            average_block_time: 5_000,
            average_remote_block_time: 15_000,
            batch_size: 100,
            slash_fraction_signer_set: Decimal::permille(1),
            slash_fraction_batch: Decimal::permille(1),
            slash_fraction_logic_call: Decimal::permille(1),
            slash_fraction_event: Decimal::permille(1),
            slash_fraction_conflicting_event: Decimal::permille(1),
            unbonding_window: 10_000,
            max_signer_set_power_diff: Decimal::percent(5),
            attestation_votes_power_threshold: Decimal::permille(666),
        }
    }
}

impl Params {
    /// Bounds checking; bad values are rejected at instantiate and migrate.
    pub fn validate(&self) -> StdResult<()> {
        parse_remote_address(&self.bridge_contract_address)
            .map_err(|_| StdError::generic_err("invalid bridge contract address"))?;
        if self.bridge_chain_id == 0 {
            return Err(StdError::generic_err("bridge chain id cannot be 0"));
        }
        if self.target_batch_timeout < 60_000 {
            return Err(StdError::generic_err(
                "target batch timeout below 60 seconds",
            ));
        }
        if self.average_block_time < 100 || self.average_remote_block_time < 100 {
            return Err(StdError::generic_err(
                "average block times below latency limits",
            ));
        }
        if self.batch_size == 0 {
            return Err(StdError::generic_err("batch size cannot be 0"));
        }
        for fraction in [
            self.slash_fraction_signer_set,
            self.slash_fraction_batch,
            self.slash_fraction_logic_call,
            self.slash_fraction_event,
            self.slash_fraction_conflicting_event,
            self.max_signer_set_power_diff,
            self.attestation_votes_power_threshold,
        ] {
            if fraction > Decimal::one() {
                return Err(StdError::generic_err("fraction above 1"));
            }
        }
        Ok(())
    }
}

pub const PARAMS: Item<Params> = Item::new("params");

/// Contract name for cw2 migration info.
pub const CONTRACT_NAME: &str = "crates.io:quorum-bridge";

/// Contract version for cw2 migration info.
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Key layout
// ============================================================================

/// val -> remote address
pub const REMOTE_ADDRESS_BY_VALIDATOR: u8 = 0x01;
/// remote address -> orchestrator
pub const ORCHESTRATOR_BY_REMOTE_ADDRESS: u8 = 0x02;
/// signer set by nonce
pub const SIGNER_SET: u8 = 0x03;
/// signer set confirmation by (nonce, validator)
pub const SIGNER_SET_CONFIRM: u8 = 0x04;
/// event body by content hash
pub const EVENT: u8 = 0x05;
/// attestation by (event nonce, content hash)
pub const ATTESTATION: u8 = 0x06;
/// pool transfer by id
pub const OUTGOING_TX_POOL: u8 = 0x07;
/// fee second index by (contract, fee, id)
pub const FEE_INDEX: u8 = 0x09;
/// batch by (contract, nonce)
pub const BATCH: u8 = 0x0a;
/// batch ref by (creation height, nonce)
pub const BATCH_BY_BLOCK: u8 = 0x0b;
/// batch confirmation by (contract, nonce, validator)
pub const BATCH_CONFIRM: u8 = 0x0c;
/// last submitted event nonce per validator
pub const LAST_EVENT_NONCE_BY_VALIDATOR: u8 = 0x0e;
/// last applied event nonce
pub const LAST_OBSERVED_EVENT_NONCE: u8 = 0x0f;
/// id sequences, labeled
pub const SEQUENCE: u8 = 0x10;
/// orchestrator -> val
pub const VALIDATOR_BY_ORCHESTRATOR: u8 = 0x11;
/// logic call by (invalidation id, invalidation nonce)
pub const LOGIC_CALL: u8 = 0x12;
/// logic call confirmation by (invalidation id, invalidation nonce, validator)
pub const LOGIC_CALL_CONFIRM: u8 = 0x13;
/// denom -> token contract (native-origin pairs)
pub const DENOM_TO_CONTRACT: u8 = 0x15;
/// token contract -> denom (native-origin pairs)
pub const CONTRACT_TO_DENOM: u8 = 0x16;
/// newest signer-set nonce already swept for slashing
pub const LAST_SLASHED_SIGNER_SET_NONCE: u8 = 0x17;
/// newest signer-set nonce ever stored
pub const LATEST_SIGNER_SET_NONCE: u8 = 0x18;
/// newest batch creation height already swept for slashing
pub const LAST_SLASHED_BATCH_BLOCK: u8 = 0x19;
/// bridge id assigned at genesis
pub const BRIDGE_ID: u8 = 0x1a;
/// checkpoints the module has requested signatures over
pub const PAST_CHECKPOINT: u8 = 0x1b;
/// host height of the most recent unbonding start
pub const LAST_UNBONDING_HEIGHT: u8 = 0xf8;
/// remote height/time of the most recent applied event
pub const LATEST_REMOTE_HEIGHT: u8 = 0xf9;
/// signer-set nonce last observed on the remote contract
pub const LAST_OBSERVED_SIGNER_SET_NONCE: u8 = 0xfa;

const SEQ_TX_POOL_ID: &[u8] = b"lastTxPoolId";
const SEQ_BATCH_ID: &[u8] = b"lastBatchId";
const SEQ_EVENT_SLASH: &[u8] = b"lastSlashedEventNonce";
const SEQ_LOGIC_SLASH: &[u8] = b"lastSlashedLogicBlock";

fn key(prefix: u8, parts: &[&[u8]]) -> Vec<u8> {
    let len = 1 + parts.iter().map(|p| p.len()).sum::<usize>();
    let mut k = Vec::with_capacity(len);
    k.push(prefix);
    for p in parts {
        k.extend_from_slice(p);
    }
    k
}

/// The first key after every key starting with `prefix`, if any.
fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.last_mut() {
        if *last < 0xff {
            *last += 1;
            return Some(end);
        }
        end.pop();
    }
    None
}

/// Iterate `(suffix, value)` pairs under `prefix` in the given order.
fn iter_prefix<'a>(
    storage: &'a dyn Storage,
    prefix: Vec<u8>,
    order: Order,
) -> impl Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a {
    let end = prefix_end(&prefix);
    let iter = storage.range(Some(&prefix), end.as_deref(), order);
    let plen = prefix.len();
    iter.map(move |(k, v)| (k[plen..].to_vec(), v))
}

fn get_u64(storage: &dyn Storage, k: &[u8]) -> u64 {
    storage
        .get(k)
        .and_then(|bz| bz.try_into().ok().map(u64::from_be_bytes))
        .unwrap_or(0)
}

fn set_u64(storage: &mut dyn Storage, k: &[u8], value: u64) {
    storage.set(k, &value.to_be_bytes());
}

fn get_json<T: serde::de::DeserializeOwned>(
    storage: &dyn Storage,
    k: &[u8],
) -> StdResult<Option<T>> {
    match storage.get(k) {
        Some(bz) => Ok(Some(cosmwasm_std::from_json(&bz)?)),
        None => Ok(None),
    }
}

fn set_json<T: serde::Serialize>(storage: &mut dyn Storage, k: &[u8], value: &T) -> StdResult<()> {
    storage.set(k, &cosmwasm_std::to_json_vec(value)?);
    Ok(())
}

// ============================================================================
// Bridge id
// ============================================================================

pub fn set_bridge_id(storage: &mut dyn Storage, bridge_id: &[u8; 32]) {
    storage.set(&[BRIDGE_ID], bridge_id);
}

pub fn get_bridge_id(storage: &dyn Storage) -> StdResult<[u8; 32]> {
    storage
        .get(&[BRIDGE_ID])
        .and_then(|bz| <[u8; 32]>::try_from(bz.as_slice()).ok())
        .ok_or_else(|| StdError::generic_err("bridge id not set"))
}

// ============================================================================
// Delegate-key registry
// ============================================================================

/// Write all three directions of the registry atomically.
pub fn set_delegate_keys(
    storage: &mut dyn Storage,
    validator: &str,
    orchestrator: &str,
    remote_address: &str,
) {
    storage.set(
        &key(REMOTE_ADDRESS_BY_VALIDATOR, &[validator.as_bytes()]),
        remote_address.as_bytes(),
    );
    storage.set(
        &key(ORCHESTRATOR_BY_REMOTE_ADDRESS, &[remote_address.as_bytes()]),
        orchestrator.as_bytes(),
    );
    storage.set(
        &key(VALIDATOR_BY_ORCHESTRATOR, &[orchestrator.as_bytes()]),
        validator.as_bytes(),
    );
}

pub fn remote_address_by_validator(storage: &dyn Storage, validator: &str) -> Option<String> {
    storage
        .get(&key(REMOTE_ADDRESS_BY_VALIDATOR, &[validator.as_bytes()]))
        .map(|bz| String::from_utf8_lossy(&bz).to_string())
}

pub fn orchestrator_by_remote_address(storage: &dyn Storage, remote_address: &str) -> Option<String> {
    storage
        .get(&key(
            ORCHESTRATOR_BY_REMOTE_ADDRESS,
            &[remote_address.as_bytes()],
        ))
        .map(|bz| String::from_utf8_lossy(&bz).to_string())
}

pub fn validator_by_orchestrator(storage: &dyn Storage, orchestrator: &str) -> Option<String> {
    storage
        .get(&key(VALIDATOR_BY_ORCHESTRATOR, &[orchestrator.as_bytes()]))
        .map(|bz| String::from_utf8_lossy(&bz).to_string())
}

// ============================================================================
// Signer sets
// ============================================================================

pub fn set_signer_set(storage: &mut dyn Storage, signer_set: &SignerSet) -> StdResult<()> {
    set_json(
        storage,
        &key(SIGNER_SET, &[&signer_set.nonce.to_be_bytes()]),
        signer_set,
    )?;
    if signer_set.nonce > latest_signer_set_nonce(storage) {
        set_u64(storage, &[LATEST_SIGNER_SET_NONCE], signer_set.nonce);
    }
    Ok(())
}

pub fn get_signer_set(storage: &dyn Storage, nonce: u64) -> StdResult<Option<SignerSet>> {
    get_json(storage, &key(SIGNER_SET, &[&nonce.to_be_bytes()]))
}

pub fn delete_signer_set(storage: &mut dyn Storage, nonce: u64) {
    storage.remove(&key(SIGNER_SET, &[&nonce.to_be_bytes()]));
}

pub fn latest_signer_set_nonce(storage: &dyn Storage) -> u64 {
    get_u64(storage, &[LATEST_SIGNER_SET_NONCE])
}

pub fn latest_signer_set(storage: &dyn Storage) -> StdResult<Option<SignerSet>> {
    match latest_signer_set_nonce(storage) {
        0 => Ok(None),
        nonce => get_signer_set(storage, nonce),
    }
}

/// All stored signer sets, newest first.
pub fn signer_sets_desc(storage: &dyn Storage) -> StdResult<Vec<SignerSet>> {
    iter_prefix(storage, vec![SIGNER_SET], Order::Descending)
        .map(|(_, v)| cosmwasm_std::from_json(&v).map_err(Into::into))
        .collect()
}

pub fn set_signer_set_confirm(
    storage: &mut dyn Storage,
    nonce: u64,
    validator: &str,
    confirm: &Confirm,
) -> StdResult<()> {
    set_json(
        storage,
        &key(
            SIGNER_SET_CONFIRM,
            &[&nonce.to_be_bytes(), validator.as_bytes()],
        ),
        confirm,
    )
}

pub fn get_signer_set_confirm(
    storage: &dyn Storage,
    nonce: u64,
    validator: &str,
) -> StdResult<Option<Confirm>> {
    get_json(
        storage,
        &key(
            SIGNER_SET_CONFIRM,
            &[&nonce.to_be_bytes(), validator.as_bytes()],
        ),
    )
}

/// All confirmations for a signer set, with the confirming validator.
pub fn signer_set_confirms(storage: &dyn Storage, nonce: u64) -> StdResult<Vec<(String, Confirm)>> {
    let prefix = key(SIGNER_SET_CONFIRM, &[&nonce.to_be_bytes()]);
    iter_prefix(storage, prefix, Order::Ascending)
        .map(|(suffix, v)| {
            let validator = String::from_utf8_lossy(&suffix).to_string();
            Ok((validator, cosmwasm_std::from_json(&v)?))
        })
        .collect()
}

/// Remove every key under `prefix`.
fn clear_prefix(storage: &mut dyn Storage, prefix: Vec<u8>) {
    let suffixes: Vec<Vec<u8>> = iter_prefix(storage, prefix.clone(), Order::Ascending)
        .map(|(suffix, _)| suffix)
        .collect();
    for suffix in suffixes {
        let mut k = prefix.clone();
        k.extend_from_slice(&suffix);
        storage.remove(&k);
    }
}

pub fn delete_signer_set_confirms(storage: &mut dyn Storage, nonce: u64) {
    clear_prefix(storage, key(SIGNER_SET_CONFIRM, &[&nonce.to_be_bytes()]));
}

// ============================================================================
// Events & attestations
// ============================================================================

pub fn set_event(
    storage: &mut dyn Storage,
    event_hash: &[u8; 32],
    event: &EthereumEvent,
) -> StdResult<()> {
    set_json(storage, &key(EVENT, &[event_hash]), event)
}

pub fn get_event(storage: &dyn Storage, event_hash: &[u8; 32]) -> StdResult<Option<EthereumEvent>> {
    get_json(storage, &key(EVENT, &[event_hash]))
}

pub fn set_attestation(
    storage: &mut dyn Storage,
    event_nonce: u64,
    event_hash: &[u8; 32],
    attestation: &Attestation,
) -> StdResult<()> {
    set_json(
        storage,
        &key(ATTESTATION, &[&event_nonce.to_be_bytes(), event_hash]),
        attestation,
    )
}

pub fn get_attestation(
    storage: &dyn Storage,
    event_nonce: u64,
    event_hash: &[u8; 32],
) -> StdResult<Option<Attestation>> {
    get_json(
        storage,
        &key(ATTESTATION, &[&event_nonce.to_be_bytes(), event_hash]),
    )
}

/// All attestations at one event nonce (competing claims included).
pub fn attestations_at_nonce(storage: &dyn Storage, event_nonce: u64) -> StdResult<Vec<Attestation>> {
    let prefix = key(ATTESTATION, &[&event_nonce.to_be_bytes()]);
    iter_prefix(storage, prefix, Order::Ascending)
        .map(|(_, v)| cosmwasm_std::from_json(&v).map_err(Into::into))
        .collect()
}

/// All attestations in ascending event-nonce order.
pub fn attestations_asc(storage: &dyn Storage) -> StdResult<Vec<Attestation>> {
    iter_prefix(storage, vec![ATTESTATION], Order::Ascending)
        .map(|(_, v)| cosmwasm_std::from_json(&v).map_err(Into::into))
        .collect()
}

pub fn last_observed_event_nonce(storage: &dyn Storage) -> u64 {
    get_u64(storage, &[LAST_OBSERVED_EVENT_NONCE])
}

pub fn set_last_observed_event_nonce(storage: &mut dyn Storage, nonce: u64) {
    set_u64(storage, &[LAST_OBSERVED_EVENT_NONCE], nonce);
}

/// The last event nonce this validator voted on, if it ever voted.
pub fn last_event_nonce_by_validator(storage: &dyn Storage, validator: &str) -> Option<u64> {
    storage
        .get(&key(LAST_EVENT_NONCE_BY_VALIDATOR, &[validator.as_bytes()]))
        .and_then(|bz| bz.try_into().ok().map(u64::from_be_bytes))
}

pub fn set_last_event_nonce_by_validator(
    storage: &mut dyn Storage,
    validator: &str,
    nonce: u64,
) {
    set_u64(
        storage,
        &key(LAST_EVENT_NONCE_BY_VALIDATOR, &[validator.as_bytes()]),
        nonce,
    );
}

pub fn get_remote_chain_info(storage: &dyn Storage) -> StdResult<Option<RemoteChainInfo>> {
    get_json(storage, &[LATEST_REMOTE_HEIGHT])
}

pub fn set_remote_chain_info(storage: &mut dyn Storage, info: &RemoteChainInfo) -> StdResult<()> {
    set_json(storage, &[LATEST_REMOTE_HEIGHT], info)
}

pub fn last_observed_signer_set_nonce(storage: &dyn Storage) -> u64 {
    get_u64(storage, &[LAST_OBSERVED_SIGNER_SET_NONCE])
}

pub fn set_last_observed_signer_set_nonce(storage: &mut dyn Storage, nonce: u64) {
    set_u64(storage, &[LAST_OBSERVED_SIGNER_SET_NONCE], nonce);
}

// ============================================================================
// Outgoing pool
// ============================================================================

fn fee_index_key(tx: &TransferTx) -> StdResult<Vec<u8>> {
    let contract = parse_remote_address(&tx.fee.contract)
        .map_err(|_| StdError::generic_err("invalid fee contract in pool index"))?;
    Ok(key(
        FEE_INDEX,
        &[
            &contract,
            &tx.fee.amount.u128().to_be_bytes(),
            &tx.id.to_be_bytes(),
        ],
    ))
}

/// Insert a transfer into the pool under both indices.
pub fn set_pool_tx(storage: &mut dyn Storage, tx: &TransferTx) -> StdResult<()> {
    set_json(storage, &key(OUTGOING_TX_POOL, &[&tx.id.to_be_bytes()]), tx)?;
    storage.set(&fee_index_key(tx)?, &tx.id.to_be_bytes());
    Ok(())
}

pub fn get_pool_tx(storage: &dyn Storage, id: u64) -> StdResult<Option<TransferTx>> {
    get_json(storage, &key(OUTGOING_TX_POOL, &[&id.to_be_bytes()]))
}

/// Remove a transfer from both indices.
pub fn delete_pool_tx(storage: &mut dyn Storage, tx: &TransferTx) -> StdResult<()> {
    storage.remove(&key(OUTGOING_TX_POOL, &[&tx.id.to_be_bytes()]));
    storage.remove(&fee_index_key(tx)?);
    Ok(())
}

/// Pool transfers for one token contract in descending fee order (ties by
/// descending id), up to `limit`.
pub fn pool_txs_by_fee_desc(
    storage: &dyn Storage,
    token_contract: &str,
    limit: usize,
) -> StdResult<Vec<TransferTx>> {
    let contract = parse_remote_address(token_contract)
        .map_err(|_| StdError::generic_err("invalid token contract"))?;
    let prefix = key(FEE_INDEX, &[&contract]);
    let mut txs = Vec::new();
    for (suffix, _) in iter_prefix(storage, prefix, Order::Descending).take(limit) {
        // id is the full trailing 8 bytes of the suffix after the fee amount
        let id_bytes: [u8; 8] = suffix[suffix.len() - 8..]
            .try_into()
            .map_err(|_| StdError::generic_err("malformed fee index key"))?;
        let id = u64::from_be_bytes(id_bytes);
        match get_pool_tx(storage, id)? {
            Some(tx) => txs.push(tx),
            None => return Err(StdError::generic_err("fee index points at missing tx")),
        }
    }
    Ok(txs)
}

/// Every pool transfer, ascending id.
pub fn all_pool_txs(storage: &dyn Storage) -> StdResult<Vec<TransferTx>> {
    iter_prefix(storage, vec![OUTGOING_TX_POOL], Order::Ascending)
        .map(|(_, v)| cosmwasm_std::from_json(&v).map_err(Into::into))
        .collect()
}

pub fn next_pool_id(storage: &mut dyn Storage) -> u64 {
    let k = key(SEQUENCE, &[SEQ_TX_POOL_ID]);
    let id = get_u64(storage, &k) + 1;
    set_u64(storage, &k, id);
    id
}

pub fn last_pool_id(storage: &dyn Storage) -> u64 {
    get_u64(storage, &key(SEQUENCE, &[SEQ_TX_POOL_ID]))
}

// ============================================================================
// Batches
// ============================================================================

/// A `(token_contract, batch_nonce)` reference stored in secondary indexes.
#[cw_serde]
pub struct BatchRef {
    pub token_contract: String,
    pub batch_nonce: u64,
}

fn batch_key(token_contract: &str, batch_nonce: u64) -> StdResult<Vec<u8>> {
    let contract = parse_remote_address(token_contract)
        .map_err(|_| StdError::generic_err("invalid token contract"))?;
    Ok(key(BATCH, &[&contract, &batch_nonce.to_be_bytes()]))
}

pub fn set_batch(storage: &mut dyn Storage, batch: &BatchTx) -> StdResult<()> {
    set_json(
        storage,
        &batch_key(&batch.token_contract, batch.batch_nonce)?,
        batch,
    )?;
    set_json(
        storage,
        &key(
            BATCH_BY_BLOCK,
            &[
                &batch.block_created.to_be_bytes(),
                &batch.batch_nonce.to_be_bytes(),
            ],
        ),
        &BatchRef {
            token_contract: batch.token_contract.clone(),
            batch_nonce: batch.batch_nonce,
        },
    )
}

pub fn get_batch(
    storage: &dyn Storage,
    token_contract: &str,
    batch_nonce: u64,
) -> StdResult<Option<BatchTx>> {
    get_json(storage, &batch_key(token_contract, batch_nonce)?)
}

pub fn delete_batch(storage: &mut dyn Storage, batch: &BatchTx) -> StdResult<()> {
    storage.remove(&batch_key(&batch.token_contract, batch.batch_nonce)?);
    storage.remove(&key(
        BATCH_BY_BLOCK,
        &[
            &batch.block_created.to_be_bytes(),
            &batch.batch_nonce.to_be_bytes(),
        ],
    ));
    Ok(())
}

/// Batches for one contract in ascending nonce order.
pub fn batches_for_contract(
    storage: &dyn Storage,
    token_contract: &str,
) -> StdResult<Vec<BatchTx>> {
    let contract = parse_remote_address(token_contract)
        .map_err(|_| StdError::generic_err("invalid token contract"))?;
    let prefix = key(BATCH, &[&contract]);
    iter_prefix(storage, prefix, Order::Ascending)
        .map(|(_, v)| cosmwasm_std::from_json(&v).map_err(Into::into))
        .collect()
}

/// Every live batch, ordered by contract then nonce.
pub fn all_batches(storage: &dyn Storage) -> StdResult<Vec<BatchTx>> {
    iter_prefix(storage, vec![BATCH], Order::Ascending)
        .map(|(_, v)| cosmwasm_std::from_json(&v).map_err(Into::into))
        .collect()
}

pub fn next_batch_nonce(storage: &mut dyn Storage) -> u64 {
    let k = key(SEQUENCE, &[SEQ_BATCH_ID]);
    let nonce = get_u64(storage, &k) + 1;
    set_u64(storage, &k, nonce);
    nonce
}

pub fn set_batch_confirm(
    storage: &mut dyn Storage,
    token_contract: &str,
    batch_nonce: u64,
    validator: &str,
    confirm: &Confirm,
) -> StdResult<()> {
    let contract = parse_remote_address(token_contract)
        .map_err(|_| StdError::generic_err("invalid token contract"))?;
    set_json(
        storage,
        &key(
            BATCH_CONFIRM,
            &[&contract, &batch_nonce.to_be_bytes(), validator.as_bytes()],
        ),
        confirm,
    )
}

pub fn get_batch_confirm(
    storage: &dyn Storage,
    token_contract: &str,
    batch_nonce: u64,
    validator: &str,
) -> StdResult<Option<Confirm>> {
    let contract = parse_remote_address(token_contract)
        .map_err(|_| StdError::generic_err("invalid token contract"))?;
    get_json(
        storage,
        &key(
            BATCH_CONFIRM,
            &[&contract, &batch_nonce.to_be_bytes(), validator.as_bytes()],
        ),
    )
}

pub fn delete_batch_confirms(storage: &mut dyn Storage, token_contract: &str, batch_nonce: u64) -> StdResult<()> {
    let contract = parse_remote_address(token_contract)
        .map_err(|_| StdError::generic_err("invalid token contract"))?;
    clear_prefix(
        storage,
        key(BATCH_CONFIRM, &[&contract, &batch_nonce.to_be_bytes()]),
    );
    Ok(())
}

pub fn batch_confirms(
    storage: &dyn Storage,
    token_contract: &str,
    batch_nonce: u64,
) -> StdResult<Vec<(String, Confirm)>> {
    let contract = parse_remote_address(token_contract)
        .map_err(|_| StdError::generic_err("invalid token contract"))?;
    let prefix = key(BATCH_CONFIRM, &[&contract, &batch_nonce.to_be_bytes()]);
    iter_prefix(storage, prefix, Order::Ascending)
        .map(|(suffix, v)| {
            let validator = String::from_utf8_lossy(&suffix).to_string();
            Ok((validator, cosmwasm_std::from_json(&v)?))
        })
        .collect()
}

// ============================================================================
// Logic calls
// ============================================================================

fn logic_call_key(invalidation_id: &[u8], invalidation_nonce: u64) -> Vec<u8> {
    key(
        LOGIC_CALL,
        &[invalidation_id, &invalidation_nonce.to_be_bytes()],
    )
}

pub fn set_logic_call(storage: &mut dyn Storage, call: &OutgoingLogicCall) -> StdResult<()> {
    set_json(
        storage,
        &logic_call_key(call.invalidation_id.as_slice(), call.invalidation_nonce),
        call,
    )
}

pub fn get_logic_call(
    storage: &dyn Storage,
    invalidation_id: &[u8],
    invalidation_nonce: u64,
) -> StdResult<Option<OutgoingLogicCall>> {
    get_json(storage, &logic_call_key(invalidation_id, invalidation_nonce))
}

pub fn delete_logic_call(
    storage: &mut dyn Storage,
    invalidation_id: &[u8],
    invalidation_nonce: u64,
) {
    storage.remove(&logic_call_key(invalidation_id, invalidation_nonce));
}

pub fn all_logic_calls(storage: &dyn Storage) -> StdResult<Vec<OutgoingLogicCall>> {
    iter_prefix(storage, vec![LOGIC_CALL], Order::Ascending)
        .map(|(_, v)| cosmwasm_std::from_json(&v).map_err(Into::into))
        .collect()
}

pub fn set_logic_call_confirm(
    storage: &mut dyn Storage,
    invalidation_id: &[u8],
    invalidation_nonce: u64,
    validator: &str,
    confirm: &Confirm,
) -> StdResult<()> {
    set_json(
        storage,
        &key(
            LOGIC_CALL_CONFIRM,
            &[
                invalidation_id,
                &invalidation_nonce.to_be_bytes(),
                validator.as_bytes(),
            ],
        ),
        confirm,
    )
}

pub fn get_logic_call_confirm(
    storage: &dyn Storage,
    invalidation_id: &[u8],
    invalidation_nonce: u64,
    validator: &str,
) -> StdResult<Option<Confirm>> {
    get_json(
        storage,
        &key(
            LOGIC_CALL_CONFIRM,
            &[
                invalidation_id,
                &invalidation_nonce.to_be_bytes(),
                validator.as_bytes(),
            ],
        ),
    )
}

pub fn delete_logic_call_confirms(
    storage: &mut dyn Storage,
    invalidation_id: &[u8],
    invalidation_nonce: u64,
) {
    clear_prefix(
        storage,
        key(
            LOGIC_CALL_CONFIRM,
            &[invalidation_id, &invalidation_nonce.to_be_bytes()],
        ),
    );
}

pub fn logic_call_confirms(
    storage: &dyn Storage,
    invalidation_id: &[u8],
    invalidation_nonce: u64,
) -> StdResult<Vec<(String, Confirm)>> {
    let prefix = key(
        LOGIC_CALL_CONFIRM,
        &[invalidation_id, &invalidation_nonce.to_be_bytes()],
    );
    iter_prefix(storage, prefix, Order::Ascending)
        .map(|(suffix, v)| {
            let validator = String::from_utf8_lossy(&suffix).to_string();
            Ok((validator, cosmwasm_std::from_json(&v)?))
        })
        .collect()
}

// ============================================================================
// Denom registry
// ============================================================================

/// Write both directions of a native-origin denom pair.
pub fn set_denom_contract_pair(storage: &mut dyn Storage, denom: &str, token_contract: &str) {
    storage.set(
        &key(DENOM_TO_CONTRACT, &[denom.as_bytes()]),
        token_contract.as_bytes(),
    );
    storage.set(
        &key(CONTRACT_TO_DENOM, &[token_contract.as_bytes()]),
        denom.as_bytes(),
    );
}

pub fn stored_contract_for_denom(storage: &dyn Storage, denom: &str) -> Option<String> {
    storage
        .get(&key(DENOM_TO_CONTRACT, &[denom.as_bytes()]))
        .map(|bz| String::from_utf8_lossy(&bz).to_string())
}

pub fn stored_denom_for_contract(storage: &dyn Storage, token_contract: &str) -> Option<String> {
    storage
        .get(&key(CONTRACT_TO_DENOM, &[token_contract.as_bytes()]))
        .map(|bz| String::from_utf8_lossy(&bz).to_string())
}

// ============================================================================
// Slashing bookkeeping & hooks
// ============================================================================

pub fn last_slashed_signer_set_nonce(storage: &dyn Storage) -> u64 {
    get_u64(storage, &[LAST_SLASHED_SIGNER_SET_NONCE])
}

pub fn set_last_slashed_signer_set_nonce(storage: &mut dyn Storage, nonce: u64) {
    set_u64(storage, &[LAST_SLASHED_SIGNER_SET_NONCE], nonce);
}

pub fn last_slashed_batch_block(storage: &dyn Storage) -> u64 {
    get_u64(storage, &[LAST_SLASHED_BATCH_BLOCK])
}

pub fn set_last_slashed_batch_block(storage: &mut dyn Storage, height: u64) {
    set_u64(storage, &[LAST_SLASHED_BATCH_BLOCK], height);
}

pub fn last_slashed_event_nonce(storage: &dyn Storage) -> u64 {
    get_u64(storage, &key(SEQUENCE, &[SEQ_EVENT_SLASH]))
}

pub fn set_last_slashed_event_nonce(storage: &mut dyn Storage, nonce: u64) {
    set_u64(storage, &key(SEQUENCE, &[SEQ_EVENT_SLASH]), nonce);
}

pub fn last_slashed_logic_block(storage: &dyn Storage) -> u64 {
    get_u64(storage, &key(SEQUENCE, &[SEQ_LOGIC_SLASH]))
}

pub fn set_last_slashed_logic_block(storage: &mut dyn Storage, height: u64) {
    set_u64(storage, &key(SEQUENCE, &[SEQ_LOGIC_SLASH]), height);
}

pub fn last_unbonding_height(storage: &dyn Storage) -> u64 {
    get_u64(storage, &[LAST_UNBONDING_HEIGHT])
}

pub fn set_last_unbonding_height(storage: &mut dyn Storage, height: u64) {
    set_u64(storage, &[LAST_UNBONDING_HEIGHT], height);
}

// ============================================================================
// Past checkpoints
// ============================================================================

/// Record a checkpoint the module expects signatures over.
pub fn set_past_checkpoint(storage: &mut dyn Storage, checkpoint: &[u8; 32], kind: &str) {
    storage.set(&key(PAST_CHECKPOINT, &[checkpoint]), kind.as_bytes());
}

pub fn has_past_checkpoint(storage: &dyn Storage, checkpoint: &[u8; 32]) -> bool {
    storage.get(&key(PAST_CHECKPOINT, &[checkpoint])).is_some()
}
