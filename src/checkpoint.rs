//! Checkpoint construction and signature recovery.
//!
//! A checkpoint is the Keccak-256 hash of the ABI encoding the remote
//! contract uses to authenticate a signer set, a transfer batch or a logic
//! call. The remote side encodes a full function call and discards the 4-byte
//! selector before hashing; encoding the argument region directly produces the
//! identical bytes. The byte layout here is consensus- and wire-critical:
//! every honest party must derive the exact same hash from the same artifact.

use cosmwasm_std::Api;
use tiny_keccak::{Hasher, Keccak};

use crate::address::{encode_remote_address, parse_remote_address};
use crate::error::ContractError;
use crate::types::{BatchTx, OutgoingLogicCall, SignerSet};

/// Compute keccak256 hash of arbitrary data.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

// ============================================================================
// ABI word & tail helpers
// ============================================================================

const WORD: usize = 32;

/// A left-aligned ASCII tag padded to one word, e.g. b"checkpoint".
fn tag_word(tag: &str) -> [u8; 32] {
    let mut word = [0u8; 32];
    let bytes = tag.as_bytes();
    word[..bytes.len()].copy_from_slice(bytes);
    word
}

/// A uint256 word from a u64 (left-padded, big-endian).
fn uint_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// A uint256 word from a u128 (left-padded, big-endian).
fn uint128_word(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// An address word (20 bytes, left-padded to 32).
fn address_word(addr: &[u8; 20]) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(addr);
    word
}

/// Tail encoding of `uint256[]`: length word followed by one word per element.
fn uint_array_tail(values: &[u128]) -> Vec<u8> {
    let mut out = Vec::with_capacity(WORD * (1 + values.len()));
    out.extend_from_slice(&uint_word(values.len() as u64));
    for v in values {
        out.extend_from_slice(&uint128_word(*v));
    }
    out
}

/// Tail encoding of `address[]`.
fn address_array_tail(addrs: &[[u8; 20]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(WORD * (1 + addrs.len()));
    out.extend_from_slice(&uint_word(addrs.len() as u64));
    for a in addrs {
        out.extend_from_slice(&address_word(a));
    }
    out
}

/// Tail encoding of `bytes`: length word, data, zero padding to a word
/// boundary.
fn bytes_tail(data: &[u8]) -> Vec<u8> {
    let padded_len = (data.len() + WORD - 1) / WORD * WORD;
    let mut out = Vec::with_capacity(WORD + padded_len);
    out.extend_from_slice(&uint_word(data.len() as u64));
    out.extend_from_slice(data);
    out.resize(WORD + padded_len, 0);
    out
}

/// Assemble a head/tail ABI encoding. `Head` slots are either inline words or
/// placeholders for dynamic parts whose tails are appended in slot order.
enum Slot {
    Word([u8; 32]),
    Dynamic(Vec<u8>),
}

fn encode_slots(slots: Vec<Slot>) -> Vec<u8> {
    let head_len = WORD * slots.len();
    let mut head: Vec<u8> = Vec::with_capacity(head_len);
    let mut tail: Vec<u8> = Vec::new();

    for slot in &slots {
        match slot {
            Slot::Word(word) => head.extend_from_slice(word),
            Slot::Dynamic(bytes) => {
                head.extend_from_slice(&uint_word((head_len + tail.len()) as u64));
                tail.extend_from_slice(bytes);
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

// ============================================================================
// Checkpoints
// ============================================================================

/// ABI encoding of `checkpoint(bytes32,bytes32,uint256,address[],uint256[])`
/// minus the selector.
pub fn signer_set_checkpoint_bytes(
    bridge_id: &[u8; 32],
    signer_set: &SignerSet,
) -> Result<Vec<u8>, ContractError> {
    let mut addresses: Vec<[u8; 20]> = Vec::with_capacity(signer_set.members.len());
    let mut powers: Vec<u128> = Vec::with_capacity(signer_set.members.len());
    for member in &signer_set.members {
        addresses.push(parse_remote_address(&member.remote_address)?);
        powers.push(member.power as u128);
    }

    Ok(encode_slots(vec![
        Slot::Word(*bridge_id),
        Slot::Word(tag_word("checkpoint")),
        Slot::Word(uint_word(signer_set.nonce)),
        Slot::Dynamic(address_array_tail(&addresses)),
        Slot::Dynamic(uint_array_tail(&powers)),
    ]))
}

/// Checkpoint hash of a signer set.
pub fn signer_set_checkpoint(
    bridge_id: &[u8; 32],
    signer_set: &SignerSet,
) -> Result<[u8; 32], ContractError> {
    Ok(keccak256(&signer_set_checkpoint_bytes(
        bridge_id, signer_set,
    )?))
}

/// ABI encoding of `transactionBatch(bytes32,bytes32,uint256[],address[],
/// uint256[],uint256,address,uint256)` minus the selector.
pub fn batch_checkpoint_bytes(
    bridge_id: &[u8; 32],
    batch: &BatchTx,
) -> Result<Vec<u8>, ContractError> {
    let mut amounts: Vec<u128> = Vec::with_capacity(batch.transactions.len());
    let mut destinations: Vec<[u8; 20]> = Vec::with_capacity(batch.transactions.len());
    let mut fees: Vec<u128> = Vec::with_capacity(batch.transactions.len());
    for tx in &batch.transactions {
        amounts.push(tx.token.amount.u128());
        destinations.push(parse_remote_address(&tx.remote_recipient)?);
        fees.push(tx.fee.amount.u128());
    }
    let token_contract = parse_remote_address(&batch.token_contract)?;

    Ok(encode_slots(vec![
        Slot::Word(*bridge_id),
        Slot::Word(tag_word("transactionBatch")),
        Slot::Dynamic(uint_array_tail(&amounts)),
        Slot::Dynamic(address_array_tail(&destinations)),
        Slot::Dynamic(uint_array_tail(&fees)),
        Slot::Word(uint_word(batch.batch_nonce)),
        Slot::Word(address_word(&token_contract)),
        Slot::Word(uint_word(batch.batch_timeout)),
    ]))
}

/// Checkpoint hash of a transfer batch.
pub fn batch_checkpoint(bridge_id: &[u8; 32], batch: &BatchTx) -> Result<[u8; 32], ContractError> {
    Ok(keccak256(&batch_checkpoint_bytes(bridge_id, batch)?))
}

/// ABI encoding of `logicCall(bytes32,bytes32,uint256[],address[],uint256[],
/// address[],address,bytes,uint256,bytes32,uint256)` minus the selector.
pub fn logic_call_checkpoint_bytes(
    bridge_id: &[u8; 32],
    call: &OutgoingLogicCall,
) -> Result<Vec<u8>, ContractError> {
    let mut transfer_amounts: Vec<u128> = Vec::with_capacity(call.transfers.len());
    let mut transfer_tokens: Vec<[u8; 20]> = Vec::with_capacity(call.transfers.len());
    for t in &call.transfers {
        transfer_amounts.push(t.amount.u128());
        transfer_tokens.push(parse_remote_address(&t.contract)?);
    }
    let mut fee_amounts: Vec<u128> = Vec::with_capacity(call.fees.len());
    let mut fee_tokens: Vec<[u8; 20]> = Vec::with_capacity(call.fees.len());
    for f in &call.fees {
        fee_amounts.push(f.amount.u128());
        fee_tokens.push(parse_remote_address(&f.contract)?);
    }
    let logic_contract = parse_remote_address(&call.logic_contract)?;

    let mut invalidation_id = [0u8; 32];
    if call.invalidation_id.len() > 32 {
        return Err(ContractError::InvalidEvent {
            reason: "invalidation id longer than 32 bytes".to_string(),
        });
    }
    invalidation_id[..call.invalidation_id.len()].copy_from_slice(call.invalidation_id.as_slice());

    Ok(encode_slots(vec![
        Slot::Word(*bridge_id),
        Slot::Word(tag_word("logicCall")),
        Slot::Dynamic(uint_array_tail(&transfer_amounts)),
        Slot::Dynamic(address_array_tail(&transfer_tokens)),
        Slot::Dynamic(uint_array_tail(&fee_amounts)),
        Slot::Dynamic(address_array_tail(&fee_tokens)),
        Slot::Word(address_word(&logic_contract)),
        Slot::Dynamic(bytes_tail(call.payload.as_slice())),
        Slot::Word(uint_word(call.timeout)),
        Slot::Word(invalidation_id),
        Slot::Word(uint_word(call.invalidation_nonce)),
    ]))
}

/// Checkpoint hash of a logic call.
pub fn logic_call_checkpoint(
    bridge_id: &[u8; 32],
    call: &OutgoingLogicCall,
) -> Result<[u8; 32], ContractError> {
    Ok(keccak256(&logic_call_checkpoint_bytes(bridge_id, call)?))
}

// ============================================================================
// Signature recovery
// ============================================================================

/// Recover the remote signing address from a 65-byte `r||s||v` hex signature
/// over `checkpoint`.
pub fn recover_remote_signer(
    api: &dyn Api,
    checkpoint: &[u8; 32],
    signature: &str,
) -> Result<String, ContractError> {
    let sig_hex = signature.strip_prefix("0x").unwrap_or(signature);
    let sig = hex::decode(sig_hex).map_err(|_| ContractError::InvalidSignature)?;
    if sig.len() != 65 {
        return Err(ContractError::InvalidSignature);
    }

    // v is either 0/1 or the Ethereum-style 27/28
    let mut recovery_id = sig[64];
    if recovery_id >= 27 {
        recovery_id -= 27;
    }
    if recovery_id > 1 {
        return Err(ContractError::InvalidSignature);
    }

    let pubkey = api
        .secp256k1_recover_pubkey(checkpoint, &sig[..64], recovery_id)
        .map_err(|_| ContractError::InvalidSignature)?;

    // Uncompressed SEC1 point: 0x04 || x || y. The address is the last 20
    // bytes of keccak256(x || y).
    if pubkey.len() != 65 {
        return Err(ContractError::InvalidSignature);
    }
    let hash = keccak256(&pubkey[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);

    Ok(encode_remote_address(&address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ERC20Token, SignerSetMember, TransferTx};
    use cosmwasm_std::{testing::MockApi, Addr, Uint128};

    fn two_member_set() -> SignerSet {
        SignerSet {
            nonce: 7,
            height: 1000,
            members: vec![
                SignerSetMember {
                    remote_address: "0x2222222222222222222222222222222222222222".to_string(),
                    power: 3_000_000_000,
                },
                SignerSetMember {
                    remote_address: "0x1111111111111111111111111111111111111111".to_string(),
                    power: 1_294_967_295,
                },
            ],
        }
    }

    #[test]
    fn test_signer_set_encoding_layout() {
        let bridge_id = [0xABu8; 32];
        let bytes = signer_set_checkpoint_bytes(&bridge_id, &two_member_set()).unwrap();

        // 5 head slots + (1 + 2) address tail + (1 + 2) power tail
        assert_eq!(bytes.len(), 32 * 11);

        // Slot 0: bridge id
        assert_eq!(&bytes[0..32], &[0xABu8; 32]);
        // Slot 1: the literal tag, left-aligned
        assert_eq!(&bytes[32..42], b"checkpoint");
        assert_eq!(&bytes[42..64], &[0u8; 22]);
        // Slot 2: nonce
        assert_eq!(bytes[95], 7);
        // Slot 3: offset of the address array = 160
        assert_eq!(bytes[127], 160);
        // Slot 4: offset of the power array = 160 + 3 * 32 = 256
        assert_eq!(bytes[159], 0);
        assert_eq!(&bytes[158..160], &[1, 0]);

        // Address array: length 2, first member left-padded at bytes 192..224
        assert_eq!(bytes[191], 2);
        assert_eq!(&bytes[192 + 12..224], &[0x22u8; 20]);
        assert_eq!(&bytes[224 + 12..256], &[0x11u8; 20]);

        // Power array: length 2, then each power as uint256
        assert_eq!(bytes[287], 2);
        assert_eq!(
            &bytes[288 + 24..320],
            &3_000_000_000u64.to_be_bytes()
        );
    }

    #[test]
    fn test_signer_set_checkpoint_sensitivity() {
        let bridge_id = [1u8; 32];
        let set = two_member_set();
        let base = signer_set_checkpoint(&bridge_id, &set).unwrap();

        let mut other_nonce = set.clone();
        other_nonce.nonce += 1;
        assert_ne!(base, signer_set_checkpoint(&bridge_id, &other_nonce).unwrap());

        let mut other_power = set.clone();
        other_power.members[0].power -= 1;
        assert_ne!(base, signer_set_checkpoint(&bridge_id, &other_power).unwrap());

        let other_bridge = [2u8; 32];
        assert_ne!(base, signer_set_checkpoint(&other_bridge, &set).unwrap());

        // Rebuilding from the same stored fields yields the same bytes
        assert_eq!(base, signer_set_checkpoint(&bridge_id, &set).unwrap());
    }

    #[test]
    fn test_batch_encoding_layout() {
        let bridge_id = [0u8; 32];
        let batch = BatchTx {
            batch_nonce: 5,
            token_contract: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            transactions: vec![TransferTx {
                id: 1,
                sender: Addr::unchecked("wasm1sender"),
                remote_recipient: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
                token: ERC20Token::new(
                    "0x5FbDB2315678afecb367f032d93F642f64180aa3",
                    Uint128::new(50),
                ),
                fee: ERC20Token::new(
                    "0x5FbDB2315678afecb367f032d93F642f64180aa3",
                    Uint128::new(5),
                ),
            }],
            batch_timeout: 4300,
            block_created: 12,
        };
        let bytes = batch_checkpoint_bytes(&bridge_id, &batch).unwrap();

        // 8 head slots + 3 tails of (1 + 1) words each
        assert_eq!(bytes.len(), 32 * 14);
        assert_eq!(&bytes[32..48], b"transactionBatch");
        // Offsets: amounts at 256, destinations at 320, fees at 384
        assert_eq!(&bytes[64 + 30..96], &[1, 0]);
        assert_eq!(&bytes[96 + 30..128], &[1, 64]);
        assert_eq!(&bytes[128 + 30..160], &[1, 128]);
        // Inline words: nonce, token contract, timeout
        assert_eq!(bytes[191], 5);
        assert_eq!(
            &bytes[192 + 12..224],
            parse_remote_address(&batch.token_contract).unwrap().as_slice()
        );
        assert_eq!(&bytes[224 + 30..256], &4300u16.to_be_bytes());
        // Amount tail: [1, 50], fee tail: [1, 5]
        assert_eq!(bytes[287], 1);
        assert_eq!(bytes[319], 50);
        assert_eq!(bytes[447], 5);
    }

    #[test]
    fn test_bytes_tail_padding() {
        let tail = bytes_tail(&[0xFF; 33]);
        // length word + 2 words of padded data
        assert_eq!(tail.len(), 32 * 3);
        assert_eq!(tail[31], 33);
        assert_eq!(tail[32], 0xFF);
        assert_eq!(tail[64], 0xFF);
        assert_eq!(&tail[65..96], &[0u8; 31]);
    }

    #[test]
    fn test_recover_rejects_malformed_signatures() {
        let api = MockApi::default();
        let checkpoint = [7u8; 32];

        assert_eq!(
            recover_remote_signer(&api, &checkpoint, "nothex"),
            Err(ContractError::InvalidSignature)
        );
        assert_eq!(
            recover_remote_signer(&api, &checkpoint, &hex::encode([0u8; 64])),
            Err(ContractError::InvalidSignature)
        );
        // v outside {0, 1, 27, 28}
        let mut sig = [1u8; 65];
        sig[64] = 5;
        assert_eq!(
            recover_remote_signer(&api, &checkpoint, &hex::encode(sig)),
            Err(ContractError::InvalidSignature)
        );
    }
}
