//! Shared data model of the bridge core.
//!
//! All cross-references between records are by identifier (nonce, id, key
//! bytes). The tagged enums ([`EthereumEvent`], [`Confirm`]) carry explicit
//! discriminants on the wire and are matched exhaustively everywhere.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Binary, Uint128};

use crate::address::parse_remote_address;
use crate::error::ContractError;
use crate::checkpoint::keccak256;

// ============================================================================
// Tokens
// ============================================================================

/// An amount of a remote-chain token, identified by its contract.
#[cw_serde]
pub struct ERC20Token {
    /// Token contract address on the remote chain (0x-prefixed hex).
    pub contract: String,
    pub amount: Uint128,
}

impl ERC20Token {
    pub fn new(contract: impl Into<String>, amount: Uint128) -> Self {
        Self {
            contract: contract.into(),
            amount,
        }
    }
}

// ============================================================================
// Signer sets
// ============================================================================

/// One member of the remote-chain multisig: a validator's delegated remote
/// address together with its normalized power.
#[cw_serde]
pub struct SignerSetMember {
    pub remote_address: String,
    /// Power on the shared fixed-point scale (set-wide sum <= u32::MAX).
    pub power: u64,
}

/// A snapshot of the bonded validator set as mirrored to the remote contract.
///
/// Immutable once stored. Member ordering is consensus-critical: descending by
/// power, ties broken by descending remote address bytes.
#[cw_serde]
pub struct SignerSet {
    pub nonce: u64,
    /// Host-chain height at which the snapshot was taken.
    pub height: u64,
    pub members: Vec<SignerSetMember>,
}

impl SignerSet {
    pub fn total_power(&self) -> u64 {
        self.members.iter().map(|m| m.power).sum()
    }

    /// Sort members into the canonical checkpoint order.
    pub fn sort(&mut self) {
        self.members.sort_by(|a, b| {
            b.power.cmp(&a.power).then_with(|| {
                let ab = parse_remote_address(&a.remote_address).unwrap_or_default();
                let bb = parse_remote_address(&b.remote_address).unwrap_or_default();
                bb.cmp(&ab)
            })
        });
    }
}

// ============================================================================
// Outgoing transfers & batches
// ============================================================================

/// A pool entry awaiting inclusion in a batch.
#[cw_serde]
pub struct TransferTx {
    pub id: u64,
    pub sender: Addr,
    /// Recipient account on the remote chain (0x-prefixed hex).
    pub remote_recipient: String,
    pub token: ERC20Token,
    pub fee: ERC20Token,
}

/// A fee-sorted bundle of transfers for one token contract, signed as a unit.
#[cw_serde]
pub struct BatchTx {
    pub batch_nonce: u64,
    pub token_contract: String,
    pub transactions: Vec<TransferTx>,
    /// Remote-chain height after which the batch can no longer execute.
    pub batch_timeout: u64,
    /// Host-chain height at which the batch was created.
    pub block_created: u64,
}

impl BatchTx {
    pub fn total_fee(&self) -> Uint128 {
        self.transactions
            .iter()
            .map(|tx| tx.fee.amount)
            .sum::<Uint128>()
    }
}

/// An arbitrary contract call scheduled by a host module for execution on the
/// remote chain, invalidated as a (id, nonce) pair.
#[cw_serde]
pub struct OutgoingLogicCall {
    pub invalidation_id: Binary,
    pub invalidation_nonce: u64,
    /// Contract to call on the remote chain.
    pub logic_contract: String,
    pub payload: Binary,
    /// Remote-chain height after which the call can no longer execute.
    pub timeout: u64,
    pub transfers: Vec<ERC20Token>,
    pub fees: Vec<ERC20Token>,
    /// Host-chain height at which the call was scheduled.
    pub block_created: u64,
}

// ============================================================================
// Remote-chain events
// ============================================================================

/// A remote-chain occurrence as claimed by validators.
///
/// Every variant carries the globally-ordered `event_nonce` issued by the
/// remote contract and the remote height at which it happened.
#[cw_serde]
pub enum EthereumEvent {
    /// Tokens locked on the remote contract for a host-chain receiver.
    Deposit {
        event_nonce: u64,
        remote_height: u64,
        token_contract: String,
        amount: Uint128,
        /// Sender account on the remote chain.
        remote_sender: String,
        /// Receiver account on the host chain.
        receiver: String,
    },
    /// A transfer batch was executed by the remote contract.
    WithdrawalExecuted {
        event_nonce: u64,
        remote_height: u64,
        token_contract: String,
        batch_nonce: u64,
    },
    /// The remote factory deployed an ERC20 for a host-chain denom.
    Erc20Deployed {
        event_nonce: u64,
        remote_height: u64,
        denom: String,
        token_contract: String,
        name: String,
        symbol: String,
        decimals: u8,
    },
    /// A scheduled logic call was executed by the remote contract.
    LogicCallExecuted {
        event_nonce: u64,
        remote_height: u64,
        invalidation_id: Binary,
        invalidation_nonce: u64,
    },
    /// The remote contract adopted a new signer set.
    SignerSetUpdated {
        event_nonce: u64,
        remote_height: u64,
        signer_set_nonce: u64,
    },
}

impl EthereumEvent {
    pub fn event_nonce(&self) -> u64 {
        match self {
            EthereumEvent::Deposit { event_nonce, .. }
            | EthereumEvent::WithdrawalExecuted { event_nonce, .. }
            | EthereumEvent::Erc20Deployed { event_nonce, .. }
            | EthereumEvent::LogicCallExecuted { event_nonce, .. }
            | EthereumEvent::SignerSetUpdated { event_nonce, .. } => *event_nonce,
        }
    }

    pub fn remote_height(&self) -> u64 {
        match self {
            EthereumEvent::Deposit { remote_height, .. }
            | EthereumEvent::WithdrawalExecuted { remote_height, .. }
            | EthereumEvent::Erc20Deployed { remote_height, .. }
            | EthereumEvent::LogicCallExecuted { remote_height, .. }
            | EthereumEvent::SignerSetUpdated { remote_height, .. } => *remote_height,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            EthereumEvent::Deposit { .. } => "deposit",
            EthereumEvent::WithdrawalExecuted { .. } => "withdrawal_executed",
            EthereumEvent::Erc20Deployed { .. } => "erc20_deployed",
            EthereumEvent::LogicCallExecuted { .. } => "logic_call_executed",
            EthereumEvent::SignerSetUpdated { .. } => "signer_set_updated",
        }
    }

    /// Stateless validity checks, rejected before any vote is recorded.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.event_nonce() == 0 {
            return Err(ContractError::InvalidEvent {
                reason: "event nonce cannot be 0".to_string(),
            });
        }
        match self {
            EthereumEvent::Deposit {
                token_contract,
                amount,
                remote_sender,
                receiver,
                ..
            } => {
                parse_remote_address(token_contract)?;
                parse_remote_address(remote_sender)?;
                if amount.is_zero() {
                    return Err(ContractError::InvalidEvent {
                        reason: "deposit amount cannot be 0".to_string(),
                    });
                }
                if receiver.is_empty() {
                    return Err(ContractError::InvalidEvent {
                        reason: "empty receiver".to_string(),
                    });
                }
            }
            EthereumEvent::WithdrawalExecuted {
                token_contract,
                batch_nonce,
                ..
            } => {
                parse_remote_address(token_contract)?;
                if *batch_nonce == 0 {
                    return Err(ContractError::InvalidEvent {
                        reason: "batch nonce cannot be 0".to_string(),
                    });
                }
            }
            EthereumEvent::Erc20Deployed {
                denom,
                token_contract,
                ..
            } => {
                parse_remote_address(token_contract)?;
                if denom.is_empty() {
                    return Err(ContractError::InvalidEvent {
                        reason: "empty denom".to_string(),
                    });
                }
            }
            EthereumEvent::LogicCallExecuted {
                invalidation_id, ..
            } => {
                if invalidation_id.is_empty() {
                    return Err(ContractError::InvalidEvent {
                        reason: "empty invalidation id".to_string(),
                    });
                }
            }
            EthereumEvent::SignerSetUpdated {
                signer_set_nonce, ..
            } => {
                if *signer_set_nonce == 0 {
                    return Err(ContractError::InvalidEvent {
                        reason: "signer set nonce cannot be 0".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Content hash identifying this event across validators.
    ///
    /// Keccak-256 over a fixed layout: a variant tag byte, every integer
    /// big-endian, every variable-length field preceded by its u64 length.
    pub fn event_hash(&self) -> [u8; 32] {
        let mut data: Vec<u8> = Vec::with_capacity(160);

        let push_len_prefixed = |data: &mut Vec<u8>, bytes: &[u8]| {
            data.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
            data.extend_from_slice(bytes);
        };

        match self {
            EthereumEvent::Deposit {
                event_nonce,
                remote_height,
                token_contract,
                amount,
                remote_sender,
                receiver,
            } => {
                data.push(0x01);
                data.extend_from_slice(&event_nonce.to_be_bytes());
                data.extend_from_slice(&remote_height.to_be_bytes());
                push_len_prefixed(&mut data, token_contract.to_lowercase().as_bytes());
                data.extend_from_slice(&amount.u128().to_be_bytes());
                push_len_prefixed(&mut data, remote_sender.to_lowercase().as_bytes());
                push_len_prefixed(&mut data, receiver.as_bytes());
            }
            EthereumEvent::WithdrawalExecuted {
                event_nonce,
                remote_height,
                token_contract,
                batch_nonce,
            } => {
                data.push(0x02);
                data.extend_from_slice(&event_nonce.to_be_bytes());
                data.extend_from_slice(&remote_height.to_be_bytes());
                push_len_prefixed(&mut data, token_contract.to_lowercase().as_bytes());
                data.extend_from_slice(&batch_nonce.to_be_bytes());
            }
            EthereumEvent::Erc20Deployed {
                event_nonce,
                remote_height,
                denom,
                token_contract,
                name,
                symbol,
                decimals,
            } => {
                data.push(0x03);
                data.extend_from_slice(&event_nonce.to_be_bytes());
                data.extend_from_slice(&remote_height.to_be_bytes());
                push_len_prefixed(&mut data, denom.as_bytes());
                push_len_prefixed(&mut data, token_contract.to_lowercase().as_bytes());
                push_len_prefixed(&mut data, name.as_bytes());
                push_len_prefixed(&mut data, symbol.as_bytes());
                data.push(*decimals);
            }
            EthereumEvent::LogicCallExecuted {
                event_nonce,
                remote_height,
                invalidation_id,
                invalidation_nonce,
            } => {
                data.push(0x04);
                data.extend_from_slice(&event_nonce.to_be_bytes());
                data.extend_from_slice(&remote_height.to_be_bytes());
                push_len_prefixed(&mut data, invalidation_id.as_slice());
                data.extend_from_slice(&invalidation_nonce.to_be_bytes());
            }
            EthereumEvent::SignerSetUpdated {
                event_nonce,
                remote_height,
                signer_set_nonce,
            } => {
                data.push(0x05);
                data.extend_from_slice(&event_nonce.to_be_bytes());
                data.extend_from_slice(&remote_height.to_be_bytes());
                data.extend_from_slice(&signer_set_nonce.to_be_bytes());
            }
        }

        keccak256(&data)
    }
}

// ============================================================================
// Attestations
// ============================================================================

/// The vote record for one `(event_nonce, event_hash)` pair.
///
/// The event body itself is stored once in the event store; this record only
/// tracks who voted and whether quorum was reached. Kept forever as an audit
/// trail.
#[cw_serde]
pub struct Attestation {
    pub event_nonce: u64,
    /// Hex-encoded content hash of the event being attested.
    pub event_hash: String,
    /// Validator operator addresses that voted, in vote order.
    pub votes: Vec<String>,
    pub observed: bool,
    /// Host-chain height at which the vote tipped quorum.
    pub height_observed: Option<u64>,
}

impl Attestation {
    pub fn has_voted(&self, validator: &str) -> bool {
        self.votes.iter().any(|v| v == validator)
    }
}

// ============================================================================
// Confirmations
// ============================================================================

/// A validator's remote-key signature over an artifact checkpoint.
#[cw_serde]
pub enum Confirm {
    SignerSet {
        nonce: u64,
        /// The validator's remote signing address (0x-prefixed hex).
        remote_signer: String,
        /// 65-byte r||s||v signature, hex encoded.
        signature: String,
    },
    Batch {
        token_contract: String,
        batch_nonce: u64,
        remote_signer: String,
        signature: String,
    },
    LogicCall {
        invalidation_id: Binary,
        invalidation_nonce: u64,
        remote_signer: String,
        signature: String,
    },
}

impl Confirm {
    pub fn confirm_type(&self) -> &'static str {
        match self {
            Confirm::SignerSet { .. } => "signer_set",
            Confirm::Batch { .. } => "batch",
            Confirm::LogicCall { .. } => "logic_call",
        }
    }

    pub fn remote_signer(&self) -> &str {
        match self {
            Confirm::SignerSet { remote_signer, .. }
            | Confirm::Batch { remote_signer, .. }
            | Confirm::LogicCall { remote_signer, .. } => remote_signer,
        }
    }

    pub fn signature(&self) -> &str {
        match self {
            Confirm::SignerSet { signature, .. }
            | Confirm::Batch { signature, .. }
            | Confirm::LogicCall { signature, .. } => signature,
        }
    }
}

// ============================================================================
// Remote chain info
// ============================================================================

/// Height and host-side timestamp of the most recently applied event.
#[cw_serde]
pub struct RemoteChainInfo {
    pub height: u64,
    /// Host block time (seconds) when the height was observed.
    pub observed_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deposit(nonce: u64, amount: u128) -> EthereumEvent {
        EthereumEvent::Deposit {
            event_nonce: nonce,
            remote_height: 100,
            token_contract: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            amount: Uint128::new(amount),
            remote_sender: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            receiver: "wasm1receiver".to_string(),
        }
    }

    #[test]
    fn test_event_hash_deterministic() {
        assert_eq!(deposit(1, 100).event_hash(), deposit(1, 100).event_hash());
        assert_ne!(deposit(1, 100).event_hash(), deposit(2, 100).event_hash());
        assert_ne!(deposit(1, 100).event_hash(), deposit(1, 101).event_hash());
    }

    #[test]
    fn test_event_hash_case_insensitive_addresses() {
        let lower = EthereumEvent::Deposit {
            event_nonce: 1,
            remote_height: 100,
            token_contract: "0x5fbdb2315678afecb367f032d93f642f64180aa3".to_string(),
            amount: Uint128::new(100),
            remote_sender: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".to_string(),
            receiver: "wasm1receiver".to_string(),
        };
        assert_eq!(lower.event_hash(), deposit(1, 100).event_hash());
    }

    #[test]
    fn test_event_hash_distinct_across_variants() {
        let withdrawal = EthereumEvent::WithdrawalExecuted {
            event_nonce: 1,
            remote_height: 100,
            token_contract: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            batch_nonce: 1,
        };
        assert_ne!(deposit(1, 100).event_hash(), withdrawal.event_hash());
    }

    #[test]
    fn test_event_validate() {
        assert!(deposit(1, 100).validate().is_ok());
        assert!(deposit(0, 100).validate().is_err());
        assert!(deposit(1, 0).validate().is_err());

        let bad_contract = EthereumEvent::WithdrawalExecuted {
            event_nonce: 1,
            remote_height: 100,
            token_contract: "not-an-address".to_string(),
            batch_nonce: 1,
        };
        assert!(bad_contract.validate().is_err());
    }

    #[test]
    fn test_signer_set_sort_order() {
        let mut set = SignerSet {
            nonce: 1,
            height: 10,
            members: vec![
                SignerSetMember {
                    remote_address: "0x1111111111111111111111111111111111111111".to_string(),
                    power: 100,
                },
                SignerSetMember {
                    remote_address: "0x2222222222222222222222222222222222222222".to_string(),
                    power: 300,
                },
                SignerSetMember {
                    remote_address: "0x3333333333333333333333333333333333333333".to_string(),
                    power: 100,
                },
            ],
        };
        set.sort();

        // Highest power first, then descending address bytes on the tie
        assert_eq!(
            set.members[0].remote_address,
            "0x2222222222222222222222222222222222222222"
        );
        assert_eq!(
            set.members[1].remote_address,
            "0x3333333333333333333333333333333333333333"
        );
        assert_eq!(
            set.members[2].remote_address,
            "0x1111111111111111111111111111111111111111"
        );
        assert_eq!(set.total_power(), 500);
    }
}
