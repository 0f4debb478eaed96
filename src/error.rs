//! Error types for the Quorum Bridge contract.
//!
//! Every message handler maps failures onto one of these stable kinds; the
//! host rolls back all state writes when a handler returns an error.

use cosmwasm_std::{StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    // ========================================================================
    // Address & identity errors
    // ========================================================================

    #[error("Invalid address: {reason}")]
    InvalidAddress { reason: String },

    #[error("Validator not found: {validator}")]
    ValidatorNotFound { validator: String },

    #[error("Validator not in the active set: {validator}")]
    ValidatorNotBonded { validator: String },

    #[error("Delegate keys already set for validator {validator}")]
    AlreadyDelegated { validator: String },

    // ========================================================================
    // Attestation errors
    // ========================================================================

    #[error("Event nonce gap: expected {expected}, got {got}")]
    NonceGap { expected: u64, got: u64 },

    #[error("Duplicate vote by validator {validator}")]
    DuplicateVote { validator: String },

    #[error("Attestation already observed at nonce {nonce}")]
    AttestationFinalized { nonce: u64 },

    #[error("Malformed event: {reason}")]
    InvalidEvent { reason: String },

    // ========================================================================
    // Confirmation errors
    // ========================================================================

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Duplicate signature by validator {validator}")]
    DuplicateSignature { validator: String },

    #[error("Unknown artifact: {kind}")]
    UnknownArtifact { kind: String },

    #[error("Invalid checkpoint")]
    InvalidCheckpoint,

    // ========================================================================
    // Transfer pool & batch errors
    // ========================================================================

    #[error("Denom is not bridged: {denom}")]
    DenomNotBridged { denom: String },

    #[error("No token contract registered for denom {denom}")]
    ContractNotFound { denom: String },

    #[error("Insufficient balance: needed {needed} {denom}, sent {sent}")]
    InsufficientBalance {
        needed: Uint128,
        sent: Uint128,
        denom: String,
    },

    #[error("Transfer {id} not found in the outgoing pool")]
    TransferNotFound { id: u64 },

    #[error("Transfer {id} does not belong to sender")]
    NotOwner { id: u64 },

    #[error("No transfers in the pool for contract {contract}")]
    NoTransfersForBatch { contract: String },
}
