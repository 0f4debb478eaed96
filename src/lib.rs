//! Quorum Bridge - validator-attested asset movement between the host chain
//! and an EVM chain.
//!
//! The module maintains the four correctness-critical pieces of a
//! proof-of-stake bridge inside the host chain's deterministic state machine:
//!
//! # Inbound (remote -> native)
//! 1. Relayers observe remote-chain events and submit them as votes
//! 2. Votes tally per `(event_nonce, event_hash)` until weighted quorum
//! 3. Observed events apply in strict nonce order, crediting balances
//!
//! # Outbound (native -> remote)
//! 1. Users escrow `amount + fee` into the outgoing pool
//! 2. Orchestrators fold the best-paying transfers into batches
//! 3. Validators sign batch checkpoints with their remote keys
//! 4. Any relayer assembles a threshold-signed payload for the remote contract
//!
//! # Signer-set lifecycle
//! The bonded validator set is mirrored to the remote chain as a weighted
//! multisig. End-block recomputes voting-power drift and snapshots a new
//! signer set when it exceeds the governance bound.
//!
//! # Security
//! - Per-validator monotonic event nonces prevent gaps and replays
//! - Content-hashed attestations isolate conflicting claims
//! - Checkpoint signatures are verified by secp256k1 recovery
//! - End-block slashes validators that skip signing or voting duties

pub mod address;
pub mod attestation;
pub mod batch;
pub mod chain;
pub mod checkpoint;
pub mod contract;
pub mod endblock;
pub mod error;
mod execute;
pub mod msg;
mod query;
pub mod signer_set;
pub mod slashing;
pub mod state;
pub mod types;

pub use crate::error::ContractError;
