//! Message types for the Quorum Bridge contract.

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Binary, Coin, Uint128};

use crate::state::Params;
use crate::types::{
    Attestation, BatchTx, Confirm, ERC20Token, EthereumEvent, OutgoingLogicCall, RemoteChainInfo,
    SignerSet, TransferTx,
};

// ============================================================================
// Instantiate & Migrate
// ============================================================================

#[cw_serde]
pub struct InstantiateMsg {
    /// 32-byte bridge id shared with the remote contract. Fixed at genesis.
    pub bridge_id: Binary,
    /// Module parameters; defaults apply when omitted.
    pub params: Option<Params>,
}

#[cw_serde]
pub struct MigrateMsg {}

// ============================================================================
// Execute
// ============================================================================

#[cw_serde]
pub enum ExecuteMsg {
    /// Register a validator's orchestrator key and remote signing address.
    /// Write-once per validator; sent by the validator operator.
    SetDelegateKeys {
        /// Bech32 validator operator address.
        validator: String,
        /// Bech32 account address authorized to submit bridge messages.
        orchestrator: String,
        /// The validator's signing address on the remote chain (0x hex).
        remote_address: String,
    },

    /// Vote on a remote-chain event. Sender must be a registered orchestrator
    /// (or a bonded validator submitting for itself).
    SubmitEvent { event: EthereumEvent },

    /// Submit a remote-key signature over an artifact checkpoint.
    SubmitConfirm { confirm: Confirm },

    /// Queue a transfer to the remote chain. `amount + fee` must be attached
    /// as funds and both must share one bridged denom.
    Transfer {
        /// Recipient account on the remote chain (0x hex).
        remote_recipient: String,
        amount: Coin,
        fee: Coin,
    },

    /// Remove an un-batched transfer from the pool and refund it.
    CancelTransfer { id: u64 },

    /// Build a fee-descending batch for the token contract behind `denom`.
    /// Sender must be a registered orchestrator of a bonded validator.
    RequestBatch { denom: String },
}

// ============================================================================
// Sudo (host-chain hooks)
// ============================================================================

#[cw_serde]
pub enum SudoMsg {
    /// Per-block housekeeping, called by the host after transactions.
    EndBlock {},
    /// Governance replaces the module parameters.
    UpdateParams { params: Params },
    /// A validator began unbonding; records the current height.
    ValidatorUnbonding {},
    /// A host module schedules a contract call for execution on the remote
    /// chain.
    ScheduleLogicCall {
        invalidation_id: Binary,
        invalidation_nonce: u64,
        logic_contract: String,
        payload: Binary,
        /// Remote-chain height after which the call can no longer execute.
        timeout: u64,
        transfers: Vec<ERC20Token>,
        fees: Vec<ERC20Token>,
    },
}

// ============================================================================
// Query
// ============================================================================

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ParamsResponse)]
    Params {},
    #[returns(BridgeIdResponse)]
    BridgeId {},
    #[returns(StatusResponse)]
    Status {},

    #[returns(DelegateKeysResponse)]
    DelegateKeysByValidator { validator: String },
    #[returns(DelegateKeysResponse)]
    DelegateKeysByOrchestrator { orchestrator: String },
    #[returns(DelegateKeysResponse)]
    DelegateKeysByRemote { remote_address: String },

    #[returns(SignerSetResponse)]
    CurrentSignerSet {},
    #[returns(SignerSetResponse)]
    SignerSet { nonce: u64 },
    #[returns(SignerSetsResponse)]
    SignerSets { limit: Option<u32> },
    #[returns(ConfirmsResponse)]
    SignerSetConfirms { nonce: u64 },

    #[returns(LastObservedEventNonceResponse)]
    LastObservedEventNonce {},
    #[returns(LastEventNonceResponse)]
    LastEventNonceByValidator { validator: String },
    #[returns(RemoteChainInfoResponse)]
    RemoteChainInfo {},
    #[returns(AttestationsResponse)]
    Attestations { event_nonce: u64 },
    #[returns(AttestationResponse)]
    Attestation {
        event_nonce: u64,
        /// Hex-encoded event content hash.
        event_hash: String,
    },

    #[returns(TransfersResponse)]
    PoolTransfers { limit: Option<u32> },
    #[returns(TransfersResponse)]
    PoolTransfersByFee {
        token_contract: String,
        limit: Option<u32>,
    },
    #[returns(BatchResponse)]
    Batch {
        token_contract: String,
        batch_nonce: u64,
    },
    #[returns(BatchesResponse)]
    Batches { limit: Option<u32> },
    #[returns(ConfirmsResponse)]
    BatchConfirms {
        token_contract: String,
        batch_nonce: u64,
    },

    #[returns(LogicCallResponse)]
    LogicCall {
        invalidation_id: Binary,
        invalidation_nonce: u64,
    },
    #[returns(LogicCallsResponse)]
    LogicCalls { limit: Option<u32> },
    #[returns(ConfirmsResponse)]
    LogicCallConfirms {
        invalidation_id: Binary,
        invalidation_nonce: u64,
    },

    #[returns(DenomToContractResponse)]
    DenomToContract { denom: String },
    #[returns(ContractToDenomResponse)]
    ContractToDenom { token_contract: String },
}

#[cw_serde]
pub struct ParamsResponse {
    pub params: Params,
}

#[cw_serde]
pub struct BridgeIdResponse {
    /// Hex-encoded 32-byte bridge id.
    pub bridge_id: String,
}

#[cw_serde]
pub struct StatusResponse {
    pub latest_signer_set_nonce: u64,
    pub last_observed_event_nonce: u64,
    pub last_observed_signer_set_nonce: u64,
    pub last_slashed_signer_set_nonce: u64,
    pub last_slashed_batch_block: u64,
    pub last_unbonding_height: u64,
    pub last_pool_id: u64,
}

#[cw_serde]
pub struct DelegateKeysResponse {
    pub validator: Option<String>,
    pub orchestrator: Option<String>,
    pub remote_address: Option<String>,
}

#[cw_serde]
pub struct SignerSetResponse {
    pub signer_set: Option<SignerSet>,
}

#[cw_serde]
pub struct SignerSetsResponse {
    /// Newest first.
    pub signer_sets: Vec<SignerSet>,
}

#[cw_serde]
pub struct ConfirmEntry {
    pub validator: String,
    pub confirm: Confirm,
}

#[cw_serde]
pub struct ConfirmsResponse {
    pub confirms: Vec<ConfirmEntry>,
}

#[cw_serde]
pub struct LastObservedEventNonceResponse {
    pub event_nonce: u64,
}

#[cw_serde]
pub struct LastEventNonceResponse {
    pub event_nonce: u64,
}

#[cw_serde]
pub struct RemoteChainInfoResponse {
    pub info: Option<RemoteChainInfo>,
}

#[cw_serde]
pub struct AttestationsResponse {
    pub attestations: Vec<Attestation>,
}

#[cw_serde]
pub struct AttestationResponse {
    pub attestation: Option<Attestation>,
    /// The attested event body, when known.
    pub event: Option<EthereumEvent>,
}

#[cw_serde]
pub struct TransfersResponse {
    pub transfers: Vec<TransferTx>,
}

#[cw_serde]
pub struct BatchResponse {
    pub batch: Option<BatchTx>,
    pub total_fee: Uint128,
}

#[cw_serde]
pub struct BatchesResponse {
    pub batches: Vec<BatchTx>,
}

#[cw_serde]
pub struct LogicCallResponse {
    pub call: Option<OutgoingLogicCall>,
}

#[cw_serde]
pub struct LogicCallsResponse {
    pub calls: Vec<OutgoingLogicCall>,
}

#[cw_serde]
pub struct DenomToContractResponse {
    pub token_contract: Option<String>,
}

#[cw_serde]
pub struct ContractToDenomResponse {
    pub denom: Option<String>,
}
