//! Host-chain collaborator seam.
//!
//! The bridge core runs inside the chain's deterministic state machine but
//! does not own staking, bank or slashing state. Reads go through a
//! chain-specific custom query ([`ChainQuery`]) and writes come back as
//! chain-specific messages ([`ChainMsg`]) executed by the host modules in the
//! same transaction. Both sides are deterministic at a given block height.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Coin, CustomMsg, CustomQuery, Decimal, QuerierWrapper, QueryRequest, StdResult};

/// Queries answered by host-chain modules.
#[cw_serde]
pub enum ChainQuery {
    /// The current bonded validator set, ranked by descending power.
    BondedValidators {},
    /// A single validator by operator address, bonded or not.
    Validator { operator: String },
    /// Governance-approved bank metadata for a denom, if any.
    DenomMetadata { denom: String },
}

impl CustomQuery for ChainQuery {}

/// One bonded validator as reported by the staking module.
#[cw_serde]
pub struct BondedValidator {
    /// Bech32 operator (validator) address.
    pub operator: String,
    /// Consensus voting power.
    pub power: u64,
    pub jailed: bool,
}

/// A validator looked up individually; may or may not be in the active set.
#[cw_serde]
pub struct ValidatorInfo {
    pub bonded: bool,
    pub jailed: bool,
    pub power: u64,
}

/// Bank metadata for a denom as registered through governance.
#[cw_serde]
pub struct DenomMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[cw_serde]
pub struct BondedValidatorsResponse {
    pub validators: Vec<BondedValidator>,
}

#[cw_serde]
pub struct ValidatorResponse {
    pub validator: Option<ValidatorInfo>,
}

#[cw_serde]
pub struct DenomMetadataResponse {
    pub metadata: Option<DenomMetadata>,
}

/// Messages executed by host-chain modules on behalf of the bridge.
#[cw_serde]
pub enum ChainMsg {
    /// Mint `amount` of a bridge-derived denom to `to`.
    Mint { to: String, amount: Coin },
    /// Burn `amount` out of the bridge escrow account.
    Burn { amount: Coin },
    /// Slash `validator` by `fraction` of its bonded stake and optionally jail.
    Slash {
        validator: String,
        fraction: Decimal,
        jail: bool,
    },
}

impl CustomMsg for ChainMsg {}

/// The current bonded set.
pub fn query_bonded_validators(
    querier: &QuerierWrapper<ChainQuery>,
) -> StdResult<Vec<BondedValidator>> {
    let res: BondedValidatorsResponse =
        querier.query(&QueryRequest::Custom(ChainQuery::BondedValidators {}))?;
    Ok(res.validators)
}

/// A single validator by operator address.
pub fn query_validator(
    querier: &QuerierWrapper<ChainQuery>,
    operator: &str,
) -> StdResult<Option<ValidatorInfo>> {
    let res: ValidatorResponse = querier.query(&QueryRequest::Custom(ChainQuery::Validator {
        operator: operator.to_string(),
    }))?;
    Ok(res.validator)
}

/// Bank metadata for `denom`, if governance registered any.
pub fn query_denom_metadata(
    querier: &QuerierWrapper<ChainQuery>,
    denom: &str,
) -> StdResult<Option<DenomMetadata>> {
    let res: DenomMetadataResponse =
        querier.query(&QueryRequest::Custom(ChainQuery::DenomMetadata {
            denom: denom.to_string(),
        }))?;
    Ok(res.metadata)
}
