//! Remote-chain address and bridged-denom codecs.
//!
//! Remote (EVM) addresses travel as 0x-prefixed hex strings in messages and
//! state, and as raw 20-byte arrays inside storage keys and checkpoints.
//! Denoms that originate on the remote chain have no stored registry entry;
//! their contract is derived from the textual form `bridge/0x{contract-hex}`.

use crate::error::ContractError;

/// Length of a remote contract/account address in bytes.
pub const REMOTE_ADDRESS_LEN: usize = 20;

/// Prefix of denoms derived from remote-origin token contracts.
pub const BRIDGED_DENOM_PREFIX: &str = "bridge/";

/// Parse a 0x-prefixed hex remote address to 20 bytes.
pub fn parse_remote_address(addr: &str) -> Result<[u8; 20], ContractError> {
    let hex_str = addr.strip_prefix("0x").unwrap_or(addr);

    if hex_str.len() != 40 {
        return Err(ContractError::InvalidAddress {
            reason: format!(
                "invalid remote address length: expected 40 hex chars, got {}",
                hex_str.len()
            ),
        });
    }

    let bytes = hex::decode(hex_str).map_err(|e| ContractError::InvalidAddress {
        reason: format!("invalid hex: {}", e),
    })?;

    let mut result = [0u8; REMOTE_ADDRESS_LEN];
    result.copy_from_slice(&bytes);
    Ok(result)
}

/// Encode 20 bytes to the canonical lowercase hex string with 0x prefix.
pub fn encode_remote_address(bytes: &[u8; 20]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Validate a remote address string and return its canonical form.
pub fn canonical_remote_address(addr: &str) -> Result<String, ContractError> {
    Ok(encode_remote_address(&parse_remote_address(addr)?))
}

/// Whether `denom` is the derived form of a remote-origin token.
pub fn is_bridged_denom(denom: &str) -> bool {
    denom
        .strip_prefix(BRIDGED_DENOM_PREFIX)
        .map(|rest| parse_remote_address(rest).is_ok())
        .unwrap_or(false)
}

/// Derive the voucher denom for a remote-origin token contract.
pub fn contract_to_bridged_denom(contract: &str) -> Result<String, ContractError> {
    Ok(format!(
        "{}{}",
        BRIDGED_DENOM_PREFIX,
        canonical_remote_address(contract)?
    ))
}

/// Extract the token contract out of a derived voucher denom.
pub fn bridged_denom_to_contract(denom: &str) -> Result<String, ContractError> {
    match denom.strip_prefix(BRIDGED_DENOM_PREFIX) {
        Some(rest) => canonical_remote_address(rest),
        None => Err(ContractError::DenomNotBridged {
            denom: denom.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_address_roundtrip() {
        let addr = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
        let raw = parse_remote_address(addr).unwrap();
        let canonical = encode_remote_address(&raw);
        assert_eq!(canonical, addr.to_lowercase());

        // Also accepted without the 0x prefix
        let raw2 = parse_remote_address(&addr[2..]).unwrap();
        assert_eq!(raw, raw2);
    }

    #[test]
    fn test_parse_remote_address_rejects_bad_input() {
        assert!(parse_remote_address("0x1234").is_err());
        assert!(parse_remote_address("0xzz9Fd6e51aad88F6F4ce6aB8827279cffFb92266").is_err());
        assert!(parse_remote_address("").is_err());
    }

    #[test]
    fn test_bridged_denom_roundtrip() {
        let contract = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
        let denom = contract_to_bridged_denom(contract).unwrap();
        assert_eq!(denom, format!("bridge/{}", contract.to_lowercase()));
        assert!(is_bridged_denom(&denom));

        let back = bridged_denom_to_contract(&denom).unwrap();
        assert_eq!(back, contract.to_lowercase());
    }

    #[test]
    fn test_native_denom_is_not_bridged() {
        assert!(!is_bridged_denom("uatom"));
        assert!(!is_bridged_denom("bridge/notanaddress"));
        assert_eq!(
            bridged_denom_to_contract("uatom"),
            Err(ContractError::DenomNotBridged {
                denom: "uatom".to_string()
            })
        );
    }
}
