//! Schema UID derivation.
//!
//! The EAS registry commits to `keccak256(schema ‖ resolver ‖ revocable)`
//! using tight packing: the schema's UTF-8 bytes, the 20 raw address bytes,
//! then a single `0x00`/`0x01` byte. The schema-only registry hashes the
//! schema bytes alone, even though its records still carry `revocable`.

use alloy_primitives::{keccak256, Address, B256};

use crate::error::CompileError;
use crate::types::Registry;

/// Compute the UID a registry assigns to a schema.
pub fn calculate_uid(registry: Registry, schema: &str, resolver: Address, revocable: bool) -> B256 {
    match registry {
        Registry::Eas => keccak256(pack_eas(schema, resolver, revocable)),
        Registry::SchemaOnly => keccak256(schema.as_bytes()),
    }
}

/// Tightly packed `(string, address, bool)`, as `abi.encodePacked` produces it.
pub fn pack_eas(schema: &str, resolver: Address, revocable: bool) -> Vec<u8> {
    let mut packed = Vec::with_capacity(schema.len() + 21);
    packed.extend_from_slice(schema.as_bytes());
    packed.extend_from_slice(resolver.as_slice());
    packed.push(u8::from(revocable));
    packed
}

/// Lowercase `0x`-prefixed hex of a 32-byte hash.
pub fn uid_hex(hash: &B256) -> String {
    format!("0x{}", hex::encode(hash.as_slice()))
}

/// Lowercase `0x`-prefixed hex of an address.
pub fn address_hex(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

/// Ensure a hex UID carries a `0x` prefix.
///
/// Already-prefixed input comes back unchanged and an empty string stays
/// empty. Case is not normalized, so compare UIDs case-insensitively.
pub fn format_uid(uid: &str) -> String {
    if uid.is_empty() || uid.starts_with("0x") {
        uid.to_string()
    } else {
        format!("0x{}", uid)
    }
}

/// Parse a resolver address written as `0x` plus 40 hex digits.
///
/// # Errors
///
/// Returns `CompileError::InvalidResolver` for anything else.
pub fn parse_resolver(value: &str) -> Result<Address, CompileError> {
    let invalid = || CompileError::InvalidResolver {
        value: value.to_string(),
    };
    let digits = value.strip_prefix("0x").ok_or_else(invalid)?;
    if digits.len() != 40 {
        return Err(invalid());
    }
    let bytes = hex::decode(digits).map_err(|_| invalid())?;
    Ok(Address::from_slice(&bytes))
}
