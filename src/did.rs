//! DID index addresses.
//!
//! Attestations are indexed by subject through a pseudo-address derived from
//! the subject's DID:
//!
//! ```text
//! didHash = keccak256(canonical(did))
//! index   = last20(keccak256(DID_INDEX_DOMAIN ‖ hex(didHash)))
//! ```

use alloy_primitives::{keccak256, Address, B256};

use crate::error::DidError;

/// Domain separator mixed into the second hash.
pub const DID_INDEX_DOMAIN: &str = "DID:Index:v1:";

/// Canonicalize a DID for hashing.
///
/// The `did` scheme and the method name are matched case-insensitively and
/// written lowercase. After that:
///
/// - `did:web`: only the host segment is lowercased; path segments keep their case.
/// - `did:pkh`: only the account address is lowercased.
/// - any other method: the whole DID is lowercased.
///
/// Input is hashed as given: surrounding whitespace is not stripped and makes
/// the value fail the `did:` check.
///
/// # Errors
///
/// Returns `DidError::NotADid` if the input doesn't start with `did:`, or
/// `DidError::MalformedPkh` for a `did:pkh` without exactly five parts.
pub fn canonicalize_did(did: &str) -> Result<String, DidError> {
    let is_did = did
        .get(..4)
        .map(|scheme| scheme.eq_ignore_ascii_case("did:"))
        .unwrap_or(false);
    if !is_did {
        return Err(DidError::NotADid {
            value: did.to_string(),
        });
    }

    let mut parts: Vec<String> = did.split(':').map(String::from).collect();
    parts[0] = "did".to_string();
    parts[1] = parts[1].to_lowercase();
    match parts[1].as_str() {
        "web" if parts.len() > 2 => {
            parts[2] = parts[2].to_lowercase();
            Ok(parts.join(":"))
        }
        "pkh" => {
            if parts.len() != 5 {
                return Err(DidError::MalformedPkh {
                    did: did.to_string(),
                });
            }
            parts[4] = parts[4].to_lowercase();
            Ok(parts.join(":"))
        }
        _ => Ok(did.to_lowercase()),
    }
}

/// Keccak-256 of the canonical DID.
///
/// # Errors
///
/// Propagates canonicalization errors.
pub fn did_hash(did: &str) -> Result<B256, DidError> {
    let canonical = canonicalize_did(did)?;
    Ok(keccak256(canonical.as_bytes()))
}

/// Derive the index address for a DID.
///
/// # Errors
///
/// Propagates canonicalization errors.
pub fn did_to_index_address(did: &str) -> Result<Address, DidError> {
    let hash = did_hash(did)?;
    let preimage = format!("{}{}", DID_INDEX_DOMAIN, hex::encode(hash.as_slice()));
    let digest = keccak256(preimage.as_bytes());
    Ok(Address::from_slice(&digest[12..]))
}
