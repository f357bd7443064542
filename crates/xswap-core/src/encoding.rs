//! Text encodings used by X-chain identifiers and addresses.
//!
//! Base58, bech32 and sha256 are all delegated to the crates re-exported by
//! `bitcoin`; this module only adds the cb58 checksum convention on top.

use bitcoin::bech32::{self, Bech32, Hrp};
use bitcoin::hashes::{sha256, Hash};

use crate::error::CoreError;

/// Number of checksum bytes appended by cb58.
const CB58_CHECKSUM_LEN: usize = 4;

// ==============================================================================
// Base58 / cb58
// ==============================================================================

/// Plain base58 without a checksum.
#[must_use]
pub fn base58_encode(bytes: &[u8]) -> String {
    bitcoin::base58::encode(bytes)
}

/// cb58: base58 of the payload followed by the last four bytes of its sha256.
#[must_use]
pub fn cb58_encode(payload: &[u8]) -> String {
    let mut buf = Vec::with_capacity(payload.len() + CB58_CHECKSUM_LEN);
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&cb58_checksum(payload));
    base58_encode(&buf)
}

/// Decode a cb58 string and verify its checksum, returning the payload.
pub fn cb58_decode(s: &str) -> Result<Vec<u8>, CoreError> {
    let mut bytes = bitcoin::base58::decode(s)
        .map_err(|e| CoreError::Encoding(format!("invalid base58 `{s}`: {e}")))?;
    if bytes.len() < CB58_CHECKSUM_LEN {
        return Err(CoreError::Encoding(format!("cb58 string too short: `{s}`")));
    }
    let checksum = bytes.split_off(bytes.len() - CB58_CHECKSUM_LEN);
    if checksum[..] != cb58_checksum(&bytes)[..] {
        return Err(CoreError::Encoding(format!("cb58 checksum mismatch: `{s}`")));
    }
    Ok(bytes)
}

fn cb58_checksum(payload: &[u8]) -> [u8; CB58_CHECKSUM_LEN] {
    let digest = sha256::Hash::hash(payload).to_byte_array();
    let mut out = [0u8; CB58_CHECKSUM_LEN];
    out.copy_from_slice(&digest[digest.len() - CB58_CHECKSUM_LEN..]);
    out
}

// ==============================================================================
// Bech32
// ==============================================================================

pub fn bech32_encode(hrp: &str, data: &[u8]) -> Result<String, CoreError> {
    let hrp = Hrp::parse(hrp).map_err(|e| CoreError::Encoding(format!("invalid hrp `{hrp}`: {e}")))?;
    bech32::encode::<Bech32>(hrp, data).map_err(|e| CoreError::Encoding(e.to_string()))
}

/// Decode a bech32 string into its human-readable part and data bytes.
pub fn bech32_decode(s: &str) -> Result<(String, Vec<u8>), CoreError> {
    let (hrp, data) =
        bech32::decode(s).map_err(|e| CoreError::Encoding(format!("invalid bech32 `{s}`: {e}")))?;
    Ok((hrp.to_string(), data))
}
