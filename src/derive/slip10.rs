//! SLIP-0010 key derivation for ed25519 chains.
//!
//! Unlike the secp256k1 tree, the ed25519 variant only supports hardened
//! children; asking for a normal child is a typed error the caller can skip.

use crate::error::DeriveError;
use bitcoin::bip32::ChildNumber;
use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Domain-separation key for the master node
const MASTER_SECRET: &[u8] = b"ed25519 seed";

/// One node of an ed25519 key tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slip10Key {
    pub key: [u8; 32],
    pub chain_code: [u8; 32],
}

/// Master node: I = HMAC-SHA512(key = "ed25519 seed", data = seed)
pub fn master_key(seed: &[u8]) -> Result<Slip10Key, DeriveError> {
    let mut mac = HmacSha512::new_from_slice(MASTER_SECRET)
        .map_err(|e| DeriveError::Bip32(e.to_string()))?;
    mac.update(seed);
    Ok(split(&mac.finalize().into_bytes()))
}

/// Walk a fully hardened path from the master node
pub fn derive(seed: &[u8], path: &[ChildNumber]) -> Result<Slip10Key, DeriveError> {
    let mut node = master_key(seed)?;
    for child in path {
        let raw = match child {
            ChildNumber::Hardened { index } => *index | (1 << 31),
            ChildNumber::Normal { .. } => return Err(DeriveError::NonHardenedEd25519),
        };
        node = child_key(&node, raw)?;
    }
    Ok(node)
}

/// I = HMAC-SHA512(key = parent chain code, data = 0x00 || parent key || index)
fn child_key(parent: &Slip10Key, index: u32) -> Result<Slip10Key, DeriveError> {
    let mut mac = HmacSha512::new_from_slice(&parent.chain_code)
        .map_err(|e| DeriveError::Bip32(e.to_string()))?;
    mac.update(&[0u8]);
    mac.update(&parent.key);
    mac.update(&index.to_be_bytes());
    Ok(split(&mac.finalize().into_bytes()))
}

fn split(digest: &[u8]) -> Slip10Key {
    let mut key = [0u8; 32];
    let mut chain_code = [0u8; 32];
    key.copy_from_slice(&digest[..32]);
    chain_code.copy_from_slice(&digest[32..]);
    Slip10Key { key, chain_code }
}
