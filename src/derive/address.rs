//! Chain-specific address and key encodings.
//!
//! Base58Check with per-coin version bytes, P2SH-wrapped and native segwit,
//! Keccak-based Ethereum addresses with EIP-55 checksum casing, and WIF for
//! private key reporting.

use crate::error::DeriveError;
use bech32::{ToBase32, Variant};
use bitcoin::secp256k1::{PublicKey, SecretKey};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use sha3::Keccak256;

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let ripe = Ripemd160::digest(sha);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripe);
    out
}

/// Base58 with a version byte and 4-byte double-SHA256 checksum
pub fn base58check(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(payload.len() + 5);
    data.push(version);
    data.extend_from_slice(payload);
    let checksum = Sha256::digest(Sha256::digest(&data));
    data.extend_from_slice(&checksum[..4]);
    bs58::encode(data).into_string()
}

/// Legacy pay-to-pubkey-hash address
pub fn p2pkh(version: u8, pubkey: &PublicKey) -> String {
    base58check(version, &hash160(&pubkey.serialize()))
}

/// P2SH address wrapping the v0 witness program of the key
pub fn p2sh_p2wpkh(version: u8, pubkey: &PublicKey) -> String {
    let mut redeem = Vec::with_capacity(22);
    redeem.push(0x00);
    redeem.push(0x14);
    redeem.extend_from_slice(&hash160(&pubkey.serialize()));
    base58check(version, &hash160(&redeem))
}

/// Native segwit v0 address (Bech32)
pub fn segwit_v0(hrp: &str, pubkey: &PublicKey) -> Result<String, DeriveError> {
    let program = hash160(&pubkey.serialize());
    let witness_version =
        bech32::u5::try_from_u8(0).map_err(|e| DeriveError::Encoding(e.to_string()))?;
    let mut data = vec![witness_version];
    data.extend(program.to_base32());
    bech32::encode(hrp, data, Variant::Bech32).map_err(|e| DeriveError::Encoding(e.to_string()))
}

/// 20-byte Ethereum address: Keccak-256 of the uncompressed key, last 20 bytes
pub fn eth_address_bytes(pubkey: &PublicKey) -> [u8; 20] {
    let uncompressed = pubkey.serialize_uncompressed();
    let digest = Keccak256::digest(&uncompressed[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[12..]);
    out
}

/// EIP-55 checksum casing over a 20-byte address
pub fn eip55(bytes: &[u8; 20]) -> String {
    let lower = hex::encode(bytes);
    let digest = Keccak256::digest(lower.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            digest[i / 2] >> 4
        } else {
            digest[i / 2] & 0x0f
        };
        if ch.is_ascii_alphabetic() && nibble >= 8 {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Checksummed Ethereum address for a public key
pub fn eth_address(pubkey: &PublicKey) -> String {
    eip55(&eth_address_bytes(pubkey))
}

/// Wallet import format for a compressed-key coin
pub fn wif(version: u8, key: &SecretKey) -> String {
    let mut payload = Vec::with_capacity(33);
    payload.extend_from_slice(&key.secret_bytes());
    payload.push(0x01);
    base58check(version, &payload)
}
