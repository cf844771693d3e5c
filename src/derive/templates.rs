//! Static derivation catalogue.
//!
//! Each template fixes one chain family's curve, BIP purpose, coin index,
//! bounded account/index ranges and address encoding. The encoding is
//! declared explicitly per template; the engine never infers it from the
//! coin identity.

use std::ops::Range;

/// Elliptic curve a template derives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Secp256k1,
    Ed25519,
}

/// Address encoding applied to the derived public key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressEncoding {
    /// Legacy P2PKH: Base58Check over hash160 with a coin version byte
    Base58Check { version: u8 },
    /// P2SH wrapping a v0 witness program
    P2shP2wpkh { version: u8 },
    /// Native segwit v0 (Bech32)
    Bech32 { hrp: &'static str },
    /// Keccak-256 derived 20-byte address with EIP-55 checksum casing
    Eip55,
    /// Base58 of the raw ed25519 public key
    Ed25519Base58,
}

/// One (chain, purpose, path pattern, encoding) tuple
#[derive(Debug, Clone)]
pub struct DerivationTemplate {
    /// Chain id used as the key of the report mapping
    pub chain: &'static str,
    pub curve: Curve,
    /// BIP purpose level (44/49/84); hardened
    pub purpose: u32,
    /// SLIP-44 coin index; hardened
    pub coin: u32,
    /// Account range; hardened
    pub accounts: Range<u32>,
    /// Change level; `None` for chains whose path omits it. Non-hardened on
    /// secp256k1 templates, hardened on ed25519 ones.
    pub change: Option<u32>,
    /// Address index range; non-hardened. Ed25519 templates derive one
    /// address per account instead and ignore this range.
    pub indices: Range<u32>,
    pub encoding: AddressEncoding,
    /// WIF version byte for coins whose keys are reported in WIF
    pub wif_version: Option<u8>,
}

impl DerivationTemplate {
    /// Path string for one derived key, e.g. `m/44'/0'/0'/0/3`
    pub fn path_string(&self, account: u32, index: Option<u32>) -> String {
        let mut path = format!("m/{}'/{}'/{}'", self.purpose, self.coin, account);
        if let Some(change) = self.change {
            if self.curve == Curve::Ed25519 {
                path.push_str(&format!("/{}'", change));
            } else {
                path.push_str(&format!("/{}", change));
            }
        }
        if let Some(index) = index {
            path.push_str(&format!("/{}", index));
        }
        path
    }
}

/// The fixed catalogue: bounded account × index fans per chain family
pub fn default_catalogue() -> Vec<DerivationTemplate> {
    vec![
        DerivationTemplate {
            chain: "bitcoin-44",
            curve: Curve::Secp256k1,
            purpose: 44,
            coin: 0,
            accounts: 0..2,
            change: Some(0),
            indices: 0..5,
            encoding: AddressEncoding::Base58Check { version: 0x00 },
            wif_version: Some(0x80),
        },
        DerivationTemplate {
            chain: "bitcoin-49",
            curve: Curve::Secp256k1,
            purpose: 49,
            coin: 0,
            accounts: 0..2,
            change: Some(0),
            indices: 0..5,
            encoding: AddressEncoding::P2shP2wpkh { version: 0x05 },
            wif_version: Some(0x80),
        },
        DerivationTemplate {
            chain: "bitcoin-84",
            curve: Curve::Secp256k1,
            purpose: 84,
            coin: 0,
            accounts: 0..2,
            change: Some(0),
            indices: 0..5,
            encoding: AddressEncoding::Bech32 { hrp: "bc" },
            wif_version: Some(0x80),
        },
        DerivationTemplate {
            chain: "litecoin-44",
            curve: Curve::Secp256k1,
            purpose: 44,
            coin: 2,
            accounts: 0..1,
            change: Some(0),
            indices: 0..3,
            encoding: AddressEncoding::Base58Check { version: 0x30 },
            wif_version: Some(0xB0),
        },
        DerivationTemplate {
            chain: "litecoin-49",
            curve: Curve::Secp256k1,
            purpose: 49,
            coin: 2,
            accounts: 0..1,
            change: Some(0),
            indices: 0..3,
            encoding: AddressEncoding::P2shP2wpkh { version: 0x32 },
            wif_version: Some(0xB0),
        },
        DerivationTemplate {
            chain: "litecoin-84",
            curve: Curve::Secp256k1,
            purpose: 84,
            coin: 2,
            accounts: 0..1,
            change: Some(0),
            indices: 0..3,
            encoding: AddressEncoding::Bech32 { hrp: "ltc" },
            wif_version: Some(0xB0),
        },
        DerivationTemplate {
            chain: "dogecoin-44",
            curve: Curve::Secp256k1,
            purpose: 44,
            coin: 3,
            accounts: 0..1,
            change: Some(0),
            indices: 0..3,
            encoding: AddressEncoding::Base58Check { version: 0x1E },
            wif_version: Some(0x9E),
        },
        DerivationTemplate {
            chain: "dash-44",
            curve: Curve::Secp256k1,
            purpose: 44,
            coin: 5,
            accounts: 0..1,
            change: Some(0),
            indices: 0..3,
            encoding: AddressEncoding::Base58Check { version: 0x4C },
            wif_version: Some(0xCC),
        },
        DerivationTemplate {
            chain: "ethereum-44",
            curve: Curve::Secp256k1,
            purpose: 44,
            coin: 60,
            accounts: 0..2,
            change: Some(0),
            indices: 0..5,
            encoding: AddressEncoding::Eip55,
            wif_version: None,
        },
        // Change-less variant some wallets used for early Ethereum accounts
        DerivationTemplate {
            chain: "ethereum-44-flat",
            curve: Curve::Secp256k1,
            purpose: 44,
            coin: 60,
            accounts: 0..2,
            change: None,
            indices: 0..3,
            encoding: AddressEncoding::Eip55,
            wif_version: None,
        },
        DerivationTemplate {
            chain: "solana-44",
            curve: Curve::Ed25519,
            purpose: 44,
            coin: 501,
            accounts: 0..2,
            change: Some(0),
            indices: 0..1,
            encoding: AddressEncoding::Ed25519Base58,
            wif_version: None,
        },
    ]
}
