//! HD derivation engine.
//!
//! Given a validated phrase's seed (or a raw private key), reproduces the
//! catalogue of key trees and per-chain address encodings. Derivation is a
//! pure function of (seed or key, path): no randomness, no hidden state.

pub mod address;
pub mod slip10;
pub mod templates;

use crate::error::DeriveError;
use crate::types::{ChainAddresses, DerivedAddress};
use bitcoin::bip32::{ChildNumber, Xpriv};
use bitcoin::secp256k1::{All, PublicKey, Secp256k1, SecretKey};
use bitcoin::Network;
pub use templates::{default_catalogue, AddressEncoding, Curve, DerivationTemplate};

/// Chain id used for the raw-key (single key, no tree) path
const RAW_KEY_CHAIN: &str = "ethereum";

/// Derivation engine over a fixed template catalogue
pub struct DerivationEngine {
    secp: Secp256k1<All>,
    templates: Vec<DerivationTemplate>,
}

impl DerivationEngine {
    pub fn new(templates: Vec<DerivationTemplate>) -> Self {
        Self {
            secp: Secp256k1::new(),
            templates,
        }
    }

    pub fn with_default_catalogue() -> Self {
        Self::new(default_catalogue())
    }

    pub fn templates(&self) -> &[DerivationTemplate] {
        &self.templates
    }

    /// Derive the full catalogue from a 512-bit seed
    pub fn derive_seed(&self, seed: &[u8]) -> Result<Vec<ChainAddresses>, DeriveError> {
        if seed.len() != 64 {
            return Err(DeriveError::InvalidSeed(seed.len()));
        }
        self.templates
            .iter()
            .map(|tpl| {
                let addresses = match tpl.curve {
                    Curve::Secp256k1 => self.derive_secp_template(seed, tpl)?,
                    Curve::Ed25519 => derive_ed25519_template(seed, tpl)?,
                };
                Ok(ChainAddresses {
                    chain: tpl.chain.to_string(),
                    addresses,
                })
            })
            .collect()
    }

    /// Raw-key path: the token is the private key scalar itself; only the
    /// Ethereum-family encoding applies, no tree derivation.
    pub fn derive_raw_key(&self, key_hex: &str) -> Result<Vec<ChainAddresses>, DeriveError> {
        let bytes = hex::decode(key_hex).map_err(|_| DeriveError::InvalidScalar)?;
        let sk = SecretKey::from_slice(&bytes).map_err(|_| DeriveError::InvalidScalar)?;
        let pk = PublicKey::from_secret_key(&self.secp, &sk);
        Ok(vec![ChainAddresses {
            chain: RAW_KEY_CHAIN.to_string(),
            addresses: vec![DerivedAddress {
                path: "raw".to_string(),
                address: address::eth_address(&pk),
                private_key: Some(key_hex.to_ascii_lowercase()),
            }],
        }])
    }

    fn derive_secp_template(
        &self,
        seed: &[u8],
        tpl: &DerivationTemplate,
    ) -> Result<Vec<DerivedAddress>, DeriveError> {
        let master = Xpriv::new_master(Network::Bitcoin, seed)
            .map_err(|e| DeriveError::Bip32(e.to_string()))?;
        let mut out = Vec::with_capacity(tpl.accounts.len() * tpl.indices.len());
        for account in tpl.accounts.clone() {
            // Derive to the account base once, then fan out the indices
            let mut base = vec![
                ChildNumber::from_hardened_idx(tpl.purpose)?,
                ChildNumber::from_hardened_idx(tpl.coin)?,
                ChildNumber::from_hardened_idx(account)?,
            ];
            if let Some(change) = tpl.change {
                base.push(ChildNumber::from_normal_idx(change)?);
            }
            let base_key = master.derive_priv(&self.secp, &base)?;
            for index in tpl.indices.clone() {
                let child =
                    base_key.derive_priv(&self.secp, &[ChildNumber::from_normal_idx(index)?])?;
                let sk = child.private_key;
                let pk = PublicKey::from_secret_key(&self.secp, &sk);
                let (addr, private_key) = encode_secp(tpl, &sk, &pk)?;
                out.push(DerivedAddress {
                    path: tpl.path_string(account, Some(index)),
                    address: addr,
                    private_key,
                });
            }
        }
        Ok(out)
    }
}

fn encode_secp(
    tpl: &DerivationTemplate,
    sk: &SecretKey,
    pk: &PublicKey,
) -> Result<(String, Option<String>), DeriveError> {
    let addr = match tpl.encoding {
        AddressEncoding::Base58Check { version } => address::p2pkh(version, pk),
        AddressEncoding::P2shP2wpkh { version } => address::p2sh_p2wpkh(version, pk),
        AddressEncoding::Bech32 { hrp } => address::segwit_v0(hrp, pk)?,
        AddressEncoding::Eip55 => address::eth_address(pk),
        AddressEncoding::Ed25519Base58 => {
            return Err(DeriveError::Encoding(format!(
                "{}: ed25519 encoding on a secp256k1 template",
                tpl.chain
            )))
        }
    };
    let private_key = match tpl.encoding {
        AddressEncoding::Eip55 => Some(hex::encode(sk.secret_bytes())),
        _ => tpl.wif_version.map(|version| address::wif(version, sk)),
    };
    Ok((addr, private_key))
}

/// Ed25519 templates derive one hardened address per account
fn derive_ed25519_template(
    seed: &[u8],
    tpl: &DerivationTemplate,
) -> Result<Vec<DerivedAddress>, DeriveError> {
    let mut out = Vec::with_capacity(tpl.accounts.len());
    for account in tpl.accounts.clone() {
        let mut path = vec![
            ChildNumber::from_hardened_idx(tpl.purpose)?,
            ChildNumber::from_hardened_idx(tpl.coin)?,
            ChildNumber::from_hardened_idx(account)?,
        ];
        if let Some(change) = tpl.change {
            path.push(ChildNumber::from_hardened_idx(change)?);
        }
        let node = slip10::derive(seed, &path)?;
        let signing = ed25519_dalek::SigningKey::from_bytes(&node.key);
        let addr = match tpl.encoding {
            AddressEncoding::Ed25519Base58 => {
                bs58::encode(signing.verifying_key().to_bytes()).into_string()
            }
            _ => {
                return Err(DeriveError::Encoding(format!(
                    "{}: unsupported encoding for ed25519",
                    tpl.chain
                )))
            }
        };
        out.push(DerivedAddress {
            path: tpl.path_string(account, None),
            address: addr,
            private_key: None,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::seed_from_phrase;

    const VECTOR_12: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const ANVIL_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn first_address<'a>(chains: &'a [ChainAddresses], chain: &str) -> &'a DerivedAddress {
        &chains
            .iter()
            .find(|c| c.chain == chain)
            .unwrap_or_else(|| panic!("missing chain {chain}"))
            .addresses[0]
    }

    #[test]
    fn test_known_vector_addresses() {
        let engine = DerivationEngine::with_default_catalogue();
        let seed = seed_from_phrase(VECTOR_12, "").unwrap();
        let chains = engine.derive_seed(&seed).unwrap();

        assert_eq!(
            first_address(&chains, "bitcoin-44").address,
            "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA"
        );
        assert_eq!(
            first_address(&chains, "bitcoin-49").address,
            "37VucYSaXLCAsxYyAPfbSi9eh4iEcbShgf"
        );
        assert_eq!(
            first_address(&chains, "bitcoin-84").address,
            "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu"
        );
        assert_eq!(
            first_address(&chains, "ethereum-44").address,
            "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"
        );
    }

    #[test]
    fn test_paths_recorded_per_address() {
        let engine = DerivationEngine::with_default_catalogue();
        let seed = seed_from_phrase(VECTOR_12, "").unwrap();
        let chains = engine.derive_seed(&seed).unwrap();
        let btc = first_address(&chains, "bitcoin-44");
        assert_eq!(btc.path, "m/44'/0'/0'/0/0");
        assert!(btc.private_key.as_deref().unwrap().starts_with('K') ||
                btc.private_key.as_deref().unwrap().starts_with('L'));
        let sol = first_address(&chains, "solana-44");
        assert_eq!(sol.path, "m/44'/501'/0'/0'");
        assert!(sol.private_key.is_none());
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let engine = DerivationEngine::with_default_catalogue();
        let seed = seed_from_phrase(VECTOR_12, "").unwrap();
        let a = engine.derive_seed(&seed).unwrap();
        let b = engine.derive_seed(&seed).unwrap();
        for (left, right) in a.iter().zip(b.iter()) {
            assert_eq!(left.chain, right.chain);
            for (la, ra) in left.addresses.iter().zip(right.addresses.iter()) {
                assert_eq!(la.address, ra.address);
            }
        }
    }

    #[test]
    fn test_catalogue_order_is_preserved() {
        let engine = DerivationEngine::with_default_catalogue();
        let seed = seed_from_phrase(VECTOR_12, "").unwrap();
        let chains = engine.derive_seed(&seed).unwrap();
        let expected: Vec<&str> = engine.templates().iter().map(|t| t.chain).collect();
        let got: Vec<&str> = chains.iter().map(|c| c.chain.as_str()).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_malformed_seed_rejected() {
        let engine = DerivationEngine::with_default_catalogue();
        assert_eq!(
            engine.derive_seed(&[0u8; 32]).unwrap_err(),
            DeriveError::InvalidSeed(32)
        );
    }

    #[test]
    fn test_raw_key_known_vector() {
        let engine = DerivationEngine::with_default_catalogue();
        let chains = engine.derive_raw_key(ANVIL_KEY).unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].chain, "ethereum");
        assert_eq!(
            chains[0].addresses[0].address,
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn test_invalid_scalars_rejected() {
        let engine = DerivationEngine::with_default_catalogue();
        let zero = "0".repeat(64);
        assert_eq!(
            engine.derive_raw_key(&zero).unwrap_err(),
            DeriveError::InvalidScalar
        );
        let above_order = "f".repeat(64);
        assert_eq!(
            engine.derive_raw_key(&above_order).unwrap_err(),
            DeriveError::InvalidScalar
        );
        assert_eq!(
            engine.derive_raw_key("zz").unwrap_err(),
            DeriveError::InvalidScalar
        );
    }
}
