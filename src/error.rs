use thiserror::Error;

/// Main error type for the scanner
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Wordlist error: {0}")]
    Wordlist(String),

    #[error("Dedup store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Derivation error: {0}")]
    Derive(#[from] DeriveError),

    #[error("Report sink error: {0}")]
    Report(String),

    #[error("Lock poisoned: {0}")]
    Lock(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors produced by the HD derivation engine.
///
/// All of these are skippable: the orchestrator drops the affected phrase or
/// key, logs a warning and keeps scanning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeriveError {
    #[error("invalid seed length: expected 64 bytes, got {0}")]
    InvalidSeed(usize),

    #[error("invalid private key scalar (zero or not below the curve order)")]
    InvalidScalar,

    #[error("hardened derivation requires a private key")]
    HardenedFromPublic,

    #[error("ed25519 derivation supports hardened segments only")]
    NonHardenedEd25519,

    #[error("bip32 derivation failed: {0}")]
    Bip32(String),

    #[error("address encoding failed: {0}")]
    Encoding(String),
}

impl From<bitcoin::bip32::Error> for DeriveError {
    fn from(err: bitcoin::bip32::Error) -> Self {
        match err {
            bitcoin::bip32::Error::CannotDeriveFromHardenedKey => DeriveError::HardenedFromPublic,
            other => DeriveError::Bip32(other.to_string()),
        }
    }
}

/// Result type alias for scanner operations
pub type Result<T> = std::result::Result<T, ScanError>;
