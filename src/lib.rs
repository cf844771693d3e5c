//! Filesystem scanner for cryptocurrency mnemonic phrases and raw private keys
//!
//! This library provides the full scanning pipeline:
//! - Streaming candidate scanner with chunked reads, ordered encoding
//!   fallback and cross-chunk token chains
//! - BIP39 checksum validation with a repetition heuristic
//! - Durable SQLite dedup store with batched writes
//! - Multi-chain HD derivation (BIP32/44/49/84, SLIP-0010) with per-coin
//!   address encodings
//! - Bounded worker pool orchestration with panic isolation
//! - Progress streaming via tokio::sync::mpsc

pub mod cli;
pub mod dedup;
pub mod derive;
pub mod encoding;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod scanner;
pub mod stats;
pub mod types;
pub mod validator;
pub mod wordlist;

// Re-export commonly used types
pub use dedup::DedupStore;
pub use derive::{DerivationEngine, DerivationTemplate};
pub use error::{DeriveError, Result, ScanError};
pub use orchestrator::Orchestrator;
pub use report::{LogReportSink, NullReportSink, ReportSink, VecReportSink};
pub use scanner::{PhraseScanner, RawKeyScanner, TokenChain};
pub use stats::{ScanStats, StatsSnapshot};
pub use types::{CandidatePhrase, DiscoveryRecord, ScanConfig, ScanProgress};
pub use validator::{MnemonicValidator, ValidatedMnemonic};
pub use wordlist::{Wordlist, WordlistStore};
