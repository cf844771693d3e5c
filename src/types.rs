use crate::encoding::TextEncoding;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Largest word length across BIP39 wordlists; bounds the token carry kept
/// between chunks.
pub const MAX_WORD_LEN: usize = 8;

/// Upper bound on tokens retained in one chain. A chain hitting the bound is
/// windowed and restarted so a pathological all-vocabulary file cannot grow
/// the buffer without limit.
pub const MAX_CHAIN_WORDS: usize = 256;

/// Scanner configuration. Everything the core consumes is injected here;
/// nothing is hard-coded in the pipeline modules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Enabled wordlist languages; one `<language>.txt` per language is
    /// expected under `wordlist_dir`
    pub languages: Vec<String>,

    /// Directory holding the wordlist files
    pub wordlist_dir: PathBuf,

    /// Accepted phrase lengths, ascending
    pub chain_sizes: Vec<usize>,

    /// Repetition policy: at most this many distinct words may occur more
    /// than once in a candidate (`usize::MAX` disables the filter)
    pub max_repeated_words: usize,

    /// Chunk size in bytes for file reads
    pub chunk_size: usize,

    /// Text encodings tried per chunk, in order
    pub encodings: Vec<TextEncoding>,

    /// Number of worker threads (0 = auto)
    pub num_threads: usize,

    /// Dedup store insert batch size
    pub batch_size: usize,

    /// File extensions never scanned (lowercase, with leading dot)
    pub bad_extensions: Vec<String>,

    /// Path substrings never scanned (matched case-insensitively)
    pub bad_path_fragments: Vec<String>,

    /// File stem substrings never scanned (matched case-insensitively)
    pub bad_file_stems: Vec<String>,

    /// Scan for raw 64-hex private keys alongside phrases
    pub scan_raw_keys: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            languages: vec!["english".to_string()],
            wordlist_dir: PathBuf::from("wordlist"),
            chain_sizes: vec![12, 15, 18, 21, 24],
            max_repeated_words: 1,
            chunk_size: 1024 * 1024,
            encodings: vec![TextEncoding::Utf8, TextEncoding::Cp437, TextEncoding::Latin1],
            num_threads: 0,
            batch_size: 1000,
            bad_extensions: [
                ".jpg", ".png", ".jpeg", ".ico", ".gif", ".iso", ".dll", ".sys", ".zip",
                ".rar", ".7z", ".cab", ".dat",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            bad_path_fragments: Vec::new(),
            bad_file_stems: Vec::new(),
            scan_raw_keys: true,
        }
    }
}

impl ScanConfig {
    /// Smallest configured chain size
    pub fn min_chain_size(&self) -> usize {
        self.chain_sizes.iter().copied().min().unwrap_or(usize::MAX)
    }

    /// Basic sanity checks, run once at startup
    pub fn validate(&self) -> Result<(), String> {
        if self.languages.is_empty() {
            return Err("at least one language must be enabled".to_string());
        }
        if self.chain_sizes.is_empty() {
            return Err("at least one chain size must be configured".to_string());
        }
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }
        if self.encodings.is_empty() {
            return Err("at least one text encoding must be configured".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// A fixed-length window over a token chain, ready for checksum validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePhrase {
    /// Words of the candidate, already lowercased
    pub words: Vec<String>,
    /// Index of the wordlist the chain was bound to
    pub lang_id: usize,
    /// Byte offset of the first word in the source file
    pub offset: u64,
}

impl CandidatePhrase {
    /// Canonical phrase string (single-space joined)
    pub fn phrase(&self) -> String {
        self.words.join(" ")
    }
}

/// A raw private key hit from the hex scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawKeyHit {
    /// 64 lowercase hex characters
    pub key_hex: String,
    /// Byte offset of the first hex character in the source file
    pub offset: u64,
}

/// Input that produced a discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscoveredInput {
    Mnemonic { phrase: String, language: String },
    RawKey { key: String },
}

/// One derived address together with its path and private key material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedAddress {
    pub path: String,
    pub address: String,
    /// WIF for Base58-family coins, hex for EVM chains, absent otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

/// Addresses derived for one chain template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainAddresses {
    pub chain: String,
    pub addresses: Vec<DerivedAddress>,
}

/// Final reportable result for one validated phrase or raw key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    pub source: PathBuf,
    pub offset: u64,
    pub input: DiscoveredInput,
    /// Ordered chain → address-list mapping (catalogue order)
    pub chains: Vec<ChainAddresses>,
}

/// Progress update sent via tokio channel
#[derive(Debug, Clone)]
pub enum ScanProgress {
    /// A file finished scanning (bytes read from it)
    FileScanned(u64),
    /// A work unit completed
    UnitCompleted(PathBuf),
    /// A work unit failed (non-fatal for the scan)
    UnitError(PathBuf, String),
    /// A discovery was reported
    Discovery(DiscoveryRecord),
}
