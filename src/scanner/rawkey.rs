//! Raw private key scanner: boundary-guarded 64-hex tokens.
//!
//! A much simpler path than the phrase scanner: hits feed the derivation
//! engine's single-key route directly. Keys are deduplicated per file only.
//! A key straddling a chunk boundary is not recovered; the guard characters
//! make hits unambiguous within a chunk.

use crate::types::RawKeyHit;
use ahash::AHashSet;
use lazy_static::lazy_static;
use regex::bytes::Regex;

lazy_static! {
    static ref RAW_KEY_RE: Regex =
        Regex::new(r"(?i)(?:^|[^0-9a-z_/\\])([0-9a-f]{64})(?:[^0-9a-z_]|$)")
            .expect("raw key regex compiles");
}

/// Stateless matcher for 64-hex private key material
#[derive(Debug, Default)]
pub struct RawKeyScanner;

impl RawKeyScanner {
    pub fn new() -> Self {
        Self
    }

    /// Scan one chunk, emitting hits not yet seen in this file
    pub fn scan_chunk<K>(
        &self,
        chunk: &[u8],
        base_offset: u64,
        seen: &mut AHashSet<String>,
        emit: &mut K,
    ) where
        K: FnMut(RawKeyHit),
    {
        for caps in RAW_KEY_RE.captures_iter(chunk) {
            let m = match caps.get(1) {
                Some(m) => m,
                None => continue,
            };
            // The capture is pure ASCII hex
            let key_hex = String::from_utf8_lossy(m.as_bytes()).to_ascii_lowercase();
            if seen.insert(key_hex.clone()) {
                emit(RawKeyHit {
                    key_hex,
                    offset: base_offset + m.start() as u64,
                });
            }
        }
    }
}
