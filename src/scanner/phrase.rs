//! Streaming candidate scanner.
//!
//! Reads a file in bounded chunks, gates each chunk through the configured
//! encoding fallback, tokenizes ASCII-letter runs and maintains one active
//! token chain per file. Candidates are emitted through a callback as soon as
//! a chain terminates, so memory stays bounded on arbitrarily large files.
//!
//! Tokens may straddle a chunk boundary; the trailing partial run of each
//! chunk is carried into the next one (bounded by the longest vocabulary
//! word, so no re-scanning). Chains never carry across a chunk that fails to
//! decode: the gap terminates the active chain.

use crate::encoding::decode_any;
use crate::error::Result;
use crate::scanner::chain::TokenChain;
use crate::scanner::rawkey::RawKeyScanner;
use crate::types::{CandidatePhrase, RawKeyHit, ScanConfig, MAX_WORD_LEN};
use crate::wordlist::WordlistStore;
use ahash::AHashSet;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Per-file scan counters
#[derive(Debug, Default, Clone, Copy)]
pub struct FileScanOutcome {
    pub bytes: u64,
    pub chunks_skipped: u64,
}

/// Streaming scanner for one worker; borrows the shared read-only wordlists
pub struct PhraseScanner<'a> {
    store: &'a WordlistStore,
    config: &'a ScanConfig,
    /// Longest token worth keeping across a chunk boundary
    carry_cap: usize,
}

impl<'a> PhraseScanner<'a> {
    pub fn new(store: &'a WordlistStore, config: &'a ScanConfig) -> Self {
        Self {
            store,
            config,
            carry_cap: store.max_word_len().max(MAX_WORD_LEN),
        }
    }

    /// Scan a file, emitting candidate phrases (and raw key hits when a
    /// raw-key scanner is supplied) in file-offset order.
    pub fn scan_file<C, K>(
        &self,
        path: &Path,
        raw: Option<&RawKeyScanner>,
        on_candidate: &mut C,
        on_key: &mut K,
    ) -> Result<FileScanOutcome>
    where
        C: FnMut(CandidatePhrase),
        K: FnMut(RawKeyHit),
    {
        let mut file = File::open(path)?;
        let mut buf = vec![0u8; self.config.chunk_size];
        let mut outcome = FileScanOutcome::default();

        let mut chain = TokenChain::new();
        let mut carry: Vec<u8> = Vec::new();
        let mut carry_start = 0u64;
        // Inside a letter run longer than any vocabulary word; such a run is
        // one oversized token and has already terminated the chain.
        let mut in_long_run = false;
        let mut seen_keys: AHashSet<String> = AHashSet::new();
        let mut offset = 0u64;

        loop {
            let n = read_full(&mut file, &mut buf)?;
            if n == 0 {
                break;
            }
            let chunk = &buf[..n];
            outcome.bytes += n as u64;

            if decode_any(chunk, &self.config.encodings).is_none() {
                outcome.chunks_skipped += 1;
                carry.clear();
                in_long_run = false;
                chain.flush(&self.config.chain_sizes, on_candidate);
                offset += n as u64;
                continue;
            }

            if let Some(rawkey) = raw {
                rawkey.scan_chunk(chunk, offset, &mut seen_keys, on_key);
            }

            for (i, &b) in chunk.iter().enumerate() {
                if b.is_ascii_alphabetic() {
                    if in_long_run {
                        continue;
                    }
                    if carry.is_empty() {
                        carry_start = offset + i as u64;
                    }
                    carry.push(b.to_ascii_lowercase());
                    if carry.len() > self.carry_cap {
                        // Cannot be a vocabulary word; acts as a chain break
                        chain.flush(&self.config.chain_sizes, on_candidate);
                        carry.clear();
                        in_long_run = true;
                    }
                } else {
                    if in_long_run {
                        in_long_run = false;
                        continue;
                    }
                    if !carry.is_empty() {
                        self.accept_token(&mut chain, &carry, carry_start, on_candidate);
                        carry.clear();
                    }
                }
            }

            offset += n as u64;
        }

        if !in_long_run && !carry.is_empty() {
            self.accept_token(&mut chain, &carry, carry_start, on_candidate);
        }
        chain.flush(&self.config.chain_sizes, on_candidate);

        Ok(outcome)
    }

    fn accept_token<C>(&self, chain: &mut TokenChain, token: &[u8], start: u64, emit: &mut C)
    where
        C: FnMut(CandidatePhrase),
    {
        // Tokens are built from ASCII letters only
        let word = match std::str::from_utf8(token) {
            Ok(w) => w,
            Err(_) => return,
        };

        match chain.lang_id() {
            None => {
                if let Some(lang_id) = self.store.find_binding(word) {
                    chain.bind(lang_id, word.to_string(), start);
                }
            }
            Some(lang_id) => {
                if self.store.get(lang_id).contains(word) {
                    chain.push(word.to_string(), start);
                    if chain.is_full() {
                        chain.flush(&self.config.chain_sizes, emit);
                    }
                } else {
                    chain.flush(&self.config.chain_sizes, emit);
                }
            }
        }
    }
}

/// Fill the buffer from the reader, stopping only at EOF
fn read_full(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::TextEncoding;
    use crate::wordlist::testutil::english_store;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    const VECTOR_12: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn temp_file(content: &[u8]) -> PathBuf {
        let mut dir = std::env::temp_dir();
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        dir.push(format!("seedscan_scan_{unique}"));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("input.bin");
        fs::write(&path, content).unwrap();
        path
    }

    fn scan(content: &[u8], config: &ScanConfig) -> Vec<CandidatePhrase> {
        let store = english_store();
        let scanner = PhraseScanner::new(&store, config);
        let path = temp_file(content);
        let mut candidates = Vec::new();
        scanner
            .scan_file(&path, None, &mut |c| candidates.push(c), &mut |_| {})
            .unwrap();
        candidates
    }

    #[test]
    fn test_twelve_word_vector_yields_one_candidate() {
        let config = ScanConfig::default();
        // "hello" is famously not a BIP39 word, so the chain starts after it
        let candidates = scan(format!("hello. {VECTOR_12}\n").as_bytes(), &config);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].words.len(), 12);
        assert_eq!(candidates[0].phrase(), VECTOR_12);
        assert_eq!(candidates[0].offset, 7);
    }

    #[test]
    fn test_short_sequences_yield_nothing() {
        let config = ScanConfig::default();
        let candidates = scan(b"legal winner thank year wave sausage worth useful", &config);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_thirteen_tokens_give_two_windows() {
        let config = ScanConfig::default();
        let text = format!("zoo {VECTOR_12}");
        let candidates = scan(text.as_bytes(), &config);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].offset, 0);
        assert_eq!(candidates[0].words[0], "zoo");
        assert_eq!(candidates[1].offset, 4);
        assert_eq!(candidates[1].words[0], "abandon");
    }

    #[test]
    fn test_tokens_assemble_across_chunk_boundaries() {
        let mut config = ScanConfig::default();
        config.chunk_size = 7; // splits every word
        config.chain_sizes = vec![2];
        let candidates = scan(b"legal winner thank year", &config);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].phrase(), "legal winner");
        assert_eq!(
            candidates.iter().map(|c| c.offset).collect::<Vec<_>>(),
            vec![0, 6, 13]
        );
    }

    #[test]
    fn test_decode_failure_breaks_chain() {
        let mut config = ScanConfig::default();
        config.chunk_size = 13;
        config.chain_sizes = vec![2];
        config.encodings = vec![TextEncoding::Utf8];
        let mut content = Vec::new();
        content.extend_from_slice(b"legal winner "); // chunk 1
        content.extend_from_slice(&[0x80; 13]); // chunk 2: invalid UTF-8
        content.extend_from_slice(b"thank year"); // chunk 3
        let candidates = scan(&content, &config);
        // Two separate 2-word chains, never a joined 4-word one
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].phrase(), "legal winner");
        assert_eq!(candidates[1].phrase(), "thank year");
    }

    #[test]
    fn test_skipped_chunk_is_counted() {
        let mut config = ScanConfig::default();
        config.chunk_size = 8;
        config.encodings = vec![TextEncoding::Utf8];
        let store = english_store();
        let scanner = PhraseScanner::new(&store, &config);
        let path = temp_file(&[0x80; 8]);
        let outcome = scanner
            .scan_file(&path, None, &mut |_| {}, &mut |_| {})
            .unwrap();
        assert_eq!(outcome.chunks_skipped, 1);
        assert_eq!(outcome.bytes, 8);
    }

    #[test]
    fn test_cp437_fallback_still_tokenizes() {
        let mut config = ScanConfig::default();
        config.chain_sizes = vec![3];
        // 0xB0 makes UTF-8 fail for the whole chunk; CP437 accepts it
        let candidates = scan(b"zoo zoo zoo \xB0", &config);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].phrase(), "zoo zoo zoo");
    }

    #[test]
    fn test_oversized_letter_run_breaks_chain() {
        let mut config = ScanConfig::default();
        config.chain_sizes = vec![2];
        let candidates = scan(b"legal winner abcdefghijklmnop thank year", &config);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].phrase(), "legal winner");
        assert_eq!(candidates[1].phrase(), "thank year");
    }

    #[test]
    fn test_case_folding() {
        let config = ScanConfig::default();
        let text = VECTOR_12.to_uppercase();
        let candidates = scan(text.as_bytes(), &config);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].phrase(), VECTOR_12);
    }
}
