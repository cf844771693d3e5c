//! Mnemonic checksum validation and seed stretching.
//!
//! Validation maps each word to its wordlist index, concatenates the 11-bit
//! indices, splits the bit string into entropy and checksum parts and checks
//! the checksum against the leading bits of SHA-256 over the entropy bytes.
//! Seed bytes are stretched with PBKDF2-HMAC-SHA512 only when derivation is
//! actually requested.

use crate::error::{DeriveError, Result, ScanError};
use crate::types::CandidatePhrase;
use crate::wordlist::Wordlist;
use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::{Digest, Sha256, Sha512};
use std::collections::HashMap;

/// PBKDF2 iteration count for seed derivation
const SEED_PBKDF2_ROUNDS: u32 = 2048;

/// Salt prefix for seed derivation
const SEED_SALT_PREFIX: &str = "mnemonic";

/// Checksum validator bound to one immutable wordlist
pub struct MnemonicValidator<'a> {
    wordlist: &'a Wordlist,
    /// At most this many distinct words may occur more than once
    max_repeated_words: usize,
}

impl<'a> MnemonicValidator<'a> {
    pub fn new(wordlist: &'a Wordlist, max_repeated_words: usize) -> Self {
        Self {
            wordlist,
            max_repeated_words,
        }
    }

    /// Full validation: membership, repetition policy, checksum
    pub fn validate(&self, candidate: &CandidatePhrase) -> bool {
        let words: Vec<&str> = candidate.words.iter().map(|w| w.as_str()).collect();
        self.validate_words(&words)
    }

    pub fn validate_words(&self, words: &[&str]) -> bool {
        if !matches!(words.len(), 12 | 15 | 18 | 21 | 24) {
            return false;
        }
        if !self.repetition_ok(words) {
            return false;
        }
        let mut indices = Vec::with_capacity(words.len());
        for word in words {
            match self.wordlist.index_of(word) {
                Some(i) => indices.push(i),
                None => return false,
            }
        }
        checksum_ok(&indices)
    }

    /// Heuristic false-positive filter, not a checksum rule: a natural
    /// phrase may legitimately repeat one word many times (the all-zero
    /// entropy vector does), but several distinct repeating words are noise.
    fn repetition_ok(&self, words: &[&str]) -> bool {
        if self.max_repeated_words == usize::MAX {
            return true;
        }
        let mut counts: HashMap<&str, usize> = HashMap::with_capacity(words.len());
        for word in words {
            *counts.entry(word).or_insert(0) += 1;
        }
        let repeated = counts.values().filter(|&&c| c > 1).count();
        repeated <= self.max_repeated_words
    }

    /// Promote a candidate that already passed [`validate`](Self::validate)
    pub fn promote(&self, candidate: &CandidatePhrase) -> ValidatedMnemonic {
        ValidatedMnemonic {
            phrase: candidate.phrase(),
            language: self.wordlist.language().to_string(),
            offset: candidate.offset,
        }
    }
}

/// Verify checksum bits against SHA-256 of the entropy bytes
fn checksum_ok(indices: &[u16]) -> bool {
    let total_bits = indices.len() * 11;
    let checksum_bits = total_bits / 33;
    let entropy_bytes = (total_bits - checksum_bits) / 8;

    // Pack 11-bit indices MSB-first into a byte buffer
    let mut buf = vec![0u8; (total_bits + 7) / 8];
    for (i, &idx) in indices.iter().enumerate() {
        for bit in 0..11 {
            if (idx >> (10 - bit)) & 1 == 1 {
                let pos = i * 11 + bit;
                buf[pos / 8] |= 1 << (7 - (pos % 8));
            }
        }
    }

    let digest = Sha256::digest(&buf[..entropy_bytes]);
    // checksum_bits is at most 8, so one byte of each side suffices
    let expected = digest[0] >> (8 - checksum_bits);
    let actual = buf[entropy_bytes] >> (8 - checksum_bits);
    expected == actual
}

/// A candidate that passed checksum validation
#[derive(Debug, Clone)]
pub struct ValidatedMnemonic {
    pub phrase: String,
    pub language: String,
    pub offset: u64,
}

impl ValidatedMnemonic {
    /// Stretch the phrase into the 512-bit seed. Comparatively expensive;
    /// called only when derivation is actually requested.
    pub fn seed(&self) -> Result<[u8; 64]> {
        seed_from_phrase(&self.phrase, "")
    }
}

/// PBKDF2-HMAC-SHA512 over the phrase with the standard salt prefix
pub fn seed_from_phrase(phrase: &str, passphrase: &str) -> Result<[u8; 64]> {
    let salt = format!("{}{}", SEED_SALT_PREFIX, passphrase);
    let mut seed = [0u8; 64];
    pbkdf2::<Hmac<Sha512>>(phrase.as_bytes(), salt.as_bytes(), SEED_PBKDF2_ROUNDS, &mut seed)
        .map_err(|_| ScanError::Derive(DeriveError::Bip32("seed stretching failed".to_string())))?;
    Ok(seed)
}
