//! Token chains: per-file buffers of consecutive in-vocabulary words.
//!
//! A chain binds to the wordlist that contained its first token and carries
//! that binding as a field for its whole life. When the chain breaks (word
//! outside the bound wordlist, decode gap, end of stream, or length bound) it
//! is windowed into candidates of every configured size that fits, then
//! reset.

use crate::types::{CandidatePhrase, MAX_CHAIN_WORDS};

/// Sliding buffer of consecutive matched words for one file stream
#[derive(Debug, Default)]
pub struct TokenChain {
    words: Vec<String>,
    offsets: Vec<u64>,
    lang_id: Option<usize>,
}

impl TokenChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Wordlist this chain is bound to; `None` while empty
    pub fn lang_id(&self) -> Option<usize> {
        self.lang_id
    }

    /// Whether the chain hit its retention bound and must be flushed
    pub fn is_full(&self) -> bool {
        self.words.len() >= MAX_CHAIN_WORDS
    }

    /// Start a new chain with its first word, fixing the language
    pub fn bind(&mut self, lang_id: usize, word: String, offset: u64) {
        debug_assert!(self.words.is_empty());
        self.lang_id = Some(lang_id);
        self.words.push(word);
        self.offsets.push(offset);
    }

    /// Append a word already known to be in the bound wordlist
    pub fn push(&mut self, word: String, offset: u64) {
        debug_assert!(self.lang_id.is_some());
        self.words.push(word);
        self.offsets.push(offset);
    }

    pub fn clear(&mut self) {
        self.words.clear();
        self.offsets.clear();
        self.lang_id = None;
    }

    /// Window the chain into candidates and reset it.
    ///
    /// For every configured size `m <= len`, every contiguous window of
    /// length `m` becomes one candidate. Chains shorter than the smallest
    /// configured size yield nothing. `sizes` must be ascending.
    pub fn flush<F>(&mut self, sizes: &[usize], emit: &mut F)
    where
        F: FnMut(CandidatePhrase),
    {
        let len = self.words.len();
        if let Some(lang_id) = self.lang_id {
            for &m in sizes.iter().filter(|&&m| m <= len) {
                for i in 0..=(len - m) {
                    emit(CandidatePhrase {
                        words: self.words[i..i + m].to_vec(),
                        lang_id,
                        offset: self.offsets[i],
                    });
                }
            }
        }
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_of(n: usize) -> TokenChain {
        let mut chain = TokenChain::new();
        chain.bind(0, "w0".to_string(), 0);
        for i in 1..n {
            chain.push(format!("w{i}"), (i * 10) as u64);
        }
        chain
    }

    fn flush_all(chain: &mut TokenChain, sizes: &[usize]) -> Vec<CandidatePhrase> {
        let mut out = Vec::new();
        chain.flush(sizes, &mut |c| out.push(c));
        out
    }

    #[test]
    fn test_short_chain_yields_nothing() {
        let mut chain = chain_of(11);
        assert!(flush_all(&mut chain, &[12, 15, 18, 21, 24]).is_empty());
        assert!(chain.is_empty());
    }

    #[test]
    fn test_exact_size_yields_single_candidate() {
        let mut chain = chain_of(12);
        let candidates = flush_all(&mut chain, &[12, 15, 18, 21, 24]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].words.len(), 12);
        assert_eq!(candidates[0].offset, 0);
    }

    #[test]
    fn test_thirteen_words_give_two_sliding_windows() {
        let mut chain = chain_of(13);
        let candidates = flush_all(&mut chain, &[12, 15, 18, 21, 24]);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].offset, 0);
        assert_eq!(candidates[1].offset, 10);
        assert_eq!(candidates[0].words[0], "w0");
        assert_eq!(candidates[1].words[0], "w1");
    }

    #[test]
    fn test_largest_size_produces_all_windows() {
        // 24 tokens with sizes {12, 24}: 13 twelve-word windows + the whole
        let mut chain = chain_of(24);
        let candidates = flush_all(&mut chain, &[12, 24]);
        assert_eq!(candidates.len(), 13 + 1);
        let twelves = candidates.iter().filter(|c| c.words.len() == 12).count();
        let twenty_fours = candidates.iter().filter(|c| c.words.len() == 24).count();
        assert_eq!(twelves, 13);
        assert_eq!(twenty_fours, 1);
        // No duplicates beyond what overlapping windows legitimately produce
        let mut seen = std::collections::HashSet::new();
        for c in &candidates {
            assert!(seen.insert((c.offset, c.words.len())));
        }
    }

    #[test]
    fn test_language_is_carried_by_the_chain() {
        let mut chain = TokenChain::new();
        chain.bind(3, "w".to_string(), 7);
        assert_eq!(chain.lang_id(), Some(3));
        chain.clear();
        assert_eq!(chain.lang_id(), None);
    }

    #[test]
    fn test_retention_bound() {
        let chain = chain_of(MAX_CHAIN_WORDS);
        assert!(chain.is_full());
    }
}
