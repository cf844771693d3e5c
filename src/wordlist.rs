//! Wordlist store: language vocabularies loaded once at startup and shared
//! read-only across workers.

use crate::error::{Result, ScanError};
use ahash::AHashMap;
use std::fs;
use std::path::Path;

/// Canonical vocabulary size for a checksum wordlist
pub const WORDLIST_LEN: usize = 2048;

/// One language's vocabulary with word → index lookup
#[derive(Debug, Clone)]
pub struct Wordlist {
    language: String,
    index: AHashMap<String, u16>,
    max_word_len: usize,
}

impl Wordlist {
    /// Load a newline-delimited wordlist file. The file must contain exactly
    /// the canonical number of words.
    pub fn load(language: &str, path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            ScanError::Wordlist(format!("cannot read {} wordlist {}: {}", language, path.display(), e))
        })?;
        Self::from_words(language, text.lines().map(|l| l.trim().to_string()))
    }

    /// Build a wordlist from an iterator of words (used by tests and custom
    /// loaders). Enforces the canonical vocabulary size.
    pub fn from_words<I>(language: &str, words: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut index = AHashMap::with_capacity(WORDLIST_LEN);
        let mut max_word_len = 0;
        for (i, word) in words.into_iter().filter(|w| !w.is_empty()).enumerate() {
            if i >= WORDLIST_LEN {
                return Err(ScanError::Wordlist(format!(
                    "{} wordlist has more than {} words",
                    language, WORDLIST_LEN
                )));
            }
            max_word_len = max_word_len.max(word.len());
            index.insert(word, i as u16);
        }
        if index.len() != WORDLIST_LEN {
            return Err(ScanError::Wordlist(format!(
                "{} wordlist has {} distinct words, expected {}",
                language,
                index.len(),
                WORDLIST_LEN
            )));
        }
        Ok(Self {
            language: language.to_string(),
            index,
            max_word_len,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    #[inline]
    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    #[inline]
    pub fn index_of(&self, word: &str) -> Option<u16> {
        self.index.get(word).copied()
    }

    pub fn max_word_len(&self) -> usize {
        self.max_word_len
    }
}

/// All enabled wordlists; read-only shared state, safe without locking
#[derive(Debug)]
pub struct WordlistStore {
    lists: Vec<Wordlist>,
}

impl WordlistStore {
    /// Load `<dir>/<language>.txt` for every enabled language. A missing
    /// file for an enabled language is a startup failure.
    pub fn load_dir(dir: &Path, languages: &[String]) -> Result<Self> {
        if languages.is_empty() {
            return Err(ScanError::Config("no languages enabled".to_string()));
        }
        let mut lists = Vec::with_capacity(languages.len());
        for language in languages {
            let path = dir.join(format!("{}.txt", language));
            lists.push(Wordlist::load(language, &path)?);
        }
        Ok(Self { lists })
    }

    /// Build a store from preconstructed wordlists (tests)
    pub fn from_lists(lists: Vec<Wordlist>) -> Self {
        Self { lists }
    }

    #[inline]
    pub fn get(&self, id: usize) -> &Wordlist {
        &self.lists[id]
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// First enabled wordlist containing the word, if any; fixes a new
    /// chain's language.
    #[inline]
    pub fn find_binding(&self, word: &str) -> Option<usize> {
        self.lists.iter().position(|wl| wl.contains(word))
    }

    /// Longest word across all enabled wordlists
    pub fn max_word_len(&self) -> usize {
        self.lists.iter().map(|wl| wl.max_word_len()).max().unwrap_or(0)
    }
}
