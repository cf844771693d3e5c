//! Scan statistics aggregator.
//!
//! An explicit object handed into every worker by `Arc` handle; counters are
//! atomic so workers never contend on a lock for bookkeeping.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters updated by workers
#[derive(Debug, Default)]
pub struct ScanStats {
    files_processed: AtomicU64,
    bytes_processed: AtomicU64,
    chunks_skipped: AtomicU64,
    candidates: AtomicU64,
    phrases_found: AtomicU64,
    keys_found: AtomicU64,
    duplicates_skipped: AtomicU64,
    errors: AtomicU64,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, bytes: u64, chunks_skipped: u64) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
        self.bytes_processed.fetch_add(bytes, Ordering::Relaxed);
        self.chunks_skipped.fetch_add(chunks_skipped, Ordering::Relaxed);
    }

    pub fn add_candidate(&self) {
        self.candidates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_phrase(&self) {
        self.phrases_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_key(&self) {
        self.keys_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_duplicate(&self) {
        self.duplicates_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            files_processed: self.files_processed.load(Ordering::Relaxed),
            bytes_processed: self.bytes_processed.load(Ordering::Relaxed),
            chunks_skipped: self.chunks_skipped.load(Ordering::Relaxed),
            candidates: self.candidates.load(Ordering::Relaxed),
            phrases_found: self.phrases_found.load(Ordering::Relaxed),
            keys_found: self.keys_found.load(Ordering::Relaxed),
            duplicates_skipped: self.duplicates_skipped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub files_processed: u64,
    pub bytes_processed: u64,
    pub chunks_skipped: u64,
    pub candidates: u64,
    pub phrases_found: u64,
    pub keys_found: u64,
    pub duplicates_skipped: u64,
    pub errors: u64,
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "files: {}, bytes: {}, candidates: {}, phrases: {}, keys: {}, duplicates: {}, errors: {}",
            self.files_processed,
            self.bytes_processed,
            self.candidates,
            self.phrases_found,
            self.keys_found,
            self.duplicates_skipped,
            self.errors,
        )
    }
}
