//! Scan orchestrator.
//!
//! Partitions the target tree into independent units (top-level
//! subdirectories plus the root's own files), fans them out to a bounded
//! rayon pool with panic isolation, and drives the per-file pipeline:
//! scan → validate → dedup check → derive → report. The dedup store and the
//! report sink are the only shared mutable resources; each sits behind one
//! coarse lock, and workers never hold a lock across I/O they don't need.

use crate::dedup::DedupStore;
use crate::derive::DerivationEngine;
use crate::error::{Result, ScanError};
use crate::report::ReportSink;
use crate::scanner::{PhraseScanner, RawKeyScanner};
use crate::stats::{ScanStats, StatsSnapshot};
use crate::types::{
    CandidatePhrase, DiscoveredInput, DiscoveryRecord, RawKeyHit, ScanConfig, ScanProgress,
};
use crate::validator::MnemonicValidator;
use crate::wordlist::WordlistStore;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::Sender;
use walkdir::WalkDir;

/// One independent unit of work
#[derive(Debug, Clone)]
struct Unit {
    path: PathBuf,
    /// Top-level subdirectories are walked recursively; the root unit only
    /// covers its direct files (subdirectories are their own units)
    recursive: bool,
}

/// Drives the whole pipeline over a directory tree
pub struct Orchestrator {
    config: ScanConfig,
    wordlists: Arc<WordlistStore>,
    engine: Arc<DerivationEngine>,
    dedup: Arc<Mutex<DedupStore>>,
    sink: Arc<Mutex<dyn ReportSink>>,
    stats: Arc<ScanStats>,
    cancel: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new<S>(
        config: ScanConfig,
        wordlists: WordlistStore,
        engine: DerivationEngine,
        dedup: DedupStore,
        sink: Arc<Mutex<S>>,
    ) -> Self
    where
        S: ReportSink + 'static,
    {
        Self {
            config,
            wordlists: Arc::new(wordlists),
            engine: Arc::new(engine),
            dedup: Arc::new(Mutex::new(dedup)),
            sink,
            stats: Arc::new(ScanStats::new()),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between files; setting it stops dispatch promptly while
    /// buffered dedup writes are still flushed at exit
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn stats(&self) -> Arc<ScanStats> {
        Arc::clone(&self.stats)
    }

    /// Scan the tree to completion (or cancellation) and return the final
    /// counters. The dedup store is flushed before this returns.
    pub fn run(&self, root: &Path, progress: Option<Sender<ScanProgress>>) -> Result<StatsSnapshot> {
        self.config.validate().map_err(ScanError::Config)?;
        if !root.is_dir() {
            return Err(ScanError::Config(format!(
                "scan root {} is not a directory",
                root.display()
            )));
        }

        if self.config.num_threads > 0 {
            let _ = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.num_threads)
                .build_global();
        }

        let units = partition_units(root)?;
        tracing::info!(units = units.len(), root = %root.display(), "starting scan");

        units.par_iter().for_each(|unit| {
            if self.cancel.load(Ordering::Relaxed) {
                return;
            }
            // Isolate panics so one corrupt unit cannot take down the pool
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                self.scan_unit(unit, progress.as_ref())
            }));
            match result {
                Ok(Ok(())) => {
                    if let Some(tx) = progress.as_ref() {
                        let _ = tx.blocking_send(ScanProgress::UnitCompleted(unit.path.clone()));
                    }
                }
                Ok(Err(err)) => {
                    self.stats.add_error();
                    tracing::error!(unit = %unit.path.display(), "unit failed: {err}");
                    if let Some(tx) = progress.as_ref() {
                        let _ = tx.blocking_send(ScanProgress::UnitError(
                            unit.path.clone(),
                            err.to_string(),
                        ));
                    }
                }
                Err(_) => {
                    self.stats.add_error();
                    tracing::error!(unit = %unit.path.display(), "panic while scanning unit");
                    if let Some(tx) = progress.as_ref() {
                        let _ = tx.blocking_send(ScanProgress::UnitError(
                            unit.path.clone(),
                            "panic while scanning unit".to_string(),
                        ));
                    }
                }
            }
        });

        // Shutdown guarantee: no recorded phrase is lost on exit
        self.lock_dedup()?.flush()?;
        self.lock_sink()?.flush()?;
        Ok(self.stats.snapshot())
    }

    fn scan_unit(&self, unit: &Unit, progress: Option<&Sender<ScanProgress>>) -> Result<()> {
        let max_depth = if unit.recursive { usize::MAX } else { 1 };
        for entry in WalkDir::new(&unit.path)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if self.cancel.load(Ordering::Relaxed) {
                break;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if self.excluded(path) {
                continue;
            }
            match self.scan_one_file(path, progress) {
                Ok(bytes) => {
                    if let Some(tx) = progress {
                        let _ = tx.blocking_send(ScanProgress::FileScanned(bytes));
                    }
                }
                // A dedup store failure is fatal to this unit of work
                Err(err @ ScanError::Store(_)) => return Err(err),
                Err(err @ ScanError::Lock(_)) => return Err(err),
                Err(err) => {
                    self.stats.add_error();
                    tracing::warn!(file = %path.display(), "skipping file: {err}");
                }
            }
        }
        Ok(())
    }

    fn scan_one_file(&self, path: &Path, progress: Option<&Sender<ScanProgress>>) -> Result<u64> {
        let scanner = PhraseScanner::new(&self.wordlists, &self.config);
        let rawkey = RawKeyScanner::new();
        let raw = if self.config.scan_raw_keys {
            Some(&rawkey)
        } else {
            None
        };

        // Store/lock failures inside the callbacks abort the file; both
        // callbacks share the slot, hence the RefCell
        let pipeline_err: std::cell::RefCell<Option<ScanError>> = std::cell::RefCell::new(None);
        let outcome = scanner.scan_file(
            path,
            raw,
            &mut |candidate| {
                if pipeline_err.borrow().is_some() {
                    return;
                }
                self.stats.add_candidate();
                if let Err(err) = self.process_candidate(path, &candidate, progress) {
                    *pipeline_err.borrow_mut() = Some(err);
                }
            },
            &mut |hit| {
                if pipeline_err.borrow().is_some() {
                    return;
                }
                if let Err(err) = self.process_raw_key(path, &hit, progress) {
                    *pipeline_err.borrow_mut() = Some(err);
                }
            },
        )?;
        if let Some(err) = pipeline_err.into_inner() {
            return Err(err);
        }
        self.stats.add_file(outcome.bytes, outcome.chunks_skipped);
        Ok(outcome.bytes)
    }

    fn process_candidate(
        &self,
        path: &Path,
        candidate: &CandidatePhrase,
        progress: Option<&Sender<ScanProgress>>,
    ) -> Result<()> {
        let wordlist = self.wordlists.get(candidate.lang_id);
        let validator = MnemonicValidator::new(wordlist, self.config.max_repeated_words);
        if !validator.validate(candidate) {
            return Ok(());
        }
        let validated = validator.promote(candidate);

        // Point query first; drop the lock before the expensive stretching
        {
            let dedup = self.lock_dedup()?;
            if dedup.seen(&validated.phrase)? {
                self.stats.add_duplicate();
                return Ok(());
            }
        }

        let seed = match validated.seed() {
            Ok(seed) => seed,
            Err(err) => {
                self.stats.add_error();
                tracing::warn!(phrase_offset = validated.offset, "seed stretching failed: {err}");
                return Ok(());
            }
        };
        let chains = match self.engine.derive_seed(&seed) {
            Ok(chains) => chains,
            Err(err) => {
                self.stats.add_error();
                tracing::warn!(phrase_offset = validated.offset, "derivation failed: {err}");
                return Ok(());
            }
        };

        let record = DiscoveryRecord {
            source: path.to_path_buf(),
            offset: validated.offset,
            input: DiscoveredInput::Mnemonic {
                phrase: validated.phrase.clone(),
                language: validated.language.clone(),
            },
            chains,
        };

        self.lock_dedup()?.record(&validated.phrase)?;
        self.lock_sink()?.emit(&record)?;
        self.stats.add_phrase();
        tracing::info!(
            file = %path.display(),
            offset = validated.offset,
            language = %validated.language,
            "validated mnemonic found"
        );
        if let Some(tx) = progress {
            let _ = tx.blocking_send(ScanProgress::Discovery(record));
        }
        Ok(())
    }

    fn process_raw_key(
        &self,
        path: &Path,
        hit: &RawKeyHit,
        progress: Option<&Sender<ScanProgress>>,
    ) -> Result<()> {
        let chains = match self.engine.derive_raw_key(&hit.key_hex) {
            Ok(chains) => chains,
            Err(err) => {
                // Random 64-hex junk lands here; worth counting, not failing
                self.stats.add_error();
                tracing::warn!(file = %path.display(), offset = hit.offset, "raw key rejected: {err}");
                return Ok(());
            }
        };

        let record = DiscoveryRecord {
            source: path.to_path_buf(),
            offset: hit.offset,
            input: DiscoveredInput::RawKey {
                key: hit.key_hex.clone(),
            },
            chains,
        };

        self.lock_sink()?.emit(&record)?;
        self.stats.add_key();
        tracing::info!(file = %path.display(), offset = hit.offset, "raw private key found");
        if let Some(tx) = progress {
            let _ = tx.blocking_send(ScanProgress::Discovery(record));
        }
        Ok(())
    }

    /// Exclusion policy applied before a file reaches the scanner
    fn excluded(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let dotted = format!(".{}", ext.to_string_lossy().to_lowercase());
            if self.config.bad_extensions.iter().any(|bad| *bad == dotted) {
                return true;
            }
        }
        let full = path.to_string_lossy().to_lowercase();
        if self
            .config
            .bad_path_fragments
            .iter()
            .any(|bad| !bad.is_empty() && full.contains(&bad.to_lowercase()))
        {
            return true;
        }
        if let Some(stem) = path.file_stem() {
            let stem = stem.to_string_lossy().to_lowercase();
            if self
                .config
                .bad_file_stems
                .iter()
                .any(|bad| !bad.is_empty() && stem.contains(&bad.to_lowercase()))
            {
                return true;
            }
        }
        false
    }

    fn lock_dedup(&self) -> Result<std::sync::MutexGuard<'_, DedupStore>> {
        self.dedup
            .lock()
            .map_err(|_| ScanError::Lock("dedup store".to_string()))
    }

    fn lock_sink(&self) -> Result<std::sync::MutexGuard<'_, dyn ReportSink + 'static>> {
        self.sink
            .lock()
            .map_err(|_| ScanError::Lock("report sink".to_string()))
    }
}

/// Top-level subdirectories become recursive units; the root's direct files
/// form one extra non-recursive unit
fn partition_units(root: &Path) -> Result<Vec<Unit>> {
    let mut units = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            units.push(Unit {
                path: entry.path(),
                recursive: true,
            });
        }
    }
    units.push(Unit {
        path: root.to_path_buf(),
        recursive: false,
    });
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::DedupStore;
    use crate::report::VecReportSink;
    use crate::wordlist::testutil::english_store;
    use std::time::{SystemTime, UNIX_EPOCH};

    const VECTOR_12: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const ANVIL_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn temp_dir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        dir.push(format!("seedscan_orch_{unique}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn orchestrator(config: ScanConfig) -> (Orchestrator, Arc<Mutex<VecReportSink>>) {
        let sink = Arc::new(Mutex::new(VecReportSink::default()));
        let orch = Orchestrator::new(
            config,
            english_store(),
            DerivationEngine::with_default_catalogue(),
            DedupStore::open_in_memory(16).unwrap(),
            sink.clone(),
        );
        (orch, sink)
    }

    #[test]
    fn test_end_to_end_discovery_and_dedup() {
        let root = temp_dir();
        let unit_a = root.join("docs");
        let unit_b = root.join("dumps");
        fs::create_dir_all(&unit_a).unwrap();
        fs::create_dir_all(&unit_b).unwrap();
        fs::write(unit_a.join("note.txt"), format!("{VECTOR_12}\n")).unwrap();
        fs::write(unit_a.join("copy.txt"), format!("{VECTOR_12}\n")).unwrap();
        fs::write(unit_b.join("env.bin"), format!("PRIVATE_KEY={ANVIL_KEY}\n")).unwrap();
        // Excluded by extension even though it contains the phrase
        fs::write(root.join("image.jpg"), VECTOR_12).unwrap();

        let (orch, sink) = orchestrator(ScanConfig::default());
        let snapshot = orch.run(&root, None).unwrap();

        let guard = sink.lock().unwrap();
        let records = &guard.records;
        let phrases: Vec<_> = records
            .iter()
            .filter(|r| matches!(r.input, DiscoveredInput::Mnemonic { .. }))
            .collect();
        let keys: Vec<_> = records
            .iter()
            .filter(|r| matches!(r.input, DiscoveredInput::RawKey { .. }))
            .collect();

        // Same phrase in two files derives exactly once
        assert_eq!(phrases.len(), 1);
        assert_eq!(keys.len(), 1);
        assert_eq!(snapshot.phrases_found, 1);
        assert_eq!(snapshot.keys_found, 1);
        assert_eq!(snapshot.duplicates_skipped, 1);
        assert_eq!(snapshot.files_processed, 3);
        assert_eq!(snapshot.errors, 0);

        // The record carries the full catalogue in order
        match &phrases[0].input {
            DiscoveredInput::Mnemonic { phrase, language } => {
                assert_eq!(phrase, VECTOR_12);
                assert_eq!(language, "english");
            }
            _ => unreachable!(),
        }
        assert!(!phrases[0].chains.is_empty());
        assert_eq!(
            keys[0].chains[0].addresses[0].address,
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn test_previously_seen_phrase_is_not_rederived() {
        let root = temp_dir();
        fs::write(root.join("wallet.txt"), VECTOR_12).unwrap();

        let sink = Arc::new(Mutex::new(VecReportSink::default()));
        let mut dedup = DedupStore::open_in_memory(16).unwrap();
        dedup.record(VECTOR_12).unwrap();
        let orch = Orchestrator::new(
            ScanConfig::default(),
            english_store(),
            DerivationEngine::with_default_catalogue(),
            dedup,
            sink.clone(),
        );
        let snapshot = orch.run(&root, None).unwrap();

        assert_eq!(snapshot.phrases_found, 0);
        assert_eq!(snapshot.duplicates_skipped, 1);
        assert!(sink.lock().unwrap().records.is_empty());
    }

    #[test]
    fn test_excluded_stems_are_skipped() {
        let root = temp_dir();
        fs::write(root.join("ok.txt"), VECTOR_12).unwrap();
        let mut config = ScanConfig::default();
        config.bad_file_stems = vec!["secret".to_string()];
        fs::write(root.join("secret-stuff.txt"), VECTOR_12).unwrap();

        let (orch, sink) = orchestrator(config);
        let snapshot = orch.run(&root, None).unwrap();
        assert_eq!(snapshot.files_processed, 1);
        assert_eq!(sink.lock().unwrap().records.len(), 1);
    }

    #[test]
    fn test_raw_keys_can_be_disabled() {
        let root = temp_dir();
        fs::write(root.join("env.txt"), format!("{ANVIL_KEY}\n")).unwrap();

        let mut config = ScanConfig::default();
        config.scan_raw_keys = false;
        let (orch, sink) = orchestrator(config);
        let snapshot = orch.run(&root, None).unwrap();
        assert_eq!(snapshot.keys_found, 0);
        assert!(sink.lock().unwrap().records.is_empty());
    }

    #[test]
    fn test_cancelled_run_still_flushes() {
        let root = temp_dir();
        fs::write(root.join("wallet.txt"), VECTOR_12).unwrap();

        let (orch, _sink) = orchestrator(ScanConfig::default());
        orch.cancel_token().store(true, Ordering::Relaxed);
        let snapshot = orch.run(&root, None).unwrap();
        // Nothing dispatched after the flag, and the run still completed
        assert_eq!(snapshot.phrases_found, 0);
    }

    #[test]
    fn test_missing_root_is_config_error() {
        let (orch, _sink) = orchestrator(ScanConfig::default());
        let missing = PathBuf::from("/definitely/not/here");
        assert!(matches!(
            orch.run(&missing, None),
            Err(ScanError::Config(_))
        ));
    }
}
