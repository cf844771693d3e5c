use crate::error::{Result, ScanError};
use crate::types::ScanConfig;
use clap::Parser;
use std::fs;
use std::path::PathBuf;

/// Filesystem scanner for mnemonic seed phrases and raw private keys
#[derive(Parser, Debug, Clone)]
#[command(name = "seedscan")]
#[command(version = "0.1.0")]
#[command(about = "Scan directory trees for seed phrases and private keys", long_about = None)]
pub struct Args {
    /// Root directory to scan
    #[arg(short = 'd', long = "directory", value_name = "DIR")]
    pub directory: PathBuf,

    /// Number of worker threads (0 = one per CPU core)
    #[arg(short = 't', long = "threads", default_value = "0")]
    pub threads: usize,

    /// Directory holding one <language>.txt wordlist per enabled language
    #[arg(long = "wordlist-dir", default_value = "wordlist")]
    pub wordlist_dir: PathBuf,

    /// Directory for report log files
    #[arg(long = "log-dir", default_value = "logs")]
    pub log_dir: PathBuf,

    /// Enabled wordlist languages
    #[arg(long = "languages", value_delimiter = ',', default_value = "english")]
    pub languages: Vec<String>,

    /// Chunk size for file reads, in KiB
    #[arg(long = "chunk-kb", default_value = "1024")]
    pub chunk_kb: usize,

    /// Keep the dedup store in memory (faster, not crash-safe)
    #[arg(long = "memory-db")]
    pub memory_db: bool,

    /// Dedup store file (ignored with --memory-db)
    #[arg(long = "db-path", default_value = "logs/phrases.db")]
    pub db_path: PathBuf,

    /// Disable raw private key scanning
    #[arg(long = "no-raw-keys")]
    pub no_raw_keys: bool,

    /// Disable report log files (console reporting only)
    #[arg(long = "no-logs")]
    pub no_logs: bool,

    /// JSON config file for the full configuration surface; CLI flags
    /// override its values
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Validate the arguments
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.directory.as_os_str().is_empty() {
            return Err("scan directory cannot be empty".to_string());
        }
        if self.chunk_kb == 0 {
            return Err("chunk-kb must be greater than 0".to_string());
        }
        if self.languages.is_empty() {
            return Err("at least one language must be enabled".to_string());
        }
        Ok(())
    }

    /// Chunk size in bytes
    pub fn chunk_bytes(&self) -> usize {
        self.chunk_kb * 1024
    }

    /// Build the scan configuration: config file first (when given), then
    /// CLI flags on top
    pub fn to_config(&self) -> Result<ScanConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)?;
                serde_json::from_str(&text).map_err(|e| {
                    ScanError::Config(format!("bad config file {}: {}", path.display(), e))
                })?
            }
            None => ScanConfig::default(),
        };
        config.languages = self.languages.clone();
        config.wordlist_dir = self.wordlist_dir.clone();
        config.chunk_size = self.chunk_bytes();
        config.num_threads = self.threads;
        config.scan_raw_keys = !self.no_raw_keys;
        config.validate().map_err(ScanError::Config)?;
        Ok(config)
    }
}
