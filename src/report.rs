//! Report sinks.
//!
//! The pipeline's contract is to hand every discovery record, exactly once
//! per unique validated input, to a sink behind the shared report lock. The
//! bundled sink mirrors the classic log layout: a seed list, a full log, one
//! address file per chain, a raw-key list, and a machine-readable JSONL
//! stream.

use crate::error::{Result, ScanError};
use crate::types::{DiscoveredInput, DiscoveryRecord};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Destination for discovery records
pub trait ReportSink: Send {
    fn emit(&mut self, record: &DiscoveryRecord) -> Result<()>;
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Timestamped log files under one directory
pub struct LogReportSink {
    dir: PathBuf,
    stamp: String,
}

impl LogReportSink {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let stamp = chrono::Local::now().format("%d-%m-%Y_%H-%M-%S").to_string();
        Ok(Self {
            dir: dir.to_path_buf(),
            stamp,
        })
    }

    fn append(&self, name: &str, data: &str) -> Result<()> {
        let path = self.dir.join(name);
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{data}")?;
        Ok(())
    }

    fn full_log_entry(record: &DiscoveryRecord) -> String {
        let mut entry = format!("{}\n", record.source.display());
        match &record.input {
            DiscoveredInput::Mnemonic { phrase, language } => {
                entry.push_str(&format!("{phrase} [{language}]\n"));
            }
            DiscoveredInput::RawKey { key } => {
                entry.push_str(&format!("privkey:{key}\n"));
            }
        }
        for chain in &record.chains {
            for addr in &chain.addresses {
                entry.push_str(&format!("{} {}: {}\n", chain.chain, addr.path, addr.address));
            }
        }
        entry.push_str(&"-".repeat(24));
        entry
    }
}

impl ReportSink for LogReportSink {
    fn emit(&mut self, record: &DiscoveryRecord) -> Result<()> {
        match &record.input {
            DiscoveredInput::Mnemonic { phrase, language } => {
                self.append(&format!("seed-{}.txt", self.stamp), phrase)?;
                self.append(&format!("{}_seed-{}.txt", language, self.stamp), phrase)?;
            }
            DiscoveredInput::RawKey { key } => {
                if let Some(chain) = record.chains.first() {
                    if let Some(addr) = chain.addresses.first() {
                        self.append(
                            &format!("eth-keys-{}.txt", self.stamp),
                            &format!("{}:{}", addr.address, key),
                        )?;
                    }
                }
            }
        }

        for chain in &record.chains {
            let lines: Vec<&str> = chain.addresses.iter().map(|a| a.address.as_str()).collect();
            self.append(
                &format!("{}-addresses-{}.txt", chain.chain, self.stamp),
                &lines.join("\n"),
            )?;
        }

        self.append(
            &format!("full-log-{}.txt", self.stamp),
            &Self::full_log_entry(record),
        )?;

        let json = serde_json::to_string(record)
            .map_err(|e| ScanError::Report(format!("record serialization failed: {e}")))?;
        self.append(&format!("records-{}.jsonl", self.stamp), &json)?;
        Ok(())
    }
}

/// Sink that drops everything (logging disabled)
#[derive(Debug, Default)]
pub struct NullReportSink;

impl ReportSink for NullReportSink {
    fn emit(&mut self, _record: &DiscoveryRecord) -> Result<()> {
        Ok(())
    }
}

/// In-memory sink for tests
#[derive(Debug, Default)]
pub struct VecReportSink {
    pub records: Vec<DiscoveryRecord>,
}

impl ReportSink for VecReportSink {
    fn emit(&mut self, record: &DiscoveryRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChainAddresses, DerivedAddress};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        dir.push(format!("seedscan_report_{unique}"));
        dir
    }

    fn sample_record() -> DiscoveryRecord {
        DiscoveryRecord {
            source: PathBuf::from("/data/wallet.txt"),
            offset: 17,
            input: DiscoveredInput::Mnemonic {
                phrase: "abandon about".to_string(),
                language: "english".to_string(),
            },
            chains: vec![ChainAddresses {
                chain: "bitcoin-44".to_string(),
                addresses: vec![DerivedAddress {
                    path: "m/44'/0'/0'/0/0".to_string(),
                    address: "1BoatSLRHtKNngkdXEeobR76b53LETtpyT".to_string(),
                    private_key: None,
                }],
            }],
        }
    }

    #[test]
    fn test_log_sink_writes_expected_files() {
        let dir = temp_dir();
        let mut sink = LogReportSink::new(&dir).unwrap();
        sink.emit(&sample_record()).unwrap();

        let names: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|n| n.starts_with("seed-")));
        assert!(names.iter().any(|n| n.starts_with("english_seed-")));
        assert!(names.iter().any(|n| n.starts_with("bitcoin-44-addresses-")));
        assert!(names.iter().any(|n| n.starts_with("full-log-")));
        assert!(names.iter().any(|n| n.starts_with("records-")));
    }

    #[test]
    fn test_jsonl_records_parse_back() {
        let dir = temp_dir();
        let mut sink = LogReportSink::new(&dir).unwrap();
        sink.emit(&sample_record()).unwrap();
        sink.emit(&sample_record()).unwrap();

        let jsonl = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .find(|p| p.to_string_lossy().contains("records-"))
            .unwrap();
        let content = fs::read_to_string(jsonl).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: DiscoveryRecord = serde_json::from_str(line).unwrap();
            assert_eq!(parsed.offset, 17);
        }
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink = VecReportSink::default();
        sink.emit(&sample_record()).unwrap();
        assert_eq!(sink.records.len(), 1);
    }
}
