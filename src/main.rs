use anyhow::Context;
use clap::Parser;
use seedscan::cli::Args;
use seedscan::dedup::DedupStore;
use seedscan::derive::DerivationEngine;
use seedscan::orchestrator::Orchestrator;
use seedscan::report::{LogReportSink, NullReportSink};
use seedscan::types::ScanProgress;
use seedscan::wordlist::WordlistStore;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Err(e) = args.validate() {
        eprintln!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = args.to_config().context("loading configuration")?;
    let wordlists = WordlistStore::load_dir(&config.wordlist_dir, &config.languages)
        .context("loading wordlists")?;
    let engine = DerivationEngine::with_default_catalogue();
    let dedup = if args.memory_db {
        DedupStore::open_in_memory(config.batch_size)
    } else {
        if let Some(parent) = args.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        DedupStore::open(&args.db_path, config.batch_size)
    }
    .context("opening dedup store")?;

    println!("seedscan v0.1.0");
    println!("{}", "=".repeat(60));
    println!("  Directory:     {}", args.directory.display());
    println!(
        "  Threads:       {}",
        if config.num_threads == 0 {
            "auto".to_string()
        } else {
            config.num_threads.to_string()
        }
    );
    println!("  Languages:     {}", config.languages.join(", "));
    println!("  Chain sizes:   {:?}", config.chain_sizes);
    println!("  Chunk size:    {} KiB", config.chunk_size / 1024);
    println!("  Raw key scan:  {}", config.scan_raw_keys);
    println!(
        "  Dedup store:   {}",
        if args.memory_db {
            "in-memory".to_string()
        } else {
            args.db_path.display().to_string()
        }
    );
    println!();

    let orchestrator = if args.no_logs {
        Orchestrator::new(
            config,
            wordlists,
            engine,
            dedup,
            Arc::new(Mutex::new(NullReportSink)),
        )
    } else {
        let sink = LogReportSink::new(&args.log_dir).context("creating report sink")?;
        Orchestrator::new(config, wordlists, engine, dedup, Arc::new(Mutex::new(sink)))
    };
    let orchestrator = Arc::new(orchestrator);

    let cancel = orchestrator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping dispatch and flushing");
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let (tx, mut rx) = tokio::sync::mpsc::channel(256);
    let root = args.directory.clone();
    let worker = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::task::spawn_blocking(move || orchestrator.run(&root, Some(tx)))
    };

    let mut files = 0u64;
    let mut bytes = 0u64;
    while let Some(update) = rx.recv().await {
        match update {
            ScanProgress::FileScanned(n) => {
                files += 1;
                bytes += n;
                if files % 1000 == 0 {
                    tracing::info!(files, bytes, "scan progress");
                }
            }
            ScanProgress::UnitCompleted(path) => {
                tracing::info!(unit = %path.display(), "unit completed");
            }
            ScanProgress::UnitError(path, err) => {
                tracing::warn!(unit = %path.display(), "unit failed: {err}");
            }
            ScanProgress::Discovery(record) => {
                tracing::info!(
                    source = %record.source.display(),
                    offset = record.offset,
                    "discovery reported"
                );
            }
        }
    }

    let snapshot = worker.await.context("scan task panicked")??;
    println!();
    println!("Scan complete.");
    println!("  {}", snapshot);
    Ok(())
}
