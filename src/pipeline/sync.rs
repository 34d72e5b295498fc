// src/pipeline/sync.rs

//! Full snapshot synchronisation.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::error::Result;
use crate::models::{Config, DisplayType};
use crate::pipeline::{extract_events, load_snapshot, reconcile, summarize};
use crate::services::{Decompressor, FeedFetcher, parse_document};
use crate::storage::SnapshotStore;

const TOTAL_STEPS: usize = 6;

/// Summary of a sync run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub event_count: usize,
    pub sign_count: usize,
    /// Signs written to the store; `None` for a dry run
    pub loaded: Option<usize>,
    pub elapsed_ms: u128,
    pub by_type: BTreeMap<DisplayType, usize>,
}

impl SyncReport {
    /// Log the run summary block.
    pub fn log_summary(&self) {
        log::info!("[SUMMARY] Matrix sign sync");
        log::info!("    Events: {}", self.event_count);
        log::info!("    Signs: {}", self.sign_count);
        for (kind, count) in &self.by_type {
            log::info!("    {}: {}", kind, count);
        }
    }
}

fn step(n: usize, message: &str) {
    log::info!("[STEP {}/{}] {}", n, TOTAL_STEPS, message);
}

/// Run fetch → decompress → parse → extract → reconcile → load.
///
/// Every stage completes before the next begins. Without a store the run
/// stops after reconciliation. Working files are removed afterwards unless
/// `paths.keep_artifacts` is set, whether or not the run succeeded.
pub async fn run_sync(
    config: &Config,
    fetcher: &FeedFetcher,
    store: Option<&mut dyn SnapshotStore>,
) -> Result<SyncReport> {
    let decompressor = Decompressor::from_paths(&config.paths);
    let result = sync_stages(&decompressor, fetcher, store).await;

    if !config.paths.keep_artifacts {
        decompressor.cleanup().await;
    }
    result
}

async fn sync_stages(
    decompressor: &Decompressor,
    fetcher: &FeedFetcher,
    store: Option<&mut dyn SnapshotStore>,
) -> Result<SyncReport> {
    let start = Instant::now();

    step(1, &format!("Fetch - {}", fetcher.describe()));
    let compressed = fetcher.fetch().await?;

    step(2, "Decompress");
    let markup = decompressor.expand(&compressed).await?;
    drop(compressed);

    step(3, "Parse markup");
    let document = parse_document(&markup)?;
    drop(markup);

    step(4, "Extract events");
    let events = extract_events(&document)?;
    drop(document);
    log::info!("Extracted {} sign events", events.len());

    step(5, "Reconcile signs");
    let signs = reconcile(&events)?;
    log::info!(
        "Reconciled {} events into {} signs",
        events.len(),
        signs.len()
    );
    let by_type = summarize(signs.values());
    let sign_count = signs.len();

    let loaded = match store {
        Some(store) => {
            step(6, &format!("Load snapshot - {}", store.location()));
            let summary = load_snapshot(store, signs).await?;
            Some(summary.count)
        }
        None => {
            step(6, "Load snapshot - skipped (dry run)");
            None
        }
    };

    let elapsed_ms = start.elapsed().as_millis();
    match loaded {
        Some(count) => log::info!("{} signs were loaded in {}ms", count, elapsed_ms),
        None => log::info!("{} signs were reconciled in {}ms", sign_count, elapsed_ms),
    }

    Ok(SyncReport {
        event_count: events.len(),
        sign_count,
        loaded,
        elapsed_ms,
        by_type,
    })
}
