// src/pipeline/load.rs

//! Snapshot loading.
//!
//! Hands the reconciled signs to a [`SnapshotStore`] in identity order and
//! tallies them per display type for the run report.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::{DisplayType, SignRecord};
use crate::pipeline::SignMap;
use crate::storage::{LoadSummary, SnapshotStore};

/// Replace the stored snapshot with the reconciled signs.
pub async fn load_snapshot(
    store: &mut dyn SnapshotStore,
    signs: SignMap,
) -> Result<LoadSummary> {
    let mut records: Vec<SignRecord> = signs.into_values().collect();
    records.sort_by(|a, b| a.uuid.cmp(&b.uuid));

    let summary = store.replace_all(&records).await?;
    log::info!("Loaded {} signs into {}", summary.count, summary.location);
    Ok(summary)
}

/// Count signs per display type. Every type is present, possibly with zero.
pub fn summarize<'a>(
    signs: impl IntoIterator<Item = &'a SignRecord>,
) -> BTreeMap<DisplayType, usize> {
    let mut counts: BTreeMap<DisplayType, usize> =
        DisplayType::ALL.into_iter().map(|kind| (kind, 0)).collect();
    for sign in signs {
        *counts.entry(sign.display_type).or_default() += 1;
    }
    counts
}
