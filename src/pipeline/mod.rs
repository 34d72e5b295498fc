//! Pipeline stages for the sign snapshot.
//!
//! - `extract_events`: Typed sign events from the parsed feed
//! - `reconcile`: One merged record per physical sign
//! - `load_snapshot`: Atomic replacement of the stored snapshot
//! - `run_sync`: All stages from download to load

pub mod extract;
pub mod load;
pub mod reconcile;
pub mod sync;

pub use extract::extract_events;
pub use load::{load_snapshot, summarize};
pub use reconcile::{SignMap, reconcile};
pub use sync::{SyncReport, run_sync};
