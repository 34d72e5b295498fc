// src/models/mod.rs

//! Domain models for the sign snapshot pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod event;
mod sign;

// Re-export all public types
pub use config::{Config, FeedConfig, LoggingConfig, PathsConfig, StorageBackend, StorageConfig};
pub use event::{
    DisplayAspect, DisplayPayload, EventBody, LaneClosedAhead, LaneLocation, RawSignEvent,
};
pub use sign::{DisplayType, MergeDirection, SignIdentity, SignRecord};
