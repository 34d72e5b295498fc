// src/lib.rs

//! matrix-sync library
//!
//! Downloads the NDW matrix sign feed, merges its per-field events into one
//! record per physical sign and replaces the stored snapshot atomically.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
