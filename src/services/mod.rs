//! Service layer for the sign snapshot pipeline.
//!
//! This module contains the I/O collaborators the pipeline drives:
//! - Feed retrieval (`FeedFetcher`)
//! - Gzip decompression through on-disk artifacts (`Decompressor`)
//! - Markup parsing into a generic tree (`parse_document`)

mod archive;
mod feed;
mod markup;

pub use archive::Decompressor;
pub use feed::FeedFetcher;
pub use markup::{XmlNode, parse_document};
