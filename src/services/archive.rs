// src/services/archive.rs

//! Gzip decompression through on-disk artifacts.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

use crate::error::{AppError, Result};
use crate::models::PathsConfig;
use crate::utils::remove_artifact;

/// Expands the downloaded archive into a markup file next to it.
#[derive(Debug, Clone)]
pub struct Decompressor {
    archive_path: PathBuf,
    markup_path: PathBuf,
}

impl Decompressor {
    pub fn new(archive_path: impl Into<PathBuf>, markup_path: impl Into<PathBuf>) -> Self {
        Self {
            archive_path: archive_path.into(),
            markup_path: markup_path.into(),
        }
    }

    pub fn from_paths(paths: &PathsConfig) -> Self {
        Self::new(paths.archive_path(), paths.markup_path())
    }

    pub fn markup_path(&self) -> &Path {
        &self.markup_path
    }

    /// Store `bytes` as the archive, decompress it and return the markup text.
    ///
    /// Decompression runs on the blocking pool and is awaited, so a corrupt
    /// or truncated archive surfaces as [`AppError::Decompress`].
    pub async fn expand(&self, bytes: &[u8]) -> Result<String> {
        if let Some(parent) = self.archive_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if let Some(parent) = self.markup_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.archive_path, bytes).await?;

        let archive = self.archive_path.clone();
        let markup = self.markup_path.clone();
        let written = tokio::task::spawn_blocking(move || gunzip(&archive, &markup))
            .await
            .map_err(|e| AppError::decompress(self.archive_path.display(), e))?
            .map_err(|e| AppError::decompress(self.archive_path.display(), e))?;

        log::info!(
            "Decompressed {} -> {} ({} bytes)",
            self.archive_path.display(),
            self.markup_path.display(),
            written
        );

        let bytes = tokio::fs::read(&self.markup_path).await?;
        String::from_utf8(bytes).map_err(|e| {
            AppError::decompress(self.markup_path.display(), format!("not valid UTF-8: {e}"))
        })
    }

    /// Remove both artifacts. Failures are logged, never returned.
    pub async fn cleanup(&self) {
        remove_artifact(&self.archive_path).await;
        remove_artifact(&self.markup_path).await;
    }
}

fn gunzip(archive: &Path, markup: &Path) -> io::Result<u64> {
    let mut decoder = MultiGzDecoder::new(BufReader::new(File::open(archive)?));
    let mut writer = BufWriter::new(File::create(markup)?);
    let written = io::copy(&mut decoder, &mut writer)?;
    writer.flush()?;
    Ok(written)
}
