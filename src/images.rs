//! Random image picks from the per-position folders under `images/`.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use crate::random;

pub const DEFAULT_BATCH: usize = 60;
pub const MAX_BATCH: usize = 200;
const EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

#[derive(thiserror::Error, Debug)]
pub enum ImageError {
    #[error("Image folder not found: {0}")]
    FolderMissing(String),
    #[error("No images found")]
    Empty,
    #[error("Failed to list image folder {folder}: {source}")]
    Listing {
        folder: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Qb,
    Receiver,
}

impl ImageKind {
    /// `receiver` in any case selects receivers; everything else is QB.
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw {
            Some(t) if t.trim().eq_ignore_ascii_case("receiver") => ImageKind::Receiver,
            _ => ImageKind::Qb,
        }
    }

    pub fn folder(self) -> &'static str {
        match self {
            ImageKind::Qb => "QB",
            ImageKind::Receiver => "Receiver",
        }
    }
}

/// Batch size from the `n` query value: default when absent or unparsable,
/// capped at `MAX_BATCH`.
pub fn batch_size(raw: Option<&str>) -> usize {
    raw.and_then(|n| n.trim().parse::<i64>().ok())
        .map(|n| n.clamp(0, MAX_BATCH as i64) as usize)
        .unwrap_or(DEFAULT_BATCH)
}

fn is_image(file: &str) -> bool {
    Path::new(file)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Sorted image file names from a directory listing. The first listing error
/// fails the whole folder rather than yielding a partial list.
fn image_names(
    kind: ImageKind,
    entries: impl IntoIterator<Item = io::Result<OsString>>,
) -> Result<Vec<String>, ImageError> {
    let mut files = Vec::new();
    for entry in entries {
        let name = entry.map_err(|source| ImageError::Listing {
            folder: kind.folder().to_string(),
            source,
        })?;
        if let Some(name) = name.to_str().filter(|n| is_image(n)) {
            files.push(name.to_string());
        }
    }
    files.sort();
    Ok(files)
}

#[derive(Debug, Clone)]
pub struct ImageLibrary {
    root: PathBuf,
}

impl ImageLibrary {
    /// `root` is the directory holding the `QB/` and `Receiver/` folders.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn files(&self, kind: ImageKind) -> Result<Vec<String>, ImageError> {
        let folder = self.root.join(kind.folder());
        let mut dir = tokio::fs::read_dir(&folder)
            .await
            .map_err(|_| ImageError::FolderMissing(kind.folder().to_string()))?;

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await.transpose() {
            let failed = entry.is_err();
            entries.push(entry.map(|e| e.file_name()));
            if failed {
                break;
            }
        }
        image_names(kind, entries)
    }

    pub async fn pick_url(&self, kind: ImageKind) -> Result<String, ImageError> {
        let files = self.files(kind).await?;
        let file = random::uniform(&files).map_err(|_| ImageError::Empty)?;
        Ok(url_for(kind, file))
    }

    pub async fn pick_urls(&self, kind: ImageKind, n: usize) -> Result<Vec<String>, ImageError> {
        let files = self.files(kind).await?;
        if files.is_empty() {
            return Err(ImageError::Empty);
        }
        (0..n)
            .map(|_| {
                random::uniform(&files)
                    .map(|f| url_for(kind, f))
                    .map_err(|_| ImageError::Empty)
            })
            .collect()
    }
}

fn url_for(kind: ImageKind, file: &str) -> String {
    format!("/images/{}/{}", kind.folder(), file)
}
