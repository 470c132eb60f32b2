use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Catalog-assigned album identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(pub i64);

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Catalog-assigned photo identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(pub i64);

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named, ordered grouping of photos sharing a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,
    pub name: String,
    pub order: i64,
}

/// An album that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlbum {
    pub name: String,
    pub order: i64,
}

/// A stored photo. `data` is owned exclusively by this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    pub album_id: AlbumId,
    /// ISO-8601 timestamp used for grouping and display.
    pub date: String,
    pub name: String,
    pub media_type: String,
    pub size: u64,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Photo {
    pub fn info(&self) -> PhotoInfo {
        PhotoInfo {
            id: self.id,
            album_id: self.album_id,
            date: self.date.clone(),
            name: self.name.clone(),
            media_type: self.media_type.clone(),
            size: self.size,
        }
    }
}

/// A stored photo without its content, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoInfo {
    pub id: PhotoId,
    pub album_id: AlbumId,
    pub date: String,
    pub name: String,
    pub media_type: String,
    pub size: u64,
}

/// A photo that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    pub album_id: AlbumId,
    pub date: String,
    pub name: String,
    pub media_type: String,
    pub size: u64,
    pub data: Vec<u8>,
}

/// Descriptor of an uploaded file, as handed over by the file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub name: String,
    /// MIME type, e.g. `image/jpeg`.
    pub media_type: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

impl FileMetadata {
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// One uploaded file: its descriptor plus the raw content.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub meta: FileMetadata,
    pub data: Vec<u8>,
}

/// A single `(album, new order)` pair of a reorder commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAssignment {
    pub album_id: AlbumId,
    pub order: i64,
}

impl OrderAssignment {
    pub fn new(album_id: AlbumId, order: i64) -> Self {
        Self { album_id, order }
    }
}

/// Why a file was left out of ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotAnImage,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotAnImage => write!(f, "not an image"),
        }
    }
}

/// Result of ingesting one file that did not hit a storage error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Ingested { photo: Photo, album: Album },
    Skipped(SkipReason),
}

/// Per-file status inside a [`BatchReport`].
#[derive(Debug)]
pub enum FileStatus {
    Ingested {
        photo_id: PhotoId,
        album_id: AlbumId,
        album_name: String,
    },
    Skipped(SkipReason),
    Failed(Error),
}

#[derive(Debug)]
pub struct FileReport {
    pub file_name: String,
    pub status: FileStatus,
}

/// Outcome of a batch upload, one entry per input file in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn ingested(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Ingested { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.status)).count()
    }
}

/// Album plus the number of photos it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumSummary {
    #[serde(flatten)]
    pub album: Album,
    pub photo_count: usize,
}
