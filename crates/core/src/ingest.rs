use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::domain::*;
use crate::error::Result;
use crate::grouping::album_name_for;
use crate::registry::AlbumRegistry;

/// Turns uploaded files into stored photos attached to their date album.
pub struct PhotoIngestor<C> {
    catalog: Arc<C>,
    registry: Arc<AlbumRegistry<C>>,
}

impl<C: Catalog> PhotoIngestor<C> {
    pub fn new(catalog: Arc<C>, registry: Arc<AlbumRegistry<C>>) -> Self {
        Self { catalog, registry }
    }

    /// Ingest one file.
    ///
    /// Non-image media types are skipped, not rejected. The photo is dated by
    /// the file's last-modified time, or now when the file has none. The album
    /// exists (with its id) before the photo row referencing it is written.
    pub fn ingest(&self, file: &FileMetadata, data: Vec<u8>) -> Result<IngestOutcome> {
        if !file.is_image() {
            warn!(file = %file.name, media_type = %file.media_type, "skipping non-image file");
            return Ok(IngestOutcome::Skipped(SkipReason::NotAnImage));
        }

        let taken_at = file.last_modified.unwrap_or_else(Utc::now);
        let date = taken_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        let album = self.registry.resolve_or_create(&album_name_for(&date))?;

        let photo = self.catalog.insert_photo(&NewPhoto {
            album_id: album.id,
            date,
            name: file.name.clone(),
            media_type: file.media_type.clone(),
            size: file.size,
            data,
        })?;

        debug!(file = %photo.name, photo = %photo.id, album = %album.name, "photo ingested");
        Ok(IngestOutcome::Ingested { photo, album })
    }

    /// Ingest every file on the rayon pool. One report per file, in input
    /// order; a failing file does not affect the others.
    pub fn ingest_batch(&self, files: Vec<UploadedFile>) -> BatchReport {
        self.ingest_batch_with(files, |_| {})
    }

    /// Like [`ingest_batch`](Self::ingest_batch), calling `on_file` from the
    /// worker as soon as each file is handled, in completion order.
    pub fn ingest_batch_with<F>(&self, files: Vec<UploadedFile>, on_file: F) -> BatchReport
    where
        F: Fn(&FileReport) + Sync,
    {
        let files = files
            .into_par_iter()
            .map(|file| {
                let file_name = file.meta.name.clone();
                let status = match self.ingest(&file.meta, file.data) {
                    Ok(IngestOutcome::Ingested { photo, album }) => FileStatus::Ingested {
                        photo_id: photo.id,
                        album_id: album.id,
                        album_name: album.name,
                    },
                    Ok(IngestOutcome::Skipped(reason)) => FileStatus::Skipped(reason),
                    Err(e) => {
                        warn!(file = %file_name, error = %e, "failed to ingest file");
                        FileStatus::Failed(e)
                    }
                };
                let report = FileReport { file_name, status };
                on_file(&report);
                report
            })
            .collect();

        BatchReport { files }
    }
}
