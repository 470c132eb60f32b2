pub mod catalog;
pub mod domain;
pub mod error;
pub mod grouping;
pub mod ingest;
pub mod ordering;
pub mod registry;

use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;

use tracing::info;

use catalog::{Catalog, MemoryCatalog, SqliteCatalog};
use domain::*;
use error::{Error, Result};
use ingest::PhotoIngestor;
use ordering::OrderingService;
use registry::{AlbumRegistry, OrderLock};

/// Callback events for a batch upload.
pub enum UploadProgress {
    /// Starting an upload of `total` files.
    Start { total: usize },
    /// A file has been handled, successfully or not.
    FileDone { file_name: String },
    /// Upload finished.
    Complete {
        ingested: usize,
        skipped: usize,
        failed: usize,
    },
}

/// The main entry point: albums and photos over one catalog.
pub struct Library<C> {
    catalog: Arc<C>,
    ingestor: PhotoIngestor<C>,
    ordering: OrderingService<C>,
}

impl Library<SqliteCatalog> {
    /// Open or create a library backed by a SQLite catalog at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::with_catalog(Arc::new(SqliteCatalog::open(path)?)))
    }
}

impl Library<MemoryCatalog> {
    /// A library that lives only as long as the value.
    pub fn in_memory() -> Self {
        Self::with_catalog(Arc::new(MemoryCatalog::new()))
    }
}

impl<C: Catalog> Library<C> {
    pub fn with_catalog(catalog: Arc<C>) -> Self {
        let order_lock = Arc::new(OrderLock::default());
        let registry = Arc::new(AlbumRegistry::new(catalog.clone(), order_lock.clone()));
        Self {
            ingestor: PhotoIngestor::new(catalog.clone(), registry),
            ordering: OrderingService::new(catalog.clone(), order_lock),
            catalog,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Ingest a batch of files concurrently. Calls `progress_cb` with progress updates if provided.
    ///
    /// `FileDone` events arrive as workers finish, in completion order.
    pub fn upload(
        &self,
        files: Vec<UploadedFile>,
        progress_cb: Option<&mut dyn FnMut(UploadProgress)>,
    ) -> BatchReport {
        let report = match progress_cb {
            None => self.ingestor.ingest_batch(files),
            Some(cb) => self.upload_reporting(files, cb),
        };

        info!(
            ingested = report.ingested(),
            skipped = report.skipped(),
            failed = report.failed(),
            "upload finished"
        );
        report
    }

    fn upload_reporting(
        &self,
        files: Vec<UploadedFile>,
        cb: &mut dyn FnMut(UploadProgress),
    ) -> BatchReport {
        cb(UploadProgress::Start { total: files.len() });

        // The callback is not Send: workers hand file names back to this thread.
        let (tx, rx) = mpsc::channel();
        let report = thread::scope(|s| {
            let worker = s.spawn(move || {
                self.ingestor.ingest_batch_with(files, |file| {
                    let _ = tx.send(file.file_name.clone());
                })
            });
            for file_name in rx {
                cb(UploadProgress::FileDone { file_name });
            }
            worker
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
        });

        cb(UploadProgress::Complete {
            ingested: report.ingested(),
            skipped: report.skipped(),
            failed: report.failed(),
        });
        report
    }

    /// Ingest a single file.
    pub fn ingest(&self, file: &FileMetadata, data: Vec<u8>) -> Result<IngestOutcome> {
        self.ingestor.ingest(file, data)
    }

    /// All albums in display order.
    pub fn albums(&self) -> Result<Vec<Album>> {
        self.catalog.list_albums()
    }

    /// All albums in display order, with their photo counts.
    pub fn album_summaries(&self) -> Result<Vec<AlbumSummary>> {
        let counts = self.catalog.photo_counts()?;
        Ok(self
            .catalog
            .list_albums()?
            .into_iter()
            .map(|album| AlbumSummary {
                photo_count: counts.get(&album.id).copied().unwrap_or(0),
                album,
            })
            .collect())
    }

    pub fn album(&self, id: AlbumId) -> Result<Album> {
        self.catalog.get_album(id)?.ok_or(Error::AlbumNotFound(id))
    }

    pub fn photos_in_album(&self, id: AlbumId) -> Result<Vec<Photo>> {
        self.album(id)?;
        self.catalog.photos_in_album(id)
    }

    /// Photos of one album without their content.
    pub fn photo_infos_in_album(&self, id: AlbumId) -> Result<Vec<PhotoInfo>> {
        self.album(id)?;
        self.catalog.photo_infos_in_album(id)
    }

    pub fn photo(&self, id: PhotoId) -> Result<Photo> {
        self.catalog.get_photo(id)?.ok_or(Error::PhotoNotFound(id))
    }

    /// Delete one photo. Its album stays, even when left empty.
    pub fn delete_photo(&self, id: PhotoId) -> Result<()> {
        if self.catalog.delete_photo(id)? {
            Ok(())
        } else {
            Err(Error::PhotoNotFound(id))
        }
    }

    /// Commit new orders for a set of albums, all or nothing.
    pub fn commit_order(&self, assignments: &[OrderAssignment]) -> Result<()> {
        self.ordering.commit_order(assignments)
    }

    /// Commit a drag-and-drop result: album ids in their new display sequence.
    pub fn reorder(&self, sequence: &[AlbumId]) -> Result<()> {
        self.ordering.reorder(sequence)
    }
}
