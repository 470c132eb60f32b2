pub mod memory;
pub mod schema;
pub mod sqlite;

use std::collections::HashMap;

use crate::domain::*;
use crate::error::Result;

pub use memory::MemoryCatalog;
pub use sqlite::SqliteCatalog;

/// Storage backend for albums and photos.
///
/// Implementations are shared across ingestion workers, so every method takes
/// `&self` and must be safe to call concurrently. Ids are assigned on insert.
pub trait Catalog: Send + Sync {
    // ── Albums ───────────────────────────────────────────────────────

    /// Insert an album and return it with its assigned id.
    /// Fails with `AlbumNameTaken` or `DuplicateOrder` if either key is already held.
    fn insert_album(&self, album: &NewAlbum) -> Result<Album>;

    fn get_album(&self, id: AlbumId) -> Result<Option<Album>>;

    fn find_album_by_name(&self, name: &str) -> Result<Option<Album>>;

    /// All albums, ascending by order.
    fn list_albums(&self) -> Result<Vec<Album>>;

    /// Apply every assignment or none of them. Readers never observe a
    /// partially applied set.
    fn update_album_orders(&self, assignments: &[OrderAssignment]) -> Result<()>;

    // ── Photos ───────────────────────────────────────────────────────

    /// Insert a photo. Fails with `AlbumNotFound` if its album does not exist.
    fn insert_photo(&self, photo: &NewPhoto) -> Result<Photo>;

    fn get_photo(&self, id: PhotoId) -> Result<Option<Photo>>;

    /// Photos of one album, in insertion order.
    fn photos_in_album(&self, album_id: AlbumId) -> Result<Vec<Photo>>;

    /// Like `photos_in_album`, without loading photo content.
    fn photo_infos_in_album(&self, album_id: AlbumId) -> Result<Vec<PhotoInfo>>;

    /// Photo count per album; albums without photos are absent.
    fn photo_counts(&self) -> Result<HashMap<AlbumId, usize>>;

    /// Returns whether a photo was removed.
    fn delete_photo(&self, id: PhotoId) -> Result<bool>;

    fn count_photos(&self) -> Result<usize>;
}
