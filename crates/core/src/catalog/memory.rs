use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::Catalog;
use crate::domain::*;
use crate::error::{Error, Result};

/// In-process catalog. Nothing survives the value being dropped.
///
/// All state sits behind one `RwLock`; a reorder is computed on a copy and
/// swapped in under the write lock, so readers see it whole or not at all.
#[derive(Default)]
pub struct MemoryCatalog {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    last_album_id: i64,
    last_photo_id: i64,
    albums: BTreeMap<AlbumId, Album>,
    photos: BTreeMap<PhotoId, Photo>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| Error::LockPoisoned("memory catalog"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| Error::LockPoisoned("memory catalog"))
    }
}

impl Catalog for MemoryCatalog {
    fn insert_album(&self, album: &NewAlbum) -> Result<Album> {
        let mut state = self.write()?;
        if state.albums.values().any(|a| a.name == album.name) {
            return Err(Error::AlbumNameTaken(album.name.clone()));
        }
        if state.albums.values().any(|a| a.order == album.order) {
            return Err(Error::DuplicateOrder(album.order));
        }

        state.last_album_id += 1;
        let stored = Album {
            id: AlbumId(state.last_album_id),
            name: album.name.clone(),
            order: album.order,
        };
        state.albums.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn get_album(&self, id: AlbumId) -> Result<Option<Album>> {
        Ok(self.read()?.albums.get(&id).cloned())
    }

    fn find_album_by_name(&self, name: &str) -> Result<Option<Album>> {
        Ok(self
            .read()?
            .albums
            .values()
            .find(|a| a.name == name)
            .cloned())
    }

    fn list_albums(&self) -> Result<Vec<Album>> {
        let mut albums: Vec<Album> = self.read()?.albums.values().cloned().collect();
        albums.sort_by_key(|a| (a.order, a.id));
        Ok(albums)
    }

    fn update_album_orders(&self, assignments: &[OrderAssignment]) -> Result<()> {
        let mut state = self.write()?;

        let mut staged = state.albums.clone();
        for assignment in assignments {
            let album = staged
                .get_mut(&assignment.album_id)
                .ok_or(Error::AlbumNotFound(assignment.album_id))?;
            album.order = assignment.order;
        }

        let mut seen = HashSet::with_capacity(staged.len());
        for album in staged.values() {
            if !seen.insert(album.order) {
                return Err(Error::DuplicateOrder(album.order));
            }
        }

        state.albums = staged;
        Ok(())
    }

    fn insert_photo(&self, photo: &NewPhoto) -> Result<Photo> {
        let mut state = self.write()?;
        if !state.albums.contains_key(&photo.album_id) {
            return Err(Error::AlbumNotFound(photo.album_id));
        }

        state.last_photo_id += 1;
        let stored = Photo {
            id: PhotoId(state.last_photo_id),
            album_id: photo.album_id,
            date: photo.date.clone(),
            name: photo.name.clone(),
            media_type: photo.media_type.clone(),
            size: photo.size,
            data: photo.data.clone(),
        };
        state.photos.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn get_photo(&self, id: PhotoId) -> Result<Option<Photo>> {
        Ok(self.read()?.photos.get(&id).cloned())
    }

    fn photos_in_album(&self, album_id: AlbumId) -> Result<Vec<Photo>> {
        Ok(self
            .read()?
            .photos
            .values()
            .filter(|p| p.album_id == album_id)
            .cloned()
            .collect())
    }

    fn photo_infos_in_album(&self, album_id: AlbumId) -> Result<Vec<PhotoInfo>> {
        Ok(self
            .read()?
            .photos
            .values()
            .filter(|p| p.album_id == album_id)
            .map(Photo::info)
            .collect())
    }

    fn photo_counts(&self) -> Result<HashMap<AlbumId, usize>> {
        let state = self.read()?;
        let mut counts = HashMap::new();
        for photo in state.photos.values() {
            *counts.entry(photo.album_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn delete_photo(&self, id: PhotoId) -> Result<bool> {
        Ok(self.write()?.photos.remove(&id).is_some())
    }

    fn count_photos(&self) -> Result<usize> {
        Ok(self.read()?.photos.len())
    }
}
