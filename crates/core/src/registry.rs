use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::domain::{Album, NewAlbum};
use crate::error::{Error, Result};

/// Serializes the two writers of album orders: new-album allocation and
/// reorder commits. Whichever holds it sees a stable set of orders.
#[derive(Debug, Default)]
pub struct OrderLock(Mutex<()>);

impl OrderLock {
    pub fn acquire(&self) -> Result<MutexGuard<'_, ()>> {
        self.0.lock().map_err(|_| Error::LockPoisoned("album order lock"))
    }
}

/// Resolves album names to albums, creating each album exactly once.
pub struct AlbumRegistry<C> {
    catalog: Arc<C>,
    order_lock: Arc<OrderLock>,
    /// One lock per album name currently being created.
    name_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<C: Catalog> AlbumRegistry<C> {
    pub fn new(catalog: Arc<C>, order_lock: Arc<OrderLock>) -> Self {
        Self {
            catalog,
            order_lock,
            name_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Return the album called `name`, creating it with the next free order if absent.
    ///
    /// Concurrent calls for the same new name serialize on a per-name lock and
    /// re-check inside it, so at most one album is created. Calls for different
    /// names only contend while the new order is allocated.
    pub fn resolve_or_create(&self, name: &str) -> Result<Album> {
        if let Some(album) = self.catalog.find_album_by_name(name)? {
            return Ok(album);
        }

        let name_lock = self.name_lock(name)?;
        let resolved = self.create_under(&name_lock, name);
        self.release_name_lock(name, name_lock);
        resolved
    }

    fn create_under(&self, name_lock: &Mutex<()>, name: &str) -> Result<Album> {
        let _held = name_lock
            .lock()
            .map_err(|_| Error::LockPoisoned("album name lock"))?;

        if let Some(album) = self.catalog.find_album_by_name(name)? {
            debug!(album = %name, "album created by a concurrent upload");
            return Ok(album);
        }

        let created = {
            let _orders = self.order_lock.acquire()?;
            let order = next_order(&self.catalog.list_albums()?)?;
            self.catalog.insert_album(&NewAlbum {
                name: name.to_string(),
                order,
            })
        };

        match created {
            Ok(album) => {
                info!(album = %album.name, id = %album.id, order = album.order, "created album");
                Ok(album)
            }
            // Another catalog handle won the insert; the stored row is authoritative.
            Err(Error::AlbumNameTaken(_)) => self
                .catalog
                .find_album_by_name(name)?
                .ok_or_else(|| Error::AlbumNameTaken(name.to_string())),
            Err(e) => Err(e),
        }
    }

    fn name_lock(&self, name: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .name_locks
            .lock()
            .map_err(|_| Error::LockPoisoned("album name lock table"))?;
        Ok(locks.entry(name.to_string()).or_default().clone())
    }

    /// Drop the table entry once no other caller holds or waits on it.
    fn release_name_lock(&self, name: &str, name_lock: Arc<Mutex<()>>) {
        let Ok(mut locks) = self.name_locks.lock() else {
            return;
        };
        // One count for the table, one for `name_lock`.
        if Arc::strong_count(&name_lock) == 2 {
            locks.remove(name);
        }
    }

    #[cfg(test)]
    fn pending_name_locks(&self) -> usize {
        self.name_locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }
}

/// `max(order) + 1`, or `0` for an empty catalog.
pub fn next_order(albums: &[Album]) -> Result<i64> {
    match albums.iter().map(|a| a.order).max() {
        None => Ok(0),
        Some(max) => max.checked_add(1).ok_or(Error::OrderSpaceExhausted(max)),
    }
}
