use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use super::{schema, Catalog};
use crate::domain::*;
use crate::error::{Error, Result};

/// SQLite-backed catalog for albums and photos.
///
/// A single connection is shared behind a mutex, so each call observes the
/// database either before or after any other call's transaction.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open or create a catalog at the given path with WAL mode.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    /// Open an in-memory catalog (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::initialize(&conn)?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::LockPoisoned("catalog connection"))
    }

    // ── Config ───────────────────────────────────────────────────

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()?
            .query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

impl Catalog for SqliteCatalog {
    fn insert_album(&self, album: &NewAlbum) -> Result<Album> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO albums (name, sort_order) VALUES (?1, ?2)",
            params![album.name, album.order],
        )
        .map_err(|e| match unique_violation(&e).as_deref() {
            Some("albums.name") => Error::AlbumNameTaken(album.name.clone()),
            Some("albums.sort_order") => Error::DuplicateOrder(album.order),
            _ => Error::Database(e),
        })?;
        Ok(Album {
            id: AlbumId(conn.last_insert_rowid()),
            name: album.name.clone(),
            order: album.order,
        })
    }

    fn get_album(&self, id: AlbumId) -> Result<Option<Album>> {
        let album = self
            .conn()?
            .query_row(
                "SELECT id, name, sort_order FROM albums WHERE id = ?1",
                params![id.0],
                album_from_row,
            )
            .optional()?;
        Ok(album)
    }

    fn find_album_by_name(&self, name: &str) -> Result<Option<Album>> {
        let album = self
            .conn()?
            .query_row(
                "SELECT id, name, sort_order FROM albums WHERE name = ?1",
                params![name],
                album_from_row,
            )
            .optional()?;
        Ok(album)
    }

    fn list_albums(&self) -> Result<Vec<Album>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, sort_order FROM albums ORDER BY sort_order, id")?;
        let albums = stmt
            .query_map([], album_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(albums)
    }

    fn update_album_orders(&self, assignments: &[OrderAssignment]) -> Result<()> {
        if assignments.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        // sort_order is UNIQUE and checked per statement, so swaps would collide
        // midway. Park every touched album on a value that is neither stored
        // nor a target before writing the final orders.
        let mut taken: HashSet<i64> = {
            let mut stmt = tx.prepare("SELECT sort_order FROM albums")?;
            let orders = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<HashSet<i64>, _>>()?;
            orders
        };
        taken.extend(assignments.iter().map(|a| a.order));
        let parking = (i64::MIN..=i64::MAX).filter(|order| !taken.contains(order));

        for (assignment, parked) in assignments.iter().zip(parking) {
            let updated = tx.execute(
                "UPDATE albums SET sort_order = ?1 WHERE id = ?2",
                params![parked, assignment.album_id.0],
            )?;
            if updated == 0 {
                return Err(Error::AlbumNotFound(assignment.album_id));
            }
        }

        for assignment in assignments {
            tx.execute(
                "UPDATE albums SET sort_order = ?1 WHERE id = ?2",
                params![assignment.order, assignment.album_id.0],
            )
            .map_err(|e| match unique_violation(&e).as_deref() {
                Some("albums.sort_order") => Error::DuplicateOrder(assignment.order),
                _ => Error::Database(e),
            })?;
        }

        tx.commit()?;
        Ok(())
    }

    fn insert_photo(&self, photo: &NewPhoto) -> Result<Photo> {
        let conn = self.conn()?;
        let album_exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM albums WHERE id = ?1",
                params![photo.album_id.0],
                |row| row.get(0),
            )
            .optional()?;
        if album_exists.is_none() {
            return Err(Error::AlbumNotFound(photo.album_id));
        }

        conn.execute(
            "INSERT INTO photos (album_id, date, name, media_type, size, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                photo.album_id.0,
                photo.date,
                photo.name,
                photo.media_type,
                photo.size as i64,
                photo.data,
            ],
        )?;
        Ok(Photo {
            id: PhotoId(conn.last_insert_rowid()),
            album_id: photo.album_id,
            date: photo.date.clone(),
            name: photo.name.clone(),
            media_type: photo.media_type.clone(),
            size: photo.size,
            data: photo.data.clone(),
        })
    }

    fn get_photo(&self, id: PhotoId) -> Result<Option<Photo>> {
        let photo = self
            .conn()?
            .query_row(
                "SELECT id, album_id, date, name, media_type, size, data FROM photos WHERE id = ?1",
                params![id.0],
                photo_from_row,
            )
            .optional()?;
        Ok(photo)
    }

    fn photos_in_album(&self, album_id: AlbumId) -> Result<Vec<Photo>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, album_id, date, name, media_type, size, data
             FROM photos WHERE album_id = ?1 ORDER BY id",
        )?;
        let photos = stmt
            .query_map(params![album_id.0], photo_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(photos)
    }

    fn photo_infos_in_album(&self, album_id: AlbumId) -> Result<Vec<PhotoInfo>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, album_id, date, name, media_type, size
             FROM photos WHERE album_id = ?1 ORDER BY id",
        )?;
        let infos = stmt
            .query_map(params![album_id.0], |row| {
                Ok(PhotoInfo {
                    id: PhotoId(row.get(0)?),
                    album_id: AlbumId(row.get(1)?),
                    date: row.get(2)?,
                    name: row.get(3)?,
                    media_type: row.get(4)?,
                    size: row.get::<_, i64>(5)? as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(infos)
    }

    fn photo_counts(&self) -> Result<HashMap<AlbumId, usize>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT album_id, COUNT(*) FROM photos GROUP BY album_id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((AlbumId(row.get(0)?), row.get::<_, i64>(1)? as usize))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().collect())
    }

    fn delete_photo(&self, id: PhotoId) -> Result<bool> {
        let removed = self
            .conn()?
            .execute("DELETE FROM photos WHERE id = ?1", params![id.0])?;
        Ok(removed > 0)
    }

    fn count_photos(&self) -> Result<usize> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn album_from_row(row: &Row<'_>) -> rusqlite::Result<Album> {
    Ok(Album {
        id: AlbumId(row.get(0)?),
        name: row.get(1)?,
        order: row.get(2)?,
    })
}

fn photo_from_row(row: &Row<'_>) -> rusqlite::Result<Photo> {
    Ok(Photo {
        id: PhotoId(row.get(0)?),
        album_id: AlbumId(row.get(1)?),
        date: row.get(2)?,
        name: row.get(3)?,
        media_type: row.get(4)?,
        size: row.get::<_, i64>(5)? as u64,
        data: row.get(6)?,
    })
}

/// The `table.column` named by a UNIQUE constraint failure, if `err` is one.
fn unique_violation(err: &rusqlite::Error) -> Option<String> {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(msg)) if e.code == ErrorCode::ConstraintViolation => {
            msg.strip_prefix("UNIQUE constraint failed: ").map(str::to_string)
        }
        _ => None,
    }
}
