use crate::domain::{AlbumId, PhotoId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("album not found: {0}")]
    AlbumNotFound(AlbumId),

    #[error("photo not found: {0}")]
    PhotoNotFound(PhotoId),

    #[error("album name already taken: {0}")]
    AlbumNameTaken(String),

    #[error("album order {0} would be held by more than one album")]
    DuplicateOrder(i64),

    #[error("no album order left above {0}")]
    OrderSpaceExhausted(i64),

    #[error("album {0} appears more than once in the new ordering")]
    DuplicateAssignment(AlbumId),

    #[error("catalog schema version {db} is newer than supported version {code} — upgrade photoalbum")]
    SchemaTooNew { db: u32, code: u32 },

    #[error("internal lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
