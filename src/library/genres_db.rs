//! Minimal genres helper: genre rows and genre-to-album membership.

use rusqlite::params;

use crate::db_manager::DbManager;
use crate::error::LibraryResult;
use crate::library::collaborators::GenreProvider;
use crate::library::library_types::{AlbumId, GenreId};

#[derive(Clone)]
pub struct GenresDb {
    db: DbManager,
}

impl GenresDb {
    pub fn new(db: DbManager) -> Self {
        Self { db }
    }

    /// Inserts a genre. Commit needed.
    pub fn add(&self, name: &str) -> LibraryResult<GenreId> {
        let cursor = self.db.cursor()?;
        cursor.write("INSERT INTO genres (name) VALUES (?1)", params![name])?;
        Ok(cursor.last_insert_rowid())
    }
}

impl GenreProvider for GenresDb {
    fn get_albums(&self, genre_id: GenreId) -> LibraryResult<Vec<AlbumId>> {
        let cursor = self.db.cursor()?;
        let mut stmt = cursor.prepare(
            "SELECT albums.rowid FROM albums, album_genres
             WHERE album_genres.genre_id=?1
             AND album_genres.album_id=albums.rowid
             ORDER BY albums.name COLLATE NOCASE, albums.rowid",
        )?;
        let ids = stmt
            .query_map(params![genre_id], |row| row.get(0))?
            .collect::<Result<Vec<AlbumId>, _>>()?;
        Ok(ids)
    }
}
