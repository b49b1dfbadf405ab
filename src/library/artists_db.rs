//! Minimal artists helper: the rows album listings sort by.

use rusqlite::params;

use crate::db_manager::DbManager;
use crate::error::LibraryResult;
use crate::library::library_types::ArtistId;

#[derive(Clone)]
pub struct ArtistsDb {
    db: DbManager,
}

impl ArtistsDb {
    pub fn new(db: DbManager) -> Self {
        Self { db }
    }

    /// Inserts an artist. Commit needed.
    pub fn add(&self, name: &str, sortname: &str) -> LibraryResult<ArtistId> {
        let cursor = self.db.cursor()?;
        cursor.write(
            "INSERT INTO artists (name, sortname) VALUES (?1, ?2)",
            params![name, sortname],
        )?;
        Ok(cursor.last_insert_rowid())
    }

    /// Commit needed.
    pub fn set_sortname(&self, artist_id: ArtistId, sortname: &str) -> LibraryResult<()> {
        self.db.cursor()?.write(
            "UPDATE artists SET sortname=?1 WHERE rowid=?2",
            params![sortname, artist_id],
        )?;
        Ok(())
    }
}
