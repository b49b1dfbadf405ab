//! Shared library database handle, schema setup, and scoped cursor access.

use std::ops::Deref;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, info};
use rusqlite::{Connection, Params};

use crate::error::{LibraryError, LibraryResult};

/// Cloneable handle to the single shared library connection.
///
/// Every clone points at the same connection; albums, tracks, genres and
/// artists helpers all hold one.
#[derive(Clone)]
pub struct DbManager {
    conn: Arc<Mutex<Connection>>,
}

impl DbManager {
    /// Opens (or creates) the library database file.
    pub fn new(db_path: &Path, busy_timeout: Duration) -> LibraryResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.busy_timeout(busy_timeout)?;
        info!("Opened library database. path={}", db_path.display());
        Self::from_connection(conn)
    }

    pub fn new_in_memory() -> LibraryResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> LibraryResult<Self> {
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Acquires the shared connection until the returned cursor is dropped.
    pub fn cursor(&self) -> LibraryResult<SqlCursor<'_>> {
        let conn = self.conn.lock().map_err(|_| LibraryError::StorePoisoned)?;
        Ok(SqlCursor { conn })
    }

    /// Makes every pending mutation durable.
    pub fn commit(&self) -> LibraryResult<()> {
        self.cursor()?.commit()
    }

    /// Discards every pending mutation.
    pub fn rollback(&self) -> LibraryResult<()> {
        self.cursor()?.rollback()
    }
}

/// Scoped access to the shared connection.
///
/// Writes issued through [`SqlCursor::write`] join the pending transaction,
/// opening one first when none is active, so they stay invisible to other
/// connections until someone commits.
pub struct SqlCursor<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl SqlCursor<'_> {
    pub fn write<P: Params>(&self, sql: &str, params: P) -> LibraryResult<usize> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(self.conn.execute(sql, params)?)
    }

    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    pub fn commit(&self) -> LibraryResult<()> {
        if self.in_transaction() {
            self.conn.execute_batch("COMMIT")?;
            debug!("Library database committed");
        }
        Ok(())
    }

    pub fn rollback(&self) -> LibraryResult<()> {
        if self.in_transaction() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }
}

impl Deref for SqlCursor<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS albums (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            artist_id INT NOT NULL,
            no_album_artist BOOLEAN NOT NULL DEFAULT 0,
            year INT,
            path TEXT NOT NULL DEFAULT '',
            popularity INT NOT NULL DEFAULT 0,
            mtime INT NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS artists (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            sortname TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS genres (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS tracks (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            filepath TEXT NOT NULL,
            album_id INT NOT NULL,
            duration INT NOT NULL DEFAULT 0,
            discnumber INT NOT NULL DEFAULT 0,
            tracknumber INT,
            mtime INT NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS album_genres (
            album_id INT NOT NULL,
            genre_id INT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS track_genres (
            track_id INT NOT NULL,
            genre_id INT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS track_artists (
            track_id INT NOT NULL,
            artist_id INT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_albums_artist_id ON albums(artist_id);
        CREATE INDEX IF NOT EXISTS idx_tracks_album_id ON tracks(album_id);
        CREATE INDEX IF NOT EXISTS idx_album_genres_album_id ON album_genres(album_id);
        CREATE INDEX IF NOT EXISTS idx_album_genres_genre_id ON album_genres(genre_id);
        CREATE INDEX IF NOT EXISTS idx_track_genres_track_id ON track_genres(track_id);
        CREATE INDEX IF NOT EXISTS idx_track_artists_track_id ON track_artists(track_id);",
    )
}
