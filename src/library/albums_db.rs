//! Albums helper: mutations, identity lookups, path self-healing and the
//! per-album consistency sweep.
//!
//! Listing and sampling queries live in `album_listing.rs`, per-album track
//! aggregates in `album_stats.rs`.
//!
//! Mutations join the store's pending transaction and are not durable until
//! the caller commits, unless a method says otherwise.

use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Params, Row};

use crate::db_manager::DbManager;
use crate::error::LibraryResult;
use crate::library::collaborators::{GenreProvider, TrackProvider};
use crate::library::library_types::{
    Album, AlbumId, ArtistId, GenreFilter, GenreId, NewAlbum, PathResolution,
};

pub const UNKNOWN_ALBUM_NAME: &str = "Unknown";
pub const COMPILATION_ARTIST_NAME: &str = "Compilation";

/// Data-access facade over the `albums` and `album_genres` tables.
pub struct AlbumsDb {
    pub(crate) db: DbManager,
    pub(crate) tracks: Arc<dyn TrackProvider>,
    pub(crate) genres: Arc<dyn GenreProvider>,
    /// Last `get_randoms` result; lives as long as this helper.
    pub(crate) cached_randoms: RefCell<Vec<AlbumId>>,
}

pub(crate) fn query_ids<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> LibraryResult<Vec<i64>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map(params, |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}

fn genre_ids_with(conn: &Connection, album_id: AlbumId) -> LibraryResult<Vec<GenreId>> {
    query_ids(
        conn,
        "SELECT genre_id FROM album_genres WHERE album_id=?1",
        params![album_id],
    )
}

fn row_to_album(row: &Row) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get(0)?,
        name: row.get(1)?,
        artist_id: row.get(2)?,
        no_album_artist: row.get(3)?,
        year: row.get(4)?,
        path: row.get(5)?,
        popularity: row.get(6)?,
        mtime: row.get(7)?,
    })
}

impl AlbumsDb {
    pub fn new(
        db: DbManager,
        tracks: Arc<dyn TrackProvider>,
        genres: Arc<dyn GenreProvider>,
    ) -> Self {
        Self {
            db,
            tracks,
            genres,
            cached_randoms: RefCell::new(Vec::new()),
        }
    }

    // Mutations

    /// Inserts an album and returns its id. Commit needed.
    pub fn add(&self, album: &NewAlbum) -> LibraryResult<AlbumId> {
        let cursor = self.db.cursor()?;
        cursor.write(
            "INSERT INTO albums
             (name, artist_id, no_album_artist, year, path, popularity, mtime)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                album.name,
                album.artist_id,
                album.no_album_artist,
                album.year,
                album.path,
                album.popularity,
                album.mtime
            ],
        )?;
        Ok(cursor.last_insert_rowid())
    }

    /// Links a genre to an album unless already linked. Commit needed.
    pub fn add_genre(&self, album_id: AlbumId, genre_id: GenreId) -> LibraryResult<()> {
        let cursor = self.db.cursor()?;
        if genre_ids_with(&cursor, album_id)?.contains(&genre_id) {
            return Ok(());
        }
        cursor.write(
            "INSERT INTO album_genres (album_id, genre_id) VALUES (?1, ?2)",
            params![album_id, genre_id],
        )?;
        Ok(())
    }

    /// Commit needed.
    pub fn set_artist_id(&self, album_id: AlbumId, artist_id: ArtistId) -> LibraryResult<()> {
        self.db.cursor()?.write(
            "UPDATE albums SET artist_id=?1 WHERE rowid=?2",
            params![artist_id, album_id],
        )?;
        Ok(())
    }

    /// Commit needed.
    pub fn set_year(&self, album_id: AlbumId, year: Option<i64>) -> LibraryResult<()> {
        self.db.cursor()?.write(
            "UPDATE albums SET year=?1 WHERE rowid=?2",
            params![year, album_id],
        )?;
        Ok(())
    }

    /// Commit needed.
    pub fn set_path(&self, album_id: AlbumId, path: &str) -> LibraryResult<()> {
        self.db.cursor()?.write(
            "UPDATE albums SET path=?1 WHERE rowid=?2",
            params![path, album_id],
        )?;
        Ok(())
    }

    /// Commit needed.
    pub fn set_mtime(&self, album_id: AlbumId, mtime: i64) -> LibraryResult<()> {
        self.db.cursor()?.write(
            "UPDATE albums SET mtime=?1 WHERE rowid=?2",
            params![mtime, album_id],
        )?;
        Ok(())
    }

    /// Stores a popularity value, committing when `commit` is set.
    ///
    /// A busy or locked store makes this a silent no-op: a library scan may
    /// hold the write lock while the user is playing music. Any other
    /// failure propagates.
    pub fn set_popularity(
        &self,
        album_id: AlbumId,
        popularity: i64,
        commit: bool,
    ) -> LibraryResult<()> {
        let cursor = self.db.cursor()?;
        let opened_here = !cursor.in_transaction();
        let result = cursor
            .write(
                "UPDATE albums SET popularity=?1 WHERE rowid=?2",
                params![popularity, album_id],
            )
            .and_then(|_| if commit { cursor.commit() } else { Ok(()) });

        match result {
            Err(err) if err.is_store_busy() => {
                warn!(
                    "Library database busy, dropping popularity update. album_id={} err={}",
                    album_id, err
                );
                if opened_here {
                    if let Err(rollback_err) = cursor.rollback() {
                        warn!("Failed to release busy transaction: {}", rollback_err);
                    }
                }
                Ok(())
            }
            other => other,
        }
    }

    /// Increments popularity and commits immediately.
    pub fn set_more_popular(&self, album_id: AlbumId) -> LibraryResult<()> {
        let cursor = self.db.cursor()?;
        let current: i64 = cursor
            .query_row(
                "SELECT popularity FROM albums WHERE rowid=?1",
                params![album_id],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(0);
        cursor.write(
            "UPDATE albums SET popularity=?1 WHERE rowid=?2",
            params![current + 1, album_id],
        )?;
        cursor.commit()
    }

    /// Deletes an album and its genre links. Commit needed.
    pub fn delete(&self, album_id: AlbumId) -> LibraryResult<()> {
        let cursor = self.db.cursor()?;
        cursor.write(
            "DELETE FROM album_genres WHERE album_id=?1",
            params![album_id],
        )?;
        cursor.write("DELETE FROM albums WHERE rowid=?1", params![album_id])?;
        Ok(())
    }

    // Identity

    /// Album id for (name, artist, year); a `None` year only matches albums
    /// without a year.
    pub fn get_id(
        &self,
        name: &str,
        artist_id: ArtistId,
        year: Option<i64>,
    ) -> LibraryResult<Option<AlbumId>> {
        let cursor = self.db.cursor()?;
        Ok(cursor
            .query_row(
                "SELECT rowid FROM albums
                 WHERE name=?1 AND artist_id=?2 AND year IS ?3",
                params![name, artist_id, year],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Same as [`AlbumsDb::get_id`], ignoring albums flagged as compilations.
    pub fn get_non_compilation_id(
        &self,
        name: &str,
        artist_id: ArtistId,
        year: Option<i64>,
    ) -> LibraryResult<Option<AlbumId>> {
        let cursor = self.db.cursor()?;
        Ok(cursor
            .query_row(
                "SELECT rowid FROM albums
                 WHERE name=?1 AND artist_id=?2 AND year IS ?3
                 AND no_album_artist=0",
                params![name, artist_id, year],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Compilation album id for (name, year).
    pub fn get_compilation_id(
        &self,
        name: &str,
        year: Option<i64>,
    ) -> LibraryResult<Option<AlbumId>> {
        let cursor = self.db.cursor()?;
        Ok(cursor
            .query_row(
                "SELECT rowid FROM albums
                 WHERE name=?1 AND no_album_artist=1 AND year IS ?2",
                params![name, year],
                |row| row.get(0),
            )
            .optional()?)
    }

    // Accessors

    pub fn get(&self, album_id: AlbumId) -> LibraryResult<Option<Album>> {
        let cursor = self.db.cursor()?;
        Ok(cursor
            .query_row(
                "SELECT rowid, name, artist_id, no_album_artist, year, path, popularity, mtime
                 FROM albums WHERE rowid=?1",
                params![album_id],
                row_to_album,
            )
            .optional()?)
    }

    pub fn get_genre_ids(&self, album_id: AlbumId) -> LibraryResult<Vec<GenreId>> {
        let cursor = self.db.cursor()?;
        genre_ids_with(&cursor, album_id)
    }

    /// Album name, or [`UNKNOWN_ALBUM_NAME`].
    pub fn get_name(&self, album_id: AlbumId) -> LibraryResult<String> {
        let cursor = self.db.cursor()?;
        let name: Option<String> = cursor
            .query_row(
                "SELECT name FROM albums WHERE rowid=?1",
                params![album_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name.unwrap_or_else(|| UNKNOWN_ALBUM_NAME.to_string()))
    }

    /// Album artist display name, or [`COMPILATION_ARTIST_NAME`] when the
    /// album has no artist row.
    pub fn get_artist_name(&self, album_id: AlbumId) -> LibraryResult<String> {
        let cursor = self.db.cursor()?;
        let name: Option<String> = cursor
            .query_row(
                "SELECT artists.name FROM artists, albums
                 WHERE albums.rowid=?1 AND albums.artist_id=artists.rowid",
                params![album_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name.unwrap_or_else(|| COMPILATION_ARTIST_NAME.to_string()))
    }

    pub fn get_artist_id(&self, album_id: AlbumId) -> LibraryResult<Option<ArtistId>> {
        let cursor = self.db.cursor()?;
        Ok(cursor
            .query_row(
                "SELECT artist_id FROM albums WHERE rowid=?1",
                params![album_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn get_year(&self, album_id: AlbumId) -> LibraryResult<Option<i64>> {
        let cursor = self.db.cursor()?;
        Ok(cursor
            .query_row(
                "SELECT year FROM albums WHERE rowid=?1",
                params![album_id],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?
            .flatten())
    }

    /// Popularity, 0 for unknown albums.
    pub fn get_popularity(&self, album_id: AlbumId) -> LibraryResult<i64> {
        let cursor = self.db.cursor()?;
        Ok(cursor
            .query_row(
                "SELECT popularity FROM albums WHERE rowid=?1",
                params![album_id],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(0))
    }

    /// Number of albums sharing a directory.
    pub fn get_path_count(&self, path: &str) -> LibraryResult<i64> {
        let cursor = self.db.cursor()?;
        Ok(cursor.query_row(
            "SELECT COUNT(path) FROM albums WHERE path=?1",
            params![path],
            |row| row.get(0),
        )?)
    }

    /// Album directory, repairing a stale stored path on the way.
    ///
    /// When the stored path is set but gone from disk, the directory of the
    /// album's first track replaces it. The replacement is written and
    /// committed only if that directory exists; either way the derived
    /// directory is returned.
    pub fn get_path(&self, album_id: AlbumId) -> LibraryResult<PathResolution> {
        let stored: String = {
            let cursor = self.db.cursor()?;
            cursor
                .query_row(
                    "SELECT path FROM albums WHERE rowid=?1",
                    params![album_id],
                    |row| row.get(0),
                )
                .optional()?
                .unwrap_or_default()
        };
        let unchanged = |path: String| PathResolution {
            path,
            repaired: false,
        };

        if stored.is_empty() || Path::new(&stored).exists() {
            return Ok(unchanged(stored));
        }

        // Collaborators share the store, so no cursor is held across them.
        let Some(first_track) = self
            .get_tracks(album_id, GenreFilter::Unfiltered)?
            .first()
            .copied()
        else {
            return Ok(unchanged(stored));
        };
        let Some(filepath) = self.tracks.get_path(first_track)? else {
            return Ok(unchanged(stored));
        };

        let derived = Path::new(&filepath)
            .parent()
            .map(|parent| parent.to_string_lossy().into_owned())
            .unwrap_or_default();
        if derived.is_empty() || !Path::new(&derived).exists() {
            debug!(
                "Album path is stale and track directory is missing. album_id={} path={}",
                album_id, derived
            );
            return Ok(unchanged(derived));
        }

        let cursor = self.db.cursor()?;
        cursor.write(
            "UPDATE albums SET path=?1 WHERE rowid=?2",
            params![derived, album_id],
        )?;
        cursor.commit()?;
        info!(
            "Repaired album path. album_id={} old={} new={}",
            album_id, stored, derived
        );
        Ok(PathResolution {
            path: derived,
            repaired: true,
        })
    }

    // Consistency

    /// Drops genre links no album track carries anymore, then the album
    /// itself if it has no tracks left. Returns whether anything was
    /// removed. Commit needed.
    pub fn clean(&self, album_id: AlbumId) -> LibraryResult<bool> {
        let cursor = self.db.cursor()?;
        let mut modified = false;

        for genre_id in genre_ids_with(&cursor, album_id)? {
            let tagged = cursor
                .query_row(
                    "SELECT track_genres.track_id FROM tracks, track_genres
                     WHERE track_genres.track_id=tracks.rowid
                     AND tracks.album_id=?1
                     AND track_genres.genre_id=?2
                     LIMIT 1",
                    params![album_id, genre_id],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .is_some();
            if !tagged {
                let removed = cursor.write(
                    "DELETE FROM album_genres WHERE album_id=?1 AND genre_id=?2",
                    params![album_id, genre_id],
                )?;
                debug!(
                    "Pruned stale album genre. album_id={} genre_id={}",
                    album_id, genre_id
                );
                modified |= removed > 0;
            }
        }

        let has_tracks = cursor
            .query_row(
                "SELECT rowid FROM tracks WHERE album_id=?1 LIMIT 1",
                params![album_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .is_some();
        if !has_tracks {
            let removed = cursor.write("DELETE FROM albums WHERE rowid=?1", params![album_id])?;
            if removed > 0 {
                debug!("Removed orphaned album. album_id={}", album_id);
                modified = true;
            }
        }

        Ok(modified)
    }
}
