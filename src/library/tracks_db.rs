//! Minimal tracks helper: insert/remove rows and resolve file paths.

use rusqlite::{params, OptionalExtension};

use crate::db_manager::DbManager;
use crate::error::LibraryResult;
use crate::library::collaborators::TrackProvider;
use crate::library::library_types::{AlbumId, ArtistId, GenreId, TrackId};

/// Values for a scanned track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrack {
    pub name: String,
    pub filepath: String,
    pub album_id: AlbumId,
    pub duration: i64,
    pub discnumber: i64,
    pub tracknumber: Option<i64>,
    pub mtime: i64,
}

impl NewTrack {
    pub fn new(name: impl Into<String>, filepath: impl Into<String>, album_id: AlbumId) -> Self {
        Self {
            name: name.into(),
            filepath: filepath.into(),
            album_id,
            duration: 0,
            discnumber: 0,
            tracknumber: None,
            mtime: 0,
        }
    }

    pub fn with_duration(mut self, duration: i64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_position(mut self, discnumber: i64, tracknumber: i64) -> Self {
        self.discnumber = discnumber;
        self.tracknumber = Some(tracknumber);
        self
    }
}

#[derive(Clone)]
pub struct TracksDb {
    db: DbManager,
}

impl TracksDb {
    pub fn new(db: DbManager) -> Self {
        Self { db }
    }

    /// Inserts a track. Commit needed.
    pub fn add(&self, track: &NewTrack) -> LibraryResult<TrackId> {
        let cursor = self.db.cursor()?;
        cursor.write(
            "INSERT INTO tracks
             (name, filepath, album_id, duration, discnumber, tracknumber, mtime)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                track.name,
                track.filepath,
                track.album_id,
                track.duration,
                track.discnumber,
                track.tracknumber,
                track.mtime
            ],
        )?;
        Ok(cursor.last_insert_rowid())
    }

    /// Tags a track with a genre. Commit needed.
    pub fn add_genre(&self, track_id: TrackId, genre_id: GenreId) -> LibraryResult<()> {
        self.db.cursor()?.write(
            "INSERT INTO track_genres (track_id, genre_id) VALUES (?1, ?2)",
            params![track_id, genre_id],
        )?;
        Ok(())
    }

    /// Credits a track to an artist. Commit needed.
    pub fn add_artist(&self, track_id: TrackId, artist_id: ArtistId) -> LibraryResult<()> {
        self.db.cursor()?.write(
            "INSERT INTO track_artists (track_id, artist_id) VALUES (?1, ?2)",
            params![track_id, artist_id],
        )?;
        Ok(())
    }

    /// Removes a track with its genre and artist links. Commit needed.
    pub fn remove(&self, track_id: TrackId) -> LibraryResult<()> {
        let cursor = self.db.cursor()?;
        cursor.write(
            "DELETE FROM track_genres WHERE track_id=?1",
            params![track_id],
        )?;
        cursor.write(
            "DELETE FROM track_artists WHERE track_id=?1",
            params![track_id],
        )?;
        cursor.write("DELETE FROM tracks WHERE rowid=?1", params![track_id])?;
        Ok(())
    }

    pub fn get_album_id(&self, track_id: TrackId) -> LibraryResult<Option<AlbumId>> {
        let cursor = self.db.cursor()?;
        Ok(cursor
            .query_row(
                "SELECT album_id FROM tracks WHERE rowid=?1",
                params![track_id],
                |row| row.get(0),
            )
            .optional()?)
    }
}

impl TrackProvider for TracksDb {
    fn get_path(&self, track_id: TrackId) -> LibraryResult<Option<String>> {
        let cursor = self.db.cursor()?;
        Ok(cursor
            .query_row(
                "SELECT filepath FROM tracks WHERE rowid=?1",
                params![track_id],
                |row| row.get(0),
            )
            .optional()?)
    }
}

#[cfg(test)]
mod tests {
    use super::{NewTrack, TracksDb};
    use crate::db_manager::DbManager;
    use crate::library::collaborators::TrackProvider;

    #[test]
    fn test_add_then_get_path_and_album_id() {
        let tracks = TracksDb::new(DbManager::new_in_memory().expect("db should open"));
        let track_id = tracks
            .add(&NewTrack::new("Intro", "/music/a/01.flac", 3))
            .expect("track should be inserted");

        assert_eq!(
            tracks.get_path(track_id).expect("lookup should succeed"),
            Some("/music/a/01.flac".to_string())
        );
        assert_eq!(
            tracks.get_album_id(track_id).expect("lookup should succeed"),
            Some(3)
        );
    }

    #[test]
    fn test_remove_makes_track_unresolvable() {
        let tracks = TracksDb::new(DbManager::new_in_memory().expect("db should open"));
        let track_id = tracks
            .add(&NewTrack::new("Intro", "/music/a/01.flac", 3))
            .expect("track should be inserted");
        tracks.add_genre(track_id, 1).expect("genre link should be added");
        tracks.remove(track_id).expect("track should be removed");

        assert_eq!(tracks.get_path(track_id).expect("lookup should succeed"), None);
        assert_eq!(tracks.get_path(404).expect("lookup should succeed"), None);
    }
}
