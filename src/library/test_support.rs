//! Seeded library stores for unit tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::db_manager::DbManager;
use crate::library::albums_db::AlbumsDb;
use crate::library::artists_db::ArtistsDb;
use crate::library::genres_db::GenresDb;
use crate::library::library_types::{AlbumId, ArtistId, GenreId, NewAlbum, TrackId};
use crate::library::tracks_db::{NewTrack, TracksDb};

pub(crate) struct LibraryFixture {
    pub db: DbManager,
    pub albums: AlbumsDb,
    pub tracks: TracksDb,
    pub genres: GenresDb,
    pub artists: ArtistsDb,
}

impl LibraryFixture {
    pub fn in_memory() -> Self {
        Self::with_db(DbManager::new_in_memory().expect("in-memory db should open"))
    }

    pub fn open(db_path: &Path, busy_timeout: Duration) -> Self {
        Self::with_db(DbManager::new(db_path, busy_timeout).expect("file db should open"))
    }

    fn with_db(db: DbManager) -> Self {
        let tracks = TracksDb::new(db.clone());
        let genres = GenresDb::new(db.clone());
        let albums = AlbumsDb::new(
            db.clone(),
            Arc::new(tracks.clone()),
            Arc::new(genres.clone()),
        );
        Self {
            artists: ArtistsDb::new(db.clone()),
            db,
            albums,
            tracks,
            genres,
        }
    }

    pub fn artist(&self, name: &str, sortname: &str) -> ArtistId {
        self.artists.add(name, sortname).expect("artist should be inserted")
    }

    pub fn genre(&self, name: &str) -> GenreId {
        self.genres.add(name).expect("genre should be inserted")
    }

    pub fn album(&self, album: NewAlbum) -> AlbumId {
        self.albums.add(&album).expect("album should be inserted")
    }

    pub fn track(&self, track: NewTrack) -> TrackId {
        self.tracks.add(&track).expect("track should be inserted")
    }

    pub fn tag_track(&self, track_id: TrackId, genre_id: GenreId) {
        self.tracks
            .add_genre(track_id, genre_id)
            .expect("track genre should be inserted");
    }

    pub fn credit_track(&self, track_id: TrackId, artist_id: ArtistId) {
        self.tracks
            .add_artist(track_id, artist_id)
            .expect("track artist should be inserted");
    }

    pub fn commit(&self) {
        self.db.commit().expect("commit should succeed");
    }
}
