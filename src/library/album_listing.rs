//! Album listings: browse orderings, samples, party mode and search.

use std::collections::HashSet;

use log::debug;
use rusqlite::params;

use crate::error::LibraryResult;
use crate::library::albums_db::{query_ids, AlbumsDb};
use crate::library::library_types::{reserved, AlbumId, ArtistId, GenreFilter, PartySource};

const SAMPLE_LIMIT: i64 = 100;
const SEARCH_LIMIT: i64 = 25;
const MIN_AVG_POPULARITY: f64 = 5.0;

fn extend_unique(albums: &mut Vec<AlbumId>, seen: &mut HashSet<AlbumId>, ids: Vec<AlbumId>) {
    for id in ids {
        if seen.insert(id) {
            albums.push(id);
        }
    }
}

impl AlbumsDb {
    /// Browse listing.
    ///
    /// Without an artist, albums are ordered by artist sort name, year and
    /// name (case-insensitive) and only albums whose artist row exists are
    /// listed. With an artist, by year then name.
    pub fn get_ids(
        &self,
        artist_id: Option<ArtistId>,
        genre: GenreFilter,
    ) -> LibraryResult<Vec<AlbumId>> {
        let cursor = self.db.cursor()?;
        match (artist_id, genre) {
            (None, GenreFilter::Unfiltered) => query_ids(
                &cursor,
                "SELECT albums.rowid FROM albums, artists
                 WHERE artists.rowid=albums.artist_id
                 ORDER BY artists.sortname COLLATE NOCASE,
                 albums.year,
                 albums.name COLLATE NOCASE",
                [],
            ),
            (None, GenreFilter::Genre(genre_id)) => query_ids(
                &cursor,
                "SELECT albums.rowid FROM albums, album_genres, artists
                 WHERE album_genres.genre_id=?1
                 AND artists.rowid=albums.artist_id
                 AND album_genres.album_id=albums.rowid
                 ORDER BY artists.sortname COLLATE NOCASE,
                 albums.year,
                 albums.name COLLATE NOCASE",
                params![genre_id],
            ),
            (Some(artist_id), GenreFilter::Unfiltered) => query_ids(
                &cursor,
                "SELECT rowid FROM albums
                 WHERE artist_id=?1
                 ORDER BY year, name COLLATE NOCASE",
                params![artist_id],
            ),
            (Some(artist_id), GenreFilter::Genre(genre_id)) => query_ids(
                &cursor,
                "SELECT albums.rowid FROM albums, album_genres
                 WHERE albums.artist_id=?1
                 AND album_genres.genre_id=?2
                 AND album_genres.album_id=albums.rowid
                 ORDER BY albums.year, albums.name COLLATE NOCASE",
                params![artist_id, genre_id],
            ),
        }
    }

    /// Albums attributed to the compilation pseudo-artist, by name then year.
    pub fn get_compilations(&self, genre: GenreFilter) -> LibraryResult<Vec<AlbumId>> {
        let cursor = self.db.cursor()?;
        match genre {
            GenreFilter::Unfiltered => query_ids(
                &cursor,
                "SELECT rowid FROM albums
                 WHERE artist_id=?1
                 ORDER BY name, year",
                params![reserved::COMPILATIONS],
            ),
            GenreFilter::Genre(genre_id) => query_ids(
                &cursor,
                "SELECT albums.rowid FROM albums, album_genres
                 WHERE album_genres.genre_id=?1
                 AND album_genres.album_id=albums.rowid
                 AND albums.artist_id=?2
                 ORDER BY albums.name, albums.year",
                params![genre_id, reserved::COMPILATIONS],
            ),
        }
    }

    /// Every album id, in insertion order.
    pub fn all_ids(&self) -> LibraryResult<Vec<AlbumId>> {
        let cursor = self.db.cursor()?;
        query_ids(&cursor, "SELECT rowid FROM albums ORDER BY rowid", [])
    }

    pub fn count(&self) -> LibraryResult<i64> {
        let cursor = self.db.cursor()?;
        Ok(cursor.query_row("SELECT COUNT(1) FROM albums", [], |row| row.get(0))?)
    }

    /// Average popularity of the 100 most popular albums, never below 5.
    pub fn get_avg_popularity(&self) -> LibraryResult<f64> {
        let cursor = self.db.cursor()?;
        let avg: Option<f64> = cursor.query_row(
            "SELECT AVG(popularity)
             FROM (SELECT popularity FROM albums ORDER BY popularity DESC LIMIT ?1)",
            params![SAMPLE_LIMIT],
            |row| row.get(0),
        )?;
        Ok(match avg {
            Some(avg) if avg > MIN_AVG_POPULARITY => avg,
            _ => MIN_AVG_POPULARITY,
        })
    }

    /// Up to 100 played albums, most popular first.
    pub fn get_populars(&self) -> LibraryResult<Vec<AlbumId>> {
        let cursor = self.db.cursor()?;
        query_ids(
            &cursor,
            "SELECT rowid FROM albums WHERE popularity!=0
             ORDER BY popularity DESC LIMIT ?1",
            params![SAMPLE_LIMIT],
        )
    }

    /// Up to 100 albums, most recently modified first.
    pub fn get_recents(&self) -> LibraryResult<Vec<AlbumId>> {
        let cursor = self.db.cursor()?;
        query_ids(
            &cursor,
            "SELECT rowid FROM albums ORDER BY mtime DESC LIMIT ?1",
            params![SAMPLE_LIMIT],
        )
    }

    /// Up to 100 albums in random order. The result replaces the snapshot
    /// returned by [`AlbumsDb::get_cached_randoms`].
    pub fn get_randoms(&self) -> LibraryResult<Vec<AlbumId>> {
        let albums = {
            let cursor = self.db.cursor()?;
            query_ids(
                &cursor,
                "SELECT rowid FROM albums ORDER BY random() LIMIT ?1",
                params![SAMPLE_LIMIT],
            )?
        };
        debug!("Refreshed random albums. count={}", albums.len());
        *self.cached_randoms.borrow_mut() = albums.clone();
        Ok(albums)
    }

    /// Snapshot of the last [`AlbumsDb::get_randoms`] result.
    pub fn get_cached_randoms(&self) -> Vec<AlbumId> {
        self.cached_randoms.borrow().clone()
    }

    /// Party-mode albums: populars, then recents, then each genre's albums
    /// in the order given, without duplicates.
    pub fn get_party_ids(&self, sources: &[PartySource]) -> LibraryResult<Vec<AlbumId>> {
        let mut albums = Vec::new();
        let mut seen = HashSet::new();

        if sources.contains(&PartySource::Populars) {
            extend_unique(&mut albums, &mut seen, self.get_populars()?);
        }
        if sources.contains(&PartySource::Recents) {
            extend_unique(&mut albums, &mut seen, self.get_recents()?);
        }
        for source in sources {
            if let PartySource::Genre(genre_id) = source {
                extend_unique(&mut albums, &mut seen, self.genres.get_albums(*genre_id)?);
            }
        }
        Ok(albums)
    }

    /// Albums whose name contains `text`, as (album, artist) pairs.
    pub fn search(&self, text: &str) -> LibraryResult<Vec<(AlbumId, ArtistId)>> {
        let cursor = self.db.cursor()?;
        let mut stmt = cursor.prepare(
            "SELECT rowid, artist_id FROM albums
             WHERE name LIKE ?1
             LIMIT ?2",
        )?;
        let pattern = format!("%{}%", text);
        let found = stmt
            .query_map(params![pattern, SEARCH_LIMIT], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<(AlbumId, ArtistId)>, _>>()?;
        Ok(found)
    }
}
