//! Per-album track aggregates, optionally restricted to one genre.

use rusqlite::{params, OptionalExtension};

use crate::error::LibraryResult;
use crate::library::albums_db::{query_ids, AlbumsDb};
use crate::library::library_types::{
    reserved, AlbumId, AlbumStats, CompilationStatus, GenreFilter, TrackId,
};

impl AlbumsDb {
    /// Number of album tracks.
    pub fn get_count(&self, album_id: AlbumId, genre: GenreFilter) -> LibraryResult<i64> {
        let cursor = self.db.cursor()?;
        let count = match genre {
            GenreFilter::Unfiltered => cursor.query_row(
                "SELECT COUNT(1) FROM tracks WHERE tracks.album_id=?1",
                params![album_id],
                |row| row.get(0),
            )?,
            GenreFilter::Genre(genre_id) => cursor.query_row(
                "SELECT COUNT(1) FROM tracks, track_genres
                 WHERE tracks.album_id=?1
                 AND track_genres.track_id=tracks.rowid
                 AND track_genres.genre_id=?2",
                params![album_id, genre_id],
                |row| row.get(0),
            )?,
        };
        Ok(count)
    }

    /// Number of album tracks on one disc.
    pub fn get_count_for_disc(
        &self,
        album_id: AlbumId,
        genre: GenreFilter,
        disc: i64,
    ) -> LibraryResult<i64> {
        let cursor = self.db.cursor()?;
        let count = match genre {
            GenreFilter::Unfiltered => cursor.query_row(
                "SELECT COUNT(1) FROM tracks
                 WHERE tracks.album_id=?1 AND discnumber=?2",
                params![album_id, disc],
                |row| row.get(0),
            )?,
            GenreFilter::Genre(genre_id) => cursor.query_row(
                "SELECT COUNT(1) FROM tracks, track_genres
                 WHERE tracks.album_id=?1
                 AND track_genres.track_id=tracks.rowid
                 AND track_genres.genre_id=?2
                 AND discnumber=?3",
                params![album_id, genre_id, disc],
                |row| row.get(0),
            )?,
        };
        Ok(count)
    }

    /// Distinct disc numbers, ascending.
    pub fn get_discs(&self, album_id: AlbumId, genre: GenreFilter) -> LibraryResult<Vec<i64>> {
        let cursor = self.db.cursor()?;
        match genre {
            GenreFilter::Unfiltered => query_ids(
                &cursor,
                "SELECT DISTINCT discnumber FROM tracks
                 WHERE tracks.album_id=?1
                 ORDER BY discnumber",
                params![album_id],
            ),
            GenreFilter::Genre(genre_id) => query_ids(
                &cursor,
                "SELECT DISTINCT discnumber FROM tracks, track_genres
                 WHERE tracks.album_id=?1
                 AND track_genres.track_id=tracks.rowid
                 AND track_genres.genre_id=?2
                 ORDER BY discnumber",
                params![album_id, genre_id],
            ),
        }
    }

    /// Track ids in disc/track order.
    pub fn get_tracks(&self, album_id: AlbumId, genre: GenreFilter) -> LibraryResult<Vec<TrackId>> {
        let cursor = self.db.cursor()?;
        match genre {
            GenreFilter::Unfiltered => query_ids(
                &cursor,
                "SELECT rowid FROM tracks
                 WHERE album_id=?1
                 ORDER BY discnumber, tracknumber",
                params![album_id],
            ),
            GenreFilter::Genre(genre_id) => query_ids(
                &cursor,
                "SELECT tracks.rowid FROM tracks, track_genres
                 WHERE tracks.album_id=?1
                 AND track_genres.track_id=tracks.rowid
                 AND track_genres.genre_id=?2
                 ORDER BY discnumber, tracknumber",
                params![album_id, genre_id],
            ),
        }
    }

    /// Track file paths in disc/track order.
    pub fn get_tracks_path(
        &self,
        album_id: AlbumId,
        genre: GenreFilter,
    ) -> LibraryResult<Vec<String>> {
        let cursor = self.db.cursor()?;
        let paths = match genre {
            GenreFilter::Unfiltered => {
                let mut stmt = cursor.prepare(
                    "SELECT tracks.filepath FROM tracks
                     WHERE album_id=?1
                     ORDER BY discnumber, tracknumber",
                )?;
                let paths = stmt
                    .query_map(params![album_id], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                paths
            }
            GenreFilter::Genre(genre_id) => {
                let mut stmt = cursor.prepare(
                    "SELECT tracks.filepath FROM tracks, track_genres
                     WHERE tracks.album_id=?1
                     AND track_genres.genre_id=?2
                     AND track_genres.track_id=tracks.rowid
                     ORDER BY discnumber, tracknumber",
                )?;
                let paths = stmt
                    .query_map(params![album_id, genre_id], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                paths
            }
        };
        Ok(paths)
    }

    /// Track ids of one disc in disc/track order.
    pub fn get_disc_tracks_ids(
        &self,
        album_id: AlbumId,
        genre: GenreFilter,
        disc: i64,
    ) -> LibraryResult<Vec<TrackId>> {
        let cursor = self.db.cursor()?;
        match genre {
            GenreFilter::Unfiltered => query_ids(
                &cursor,
                "SELECT tracks.rowid FROM tracks
                 WHERE tracks.album_id=?1
                 AND discnumber=?2
                 ORDER BY discnumber, tracknumber",
                params![album_id, disc],
            ),
            GenreFilter::Genre(genre_id) => query_ids(
                &cursor,
                "SELECT tracks.rowid FROM tracks, track_genres
                 WHERE tracks.album_id=?1
                 AND tracks.rowid=track_genres.track_id
                 AND track_genres.genre_id=?2
                 AND discnumber=?3
                 ORDER BY discnumber, tracknumber",
                params![album_id, genre_id, disc],
            ),
        }
    }

    /// Total track duration in seconds, 0 without tracks.
    pub fn get_duration(&self, album_id: AlbumId, genre: GenreFilter) -> LibraryResult<i64> {
        let cursor = self.db.cursor()?;
        let duration: Option<i64> = match genre {
            GenreFilter::Unfiltered => cursor.query_row(
                "SELECT SUM(duration) FROM tracks WHERE album_id=?1",
                params![album_id],
                |row| row.get(0),
            )?,
            GenreFilter::Genre(genre_id) => cursor.query_row(
                "SELECT SUM(duration) FROM tracks, track_genres
                 WHERE tracks.album_id=?1
                 AND track_genres.track_id=tracks.rowid
                 AND track_genres.genre_id=?2",
                params![album_id, genre_id],
                |row| row.get(0),
            )?,
        };
        Ok(duration.unwrap_or(0))
    }

    /// Popularity and mtime of the album whose tracks add up to `count`
    /// tracks lasting `duration` seconds.
    ///
    /// Used to carry play statistics over to an album rediscovered under a
    /// new id. Track totals are regrouped on every call.
    pub fn get_stats(&self, duration: i64, count: i64) -> LibraryResult<Option<AlbumStats>> {
        let cursor = self.db.cursor()?;
        cursor.execute_batch(
            "DROP TABLE IF EXISTS temp.album_stats;
             CREATE TEMP TABLE album_stats (album_id INT, count INT, duration INT);
             INSERT INTO temp.album_stats (album_id, count, duration)
             SELECT album_id, COUNT(1), SUM(tracks.duration)
             FROM tracks GROUP BY album_id;",
        )?;

        let matched: Option<AlbumId> = cursor
            .query_row(
                "SELECT album_id FROM temp.album_stats
                 WHERE count=?1 AND duration=?2
                 ORDER BY album_id LIMIT 1",
                params![count, duration],
                |row| row.get(0),
            )
            .optional()?;
        cursor.execute_batch("DROP TABLE IF EXISTS temp.album_stats")?;

        let Some(album_id) = matched else {
            return Ok(None);
        };
        Ok(cursor
            .query_row(
                "SELECT popularity, mtime FROM albums WHERE rowid=?1",
                params![album_id],
                |row| {
                    Ok(AlbumStats {
                        popularity: row.get(0)?,
                        mtime: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    /// True when more than one distinct artist is credited on album tracks.
    pub fn is_compilation(&self, album_id: AlbumId) -> LibraryResult<bool> {
        let cursor = self.db.cursor()?;
        let artists: i64 = cursor.query_row(
            "SELECT COUNT(DISTINCT track_artists.artist_id)
             FROM tracks, track_artists
             WHERE tracks.album_id=?1
             AND tracks.rowid=track_artists.track_id",
            params![album_id],
            |row| row.get(0),
        )?;
        Ok(artists > 1)
    }

    /// Stored compilation marking next to the track-artist heuristic.
    pub fn compilation_status(&self, album_id: AlbumId) -> LibraryResult<CompilationStatus> {
        let flagged = {
            let cursor = self.db.cursor()?;
            cursor
                .query_row(
                    "SELECT no_album_artist, artist_id FROM albums WHERE rowid=?1",
                    params![album_id],
                    |row| Ok((row.get::<_, bool>(0)?, row.get::<_, i64>(1)?)),
                )
                .optional()?
                .is_some_and(|(no_album_artist, artist_id)| {
                    no_album_artist || artist_id == reserved::COMPILATIONS
                })
        };
        Ok(CompilationStatus {
            flagged,
            computed: self.is_compilation(album_id)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::library::library_types::{AlbumStats, GenreFilter, NewAlbum};
    use crate::library::test_support::LibraryFixture;
    use crate::library::tracks_db::NewTrack;

    struct TwoDiscAlbum {
        fixture: LibraryFixture,
        album: i64,
        rock: i64,
        tracks: Vec<i64>,
    }

    fn two_disc_album() -> TwoDiscAlbum {
        let fixture = LibraryFixture::in_memory();
        let artist = fixture.artist("Artist", "artist");
        let rock = fixture.genre("Rock");
        let album = fixture.album(NewAlbum::new("Double", artist));
        let layout = [(2, 1, 200), (1, 2, 180), (1, 1, 240), (2, 2, 100)];
        let tracks = layout
            .iter()
            .map(|(disc, number, duration)| {
                fixture.track(
                    NewTrack::new(
                        format!("{}-{}", disc, number),
                        format!("/music/double/{}-{}.flac", disc, number),
                        album,
                    )
                    .with_position(*disc, *number)
                    .with_duration(*duration),
                )
            })
            .collect::<Vec<_>>();
        // Rock tracks: disc 1 track 2 and disc 2 track 2.
        fixture.tag_track(tracks[1], rock);
        fixture.tag_track(tracks[3], rock);
        TwoDiscAlbum {
            fixture,
            album,
            rock,
            tracks,
        }
    }

    #[test]
    fn test_counts_and_durations_with_and_without_genre() {
        let sample = two_disc_album();
        let albums = &sample.fixture.albums;
        let rock = GenreFilter::Genre(sample.rock);

        assert_eq!(albums.get_count(sample.album, GenreFilter::Unfiltered).expect("count"), 4);
        assert_eq!(albums.get_count(sample.album, rock).expect("count"), 2);
        assert_eq!(
            albums.get_count_for_disc(sample.album, GenreFilter::Unfiltered, 1).expect("count"),
            2
        );
        assert_eq!(albums.get_count_for_disc(sample.album, rock, 2).expect("count"), 1);
        assert_eq!(
            albums.get_duration(sample.album, GenreFilter::Unfiltered).expect("duration"),
            720
        );
        assert_eq!(albums.get_duration(sample.album, rock).expect("duration"), 280);
        assert_eq!(albums.get_duration(404, GenreFilter::Unfiltered).expect("duration"), 0);
    }

    #[test]
    fn test_non_positive_raw_genre_means_unfiltered() {
        let sample = two_disc_album();
        let albums = &sample.fixture.albums;
        assert_eq!(
            albums.get_count(sample.album, GenreFilter::from_raw(Some(0))).expect("count"),
            4
        );
        assert_eq!(
            albums.get_count(sample.album, GenreFilter::from_raw(Some(-3))).expect("count"),
            4
        );
    }

    #[test]
    fn test_tracks_follow_disc_then_track_order() {
        let sample = two_disc_album();
        let albums = &sample.fixture.albums;
        let t = &sample.tracks;

        assert_eq!(
            albums.get_tracks(sample.album, GenreFilter::Unfiltered).expect("tracks"),
            vec![t[2], t[1], t[0], t[3]]
        );
        assert_eq!(
            albums.get_tracks(sample.album, GenreFilter::Genre(sample.rock)).expect("tracks"),
            vec![t[1], t[3]]
        );
        assert_eq!(
            albums
                .get_disc_tracks_ids(sample.album, GenreFilter::Unfiltered, 2)
                .expect("tracks"),
            vec![t[0], t[3]]
        );
        assert_eq!(
            albums
                .get_disc_tracks_ids(sample.album, GenreFilter::Genre(sample.rock), 1)
                .expect("tracks"),
            vec![t[1]]
        );
        assert_eq!(
            albums.get_tracks_path(sample.album, GenreFilter::Genre(sample.rock)).expect("paths"),
            vec![
                "/music/double/1-2.flac".to_string(),
                "/music/double/2-2.flac".to_string()
            ]
        );
        assert_eq!(
            albums
                .get_tracks_path(sample.album, GenreFilter::Unfiltered)
                .expect("paths")
                .len(),
            4
        );
    }

    #[test]
    fn test_discs_are_distinct_and_sorted() {
        let sample = two_disc_album();
        let albums = &sample.fixture.albums;
        assert_eq!(
            albums.get_discs(sample.album, GenreFilter::Unfiltered).expect("discs"),
            vec![1, 2]
        );
        assert!(albums
            .get_discs(sample.album, GenreFilter::Genre(999))
            .expect("discs")
            .is_empty());
    }

    #[test]
    fn test_get_stats_matches_count_and_duration_signature() {
        let sample = two_disc_album();
        let fixture = &sample.fixture;
        fixture
            .albums
            .set_popularity(sample.album, 12, false)
            .expect("popularity should update");
        fixture.albums.set_mtime(sample.album, 1_700_000_000).expect("mtime should update");

        assert_eq!(
            fixture.albums.get_stats(720, 4).expect("stats should succeed"),
            Some(AlbumStats {
                popularity: 12,
                mtime: 1_700_000_000
            })
        );
        assert_eq!(fixture.albums.get_stats(720, 3).expect("stats should succeed"), None);
        assert_eq!(fixture.albums.get_stats(700, 4).expect("stats should succeed"), None);
    }

    #[test]
    fn test_get_stats_sees_track_changes_between_calls() {
        let sample = two_disc_album();
        let fixture = &sample.fixture;
        assert!(fixture.albums.get_stats(720, 4).expect("stats should succeed").is_some());

        fixture
            .track(NewTrack::new("Bonus", "/music/double/bonus.flac", sample.album).with_duration(80));
        assert_eq!(fixture.albums.get_stats(720, 4).expect("stats should succeed"), None);
        assert!(fixture.albums.get_stats(800, 5).expect("stats should succeed").is_some());
    }

    #[test]
    fn test_is_compilation_counts_distinct_track_artists() {
        let fixture = LibraryFixture::in_memory();
        let first = fixture.artist("First", "first");
        let second = fixture.artist("Second", "second");
        let album = fixture.album(NewAlbum::new("Split", first));
        let one = fixture.track(NewTrack::new("One", "/music/split/1.flac", album));
        let two = fixture.track(NewTrack::new("Two", "/music/split/2.flac", album));
        fixture.credit_track(one, first);
        fixture.credit_track(two, first);

        assert!(!fixture.albums.is_compilation(album).expect("check should succeed"));

        fixture.credit_track(two, second);
        assert!(fixture.albums.is_compilation(album).expect("check should succeed"));
    }

    #[test]
    fn test_compilation_status_surfaces_disagreement() {
        let fixture = LibraryFixture::in_memory();
        let first = fixture.artist("First", "first");
        let second = fixture.artist("Second", "second");
        let split = fixture.album(NewAlbum::new("Split", first));
        let one = fixture.track(NewTrack::new("One", "/music/split/1.flac", split));
        let two = fixture.track(NewTrack::new("Two", "/music/split/2.flac", split));
        fixture.credit_track(one, first);
        fixture.credit_track(two, second);
        let various = fixture.album(NewAlbum::compilation("Various"));

        let split_status = fixture.albums.compilation_status(split).expect("status");
        assert!(!split_status.flagged);
        assert!(split_status.computed);
        assert!(!split_status.is_consistent());

        let various_status = fixture.albums.compilation_status(various).expect("status");
        assert!(various_status.flagged);
        assert!(!various_status.computed);

        let unknown = fixture.albums.compilation_status(404).expect("status");
        assert!(unknown.is_consistent());
    }
}
