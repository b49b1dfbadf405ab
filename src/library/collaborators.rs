//! Cross-entity lookups the albums helper delegates to its siblings.

use crate::error::LibraryResult;
use crate::library::library_types::{AlbumId, GenreId, TrackId};

/// Resolves track rows owned by the tracks helper.
pub trait TrackProvider: Send + Sync {
    /// Filesystem path of a track, `None` when the track does not exist.
    fn get_path(&self, track_id: TrackId) -> LibraryResult<Option<String>>;
}

/// Resolves genre membership owned by the genres helper.
pub trait GenreProvider: Send + Sync {
    /// Albums linked to a genre.
    fn get_albums(&self, genre_id: GenreId) -> LibraryResult<Vec<AlbumId>>;
}
