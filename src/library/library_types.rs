//! Identifiers, row models and filter types shared by the library helpers.

pub type AlbumId = i64;
pub type ArtistId = i64;
pub type GenreId = i64;
pub type TrackId = i64;

/// Reserved ids used as markers instead of real rows.
pub mod reserved {
    /// Artist id stored on albums that have no single album artist.
    pub const COMPILATIONS: i64 = -999;
    /// Pseudo-genre selecting the most played albums.
    pub const POPULARS: i64 = -2;
    /// Pseudo-genre selecting the most recently modified albums.
    pub const RECENTS: i64 = -4;
    /// Pseudo-genre meaning "no genre restriction".
    pub const ALL: i64 = -8;
}

/// Album row as stored in `albums`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: AlbumId,
    pub name: String,
    pub artist_id: ArtistId,
    pub no_album_artist: bool,
    pub year: Option<i64>,
    pub path: String,
    pub popularity: i64,
    pub mtime: i64,
}

/// Values for a freshly scanned album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlbum {
    pub name: String,
    pub artist_id: ArtistId,
    pub no_album_artist: bool,
    pub year: Option<i64>,
    pub path: String,
    pub popularity: i64,
    pub mtime: i64,
}

impl NewAlbum {
    pub fn new(name: impl Into<String>, artist_id: ArtistId) -> Self {
        Self {
            name: name.into(),
            artist_id,
            no_album_artist: false,
            year: None,
            path: String::new(),
            popularity: 0,
            mtime: 0,
        }
    }

    /// Album attributed to the compilation pseudo-artist.
    pub fn compilation(name: impl Into<String>) -> Self {
        Self {
            no_album_artist: true,
            ..Self::new(name, reserved::COMPILATIONS)
        }
    }

    pub fn with_year(mut self, year: Option<i64>) -> Self {
        self.year = year;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_popularity(mut self, popularity: i64) -> Self {
        self.popularity = popularity;
        self
    }

    pub fn with_mtime(mut self, mtime: i64) -> Self {
        self.mtime = mtime;
        self
    }
}

/// Restricts per-album track queries to tracks tagged with one genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenreFilter {
    #[default]
    Unfiltered,
    Genre(GenreId),
}

impl GenreFilter {
    /// Maps a raw genre id as carried by views: missing, non-positive and
    /// [`reserved::ALL`] ids select every track.
    pub fn from_raw(genre_id: Option<GenreId>) -> Self {
        match genre_id {
            Some(id) if id > 0 => Self::Genre(id),
            _ => Self::Unfiltered,
        }
    }
}

/// One source feeding the party-mode album list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartySource {
    Populars,
    Recents,
    Genre(GenreId),
}

impl PartySource {
    pub fn from_id(id: GenreId) -> Self {
        match id {
            reserved::POPULARS => Self::Populars,
            reserved::RECENTS => Self::Recents,
            genre_id => Self::Genre(genre_id),
        }
    }
}

/// Result of resolving an album directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolution {
    pub path: String,
    /// The stored path was stale and has been replaced (and committed).
    pub repaired: bool,
}

/// Stored popularity/mtime of an album matched by track count and duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlbumStats {
    pub popularity: i64,
    pub mtime: i64,
}

/// Both notions of "compilation" for one album.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilationStatus {
    /// `no_album_artist` flag or compilation pseudo-artist on the album row.
    pub flagged: bool,
    /// More than one distinct track artist among the album tracks.
    pub computed: bool,
}

impl CompilationStatus {
    pub fn is_consistent(&self) -> bool {
        self.flagged == self.computed
    }
}
