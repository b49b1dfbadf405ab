mod album_listing;
mod album_stats;
pub mod albums_db;
pub mod artists_db;
pub mod collaborators;
pub mod genres_db;
pub mod library_types;
pub mod tracks_db;

#[cfg(test)]
pub(crate) mod test_support;

pub use albums_db::AlbumsDb;
pub use artists_db::ArtistsDb;
pub use collaborators::{GenreProvider, TrackProvider};
pub use genres_db::GenresDb;
pub use library_types::{
    reserved, Album, AlbumId, AlbumStats, ArtistId, CompilationStatus, GenreFilter, GenreId,
    NewAlbum, PartySource, PathResolution, TrackId,
};
pub use tracks_db::{NewTrack, TracksDb};
