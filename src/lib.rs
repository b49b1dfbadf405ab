//! Album index over the local music library database.
//!
//! [`library::AlbumsDb`] is the album data-access helper; it shares one
//! [`db_manager::DbManager`] connection with the tracks, genres and artists
//! helpers and leaves commit timing to its callers.

pub mod config;
pub mod db_manager;
pub mod error;
pub mod library;

pub use db_manager::{DbManager, SqlCursor};
pub use error::{ConfigError, LibraryError, LibraryResult};
