use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{info, warn};

use roqtune_library::config::{self, LibraryConfig};
use roqtune_library::library::{AlbumsDb, GenresDb, PartySource, TracksDb};
use roqtune_library::DbManager;

#[derive(Parser, Debug)]
#[clap(about = "Inspect and maintain the roqtune album index")]
struct CliArgs {
    /// Path to `library.toml`. Defaults to the user config directory.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Log at debug level regardless of config.
    #[clap(short, long)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Album count and average popularity.
    Stats,
    /// Prune stale genre links and orphaned albums, then commit.
    Clean,
    /// Most played albums.
    Populars,
    /// Most recently modified albums.
    Recents,
    /// A fresh random sample of albums.
    Randoms,
    /// Party-mode album list.
    Party {
        #[clap(long)]
        populars: bool,
        #[clap(long)]
        recents: bool,
        #[clap(long = "genre")]
        genres: Vec<i64>,
    },
    /// Album directory, repairing a stale stored path.
    Path { album_id: i64 },
}

fn open_albums(
    config: &LibraryConfig,
) -> Result<(DbManager, AlbumsDb), Box<dyn std::error::Error>> {
    let db_path = config
        .database
        .resolved_path()
        .ok_or("Could not determine the library database path")?;
    let db = DbManager::new(
        &db_path,
        Duration::from_millis(config.database.busy_timeout_ms),
    )?;
    let albums = AlbumsDb::new(
        db.clone(),
        Arc::new(TracksDb::new(db.clone())),
        Arc::new(GenresDb::new(db.clone())),
    );
    Ok((db, albums))
}

fn print_ids(ids: &[i64]) {
    for id in ids {
        println!("{}", id);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let config_file = match args.config {
        Some(path) => path,
        None => config::default_config_file()?,
    };
    let config = config::load_or_create(&config_file)?;

    let mut clog = colog::default_builder();
    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        config.logging.level.to_level_filter()
    };
    clog.filter(None, level);
    clog.init();

    let (db, albums) = open_albums(&config)?;

    match args.command {
        Command::Stats => {
            println!("albums: {}", albums.count()?);
            println!("average popularity: {:.2}", albums.get_avg_popularity()?);
        }
        Command::Clean => {
            let mut modified = 0usize;
            for album_id in albums.all_ids()? {
                if albums.clean(album_id)? {
                    modified += 1;
                }
            }
            db.commit()?;
            info!("Library clean finished. modified_albums={}", modified);
        }
        Command::Populars => print_ids(&albums.get_populars()?),
        Command::Recents => print_ids(&albums.get_recents()?),
        Command::Randoms => print_ids(&albums.get_randoms()?),
        Command::Party {
            populars,
            recents,
            genres,
        } => {
            let mut sources = Vec::new();
            if populars {
                sources.push(PartySource::Populars);
            }
            if recents {
                sources.push(PartySource::Recents);
            }
            sources.extend(genres.into_iter().map(PartySource::from_id));
            if sources.is_empty() {
                warn!("No party sources selected");
            }
            print_ids(&albums.get_party_ids(&sources)?);
        }
        Command::Path { album_id } => {
            let resolution = albums.get_path(album_id)?;
            if resolution.repaired {
                info!("Stored path was stale and has been repaired");
            }
            println!("{}", resolution.path);
        }
    }

    Ok(())
}
