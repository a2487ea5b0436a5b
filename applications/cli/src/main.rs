//! plex-playlist - manage Plex Media Server playlists from the terminal

mod settings;

use clap::{Parser, Subcommand};
use plex_client::{PlaylistManager, PlexClient, PlexClientError};
use settings::Settings;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "plex-playlist")]
#[command(about = "CLI tool to manage Plex Media Server playlists", version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test the connection to the server
    Test,
    /// List all playlists
    List,
    /// Show playlist details and tracks
    Show {
        /// Playlist rating key
        playlist_id: String,
    },
    /// Create a new playlist
    Create {
        title: String,
        /// Playlist type (audio, video)
        #[arg(short = 't', long = "type", default_value = "audio")]
        kind: String,
    },
    /// Delete a playlist
    Delete {
        playlist_id: String,
    },
    /// Search for tracks and add them to a playlist
    Add {
        playlist_id: String,
        query: String,
        /// Library ID to search in (defaults to the first music library)
        #[arg(short, long)]
        library: Option<String>,
    },
    /// Remove a track from a playlist by index (0-based)
    Remove {
        playlist_id: String,
        #[arg(allow_negative_numbers = true)]
        index: i64,
    },
    /// List all libraries
    Libraries,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "plex_playlist=debug,plex_client=debug"
    } else {
        "plex_playlist=info,plex_client=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            if let Some(client_err) = err.downcast_ref::<PlexClientError>() {
                report(client_err);
            }
            ExitCode::FAILURE
        }
    }
}

fn report(err: &PlexClientError) {
    if let PlexClientError::Connection {
        url, code, status, ..
    } = err
    {
        eprintln!("Server: {}", url);
        if let Some(code) = code {
            eprintln!("Error code: {}", code);
        }
        if let Some(status) = status {
            eprintln!("HTTP status: {}", status);
        }
    }

    let hints = err.troubleshooting();
    if !hints.is_empty() {
        eprintln!("\nTroubleshooting:");
        for hint in hints {
            eprintln!("  - {}", hint);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let client = PlexClient::new(settings.client_config())?;
    let manager = PlaylistManager::new(client);

    manager.connect().await?;
    println!("Connected to Plex server at {}", manager.client().url());

    match cli.command {
        Commands::Test => {}
        Commands::List => {
            let playlists = manager.client().list_playlists().await?;
            if playlists.is_empty() {
                println!("No playlists found");
            } else {
                println!("\nPlaylists:");
                for (i, playlist) in playlists.iter().enumerate() {
                    println!(
                        "{}. {} ({} items) [{}]",
                        i + 1,
                        playlist.title,
                        playlist.leaf_count,
                        playlist.rating_key
                    );
                }
            }
        }
        Commands::Show { playlist_id } => {
            let details = manager.playlist_details(&playlist_id).await?;
            println!("\nPlaylist: {}", details.playlist.title);
            println!("Items: {}", details.playlist.leaf_count);
            println!(
                "Type: {}",
                details.playlist.playlist_type.as_deref().unwrap_or("Unknown")
            );

            if !details.items.is_empty() {
                println!("\nTracks:");
                for (i, item) in details.items.iter().enumerate() {
                    println!(
                        "{}. {} - {} ({})",
                        i + 1,
                        item.grandparent_title.as_deref().unwrap_or("Unknown Artist"),
                        item.title,
                        item.parent_title.as_deref().unwrap_or("Unknown Album")
                    );
                }
            }
        }
        Commands::Create { title, kind } => {
            manager.client().create_playlist(&title, &kind).await?;
            println!("Playlist created: {}", title);
        }
        Commands::Delete { playlist_id } => {
            let deleted = manager.delete_playlist(&playlist_id).await?;
            println!("Playlist deleted: {}", deleted.title);
        }
        Commands::Add {
            playlist_id,
            query,
            library,
        } => {
            let added = manager
                .search_and_add(&playlist_id, &query, library.as_deref())
                .await?;
            if added.is_empty() {
                println!("No results found for: {}", query);
            } else {
                for (i, result) in added.iter().enumerate() {
                    println!(
                        "{}. {} - {}",
                        i + 1,
                        result.grandparent_title.as_deref().unwrap_or("Unknown Artist"),
                        result.title
                    );
                }
                println!("Added {} items to playlist", added.len());
            }
        }
        Commands::Remove { playlist_id, index } => {
            let removed = manager.remove_at(&playlist_id, index).await?;
            println!("Removed: {}", removed.title);
        }
        Commands::Libraries => {
            let libraries = manager.client().list_libraries().await?;
            println!("\nLibraries:");
            for (i, library) in libraries.iter().enumerate() {
                println!(
                    "{}. {} ({}) [{}]",
                    i + 1,
                    library.title,
                    library.library_type.as_str(),
                    library.key
                );
            }
        }
    }

    Ok(())
}
